use super::model::BlockSpec;
use serde::Serialize;
use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Problem has no variable blocks")]
    NoBlocks,
    #[error("Variable block '{0}' has no options")]
    EmptyBlock(&'static str),
    #[error("Block index {block} is out of range ({count} blocks)")]
    UnknownBlock { block: usize, count: usize },
    #[error("Option {option} is out of range for block '{name}' ({len} options)")]
    OptionOutOfRange {
        name: &'static str,
        option: usize,
        len: usize,
    },
    #[error("Selection has {actual} entries, layout has {expected} blocks")]
    SelectionLength { expected: usize, actual: usize },
    #[error("Assignment has {actual} variables, layout has {expected}")]
    AssignmentLength { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockRange {
    pub name: &'static str,
    pub start: usize,
    pub len: usize,
}

impl BlockRange {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

/// Contiguous one-hot blocks, in model order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableLayout {
    blocks: Vec<BlockRange>,
    num_variables: usize,
}

impl VariableLayout {
    pub fn new(specs: &[BlockSpec]) -> Result<Self, LayoutError> {
        if specs.is_empty() {
            return Err(LayoutError::NoBlocks);
        }
        let mut start = 0;
        let mut blocks = Vec::with_capacity(specs.len());
        for spec in specs {
            if spec.len == 0 {
                return Err(LayoutError::EmptyBlock(spec.name));
            }
            blocks.push(BlockRange {
                name: spec.name,
                start,
                len: spec.len,
            });
            start += spec.len;
        }
        Ok(Self {
            blocks,
            num_variables: start,
        })
    }

    pub fn blocks(&self) -> &[BlockRange] {
        &self.blocks
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn block(&self, block: usize) -> Result<&BlockRange, LayoutError> {
        self.blocks.get(block).ok_or(LayoutError::UnknownBlock {
            block,
            count: self.blocks.len(),
        })
    }

    pub fn global_index(&self, block: usize, option: usize) -> Result<usize, LayoutError> {
        let range = self.block(block)?;
        if option >= range.len {
            return Err(LayoutError::OptionOutOfRange {
                name: range.name,
                option,
                len: range.len,
            });
        }
        Ok(range.start + option)
    }

    /// The assignment with exactly one bit set per block.
    pub fn one_hot(&self, selection: &[usize]) -> Result<Vec<bool>, LayoutError> {
        if selection.len() != self.blocks.len() {
            return Err(LayoutError::SelectionLength {
                expected: self.blocks.len(),
                actual: selection.len(),
            });
        }
        let mut x = vec![false; self.num_variables];
        for (block, &option) in selection.iter().enumerate() {
            x[self.global_index(block, option)?] = true;
        }
        Ok(x)
    }
}
