use super::layout::{LayoutError, VariableLayout};
use serde::Serialize;

/// One option index per block, in layout order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub options: Vec<usize>,
    /// Whether the raw assignment had exactly one bit set in every block.
    pub exact_one_hot: bool,
}

/// Takes the arg-max of each block's slice: the first set bit, or option 0
/// when the block is empty. Does not require a valid one-hot assignment.
pub fn decode(layout: &VariableLayout, x: &[bool]) -> Result<Selection, LayoutError> {
    if x.len() != layout.num_variables() {
        return Err(LayoutError::AssignmentLength {
            expected: layout.num_variables(),
            actual: x.len(),
        });
    }

    let mut exact_one_hot = true;
    let options = layout
        .blocks()
        .iter()
        .map(|block| {
            let slice = &x[block.range()];
            if slice.iter().filter(|&&bit| bit).count() != 1 {
                exact_one_hot = false;
            }
            slice.iter().position(|&bit| bit).unwrap_or(0)
        })
        .collect();

    Ok(Selection {
        options,
        exact_one_hot,
    })
}
