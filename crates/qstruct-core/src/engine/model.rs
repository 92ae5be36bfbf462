use super::config::PenaltyConfig;

/// One one-hot block of decision variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpec {
    pub name: &'static str,
    pub len: usize,
}

impl BlockSpec {
    pub const fn new(name: &'static str, len: usize) -> Self {
        Self { name, len }
    }
}

pub type UnaryRatio<'a> = Box<dyn Fn(usize) -> f64 + Send + Sync + 'a>;
pub type PairRatio<'a> = Box<dyn Fn(usize, usize) -> f64 + Send + Sync + 'a>;

pub enum ConstraintScope<'a> {
    /// Depends on a single option; penalized on the diagonal.
    Unary { block: usize, ratio: UnaryRatio<'a> },
    /// Depends on one option from each of two distinct blocks; penalized on
    /// the coupling between the two variables.
    Pairwise {
        first: usize,
        second: usize,
        ratio: PairRatio<'a>,
    },
}

/// A feasibility ratio that passes when it is `<= threshold`.
pub struct Constraint<'a> {
    pub name: &'static str,
    pub weight: f64,
    pub threshold: f64,
    pub scope: ConstraintScope<'a>,
}

impl<'a> Constraint<'a> {
    pub fn unary<F>(name: &'static str, weight: f64, threshold: f64, block: usize, ratio: F) -> Self
    where
        F: Fn(usize) -> f64 + Send + Sync + 'a,
    {
        Self {
            name,
            weight,
            threshold,
            scope: ConstraintScope::Unary {
                block,
                ratio: Box::new(ratio),
            },
        }
    }

    pub fn pairwise<F>(
        name: &'static str,
        weight: f64,
        threshold: f64,
        first: usize,
        second: usize,
        ratio: F,
    ) -> Self
    where
        F: Fn(usize, usize) -> f64 + Send + Sync + 'a,
    {
        Self {
            name,
            weight,
            threshold,
            scope: ConstraintScope::Pairwise {
                first,
                second,
                ratio: Box::new(ratio),
            },
        }
    }
}

/// A discrete catalog-selection problem the engine can encode.
///
/// Block order returned by [`blocks`](CatalogModel::blocks) is the variable
/// order of the encoded problem. Option indices passed to the callbacks are
/// positions inside the corresponding block.
pub trait CatalogModel {
    fn blocks(&self) -> Vec<BlockSpec>;

    /// Unscaled objective contribution of picking `option` in `block`.
    fn objective(&self, block: usize, option: usize) -> f64;

    fn constraints(&self, penalties: &PenaltyConfig) -> Vec<Constraint<'_>>;
}
