use super::config::PenaltyConfig;
use super::error::EngineError;
use super::layout::VariableLayout;
use super::model::{CatalogModel, Constraint, ConstraintScope};
use crate::core::qubo::BinaryQuadraticProblem;
use nalgebra::DMatrix;
use serde::Serialize;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EncodingStats {
    pub num_variables: usize,
    pub num_blocks: usize,
    pub unary_penalties: usize,
    pub pairwise_penalties: usize,
    pub capped_penalties: usize,
    pub max_penalty: f64,
}

impl EncodingStats {
    fn record(&mut self, penalty: f64, cap: f64) {
        if penalty >= cap {
            self.capped_penalties += 1;
        }
        self.max_penalty = self.max_penalty.max(penalty);
    }
}

/// A problem ready for a solver, plus everything needed to decode it.
#[derive(Debug, Clone)]
pub struct EncodedProblem {
    pub problem: BinaryQuadraticProblem,
    pub layout: VariableLayout,
    /// Unscaled objective value per block and option, in layout order.
    pub objective_terms: Vec<Vec<f64>>,
    pub stats: EncodingStats,
}

/// Builds `Q` for `model`:
///
/// - `objective · scale` on the diagonal,
/// - `λ·(Σxᵢ − 1)²` per block (`−λ` diagonal, `2λ` per pair, `+λ` offset),
/// - capped `weight·(ratio − threshold)²` for every violating option or pair.
///
/// The returned matrix is symmetric and finite.
#[instrument(level = "debug", skip_all)]
pub fn encode<M>(model: &M, penalties: &PenaltyConfig) -> Result<EncodedProblem, EngineError>
where
    M: CatalogModel + ?Sized,
{
    let layout = VariableLayout::new(&model.blocks())?;
    let n = layout.num_variables();
    let mut q = DMatrix::<f64>::zeros(n, n);
    let mut offset = 0.0;
    let mut stats = EncodingStats {
        num_variables: n,
        num_blocks: layout.num_blocks(),
        ..EncodingStats::default()
    };

    let mut objective_terms = Vec::with_capacity(layout.num_blocks());
    for (b, block) in layout.blocks().iter().enumerate() {
        let mut terms = Vec::with_capacity(block.len);
        for option in 0..block.len {
            let value = model.objective(b, option);
            if !value.is_finite() {
                return Err(EngineError::NonFiniteObjective {
                    block: block.name,
                    option,
                    value,
                });
            }
            let i = block.start + option;
            q[(i, i)] += value * penalties.objective_scale;
            terms.push(value);
        }
        objective_terms.push(terms);
    }

    let lambda = penalties.one_hot;
    for block in layout.blocks() {
        for i in block.range() {
            q[(i, i)] -= lambda;
            for j in (i + 1)..block.end() {
                q[(i, j)] += 2.0 * lambda;
            }
        }
        offset += lambda;
    }

    for constraint in model.constraints(penalties) {
        add_constraint(&mut q, &layout, &constraint, penalties, &mut stats)?;
    }

    let problem = BinaryQuadraticProblem::symmetrized(q, offset)?;
    debug!(
        num_variables = stats.num_variables,
        num_blocks = stats.num_blocks,
        unary = stats.unary_penalties,
        pairwise = stats.pairwise_penalties,
        capped = stats.capped_penalties,
        max_penalty = stats.max_penalty,
        "Encoded binary quadratic problem."
    );

    Ok(EncodedProblem {
        problem,
        layout,
        objective_terms,
        stats,
    })
}

fn add_constraint(
    q: &mut DMatrix<f64>,
    layout: &VariableLayout,
    constraint: &Constraint<'_>,
    penalties: &PenaltyConfig,
    stats: &mut EncodingStats,
) -> Result<(), EngineError> {
    let cap = penalties.penalty_cap;
    match &constraint.scope {
        ConstraintScope::Unary { block, ratio } => {
            let range = *layout.block(*block)?;
            for option in 0..range.len {
                let penalty =
                    penalties.violation_penalty(constraint.weight, ratio(option), constraint.threshold);
                if penalty > 0.0 {
                    let i = range.start + option;
                    q[(i, i)] += penalty;
                    stats.unary_penalties += 1;
                    stats.record(penalty, cap);
                }
            }
        }
        ConstraintScope::Pairwise {
            first,
            second,
            ratio,
        } => {
            if first == second {
                return Err(EngineError::InvalidConstraint {
                    name: constraint.name,
                    reason: format!("pairwise constraint couples block {first} with itself"),
                });
            }
            let a = *layout.block(*first)?;
            let b = *layout.block(*second)?;
            for oa in 0..a.len {
                for ob in 0..b.len {
                    let penalty = penalties.violation_penalty(
                        constraint.weight,
                        ratio(oa, ob),
                        constraint.threshold,
                    );
                    if penalty > 0.0 {
                        let (i, j) = (a.start + oa, b.start + ob);
                        // Stored on one side only; symmetrization splits it.
                        q[(i.min(j), i.max(j))] += penalty;
                        stats.pairwise_penalties += 1;
                        stats.record(penalty, cap);
                    }
                }
            }
        }
    }
    Ok(())
}
