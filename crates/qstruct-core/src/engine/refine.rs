use super::error::EngineError;
use super::layout::VariableLayout;
use super::progress::{Progress, ProgressReporter};
use crate::core::qubo::BinaryQuadraticProblem;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefinementOutcome {
    pub passes: usize,
    pub changes: usize,
    /// `xᵗQx + offset` of the refined selection.
    pub energy: f64,
}

/// Block-wise descent restricted to one-hot assignments.
///
/// Each pass visits every block and moves it to the option with the lowest
/// energy given the other blocks. Stops after `max_passes` or the first pass
/// without a change. Energy never increases.
pub fn refine(
    problem: &BinaryQuadraticProblem,
    layout: &VariableLayout,
    selection: &mut [usize],
    max_passes: usize,
    reporter: &ProgressReporter,
) -> Result<RefinementOutcome, EngineError> {
    let mut energy = problem.shifted_energy(&layout.one_hot(selection)?)?;
    let mut passes = 0;
    let mut changes = 0;

    for pass in 0..max_passes {
        passes += 1;
        let mut moves = 0;

        for block in 0..layout.num_blocks() {
            let original = selection[block];
            let mut best = (original, energy);
            for option in 0..layout.block(block)?.len {
                if option == original {
                    continue;
                }
                selection[block] = option;
                let candidate = problem.shifted_energy(&layout.one_hot(selection)?)?;
                if candidate < best.1 {
                    best = (option, candidate);
                }
            }
            selection[block] = best.0;
            if best.0 != original {
                debug!(block, from = original, to = best.0, energy = best.1, "Refinement move.");
                energy = best.1;
                moves += 1;
            }
        }
        changes += moves;
        reporter.report(Progress::RefinementPass {
            pass: pass + 1,
            max_passes,
            moves,
            energy,
        });

        if moves == 0 {
            info!(iteration = pass + 1, "Refinement converged.");
            break;
        }
    }

    Ok(RefinementOutcome {
        passes,
        changes,
        energy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::PenaltyConfig;
    use crate::engine::encoder::encode;
    use crate::engine::model::{BlockSpec, CatalogModel, Constraint};

    /// Two blocks; option costs decrease with index; pairs whose indices sum
    /// above 3 are infeasible.
    struct Descending;

    impl CatalogModel for Descending {
        fn blocks(&self) -> Vec<BlockSpec> {
            vec![BlockSpec::new("a", 4), BlockSpec::new("b", 4)]
        }
        fn objective(&self, _: usize, option: usize) -> f64 {
            10.0 - option as f64
        }
        fn constraints(&self, penalties: &PenaltyConfig) -> Vec<Constraint<'_>> {
            vec![Constraint::pairwise("sum", penalties.stress, 1.0, 0, 1, |a, b| {
                if a + b > 3 { 2.0 } else { 0.0 }
            })]
        }
    }

    #[test]
    fn refinement_reaches_a_block_wise_minimum_without_raising_energy() {
        let encoded = encode(&Descending, &PenaltyConfig::default()).unwrap();
        let mut selection = vec![0, 0];
        let start = encoded
            .problem
            .shifted_energy(&encoded.layout.one_hot(&selection).unwrap())
            .unwrap();
        let outcome = refine(
            &encoded.problem,
            &encoded.layout,
            &mut selection,
            10,
            &ProgressReporter::new(),
        )
        .unwrap();

        assert!(outcome.energy < start);
        assert!(selection[0] + selection[1] <= 3);
        assert_eq!(selection[0] + selection[1], 3);
        assert!(outcome.changes > 0);
        assert!(outcome.passes >= 2);
    }

    #[test]
    fn each_pass_reports_its_moves_and_energy() {
        use std::sync::Mutex;
        let encoded = encode(&Descending, &PenaltyConfig::default()).unwrap();
        let mut selection = vec![0, 0];
        let passes = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::RefinementPass { pass, moves, energy, .. } = event {
                passes.lock().unwrap().push((pass, moves, energy));
            }
        }));
        let outcome =
            refine(&encoded.problem, &encoded.layout, &mut selection, 10, &reporter).unwrap();
        drop(reporter);

        let passes = passes.into_inner().unwrap();
        assert_eq!(passes.len(), outcome.passes);
        assert_eq!(passes.iter().map(|p| p.1).sum::<usize>(), outcome.changes);
        assert_eq!(passes.last().map(|p| p.1), Some(0));
        assert!(passes.windows(2).all(|w| w[1].2 <= w[0].2));
        assert_eq!(passes.last().map(|p| p.2), Some(outcome.energy));
    }

    #[test]
    fn zero_passes_leaves_selection_untouched() {
        let encoded = encode(&Descending, &PenaltyConfig::default()).unwrap();
        let mut selection = vec![1, 1];
        let outcome = refine(
            &encoded.problem,
            &encoded.layout,
            &mut selection,
            0,
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(selection, vec![1, 1]);
        assert_eq!(outcome.passes, 0);
        assert_eq!(outcome.changes, 0);
    }

    #[test]
    fn selection_with_wrong_length_is_rejected() {
        let encoded = encode(&Descending, &PenaltyConfig::default()).unwrap();
        let mut selection = vec![0];
        assert!(
            refine(
                &encoded.problem,
                &encoded.layout,
                &mut selection,
                1,
                &ProgressReporter::new()
            )
            .is_err()
        );
    }
}
