use super::config::{OptimizationConfig, SolverSelection};
use super::decoder::decode;
use super::encoder::{EncodedProblem, encode};
use super::error::EngineError;
use super::model::CatalogModel;
use super::progress::{Progress, ProgressReporter};
use super::refine::{RefinementOutcome, refine};
use super::solver::{
    LocalAnnealingSolver, RemoteServiceSolver, SolveReport, SolverBackend, solve_with_fallback,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{info, warn};

/// How the selection was obtained, for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolverSummary {
    pub backend: &'static str,
    pub external_used: bool,
    pub fallback_reason: Option<String>,
    pub num_reads: usize,
    pub seed: u64,
    /// Energy of the solver's raw assignment, offset included.
    pub raw_energy: f64,
    pub raw_one_hot: bool,
    pub refinement_passes: usize,
    pub refinement_changes: usize,
    /// Energy of the final one-hot selection, offset included.
    pub final_energy: f64,
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub encoded: EncodedProblem,
    /// One option index per block, in model block order.
    pub selection: Vec<usize>,
    pub summary: SolverSummary,
}

/// Encode → solve → decode → refine for any [`CatalogModel`].
pub fn optimize<M>(
    model: &M,
    config: &OptimizationConfig,
    reporter: &ProgressReporter,
) -> Result<PipelineOutcome, EngineError>
where
    M: CatalogModel + ?Sized,
{
    config.validate()?;

    // === Phase 1: Encoding ===
    reporter.report(Progress::PhaseStart { name: "Encoding" });
    let encoded = encode(model, &config.penalties)?;
    info!(
        variables = encoded.layout.num_variables(),
        blocks = encoded.layout.num_blocks(),
        "Encoded catalog problem."
    );
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Solving ===
    reporter.report(Progress::PhaseStart { name: "Annealing" });
    let seed = config
        .annealing
        .seed
        .unwrap_or_else(|| rand::thread_rng().r#gen());
    let mut rng = StdRng::seed_from_u64(seed);
    let report = run_solver(&encoded, config, &mut rng, reporter)?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Decoding ===
    let raw = decode(&encoded.layout, &report.outcome.assignment)?;
    if !raw.exact_one_hot {
        info!("Solver output is not exactly one-hot; using the first set bit per block.");
    }
    let mut selection = raw.options;

    // === Phase 4: Final refinement ===
    let refinement = if config.refinement_passes > 0 {
        reporter.report(Progress::PhaseStart {
            name: "Final Refinement",
        });
        let outcome = refine(
            &encoded.problem,
            &encoded.layout,
            &mut selection,
            config.refinement_passes,
            reporter,
        )?;
        reporter.report(Progress::PhaseFinish);
        outcome
    } else {
        let energy = encoded
            .problem
            .shifted_energy(&encoded.layout.one_hot(&selection)?)?;
        RefinementOutcome {
            passes: 0,
            changes: 0,
            energy,
        }
    };

    let summary = SolverSummary {
        backend: report.outcome.backend,
        external_used: report.external_used,
        fallback_reason: report.fallback_reason,
        num_reads: config.annealing.num_reads,
        seed,
        raw_energy: report.outcome.energy,
        raw_one_hot: raw.exact_one_hot,
        refinement_passes: refinement.passes,
        refinement_changes: refinement.changes,
        final_energy: refinement.energy,
    };
    info!(
        backend = summary.backend,
        raw_energy = summary.raw_energy,
        final_energy = summary.final_energy,
        "Optimization pipeline finished."
    );

    Ok(PipelineOutcome {
        encoded,
        selection,
        summary,
    })
}

fn run_solver(
    encoded: &EncodedProblem,
    config: &OptimizationConfig,
    rng: &mut StdRng,
    reporter: &ProgressReporter,
) -> Result<SolveReport, EngineError> {
    let local = LocalAnnealingSolver::new(config.annealing);
    let report = match &config.solver {
        SolverSelection::Local => SolveReport::local(local.solve(&encoded.problem, rng, reporter)?),
        SolverSelection::External(remote_config) => {
            match RemoteServiceSolver::new(remote_config.clone()) {
                Ok(remote) => solve_with_fallback(&remote, &local, &encoded.problem, rng, reporter)?,
                Err(err) => {
                    warn!("External solver unavailable, using local annealing: {}", err);
                    reporter.report(Progress::Message(format!(
                        "External solver unavailable ({err}); using {}.",
                        LocalAnnealingSolver::NAME
                    )));
                    let outcome = local.solve(&encoded.problem, rng, reporter)?;
                    SolveReport::fallback(outcome, &err)
                }
            }
        }
    };
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::{OptimizationConfigBuilder, PenaltyConfig, RemoteSolverConfig};
    use crate::engine::model::{BlockSpec, Constraint};

    /// Three blocks of four; cost grows with index; the first two blocks must
    /// sum to at least 3 and the third block's option 0 is forbidden.
    struct Toy;

    impl CatalogModel for Toy {
        fn blocks(&self) -> Vec<BlockSpec> {
            vec![
                BlockSpec::new("a", 4),
                BlockSpec::new("b", 4),
                BlockSpec::new("c", 4),
            ]
        }
        fn objective(&self, _: usize, option: usize) -> f64 {
            option as f64
        }
        fn constraints(&self, penalties: &PenaltyConfig) -> Vec<Constraint<'_>> {
            vec![
                Constraint::pairwise("sum", penalties.stress, 1.0, 0, 1, |a, b| {
                    if a + b >= 3 { 0.0 } else { 2.0 }
                }),
                Constraint::unary("c0", penalties.deflection, 1.0, 2, |c| {
                    if c == 0 { 3.0 } else { 0.0 }
                }),
            ]
        }
    }

    fn config(seed: u64) -> OptimizationConfig {
        OptimizationConfigBuilder::new()
            .num_reads(30)
            .seed(seed)
            .solver(SolverSelection::Local)
            .build()
            .unwrap()
    }

    #[test]
    fn pipeline_finds_cheapest_feasible_selection() {
        let outcome = optimize(&Toy, &config(17), &ProgressReporter::new()).unwrap();
        assert_eq!(outcome.selection[0] + outcome.selection[1], 3);
        assert_eq!(outcome.selection[2], 1);
        assert!((outcome.summary.final_energy - 40.0).abs() < 1e-6);
        if outcome.summary.raw_one_hot {
            assert!(outcome.summary.final_energy <= outcome.summary.raw_energy + 1e-9);
        }
    }

    #[test]
    fn refinement_never_ends_above_the_raw_read() {
        let raw_only = OptimizationConfigBuilder::new()
            .num_reads(30)
            .seed(17)
            .refinement_passes(0)
            .solver(SolverSelection::Local)
            .build()
            .unwrap();
        let unrefined = optimize(&Toy, &raw_only, &ProgressReporter::new()).unwrap();
        let refined = optimize(&Toy, &config(17), &ProgressReporter::new()).unwrap();

        assert_eq!(unrefined.summary.refinement_passes, 0);
        assert_eq!(unrefined.summary.raw_energy, refined.summary.raw_energy);
        assert!(refined.summary.final_energy <= unrefined.summary.final_energy + 1e-9);
        assert!((refined.summary.final_energy - 40.0).abs() < 1e-6);
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let a = optimize(&Toy, &config(3), &ProgressReporter::new()).unwrap();
        let b = optimize(&Toy, &config(3), &ProgressReporter::new()).unwrap();
        assert_eq!(a.selection, b.selection);
        assert_eq!(a.summary, b.summary);
    }

    #[test]
    fn external_selection_without_credentials_falls_back() {
        let config = OptimizationConfigBuilder::new()
            .num_reads(10)
            .seed(1)
            .solver(SolverSelection::External(RemoteSolverConfig {
                token: Some(String::new()),
                ..RemoteSolverConfig::new("http://127.0.0.1:1/solve")
            }))
            .build()
            .unwrap();
        // A blank configured token defers to the environment; only assert the
        // local path was taken when no environment token is present.
        if std::env::var(crate::engine::solver::remote::TOKEN_ENV_VAR).is_err() {
            let outcome = optimize(&Toy, &config, &ProgressReporter::new()).unwrap();
            assert!(!outcome.summary.external_used);
            assert_eq!(outcome.summary.backend, LocalAnnealingSolver::NAME);
            assert!(outcome.summary.fallback_reason.is_some());
        }
    }

    #[test]
    fn external_selection_without_endpoint_falls_back() {
        let external = OptimizationConfigBuilder::new()
            .num_reads(30)
            .seed(17)
            .solver(SolverSelection::External(RemoteSolverConfig::new("")))
            .build()
            .unwrap();
        let outcome = optimize(&Toy, &external, &ProgressReporter::new()).unwrap();
        let local = optimize(&Toy, &config(17), &ProgressReporter::new()).unwrap();

        assert!(!outcome.summary.external_used);
        assert_eq!(outcome.summary.backend, LocalAnnealingSolver::NAME);
        assert!(
            outcome
                .summary
                .fallback_reason
                .as_deref()
                .is_some_and(|reason| reason.contains("endpoint"))
        );
        assert_eq!(outcome.selection, local.selection);
    }

    #[test]
    fn phases_are_reported_in_order() {
        use std::sync::Mutex;
        let phases = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::PhaseStart { name } = event {
                phases.lock().unwrap().push(name);
            }
        }));
        optimize(&Toy, &config(5), &reporter).unwrap();
        drop(reporter);
        assert_eq!(
            phases.into_inner().unwrap(),
            vec!["Encoding", "Annealing", "Final Refinement"]
        );
    }
}
