//! Solver backends for binary quadratic problems.
//!
//! Backends share one contract: a validated symmetric problem in, a binary
//! assignment of the same length out. Fallback policy lives with the caller
//! ([`solve_with_fallback`]), not inside a backend.

pub mod annealing;
pub mod remote;

pub use annealing::LocalAnnealingSolver;
pub use remote::RemoteServiceSolver;

use super::progress::{Progress, ProgressReporter};
use crate::core::qubo::{BinaryQuadraticProblem, ProblemError};
use rand::rngs::StdRng;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("No endpoint configured for the external solver")]
    MissingEndpoint,
    #[error("No credentials for the external solver (set a token or QSTRUCT_SOLVER_TOKEN)")]
    MissingCredentials,
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("External solver did not answer within {seconds} s")]
    Timeout { seconds: u64 },
    #[error("External solver returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("Malformed solver response: {0}")]
    MalformedResponse(String),
    #[error("Problem rejected: {source}")]
    Problem {
        #[from]
        source: ProblemError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolverOutcome {
    pub assignment: Vec<bool>,
    /// `xᵗQx + offset` of the returned assignment.
    pub energy: f64,
    pub backend: &'static str,
}

pub trait SolverBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(
        &self,
        problem: &BinaryQuadraticProblem,
        rng: &mut StdRng,
        reporter: &ProgressReporter,
    ) -> Result<SolverOutcome, SolverError>;
}

/// Result of a solve, with a record of whether the external path was used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveReport {
    pub outcome: SolverOutcome,
    pub external_used: bool,
    pub fallback_reason: Option<String>,
}

impl SolveReport {
    pub fn local(outcome: SolverOutcome) -> Self {
        Self {
            outcome,
            external_used: false,
            fallback_reason: None,
        }
    }

    pub fn fallback(outcome: SolverOutcome, reason: &SolverError) -> Self {
        Self {
            outcome,
            external_used: false,
            fallback_reason: Some(reason.to_string()),
        }
    }
}

/// Runs `primary` and degrades to `fallback` on any error. Only a failure of
/// the fallback itself is returned as an error.
pub fn solve_with_fallback(
    primary: &dyn SolverBackend,
    fallback: &dyn SolverBackend,
    problem: &BinaryQuadraticProblem,
    rng: &mut StdRng,
    reporter: &ProgressReporter,
) -> Result<SolveReport, SolverError> {
    match primary.solve(problem, rng, reporter) {
        Ok(outcome) => {
            info!(backend = primary.name(), energy = outcome.energy, "External solve succeeded.");
            Ok(SolveReport {
                outcome,
                external_used: true,
                fallback_reason: None,
            })
        }
        Err(err) => {
            warn!(
                backend = primary.name(),
                fallback = fallback.name(),
                "External solver failed, falling back: {}",
                err
            );
            reporter.report(Progress::Message(format!(
                "External solver unavailable ({err}); using {}.",
                fallback.name()
            )));
            let outcome = fallback.solve(problem, rng, reporter)?;
            Ok(SolveReport::fallback(outcome, &err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::AnnealingConfig;
    use nalgebra::DMatrix;
    use rand::SeedableRng;

    struct Failing;

    impl SolverBackend for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn solve(
            &self,
            _: &BinaryQuadraticProblem,
            _: &mut StdRng,
            _: &ProgressReporter,
        ) -> Result<SolverOutcome, SolverError> {
            Err(SolverError::MalformedResponse("missing 'solution'".to_string()))
        }
    }

    struct Fixed(Vec<bool>);

    impl SolverBackend for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn solve(
            &self,
            problem: &BinaryQuadraticProblem,
            _: &mut StdRng,
            _: &ProgressReporter,
        ) -> Result<SolverOutcome, SolverError> {
            Ok(SolverOutcome {
                energy: problem.shifted_energy(&self.0)?,
                assignment: self.0.clone(),
                backend: self.name(),
            })
        }
    }

    fn problem() -> BinaryQuadraticProblem {
        let m = DMatrix::from_row_slice(2, 2, &[-1.0, 2.0, 2.0, -1.0]);
        BinaryQuadraticProblem::from_symmetric(m, 1.0).unwrap()
    }

    fn local() -> LocalAnnealingSolver {
        LocalAnnealingSolver::new(AnnealingConfig {
            num_reads: 8,
            ..AnnealingConfig::default()
        })
    }

    #[test]
    fn failing_primary_falls_back_to_local_with_same_result() {
        let problem = problem();
        let reporter = ProgressReporter::new();

        let mut rng = StdRng::seed_from_u64(11);
        let report =
            solve_with_fallback(&Failing, &local(), &problem, &mut rng, &reporter).unwrap();

        let mut rng = StdRng::seed_from_u64(11);
        let direct = local().solve(&problem, &mut rng, &reporter).unwrap();

        assert!(!report.external_used);
        assert!(report.fallback_reason.unwrap().contains("missing 'solution'"));
        assert_eq!(report.outcome, direct);
    }

    #[test]
    fn successful_primary_is_reported_as_external() {
        let problem = problem();
        let mut rng = StdRng::seed_from_u64(1);
        let report = solve_with_fallback(
            &Fixed(vec![true, false]),
            &local(),
            &problem,
            &mut rng,
            &ProgressReporter::new(),
        )
        .unwrap();
        assert!(report.external_used);
        assert_eq!(report.fallback_reason, None);
        assert_eq!(report.outcome.backend, "fixed");
        assert!((report.outcome.energy - 0.0).abs() < 1e-12);
    }
}
