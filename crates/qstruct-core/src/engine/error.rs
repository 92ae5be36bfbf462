use thiserror::Error;

use super::config::ConfigError;
use super::layout::LayoutError;
use super::solver::SolverError;
use crate::core::models::ValidationError;
use crate::core::models::catalog::CatalogError;
use crate::core::qubo::ProblemError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Invalid input: {source}")]
    Validation {
        #[from]
        source: ValidationError,
    },

    #[error("Catalog error: {source}")]
    Catalog {
        #[from]
        source: CatalogError,
    },

    #[error("Variable layout mismatch: {source}")]
    Layout {
        #[from]
        source: LayoutError,
    },

    #[error("Malformed problem: {source}")]
    Problem {
        #[from]
        source: ProblemError,
    },

    #[error("Solver failed: {source}")]
    Solver {
        #[from]
        source: SolverError,
    },

    #[error("Objective for block '{block}' option {option} is not finite ({value})")]
    NonFiniteObjective {
        block: &'static str,
        option: usize,
        value: f64,
    },

    #[error("Invalid constraint '{name}': {reason}")]
    InvalidConstraint { name: &'static str, reason: String },
}
