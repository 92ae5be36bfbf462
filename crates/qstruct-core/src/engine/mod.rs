//! # Engine Module
//!
//! A generic catalog-optimization engine. A problem is described as a list of
//! one-hot variable blocks (one per decision, each backed by an ordered
//! catalog), a linear objective per option and a set of feasibility ratios
//! over single options or pairs of options. The engine turns that description
//! into a [`BinaryQuadraticProblem`](crate::core::qubo::BinaryQuadraticProblem),
//! solves it, decodes the assignment back into one option index per block and
//! polishes the result with a short coordinate-descent pass.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Penalty weights, annealing schedule and solver selection
//! - **Problem Description** ([`model`]) - The [`model::CatalogModel`] trait implemented by workflows
//! - **Encoding** ([`encoder`], [`layout`]) - Block layout and `Q` construction
//! - **Solving** ([`solver`]) - The `SolverBackend` capability with local and remote implementations
//! - **Decoding** ([`decoder`]) - First set bit per block with a one-hot flag
//! - **Refinement** ([`refine`]) - Block-wise descent on the decoded selection
//! - **Pipeline** ([`pipeline`]) - Encode, solve, decode and refine in one call
//! - **Progress Monitoring** ([`progress`]) - Optional progress callbacks
//! - **Error Handling** ([`error`]) - Engine error taxonomy

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod layout;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod refine;
pub mod solver;
