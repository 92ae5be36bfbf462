//! # qstruct Core Library
//!
//! Member sizing for small reinforced-concrete buildings. A discrete design
//! problem (one column size, one beam size, one slab thickness and one footing
//! size, each picked from a fixed catalog) is encoded as a binary quadratic
//! problem and solved with repeated simulated annealing.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Geometry`, `MemberSize`,
//!   catalogs), the closed-form capacity evaluator (`analysis`) and the binary
//!   quadratic problem type (`qubo`).
//!
//! - **[`engine`]: The Logic Core.** A generic catalog-optimization engine: the
//!   encoder that turns one-hot variable blocks, an objective and feasibility
//!   ratios into a `Q` matrix, the solver backends (local annealing and an
//!   optional remote service), the decoder and the final refinement pass.
//!
//! - **[`workflows`]: The Public API.** Entry points that instantiate the engine
//!   for member sizing and fixed-member material optimization, plus a plain
//!   analysis of a single user-given design.
//!
//! The capacity formulas are simplified code-style approximations for a
//! four-column single-bay frame. They are not a substitute for code-compliant
//! structural design.

pub mod core;
pub mod engine;
pub mod workflows;
