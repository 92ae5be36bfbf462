//! Binary quadratic problems `E(x) = xᵗQx + c` over `x ∈ {0,1}ⁿ`.

pub mod ising;
pub mod problem;

pub use ising::IsingModel;
pub use problem::{BinaryQuadraticProblem, ProblemError};
