//! Closed-form demand/capacity evaluation for the single-bay frame.
//!
//! These are simplified code-style approximations. Every ratio function
//! returns [`capacity::INFEASIBLE_RATIO`] instead of failing when a capacity
//! degenerates to zero, so the encoder can evaluate absurd combinations safely.

pub mod capacity;
pub mod frame;

pub use capacity::INFEASIBLE_RATIO;
pub use frame::{FrameAnalysis, FrameEvaluation, Reinforcement, Thresholds};
