//! # Core Module
//!
//! Stateless building blocks shared by every optimization workflow.
//!
//! - **Data Model** ([`models`]) - Materials, loads, geometry, member sizes and size catalogs
//! - **Capacity Evaluation** ([`analysis`]) - Demand, capacity and ratio formulas for frame members
//! - **Binary Quadratic Problems** ([`qubo`]) - The `Q` matrix, its energy and its Ising form
//!
//! Nothing in this layer holds mutable state; every function is safe to call
//! repeatedly from the encoder, which evaluates every catalog combination.

pub mod analysis;
pub mod models;
pub mod qubo;
