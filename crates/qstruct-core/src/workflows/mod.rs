//! # Workflows
//!
//! Public entry points. [`sizing`] picks member sizes from the member
//! catalogs, [`materials`] picks concrete strength and steel ratios for fixed
//! members, and [`analyze`] evaluates one given design without optimizing.
//! [`blocks`] runs the same engine over hollow masonry block geometries.

pub mod analyze;
pub mod blocks;
pub mod materials;
pub mod sizing;
