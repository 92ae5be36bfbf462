//! Data model for a single-bay reinforced-concrete frame, and for the
//! hollow blocks of a masonry wall.

pub mod block;
pub mod catalog;
pub mod design;
pub mod geometry;
pub mod load;
pub mod material;
pub mod member;

use thiserror::Error;

/// A caller-supplied value that the core refuses to work with.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("Invalid input for '{field}': {value} - {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub value: String,
    pub reason: &'static str,
}

impl ValidationError {
    pub fn new(field: &'static str, value: impl ToString, reason: &'static str) -> Self {
        Self {
            field,
            value: value.to_string(),
            reason,
        }
    }
}

pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new(field, value, "must be a positive finite number"))
    }
}

pub(crate) fn require_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new(field, value, "must be a non-negative finite number"))
    }
}
