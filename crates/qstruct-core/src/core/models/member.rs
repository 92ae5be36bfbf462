use super::{ValidationError, require_positive};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Rectangular section `width × depth` in millimetres.
///
/// Used uniformly for columns, beams and footings; slabs are described by a
/// scalar thickness instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemberSize {
    pub width_mm: f64,
    pub depth_mm: f64,
}

impl MemberSize {
    pub const fn new(width_mm: f64, depth_mm: f64) -> Self {
        Self { width_mm, depth_mm }
    }

    pub const fn square(side_mm: f64) -> Self {
        Self::new(side_mm, side_mm)
    }

    pub fn area_mm2(&self) -> f64 {
        self.width_mm * self.depth_mm
    }

    pub fn area_m2(&self) -> f64 {
        (self.width_mm / 1000.0) * (self.depth_mm / 1000.0)
    }

    pub fn validate(&self, field: &'static str) -> Result<(), ValidationError> {
        require_positive(field, self.width_mm)?;
        require_positive(field, self.depth_mm)
    }
}

impl fmt::Display for MemberSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{}", self.width_mm, self.depth_mm)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseMemberSizeError {
    #[error("Invalid member size '{0}'. Expected 'WIDTHxDEPTH' in millimetres (e.g., '300x450').")]
    Format(String),
    #[error("Invalid dimension '{0}' in member size.")]
    Dimension(String),
}

impl FromStr for MemberSize {
    type Err = ParseMemberSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (w, d) = trimmed
            .split_once(['x', 'X', '×'])
            .ok_or_else(|| ParseMemberSizeError::Format(s.to_string()))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| ParseMemberSizeError::Dimension(part.trim().to_string()))
        };
        Ok(Self::new(parse(w)?, parse(d)?))
    }
}
