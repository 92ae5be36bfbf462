use super::{ValidationError, require_positive};
use serde::{Deserialize, Serialize};

/// Number of columns, beams and footings in the single-bay frame.
pub const COLUMN_COUNT: usize = 4;

/// Plan dimensions and story height of a single-bay frame (m).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    pub width_m: f64,
    pub length_m: f64,
    pub height_m: f64,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            width_m: 4.0,
            length_m: 5.0,
            height_m: 3.0,
        }
    }
}

impl Geometry {
    pub fn new(width_m: f64, length_m: f64, height_m: f64) -> Self {
        Self {
            width_m,
            length_m,
            height_m,
        }
    }

    pub fn plan_area_m2(&self) -> f64 {
        self.width_m * self.length_m
    }

    pub fn max_span_m(&self) -> f64 {
        self.width_m.max(self.length_m)
    }

    /// Total length of the four perimeter beams.
    pub fn perimeter_m(&self) -> f64 {
        2.0 * (self.width_m + self.length_m)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("width_m", self.width_m)?;
        require_positive("length_m", self.length_m)?;
        require_positive("height_m", self.height_m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_quantities() {
        let g = Geometry::new(4.0, 5.0, 3.0);
        assert_eq!(g.plan_area_m2(), 20.0);
        assert_eq!(g.max_span_m(), 5.0);
        assert_eq!(g.perimeter_m(), 18.0);
    }

    #[test]
    fn zero_height_is_rejected() {
        let err = Geometry::new(4.0, 5.0, 0.0).validate().unwrap_err();
        assert_eq!(err.field, "height_m");
    }
}
