use super::{ValidationError, require_non_negative};
use serde::{Deserialize, Serialize};

pub const DEAD_LOAD_FACTOR: f64 = 1.2;
pub const LIVE_LOAD_FACTOR: f64 = 1.6;

/// Superimposed floor pressures (kPa), excluding the slab's own weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadCase {
    pub dead_kpa: f64,
    pub live_kpa: f64,
}

impl Default for LoadCase {
    fn default() -> Self {
        Self {
            dead_kpa: 5.0,
            live_kpa: 2.0,
        }
    }
}

impl LoadCase {
    pub fn new(dead_kpa: f64, live_kpa: f64) -> Self {
        Self { dead_kpa, live_kpa }
    }

    /// 1.2D + 1.6L
    pub fn factored(&self) -> f64 {
        self.factored_with_self_weight(0.0)
    }

    /// D + L
    pub fn service(&self) -> f64 {
        self.service_with_self_weight(0.0)
    }

    /// Factored pressure with an extra self-weight added to the dead load.
    pub fn factored_with_self_weight(&self, self_weight_kpa: f64) -> f64 {
        DEAD_LOAD_FACTOR * (self.dead_kpa + self_weight_kpa) + LIVE_LOAD_FACTOR * self.live_kpa
    }

    pub fn service_with_self_weight(&self, self_weight_kpa: f64) -> f64 {
        self.dead_kpa + self_weight_kpa + self.live_kpa
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_negative("dead_kpa", self.dead_kpa)?;
        require_non_negative("live_kpa", self.live_kpa)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factored_and_service_combinations() {
        let load = LoadCase::new(5.0, 2.0);
        assert!((load.factored() - 9.2).abs() < 1e-12);
        assert!((load.service() - 7.0).abs() < 1e-12);
    }

    #[test]
    fn self_weight_is_factored_as_dead_load() {
        let load = LoadCase::new(5.0, 2.0);
        assert!((load.factored_with_self_weight(3.6) - 13.52).abs() < 1e-12);
        assert!((load.service_with_self_weight(3.6) - 10.6).abs() < 1e-12);
    }

    #[test]
    fn negative_live_load_is_rejected() {
        assert!(LoadCase::new(5.0, -1.0).validate().is_err());
    }
}
