use crate::core::analysis::Thresholds;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{parameter}': {value} ({reason})")]
    InvalidValue {
        parameter: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error("Penalty weights are out of order: {0}")]
    PenaltyOrdering(String),
}

impl ConfigError {
    fn invalid(parameter: &'static str, value: impl ToString, reason: &'static str) -> Self {
        Self::InvalidValue {
            parameter,
            value: value.to_string(),
            reason,
        }
    }
}

/// Weights of the energy terms in the encoded problem.
///
/// These are tunable constants. Their ordering, not their exact values, is
/// what keeps one-hot violations more expensive than any single feasibility
/// violation, and feasibility violations more expensive than objective gains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyConfig {
    pub one_hot: f64,
    pub stress: f64,
    pub deflection: f64,
    pub bearing: f64,
    pub ductility: f64,
    pub objective_scale: f64,
    /// Upper bound for any single `weight·(ratio − threshold)²` term.
    pub penalty_cap: f64,
    pub thresholds: Thresholds,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            one_hot: 5000.0,
            stress: 1000.0,
            deflection: 500.0,
            bearing: 800.0,
            ductility: 1000.0,
            objective_scale: 10.0,
            penalty_cap: 2500.0,
            thresholds: Thresholds::default(),
        }
    }
}

impl PenaltyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("one_hot", self.one_hot),
            ("stress", self.stress),
            ("deflection", self.deflection),
            ("bearing", self.bearing),
            ("ductility", self.ductility),
            ("objective_scale", self.objective_scale),
            ("penalty_cap", self.penalty_cap),
            ("thresholds.stress", self.thresholds.stress),
            ("thresholds.bearing", self.thresholds.bearing),
            ("thresholds.deflection", self.thresholds.deflection),
        ];
        for (name, value) in named {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::invalid(name, value, "must be positive and finite"));
            }
        }

        let structural = [
            ("stress", self.stress),
            ("deflection", self.deflection),
            ("bearing", self.bearing),
            ("ductility", self.ductility),
        ];
        for (name, weight) in structural {
            if weight >= self.one_hot {
                return Err(ConfigError::PenaltyOrdering(format!(
                    "{name} weight {weight} must be below the one-hot weight {}",
                    self.one_hot
                )));
            }
            if weight <= self.objective_scale {
                return Err(ConfigError::PenaltyOrdering(format!(
                    "{name} weight {weight} must exceed the objective scale {}",
                    self.objective_scale
                )));
            }
        }
        if self.penalty_cap >= self.one_hot {
            return Err(ConfigError::PenaltyOrdering(format!(
                "penalty cap {} must be below the one-hot weight {}",
                self.penalty_cap, self.one_hot
            )));
        }
        Ok(())
    }

    /// `weight·(ratio − threshold)²` for ratios above the threshold, capped.
    /// Infinite or NaN ratios map to the cap.
    pub fn violation_penalty(&self, weight: f64, ratio: f64, threshold: f64) -> f64 {
        if ratio <= threshold {
            return 0.0;
        }
        let penalty = weight * (ratio - threshold).powi(2);
        if penalty.is_finite() {
            penalty.min(self.penalty_cap)
        } else {
            self.penalty_cap
        }
    }
}

/// Geometric-cooling schedule for the local annealer.
///
/// With the defaults a read makes one single-bit flip attempt per
/// temperature level, about 180 attempts over the whole schedule, fewer than
/// one sweep of a forty-variable problem. Moving between two one-hot
/// selections also crosses a barrier of the one-hot weight, far above the
/// initial temperature. A raw read is therefore often neither one-hot nor a
/// local minimum, and raising `steps_per_temperature` does not remove the
/// barrier. Feasible, locally optimal selections come from the block-wise
/// refinement that follows (`OptimizationConfig::refinement_passes`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealingConfig {
    pub initial_temperature: f64,
    pub final_temperature: f64,
    pub cooling_rate: f64,
    /// Flip attempts per temperature level.
    pub steps_per_temperature: usize,
    pub num_reads: usize,
    pub seed: Option<u64>,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 100.0,
            final_temperature: 0.01,
            cooling_rate: 0.95,
            steps_per_temperature: 1,
            num_reads: 100,
            seed: None,
        }
    }
}

impl AnnealingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_temperature.is_finite() && self.initial_temperature > 0.0) {
            return Err(ConfigError::invalid(
                "initial_temperature",
                self.initial_temperature,
                "must be positive and finite",
            ));
        }
        if !(self.final_temperature > 0.0 && self.final_temperature < self.initial_temperature) {
            return Err(ConfigError::invalid(
                "final_temperature",
                self.final_temperature,
                "must be positive and below the initial temperature",
            ));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return Err(ConfigError::invalid(
                "cooling_rate",
                self.cooling_rate,
                "must lie strictly between 0 and 1",
            ));
        }
        if self.steps_per_temperature == 0 {
            return Err(ConfigError::invalid("steps_per_temperature", 0, "must be at least 1"));
        }
        if self.num_reads == 0 {
            return Err(ConfigError::invalid("num_reads", 0, "must be at least 1"));
        }
        Ok(())
    }

    /// Number of temperature levels visited by one read.
    pub fn temperature_steps(&self) -> usize {
        let mut steps = 0;
        let mut t = self.initial_temperature;
        while t > self.final_temperature {
            steps += 1;
            t *= self.cooling_rate;
        }
        steps
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    #[default]
    Qubo,
    Ising,
}

/// Connection settings for an external annealing service.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSolverConfig {
    pub endpoint: String,
    /// Falls back to the `QSTRUCT_SOLVER_TOKEN` environment variable when unset.
    pub token: Option<String>,
    pub timeout: Duration,
    pub format: PayloadFormat,
}

impl RemoteSolverConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: None,
            timeout: Duration::from_secs(30),
            format: PayloadFormat::default(),
        }
    }

    /// A blank endpoint is not a configuration error: the solver reports it
    /// when it is built and the request falls back to local annealing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::invalid("solver.timeout", "0s", "must be non-zero"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SolverSelection {
    #[default]
    Local,
    /// Try the remote service first and fall back to local annealing.
    External(RemoteSolverConfig),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationConfig {
    pub penalties: PenaltyConfig,
    pub annealing: AnnealingConfig,
    pub solver: SolverSelection,
    /// Maximum block-wise descent passes after decoding; 0 disables refinement.
    pub refinement_passes: usize,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            penalties: PenaltyConfig::default(),
            annealing: AnnealingConfig::default(),
            solver: SolverSelection::Local,
            refinement_passes: 3,
        }
    }
}

impl OptimizationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.penalties.validate()?;
        self.annealing.validate()?;
        if let SolverSelection::External(remote) = &self.solver {
            remote.validate()?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct OptimizationConfigBuilder {
    penalties: Option<PenaltyConfig>,
    annealing: Option<AnnealingConfig>,
    num_reads: Option<usize>,
    seed: Option<u64>,
    solver: Option<SolverSelection>,
    refinement_passes: Option<usize>,
}

impl OptimizationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn penalties(mut self, penalties: PenaltyConfig) -> Self {
        self.penalties = Some(penalties);
        self
    }
    pub fn annealing(mut self, annealing: AnnealingConfig) -> Self {
        self.annealing = Some(annealing);
        self
    }
    pub fn num_reads(mut self, n: usize) -> Self {
        self.num_reads = Some(n);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn solver(mut self, solver: SolverSelection) -> Self {
        self.solver = Some(solver);
        self
    }
    pub fn refinement_passes(mut self, passes: usize) -> Self {
        self.refinement_passes = Some(passes);
        self
    }

    /// `num_reads` and `solver` are required; everything else defaults.
    pub fn build(self) -> Result<OptimizationConfig, ConfigError> {
        let defaults = OptimizationConfig::default();
        let mut annealing = self.annealing.unwrap_or(defaults.annealing);
        annealing.num_reads = self
            .num_reads
            .ok_or(ConfigError::MissingParameter("num_reads"))?;
        if self.seed.is_some() {
            annealing.seed = self.seed;
        }

        let config = OptimizationConfig {
            penalties: self.penalties.unwrap_or(defaults.penalties),
            annealing,
            solver: self
                .solver
                .ok_or(ConfigError::MissingParameter("solver"))?,
            refinement_passes: self.refinement_passes.unwrap_or(defaults.refinement_passes),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(OptimizationConfig::default().validate().is_ok());
    }

    #[test]
    fn default_schedule_has_about_180_levels() {
        let steps = AnnealingConfig::default().temperature_steps();
        assert!((175..=185).contains(&steps), "got {steps}");
    }

    #[test]
    fn builder_requires_num_reads() {
        let result = OptimizationConfigBuilder::new()
            .solver(SolverSelection::Local)
            .build();
        assert_eq!(result, Err(ConfigError::MissingParameter("num_reads")));
    }

    #[test]
    fn builder_requires_solver() {
        let result = OptimizationConfigBuilder::new().num_reads(10).build();
        assert_eq!(result, Err(ConfigError::MissingParameter("solver")));
    }

    #[test]
    fn builder_applies_reads_seed_and_defaults() {
        let config = OptimizationConfigBuilder::new()
            .num_reads(25)
            .seed(7)
            .solver(SolverSelection::Local)
            .build()
            .unwrap();
        assert_eq!(config.annealing.num_reads, 25);
        assert_eq!(config.annealing.seed, Some(7));
        assert_eq!(config.penalties, PenaltyConfig::default());
        assert_eq!(config.refinement_passes, 3);
    }

    #[test]
    fn zero_reads_is_rejected() {
        let result = OptimizationConfigBuilder::new()
            .num_reads(0)
            .solver(SolverSelection::Local)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                parameter: "num_reads",
                ..
            })
        ));
    }

    #[test]
    fn structural_weight_above_one_hot_is_rejected() {
        let penalties = PenaltyConfig {
            stress: 6000.0,
            ..PenaltyConfig::default()
        };
        assert!(matches!(
            penalties.validate(),
            Err(ConfigError::PenaltyOrdering(_))
        ));
    }

    #[test]
    fn structural_weight_below_objective_scale_is_rejected() {
        let penalties = PenaltyConfig {
            objective_scale: 900.0,
            ..PenaltyConfig::default()
        };
        assert!(matches!(
            penalties.validate(),
            Err(ConfigError::PenaltyOrdering(_))
        ));
    }

    #[test]
    fn cap_at_one_hot_weight_is_rejected() {
        let penalties = PenaltyConfig {
            penalty_cap: 5000.0,
            ..PenaltyConfig::default()
        };
        assert!(matches!(
            penalties.validate(),
            Err(ConfigError::PenaltyOrdering(_))
        ));
    }

    #[test]
    fn violation_penalty_is_zero_below_threshold_and_capped_above() {
        let p = PenaltyConfig::default();
        assert_eq!(p.violation_penalty(1000.0, 0.9, 0.95), 0.0);
        assert!((p.violation_penalty(1000.0, 1.05, 0.95) - 10.0).abs() < 1e-9);
        assert_eq!(p.violation_penalty(1000.0, 50.0, 0.95), p.penalty_cap);
        assert_eq!(p.violation_penalty(1000.0, f64::INFINITY, 0.95), p.penalty_cap);
        assert_eq!(p.violation_penalty(1000.0, f64::NAN, 0.95), p.penalty_cap);
    }

    #[test]
    fn external_solver_without_endpoint_still_builds() {
        let config = OptimizationConfigBuilder::new()
            .num_reads(10)
            .solver(SolverSelection::External(RemoteSolverConfig::new("  ")))
            .build()
            .unwrap();
        assert!(matches!(config.solver, SolverSelection::External(_)));
    }

    #[test]
    fn external_solver_with_zero_timeout_is_rejected() {
        let remote = RemoteSolverConfig {
            timeout: Duration::ZERO,
            ..RemoteSolverConfig::new("http://localhost/solve")
        };
        let result = OptimizationConfigBuilder::new()
            .num_reads(10)
            .solver(SolverSelection::External(remote))
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue {
                parameter: "solver.timeout",
                ..
            })
        ));
    }
}
