pub mod defaults;
pub mod models;

use crate::cli::{SolverArgs, StructureArgs};
use crate::error::{CliError, Result};
use defaults::DefaultsConfig;
use models::RunConfig;
use qstruct::core::analysis::Thresholds;
use qstruct::core::models::design::StructureInput;
use qstruct::engine::config::{
    self as core_config, OptimizationConfigBuilder, PayloadFormat, RemoteSolverConfig,
    SolverSelection,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialStructureConfig {
    width: Option<f64>,
    length: Option<f64>,
    height: Option<f64>,
    fc: Option<f64>,
    fy: Option<f64>,
    dead_load: Option<f64>,
    live_load: Option<f64>,
    soil_bearing: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialAnnealingConfig {
    initial_temperature: Option<f64>,
    final_temperature: Option<f64>,
    cooling_rate: Option<f64>,
    steps_per_temperature: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialPenaltyConfig {
    one_hot: Option<f64>,
    stress: Option<f64>,
    deflection: Option<f64>,
    bearing: Option<f64>,
    ductility: Option<f64>,
    objective_scale: Option<f64>,
    penalty_cap: Option<f64>,
    stress_threshold: Option<f64>,
    bearing_threshold: Option<f64>,
    deflection_threshold: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialOptimizationConfig {
    num_reads: Option<usize>,
    seed: Option<u64>,
    refinement_passes: Option<usize>,
    concrete_price: Option<f64>,
    catalog_file: Option<PathBuf>,
    annealing: Option<PartialAnnealingConfig>,
    penalties: Option<PartialPenaltyConfig>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSolverConfig {
    external: Option<bool>,
    endpoint: Option<String>,
    token: Option<String>,
    token_file: Option<PathBuf>,
    timeout_secs: Option<u64>,
    format: Option<PayloadFormat>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct PartialAppConfig {
    structure: Option<PartialStructureConfig>,
    optimization: Option<PartialOptimizationConfig>,
    solver: Option<PartialSolverConfig>,
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid value for {}: '{}' ({})",
            key,
            value,
            std::any::type_name::<T>()
        ))
    })
}

impl PartialAppConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Reads `path` when given, otherwise starts from an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    /// CLI flags win over the file; the reference structure fills the rest.
    pub fn merge_structure(&self, args: &StructureArgs) -> StructureInput {
        let file = self.structure.clone().unwrap_or_default();
        let mut structure = StructureInput::default();
        let pick = |cli: Option<f64>, file: Option<f64>, default: f64| cli.or(file).unwrap_or(default);

        structure.geometry.width_m = pick(args.width, file.width, structure.geometry.width_m);
        structure.geometry.length_m = pick(args.length, file.length, structure.geometry.length_m);
        structure.geometry.height_m = pick(args.height, file.height, structure.geometry.height_m);
        structure.material.fc_mpa = pick(args.fc, file.fc, structure.material.fc_mpa);
        structure.material.fy_mpa = pick(args.fy, file.fy, structure.material.fy_mpa);
        structure.load.dead_kpa = pick(args.dead_load, file.dead_load, structure.load.dead_kpa);
        structure.load.live_kpa = pick(args.live_load, file.live_load, structure.load.live_kpa);
        structure.soil_bearing_kpa =
            pick(args.soil_bearing, file.soil_bearing, structure.soil_bearing_kpa);
        structure
    }

    /// Check thresholds from the file's penalty section, for commands that
    /// evaluate without optimizing.
    pub fn merge_thresholds(&self) -> Thresholds {
        let partial = self
            .optimization
            .as_ref()
            .and_then(|o| o.penalties.clone());
        Self::merge_penalties(partial).thresholds
    }

    pub fn merge_with_cli(
        mut self,
        structure_args: &StructureArgs,
        solver_args: &SolverArgs,
        set_values: &[String],
        catalog_file: Option<&Path>,
    ) -> Result<RunConfig> {
        self.apply_set_values(set_values)?;
        let defaults = DefaultsConfig::default();
        let structure = self.merge_structure(structure_args);

        let opt = self.optimization.take().unwrap_or_default();
        let solver_file = self.solver.take().unwrap_or_default();

        let mut builder = OptimizationConfigBuilder::new()
            .num_reads(
                solver_args
                    .num_reads
                    .or(opt.num_reads)
                    .unwrap_or(defaults.num_reads),
            )
            .penalties(Self::merge_penalties(opt.penalties))
            .annealing(Self::merge_annealing(opt.annealing))
            .refinement_passes(if solver_args.no_refinement {
                0
            } else {
                opt.refinement_passes.unwrap_or(defaults.refinement_passes)
            })
            .solver(Self::merge_solver(solver_args.external, solver_file, &defaults));
        if let Some(seed) = solver_args.seed.or(opt.seed) {
            builder = builder.seed(seed);
        }
        let optimization = builder.build().map_err(|e| CliError::Config(e.to_string()))?;

        Ok(RunConfig {
            structure,
            optimization,
            catalog_file: catalog_file.map(Path::to_path_buf).or(opt.catalog_file),
            concrete_price_per_m3: opt
                .concrete_price
                .unwrap_or(defaults.concrete_price_per_m3),
        })
    }

    fn merge_penalties(partial: Option<PartialPenaltyConfig>) -> core_config::PenaltyConfig {
        let p = partial.unwrap_or_default();
        let mut penalties = core_config::PenaltyConfig::default();
        penalties.one_hot = p.one_hot.unwrap_or(penalties.one_hot);
        penalties.stress = p.stress.unwrap_or(penalties.stress);
        penalties.deflection = p.deflection.unwrap_or(penalties.deflection);
        penalties.bearing = p.bearing.unwrap_or(penalties.bearing);
        penalties.ductility = p.ductility.unwrap_or(penalties.ductility);
        penalties.objective_scale = p.objective_scale.unwrap_or(penalties.objective_scale);
        penalties.penalty_cap = p.penalty_cap.unwrap_or(penalties.penalty_cap);
        let t = &mut penalties.thresholds;
        t.stress = p.stress_threshold.unwrap_or(t.stress);
        t.bearing = p.bearing_threshold.unwrap_or(t.bearing);
        t.deflection = p.deflection_threshold.unwrap_or(t.deflection);
        penalties
    }

    fn merge_annealing(partial: Option<PartialAnnealingConfig>) -> core_config::AnnealingConfig {
        let p = partial.unwrap_or_default();
        let mut annealing = core_config::AnnealingConfig::default();
        annealing.initial_temperature = p.initial_temperature.unwrap_or(annealing.initial_temperature);
        annealing.final_temperature = p.final_temperature.unwrap_or(annealing.final_temperature);
        annealing.cooling_rate = p.cooling_rate.unwrap_or(annealing.cooling_rate);
        annealing.steps_per_temperature = p
            .steps_per_temperature
            .unwrap_or(annealing.steps_per_temperature);
        annealing
    }

    fn merge_solver(
        cli_external: bool,
        partial: PartialSolverConfig,
        defaults: &DefaultsConfig,
    ) -> SolverSelection {
        if !(cli_external || partial.external.unwrap_or(false)) {
            return SolverSelection::Local;
        }
        let endpoint = partial.endpoint.unwrap_or_else(|| {
            warn!("External solver requested without `solver.endpoint`; local annealing will be used.");
            String::new()
        });
        let token = match partial.token_file {
            Some(path) => read_token_file(&path),
            None => partial.token,
        };

        let mut remote = RemoteSolverConfig::new(endpoint);
        remote.token = token;
        remote.timeout =
            Duration::from_secs(partial.timeout_secs.unwrap_or(defaults.solver_timeout_secs));
        remote.format = partial.format.unwrap_or(defaults.solver_format);
        SolverSelection::External(remote)
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                ))
            })?;
            let key = key.trim();

            if let Some(field) = key.strip_prefix("structure.") {
                let s = self.structure.get_or_insert_with(Default::default);
                let slot = match field {
                    "width" => &mut s.width,
                    "length" => &mut s.length,
                    "height" => &mut s.height,
                    "fc" => &mut s.fc,
                    "fy" => &mut s.fy,
                    "dead-load" => &mut s.dead_load,
                    "live-load" => &mut s.live_load,
                    "soil-bearing" => &mut s.soil_bearing,
                    _ => return Err(unsupported_key(key)),
                };
                *slot = Some(parse_value(key, value)?);
                continue;
            }

            if let Some(field) = key.strip_prefix("optimization.annealing.") {
                let a = self
                    .optimization
                    .get_or_insert_with(Default::default)
                    .annealing
                    .get_or_insert_with(Default::default);
                match field {
                    "initial-temperature" => a.initial_temperature = Some(parse_value(key, value)?),
                    "final-temperature" => a.final_temperature = Some(parse_value(key, value)?),
                    "cooling-rate" => a.cooling_rate = Some(parse_value(key, value)?),
                    "steps-per-temperature" => {
                        a.steps_per_temperature = Some(parse_value(key, value)?)
                    }
                    _ => return Err(unsupported_key(key)),
                }
                continue;
            }

            if let Some(field) = key.strip_prefix("optimization.penalties.") {
                let p = self
                    .optimization
                    .get_or_insert_with(Default::default)
                    .penalties
                    .get_or_insert_with(Default::default);
                let slot = match field {
                    "one-hot" => &mut p.one_hot,
                    "stress" => &mut p.stress,
                    "deflection" => &mut p.deflection,
                    "bearing" => &mut p.bearing,
                    "ductility" => &mut p.ductility,
                    "objective-scale" => &mut p.objective_scale,
                    "penalty-cap" => &mut p.penalty_cap,
                    "stress-threshold" => &mut p.stress_threshold,
                    "bearing-threshold" => &mut p.bearing_threshold,
                    "deflection-threshold" => &mut p.deflection_threshold,
                    _ => return Err(unsupported_key(key)),
                };
                *slot = Some(parse_value(key, value)?);
                continue;
            }

            match key {
                "optimization.num-reads" => {
                    self.optimization
                        .get_or_insert_with(Default::default)
                        .num_reads = Some(parse_value(key, value)?);
                }
                "optimization.seed" => {
                    self.optimization.get_or_insert_with(Default::default).seed =
                        Some(parse_value(key, value)?);
                }
                "optimization.refinement-passes" => {
                    self.optimization
                        .get_or_insert_with(Default::default)
                        .refinement_passes = Some(parse_value(key, value)?);
                }
                "optimization.concrete-price" => {
                    self.optimization
                        .get_or_insert_with(Default::default)
                        .concrete_price = Some(parse_value(key, value)?);
                }
                "solver.external" => {
                    self.solver.get_or_insert_with(Default::default).external =
                        Some(parse_value(key, value)?);
                }
                "solver.endpoint" => {
                    self.solver.get_or_insert_with(Default::default).endpoint =
                        Some(value.trim().to_string());
                }
                "solver.timeout-secs" => {
                    self.solver.get_or_insert_with(Default::default).timeout_secs =
                        Some(parse_value(key, value)?);
                }
                "solver.format" => {
                    let format = match value.trim() {
                        "qubo" => PayloadFormat::Qubo,
                        "ising" => PayloadFormat::Ising,
                        other => {
                            return Err(CliError::Config(format!(
                                "Invalid value for {}: '{}' (expected 'qubo' or 'ising')",
                                key, other
                            )));
                        }
                    };
                    self.solver.get_or_insert_with(Default::default).format = Some(format);
                }
                _ => return Err(unsupported_key(key)),
            }
        }
        Ok(())
    }
}

fn unsupported_key(key: &str) -> CliError {
    CliError::Config(format!("Unsupported configuration key for --set: '{}'", key))
}

/// An unreadable or blank token file leaves the token unset, so the solver
/// falls back to `QSTRUCT_SOLVER_TOKEN` or to local annealing.
fn read_token_file(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let token = contents.trim();
            if token.is_empty() {
                warn!("Solver token file {:?} is empty.", path);
                None
            } else {
                Some(token.to_string())
            }
        }
        Err(err) => {
            warn!("Could not read solver token file {:?}: {}", path, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn write_config_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let file_path = dir.path().join(name);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn merge(config_path: Option<&Path>, extra_args: &[&str]) -> Result<RunConfig> {
        let mut args = vec!["qstruct", "optimize"];
        args.extend_from_slice(extra_args);
        let Commands::Optimize(opt) = Cli::parse_from(args).command else {
            panic!("Expected 'optimize' subcommand");
        };
        PartialAppConfig::load(config_path)?.merge_with_cli(
            &opt.structure,
            &opt.solver,
            &opt.set_values,
            opt.catalog_file.as_deref(),
        )
    }

    #[test]
    fn no_file_and_no_flags_gives_reference_defaults() {
        let config = merge(None, &[]).unwrap();
        assert_eq!(config.structure, StructureInput::default());
        assert_eq!(config.optimization.annealing.num_reads, 100);
        assert_eq!(config.optimization.annealing.seed, None);
        assert_eq!(config.optimization.refinement_passes, 3);
        assert_eq!(config.optimization.solver, SolverSelection::Local);
        assert_eq!(config.concrete_price_per_m3, 5000.0);
        assert!(config.catalog_file.is_none());
    }

    #[test]
    fn file_values_fill_in_structure_and_solver_settings() {
        let dir = tempdir().unwrap();
        let path = write_config_file(
            &dir,
            "config.toml",
            r#"
            [structure]
            width = 6.0
            soil-bearing = 150.0

            [optimization]
            num-reads = 40
            seed = 99
            concrete-price = 4500.0

            [optimization.annealing]
            cooling-rate = 0.9

            [optimization.penalties]
            stress = 1200.0
            stress-threshold = 0.9
            "#,
        );
        let config = merge(Some(&path), &[]).unwrap();
        assert_eq!(config.structure.geometry.width_m, 6.0);
        assert_eq!(config.structure.geometry.length_m, 5.0);
        assert_eq!(config.structure.soil_bearing_kpa, 150.0);
        assert_eq!(config.optimization.annealing.num_reads, 40);
        assert_eq!(config.optimization.annealing.seed, Some(99));
        assert_eq!(config.optimization.annealing.cooling_rate, 0.9);
        assert_eq!(config.optimization.penalties.stress, 1200.0);
        assert_eq!(config.optimization.penalties.thresholds.stress, 0.9);
        assert_eq!(config.concrete_price_per_m3, 4500.0);
    }

    #[test]
    fn cli_flags_override_set_values_which_override_the_file() {
        let dir = tempdir().unwrap();
        let path = write_config_file(
            &dir,
            "config.toml",
            r#"
            [structure]
            width = 6.0
            fc = 25.0

            [optimization]
            num-reads = 40
            "#,
        );
        let config = merge(
            Some(&path),
            &[
                "--width", "8", "-S", "structure.width=7", "-S", "structure.fc=30", "-S",
                "optimization.num-reads=60", "--no-refinement",
            ],
        )
        .unwrap();
        assert_eq!(config.structure.geometry.width_m, 8.0);
        assert_eq!(config.structure.material.fc_mpa, 30.0);
        assert_eq!(config.optimization.annealing.num_reads, 60);
        assert_eq!(config.optimization.refinement_passes, 0);
    }

    #[test]
    fn thresholds_come_from_the_penalty_section() {
        let dir = tempdir().unwrap();
        let path = write_config_file(
            &dir,
            "config.toml",
            "[optimization.penalties]\ndeflection-threshold = 0.8\n",
        );
        let thresholds = PartialAppConfig::from_file(&path).unwrap().merge_thresholds();
        assert_eq!(thresholds.deflection, 0.8);
        assert_eq!(thresholds.stress, Thresholds::default().stress);
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = write_config_file(&dir, "bad.toml", "[structure]\nspan = 4.0\n");
        assert!(matches!(
            PartialAppConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn malformed_set_values_are_rejected() {
        assert!(matches!(
            merge(None, &["-S", "optimization.num-reads"]),
            Err(CliError::Config(_))
        ));
        assert!(matches!(
            merge(None, &["-S", "optimization.num-reads=many"]),
            Err(CliError::Config(_))
        ));
        assert!(matches!(
            merge(None, &["-S", "optimization.colour=blue"]),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn zero_reads_fail_validation() {
        let result = merge(None, &["-n", "0"]);
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("num_reads")));
    }

    #[test]
    fn external_solver_without_endpoint_is_left_to_fall_back() {
        let config = merge(None, &["--external"]).unwrap();
        let SolverSelection::External(remote) = config.optimization.solver else {
            panic!("Expected the external solver");
        };
        assert!(remote.endpoint.is_empty());
        assert_eq!(remote.token, None);
    }

    #[test]
    fn blank_or_missing_token_file_leaves_token_unset() {
        let dir = tempdir().unwrap();
        let blank = write_config_file(&dir, "token", "  \n");
        let missing = dir.path().join("absent-token");
        for token_path in [blank, missing] {
            let path = write_config_file(
                &dir,
                "config.toml",
                &format!(
                    r#"
                    [solver]
                    external = true
                    endpoint = "http://localhost:9000/solve"
                    token-file = "{}"
                    "#,
                    token_path.to_str().unwrap()
                ),
            );
            let config = merge(Some(&path), &[]).unwrap();
            let SolverSelection::External(remote) = config.optimization.solver else {
                panic!("Expected the external solver");
            };
            assert_eq!(remote.token, None);
        }
    }

    #[test]
    fn external_solver_reads_token_from_file() {
        let dir = tempdir().unwrap();
        let token_path = write_config_file(&dir, "token", "  secret-token\n");
        let path = write_config_file(
            &dir,
            "config.toml",
            &format!(
                r#"
                [solver]
                external = true
                endpoint = "http://localhost:9000/solve"
                token-file = "{}"
                timeout-secs = 5
                format = "ising"
                "#,
                token_path.to_str().unwrap()
            ),
        );
        let config = merge(Some(&path), &[]).unwrap();
        let SolverSelection::External(remote) = config.optimization.solver else {
            panic!("Expected the external solver");
        };
        assert_eq!(remote.endpoint, "http://localhost:9000/solve");
        assert_eq!(remote.token.as_deref(), Some("secret-token"));
        assert_eq!(remote.timeout, Duration::from_secs(5));
        assert_eq!(remote.format, PayloadFormat::Ising);
    }

    #[test]
    fn catalog_file_flag_wins_over_file_setting() {
        let dir = tempdir().unwrap();
        let path = write_config_file(
            &dir,
            "config.toml",
            "[optimization]\ncatalog-file = \"from-file.toml\"\n",
        );
        let from_file = merge(Some(&path), &[]).unwrap();
        assert_eq!(from_file.catalog_file, Some(PathBuf::from("from-file.toml")));

        let from_flag = merge(Some(&path), &["--catalog-file", "flag.toml"]).unwrap();
        assert_eq!(from_flag.catalog_file, Some(PathBuf::from("flag.toml")));
    }
}
