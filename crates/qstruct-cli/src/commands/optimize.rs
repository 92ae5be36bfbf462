use crate::cli::OptimizeArgs;
use crate::config::PartialAppConfig;
use crate::error::Result;
use crate::utils::output;
use crate::utils::progress::RunProgress;
use qstruct::engine::progress::ProgressReporter;
use qstruct::workflows::sizing::{self, SizingRequest};
use tracing::{info, warn};

pub fn run(args: OptimizeArgs) -> Result<()> {
    let partial_config = PartialAppConfig::load(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(
        &args.structure,
        &args.solver,
        &args.set_values,
        args.catalog_file.as_deref(),
    )?;
    let provider = super::catalog_provider(config.catalog_file.as_deref())?;

    let request = SizingRequest {
        structure: config.structure,
        baseline: None,
        concrete_price_per_m3: config.concrete_price_per_m3,
    };

    let progress = RunProgress::new();
    let reporter = ProgressReporter::with_callback(progress.callback());

    println!("Starting member sizing...");
    info!("Invoking the sizing workflow...");
    let report = sizing::run(&request, provider.as_ref(), &config.optimization, &reporter)?;

    println!("{}", output::sizing_summary(&report));
    if !report.evaluation.checks.all_satisfied {
        warn!("The selected design does not satisfy every check.");
        println!("Warning: the selected design does not satisfy every check.");
    }

    if let Some(path) = &args.output {
        output::write_json(path, &report)?;
        println!("✓ Result written to: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::error::CliError;
    use clap::Parser;

    fn parse(args: &[&str]) -> OptimizeArgs {
        let mut full = vec!["qstruct", "optimize"];
        full.extend_from_slice(args);
        match Cli::parse_from(full).command {
            Commands::Optimize(args) => args,
            _ => panic!("Expected 'optimize' subcommand"),
        }
    }

    #[test]
    fn writes_a_feasible_result_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("result.json");
        let out_str = out.to_str().unwrap().to_string();
        run(parse(&["-n", "20", "--seed", "3", "-o", &out_str])).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(json["evaluation"]["checks"]["all_satisfied"], true);
        assert_eq!(json["solver"]["seed"], 3);
        assert!(json["comparison"]["savings_m3"].as_f64().unwrap() >= 0.0);
    }

    #[test]
    fn missing_catalog_file_is_reported() {
        let result = run(parse(&["-n", "5", "--catalog-file", "/nonexistent/catalogs.toml"]));
        assert!(matches!(result, Err(CliError::Catalog(_))));
    }

    #[test]
    fn invalid_structure_is_reported_as_engine_error() {
        let result = run(parse(&["-n", "5", "--width=0"]));
        assert!(matches!(result, Err(CliError::Engine(_))));
    }
}
