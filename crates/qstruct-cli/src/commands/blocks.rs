use crate::cli::{BlocksArgs, StructureArgs};
use crate::config::PartialAppConfig;
use crate::error::Result;
use crate::utils::output;
use crate::utils::progress::RunProgress;
use qstruct::core::models::block::BlockCatalogs;
use qstruct::engine::progress::ProgressReporter;
use qstruct::workflows::blocks::{self, BlockRequest};
use tracing::{info, warn};

fn request_from(args: &BlocksArgs) -> BlockRequest {
    let defaults = BlockRequest::default();
    BlockRequest {
        required_strength_kn_m: args
            .required_strength
            .unwrap_or(defaults.required_strength_kn_m),
        max_block_weight_kg: args.max_weight.unwrap_or(defaults.max_block_weight_kg),
        min_solid_ratio: args.min_solid.unwrap_or(defaults.min_solid_ratio),
        fc_mpa: args.fc.unwrap_or(defaults.fc_mpa),
        wall_length_m: args.wall_length.unwrap_or(defaults.wall_length_m),
        wall_height_m: args.wall_height.unwrap_or(defaults.wall_height_m),
        weights: defaults.weights,
    }
}

pub fn run(args: BlocksArgs) -> Result<()> {
    let partial_config = PartialAppConfig::load(args.config.as_deref())?;
    let config = partial_config.merge_with_cli(
        &StructureArgs::default(),
        &args.solver,
        &args.set_values,
        None,
    )?;
    let request = request_from(&args);
    let catalogs = BlockCatalogs::reference();

    let progress = RunProgress::new();
    let reporter = ProgressReporter::with_callback(progress.callback());

    println!("Starting block geometry optimization...");
    info!("Invoking the blocks workflow...");
    let report = blocks::run(&request, &catalogs, &config.optimization, &reporter)?;

    println!("{}", output::block_summary(&report));
    if !report.all_checks_pass {
        warn!("The selected block does not satisfy every check.");
        println!("Warning: the selected block does not satisfy every check.");
    }

    if let Some(path) = &args.output {
        output::write_json(path, &report)?;
        println!("✓ Result written to: {}", path.display());
    }
    Ok(())
}
