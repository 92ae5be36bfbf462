use crate::cli::MaterialsArgs;
use crate::config::PartialAppConfig;
use crate::error::Result;
use crate::utils::output;
use crate::utils::progress::RunProgress;
use qstruct::engine::progress::ProgressReporter;
use qstruct::workflows::materials::{self, MaterialRequest};
use tracing::{info, warn};

pub fn run(args: MaterialsArgs) -> Result<()> {
    let partial_config = PartialAppConfig::load(args.config.as_deref())?;
    let config = partial_config.merge_with_cli(
        &args.structure,
        &args.solver,
        &args.set_values,
        args.catalog_file.as_deref(),
    )?;
    let provider = super::catalog_provider(config.catalog_file.as_deref())?;
    let request = MaterialRequest::new(config.structure, args.column, args.beam, args.slab);

    let progress = RunProgress::new();
    let reporter = ProgressReporter::with_callback(progress.callback());

    println!("Starting material optimization...");
    info!("Invoking the materials workflow...");
    let report = materials::run(&request, provider.as_ref(), &config.optimization, &reporter)?;

    println!("{}", output::material_summary(&report));
    if !report.all_checks_pass {
        warn!("The selected materials do not satisfy every check.");
        println!("Warning: the selected materials do not satisfy every check.");
    }

    if let Some(path) = &args.output {
        output::write_json(path, &report)?;
        println!("✓ Result written to: {}", path.display());
    }
    Ok(())
}
