use crate::cli::AnalyzeArgs;
use crate::config::PartialAppConfig;
use crate::error::Result;
use crate::utils::output;
use qstruct::core::analysis::Reinforcement;
use qstruct::core::models::design::FrameDesign;
use qstruct::workflows::analyze;
use tracing::info;

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let partial_config = PartialAppConfig::load(args.config.as_deref())?;
    let structure = partial_config.merge_structure(&args.structure);
    let thresholds = partial_config.merge_thresholds();
    let design = FrameDesign {
        column: args.column,
        beam: args.beam,
        slab_thickness_mm: args.slab,
        footing: args.footing,
    };

    info!("Evaluating design {:?}", design);
    let evaluation = analyze::run(&structure, &design, Reinforcement::default(), &thresholds)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
    } else {
        println!("{}", output::evaluation_table(&evaluation));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::error::CliError;
    use clap::Parser;

    fn parse(args: &[&str]) -> AnalyzeArgs {
        let mut full = vec!["qstruct", "analyze"];
        full.extend_from_slice(args);
        match Cli::parse_from(full).command {
            Commands::Analyze(args) => args,
            _ => panic!("Expected 'analyze' subcommand"),
        }
    }

    #[test]
    fn evaluates_a_design_outside_the_catalogs() {
        let args = parse(&[
            "--column", "320x320", "--beam", "280x460", "--slab", "135", "--footing",
            "1250x1250", "--json",
        ]);
        assert!(run(args).is_ok());
    }

    #[test]
    fn zero_slab_is_rejected() {
        let args = parse(&[
            "--column", "300x300", "--beam", "300x450", "--slab", "0", "--footing", "1200x1200",
        ]);
        assert!(matches!(run(args), Err(CliError::Engine(_))));
    }
}
