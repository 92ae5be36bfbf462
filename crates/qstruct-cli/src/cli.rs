use clap::{Args, Parser, Subcommand};
use qstruct::core::models::member::MemberSize;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "qstruct - member sizing and material selection for small reinforced-concrete frames, encoded as binary quadratic problems and solved by simulated annealing.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel annealing reads.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Choose column, beam, slab and footing sizes with minimal concrete volume.
    Optimize(OptimizeArgs),
    /// Evaluate one given design against the structural checks.
    Analyze(AnalyzeArgs),
    /// Choose concrete grade and steel ratios for fixed member sizes.
    Materials(MaterialsArgs),
    /// Choose a hollow masonry block geometry with minimal concrete per m² of wall.
    Blocks(BlocksArgs),
    /// Print the active size and material catalogs.
    Catalog(CatalogArgs),
}

/// Building description shared by every command. Unset values fall back to
/// the config file, then to the built-in reference structure.
#[derive(Args, Debug, Clone, Default)]
pub struct StructureArgs {
    /// Plan width (m).
    #[arg(long, value_name = "M")]
    pub width: Option<f64>,
    /// Plan length (m).
    #[arg(long, value_name = "M")]
    pub length: Option<f64>,
    /// Storey height (m).
    #[arg(long, value_name = "M")]
    pub height: Option<f64>,
    /// Concrete compressive strength (MPa).
    #[arg(long, value_name = "MPA")]
    pub fc: Option<f64>,
    /// Steel yield strength (MPa).
    #[arg(long, value_name = "MPA")]
    pub fy: Option<f64>,
    /// Superimposed dead load (kPa).
    #[arg(long, value_name = "KPA")]
    pub dead_load: Option<f64>,
    /// Live load (kPa).
    #[arg(long, value_name = "KPA")]
    pub live_load: Option<f64>,
    /// Allowable soil bearing pressure (kPa).
    #[arg(long, value_name = "KPA")]
    pub soil_bearing: Option<f64>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SolverArgs {
    /// Override the number of independent annealing reads.
    #[arg(short = 'n', long, value_name = "INT")]
    pub num_reads: Option<usize>,

    /// Seed for reproducible runs.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Try the external annealing service first (requires `solver.endpoint`).
    #[arg(long)]
    pub external: bool,

    /// Disable the final block-wise refinement stage.
    #[arg(long)]
    pub no_refinement: bool,
}

/// Arguments for the `optimize` subcommand.
#[derive(Args, Debug)]
pub struct OptimizeArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub structure: StructureArgs,

    #[command(flatten)]
    pub solver: SolverArgs,

    /// Load size catalogs from a TOML file instead of the reference catalogs.
    #[arg(long, value_name = "PATH")]
    pub catalog_file: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S optimization.num-reads=200
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,

    /// Write the full result as JSON.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Column size as WIDTHxDEPTH in mm (e.g., 300x300).
    #[arg(long, required = true, value_name = "WxD")]
    pub column: MemberSize,

    /// Beam size as WIDTHxDEPTH in mm (e.g., 300x450).
    #[arg(long, required = true, value_name = "WxD")]
    pub beam: MemberSize,

    /// Slab thickness (mm).
    #[arg(long, required = true, value_name = "MM")]
    pub slab: f64,

    /// Footing plan size as WIDTHxLENGTH in mm (e.g., 1200x1200).
    #[arg(long, required = true, value_name = "WxD")]
    pub footing: MemberSize,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub structure: StructureArgs,

    /// Print the evaluation as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `materials` subcommand.
#[derive(Args, Debug)]
pub struct MaterialsArgs {
    /// Column size as WIDTHxDEPTH in mm.
    #[arg(long, required = true, value_name = "WxD")]
    pub column: MemberSize,

    /// Beam size as WIDTHxDEPTH in mm.
    #[arg(long, required = true, value_name = "WxD")]
    pub beam: MemberSize,

    /// Slab thickness (mm).
    #[arg(long, required = true, value_name = "MM")]
    pub slab: f64,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub structure: StructureArgs,

    #[command(flatten)]
    pub solver: SolverArgs,

    /// Load material catalogs from a TOML file instead of the reference catalogs.
    #[arg(long, value_name = "PATH")]
    pub catalog_file: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,

    /// Write the full result as JSON.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `blocks` subcommand.
#[derive(Args, Debug)]
pub struct BlocksArgs {
    /// Line load the wall must carry (kN/m).
    #[arg(long, value_name = "KN_M")]
    pub required_strength: Option<f64>,

    /// Heaviest block that may be laid by hand (kg).
    #[arg(long, value_name = "KG")]
    pub max_weight: Option<f64>,

    /// Minimum net over gross bed area, between 0 and 1.
    #[arg(long, value_name = "RATIO")]
    pub min_solid: Option<f64>,

    /// Block concrete strength (MPa).
    #[arg(long, value_name = "MPA")]
    pub fc: Option<f64>,

    /// Wall length for the quantity estimate (m).
    #[arg(long, value_name = "M")]
    pub wall_length: Option<f64>,

    /// Wall height for the quantity estimate (m).
    #[arg(long, value_name = "M")]
    pub wall_height: Option<f64>,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub solver: SolverArgs,

    /// Set a specific configuration value, overriding the config file.
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,

    /// Write the full result as JSON.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `catalog` subcommand.
#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Show catalogs from a TOML file instead of the reference catalogs.
    #[arg(long, value_name = "PATH")]
    pub catalog_file: Option<PathBuf>,

    /// Print the catalogs as JSON.
    #[arg(long)]
    pub json: bool,
}
