use qstruct::core::models::design::StructureInput;
use qstruct::engine::config::OptimizationConfig;
use std::path::PathBuf;

/// Fully merged settings for one optimizing command.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub structure: StructureInput,
    pub optimization: OptimizationConfig,
    pub catalog_file: Option<PathBuf>,
    pub concrete_price_per_m3: f64,
}
