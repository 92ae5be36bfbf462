use qstruct::engine::config::PayloadFormat;

pub struct DefaultsConfig {
    pub num_reads: usize,
    pub refinement_passes: usize,
    pub concrete_price_per_m3: f64,
    pub solver_timeout_secs: u64,
    pub solver_format: PayloadFormat,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            num_reads: 100,
            refinement_passes: 3,
            concrete_price_per_m3: 5000.0,
            solver_timeout_secs: 30,
            solver_format: PayloadFormat::Qubo,
        }
    }
}
