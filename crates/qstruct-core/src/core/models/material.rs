use super::{ValidationError, require_positive};
use serde::{Deserialize, Serialize};

pub const STEEL_DENSITY_KG_M3: f64 = 7850.0;

/// Concrete and reinforcing steel properties, fixed for one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialProperties {
    /// Concrete compressive strength f'c (MPa)
    pub fc_mpa: f64,
    /// Steel yield strength fy (MPa)
    pub fy_mpa: f64,
    /// Steel elastic modulus Es (MPa)
    pub steel_modulus_mpa: f64,
    /// Unit weight of reinforced concrete (kN/m³)
    pub concrete_density_kn_m3: f64,
}

impl Default for MaterialProperties {
    fn default() -> Self {
        Self {
            fc_mpa: 28.0,
            fy_mpa: 415.0,
            steel_modulus_mpa: 200_000.0,
            concrete_density_kn_m3: 24.0,
        }
    }
}

impl MaterialProperties {
    pub fn new(fc_mpa: f64, fy_mpa: f64) -> Self {
        Self {
            fc_mpa,
            fy_mpa,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("fc_mpa", self.fc_mpa)?;
        require_positive("fy_mpa", self.fy_mpa)?;
        require_positive("steel_modulus_mpa", self.steel_modulus_mpa)?;
        require_positive("concrete_density_kn_m3", self.concrete_density_kn_m3)
    }
}
