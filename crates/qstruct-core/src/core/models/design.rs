use super::ValidationError;
use super::geometry::Geometry;
use super::load::LoadCase;
use super::material::MaterialProperties;
use super::member::MemberSize;
use super::require_positive;
use serde::{Deserialize, Serialize};

/// One complete sizing decision for the frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameDesign {
    pub column: MemberSize,
    pub beam: MemberSize,
    pub slab_thickness_mm: f64,
    pub footing: MemberSize,
}

impl FrameDesign {
    /// Mid-range sizes used as the "unoptimized" comparison point.
    pub fn reference_baseline() -> Self {
        Self {
            column: MemberSize::square(300.0),
            beam: MemberSize::new(300.0, 450.0),
            slab_thickness_mm: 150.0,
            footing: MemberSize::square(1200.0),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.column.validate("column")?;
        self.beam.validate("beam")?;
        require_positive("slab_thickness_mm", self.slab_thickness_mm)?;
        self.footing.validate("footing")
    }
}

/// Everything about the building that is fixed for one optimization request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StructureInput {
    #[serde(default)]
    pub geometry: Geometry,
    #[serde(default)]
    pub material: MaterialProperties,
    #[serde(default)]
    pub load: LoadCase,
    /// Allowable soil bearing pressure (kPa)
    #[serde(default = "default_soil_bearing")]
    pub soil_bearing_kpa: f64,
}

fn default_soil_bearing() -> f64 {
    100.0
}

impl Default for StructureInput {
    fn default() -> Self {
        Self {
            geometry: Geometry::default(),
            material: MaterialProperties::default(),
            load: LoadCase::default(),
            soil_bearing_kpa: default_soil_bearing(),
        }
    }
}

impl StructureInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.geometry.validate()?;
        self.material.validate()?;
        self.load.validate()?;
        require_positive("soil_bearing_kpa", self.soil_bearing_kpa)
    }
}
