use super::capacity::{
    FOOTING_THICKNESS_MM, beam_moment_capacity, column_axial_capacity, deflection_ratio,
    demand_ratio, footing_pressure, simple_span_moment,
};
use crate::core::models::design::{FrameDesign, StructureInput};
use crate::core::models::geometry::COLUMN_COUNT;
use crate::core::models::member::MemberSize;
use serde::{Deserialize, Serialize};

/// Assumed longitudinal steel ratios used by the capacity formulas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reinforcement {
    pub column_ratio: f64,
    pub beam_ratio: f64,
}

impl Default for Reinforcement {
    fn default() -> Self {
        Self {
            column_ratio: 0.02,
            beam_ratio: 0.012,
        }
    }
}

/// Pass limits for each ratio family. A ratio passes when it is `<=` its limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub stress: f64,
    pub bearing: f64,
    pub deflection: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            stress: 0.95,
            bearing: 1.0,
            deflection: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatioCheck {
    pub demand: f64,
    pub capacity: f64,
    pub ratio: f64,
    pub threshold: f64,
    pub passes: bool,
}

impl RatioCheck {
    fn new(demand: f64, capacity: f64, ratio: f64, threshold: f64) -> Self {
        Self {
            demand,
            capacity,
            ratio,
            threshold,
            passes: ratio <= threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameLoads {
    pub column_service_kn: f64,
    pub column_factored_kn: f64,
    pub max_beam_moment_knm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolumeBreakdown {
    pub slab_m3: f64,
    pub columns_m3: f64,
    pub beams_m3: f64,
    pub footings_m3: f64,
    pub total_m3: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameChecks {
    /// Column axial demand (kN) against capacity.
    pub column: RatioCheck,
    /// Beam moment demand (kN·m) against capacity.
    pub beam: RatioCheck,
    /// Required minimum depth (mm) against the actual beam depth.
    pub deflection: RatioCheck,
    /// Soil pressure (kPa) against the allowable bearing pressure.
    pub footing: RatioCheck,
    pub all_satisfied: bool,
}

/// Diagnostics for one complete design, recomputed from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameEvaluation {
    pub design: FrameDesign,
    pub loads: FrameLoads,
    pub volumes: VolumeBreakdown,
    pub weight_kn: f64,
    pub checks: FrameChecks,
}

/// Capacity evaluator bound to one structure.
#[derive(Debug, Clone, Copy)]
pub struct FrameAnalysis {
    structure: StructureInput,
    reinforcement: Reinforcement,
}

impl FrameAnalysis {
    pub fn new(structure: StructureInput) -> Self {
        Self::with_reinforcement(structure, Reinforcement::default())
    }

    pub fn with_reinforcement(structure: StructureInput, reinforcement: Reinforcement) -> Self {
        Self {
            structure,
            reinforcement,
        }
    }

    pub fn structure(&self) -> &StructureInput {
        &self.structure
    }

    pub fn reinforcement(&self) -> &Reinforcement {
        &self.reinforcement
    }

    pub fn slab_self_weight_kpa(&self, slab_thickness_mm: f64) -> f64 {
        slab_thickness_mm / 1000.0 * self.structure.material.concrete_density_kn_m3
    }

    fn load_per_column(&self, pressure_kpa: f64) -> f64 {
        pressure_kpa * self.structure.geometry.plan_area_m2() / COLUMN_COUNT as f64
    }

    pub fn column_service_load_kn(&self, slab_thickness_mm: f64) -> f64 {
        let sw = self.slab_self_weight_kpa(slab_thickness_mm);
        self.load_per_column(self.structure.load.service_with_self_weight(sw))
    }

    pub fn column_factored_load_kn(&self, slab_thickness_mm: f64) -> f64 {
        let sw = self.slab_self_weight_kpa(slab_thickness_mm);
        self.load_per_column(self.structure.load.factored_with_self_weight(sw))
    }

    /// Larger of the two plan directions, each beam carrying half the
    /// perpendicular span as tributary width.
    pub fn max_beam_moment_knm(&self, slab_thickness_mm: f64) -> f64 {
        let g = &self.structure.geometry;
        let sw = self.slab_self_weight_kpa(slab_thickness_mm);
        let pressure = self.structure.load.factored_with_self_weight(sw);
        let along_width = simple_span_moment(pressure * g.length_m / 2.0, g.width_m);
        let along_length = simple_span_moment(pressure * g.width_m / 2.0, g.length_m);
        along_width.max(along_length)
    }

    pub fn column_capacity_kn(&self, column: &MemberSize) -> f64 {
        let m = &self.structure.material;
        column_axial_capacity(column, m.fc_mpa, m.fy_mpa, self.reinforcement.column_ratio)
    }

    pub fn beam_capacity_knm(&self, beam: &MemberSize) -> f64 {
        let m = &self.structure.material;
        beam_moment_capacity(beam, m.fc_mpa, m.fy_mpa, self.reinforcement.beam_ratio)
    }

    pub fn column_stress_ratio(&self, column: &MemberSize, slab_thickness_mm: f64) -> f64 {
        demand_ratio(
            self.column_factored_load_kn(slab_thickness_mm),
            self.column_capacity_kn(column),
        )
    }

    pub fn beam_stress_ratio(&self, beam: &MemberSize, slab_thickness_mm: f64) -> f64 {
        demand_ratio(
            self.max_beam_moment_knm(slab_thickness_mm),
            self.beam_capacity_knm(beam),
        )
    }

    pub fn beam_deflection_ratio(&self, beam: &MemberSize) -> f64 {
        deflection_ratio(beam.depth_mm, self.structure.geometry.max_span_m())
    }

    pub fn footing_bearing_ratio(&self, footing: &MemberSize, slab_thickness_mm: f64) -> f64 {
        let pressure = footing_pressure(self.column_service_load_kn(slab_thickness_mm), footing);
        demand_ratio(pressure, self.structure.soil_bearing_kpa)
    }

    pub fn slab_volume_m3(&self, slab_thickness_mm: f64) -> f64 {
        self.structure.geometry.plan_area_m2() * slab_thickness_mm / 1000.0
    }

    pub fn column_volume_m3(&self, column: &MemberSize) -> f64 {
        COLUMN_COUNT as f64 * column.area_m2() * self.structure.geometry.height_m
    }

    /// Perimeter beams, counting only the drop below the slab soffit.
    pub fn beam_volume_m3(&self, beam: &MemberSize, slab_thickness_mm: f64) -> f64 {
        let drop_m = ((beam.depth_mm - slab_thickness_mm) / 1000.0).max(0.0);
        beam.width_mm / 1000.0 * drop_m * self.structure.geometry.perimeter_m()
    }

    pub fn footing_volume_m3(&self, footing: &MemberSize) -> f64 {
        COLUMN_COUNT as f64 * footing.area_m2() * FOOTING_THICKNESS_MM / 1000.0
    }

    pub fn volumes(&self, design: &FrameDesign) -> VolumeBreakdown {
        let slab_m3 = self.slab_volume_m3(design.slab_thickness_mm);
        let columns_m3 = self.column_volume_m3(&design.column);
        let beams_m3 = self.beam_volume_m3(&design.beam, design.slab_thickness_mm);
        let footings_m3 = self.footing_volume_m3(&design.footing);
        VolumeBreakdown {
            slab_m3,
            columns_m3,
            beams_m3,
            footings_m3,
            total_m3: slab_m3 + columns_m3 + beams_m3 + footings_m3,
        }
    }

    pub fn total_volume_m3(&self, design: &FrameDesign) -> f64 {
        self.volumes(design).total_m3
    }

    pub fn weight_kn(&self, volume_m3: f64) -> f64 {
        volume_m3 * self.structure.material.concrete_density_kn_m3
    }

    pub fn evaluate(&self, design: &FrameDesign, thresholds: &Thresholds) -> FrameEvaluation {
        let t = design.slab_thickness_mm;
        let loads = FrameLoads {
            column_service_kn: self.column_service_load_kn(t),
            column_factored_kn: self.column_factored_load_kn(t),
            max_beam_moment_knm: self.max_beam_moment_knm(t),
        };

        let column = RatioCheck::new(
            loads.column_factored_kn,
            self.column_capacity_kn(&design.column),
            self.column_stress_ratio(&design.column, t),
            thresholds.stress,
        );
        let beam = RatioCheck::new(
            loads.max_beam_moment_knm,
            self.beam_capacity_knm(&design.beam),
            self.beam_stress_ratio(&design.beam, t),
            thresholds.stress,
        );
        let deflection = RatioCheck::new(
            self.structure.geometry.max_span_m() * 1000.0 / super::capacity::SPAN_TO_DEPTH_LIMIT,
            design.beam.depth_mm,
            self.beam_deflection_ratio(&design.beam),
            thresholds.deflection,
        );
        let footing = RatioCheck::new(
            footing_pressure(loads.column_service_kn, &design.footing),
            self.structure.soil_bearing_kpa,
            self.footing_bearing_ratio(&design.footing, t),
            thresholds.bearing,
        );
        let all_satisfied = column.passes && beam.passes && deflection.passes && footing.passes;

        let volumes = self.volumes(design);
        FrameEvaluation {
            design: *design,
            loads,
            volumes,
            weight_kn: self.weight_kn(volumes.total_m3),
            checks: FrameChecks {
                column,
                beam,
                deflection,
                footing,
                all_satisfied,
            },
        }
    }
}
