//! Fixed-member material optimization.
//!
//! With the column, beam and slab sizes fixed, choose one concrete grade and
//! one longitudinal steel ratio for columns and for beams so that material
//! cost is minimal while the stress checks still pass. Ductility bounds on
//! the steel ratio are enforced as a unary penalty, so custom catalogs with
//! ratios outside the bounds are discouraged rather than rejected.

use crate::core::analysis::{FrameAnalysis, Reinforcement};
use crate::core::models::catalog::{CatalogProvider, ConcreteGrade, MaterialCatalogs};
use crate::core::models::design::StructureInput;
use crate::core::models::material::STEEL_DENSITY_KG_M3;
use crate::core::models::member::MemberSize;
use crate::core::models::require_positive;
use crate::engine::config::{OptimizationConfig, PenaltyConfig};
use crate::engine::error::EngineError;
use crate::engine::layout::LayoutError;
use crate::engine::model::{BlockSpec, CatalogModel, Constraint};
use crate::engine::pipeline::{self, SolverSummary};
use crate::engine::progress::ProgressReporter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

const GRADES: usize = 0;
const COLUMN_STEEL: usize = 1;
const BEAM_STEEL: usize = 2;

/// Objective costs are expressed in units of this many currency units.
const COST_UNIT: f64 = 10_000.0;
pub const MIN_STEEL_PERCENT: f64 = 1.0;
pub const MAX_STEEL_PERCENT: f64 = 4.0;
/// Shrinkage mesh in the slab, as a fraction of slab volume.
pub const SLAB_MESH_RATIO: f64 = 0.003;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialRequest {
    #[serde(default)]
    pub structure: StructureInput,
    pub column: MemberSize,
    pub beam: MemberSize,
    pub slab_thickness_mm: f64,
}

impl MaterialRequest {
    pub fn new(
        structure: StructureInput,
        column: MemberSize,
        beam: MemberSize,
        slab_thickness_mm: f64,
    ) -> Self {
        Self {
            structure,
            column,
            beam,
            slab_thickness_mm,
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.structure.validate()?;
        self.column.validate("column")?;
        self.beam.validate("beam")?;
        require_positive("slab_thickness_mm", self.slab_thickness_mm)?;
        Ok(())
    }
}

/// How far a steel ratio sits outside the ductility bounds; `<= 1` inside.
pub fn ductility_ratio(steel_percent: f64) -> f64 {
    if steel_percent <= 0.0 || steel_percent.is_nan() {
        return f64::INFINITY;
    }
    (steel_percent / MAX_STEEL_PERCENT).max(MIN_STEEL_PERCENT / steel_percent)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialReport {
    pub concrete_grade: ConcreteGrade,
    pub column_steel_percent: f64,
    pub beam_steel_percent: f64,
    /// Catalog positions: grade, column steel, beam steel.
    pub selection: Vec<usize>,
    pub column_stress_ratio: f64,
    pub beam_stress_ratio: f64,
    pub concrete_volume_m3: f64,
    pub steel_weight_kg: f64,
    pub concrete_cost: f64,
    pub steel_cost: f64,
    pub total_cost: f64,
    pub all_checks_pass: bool,
    pub solver: SolverSummary,
}

pub struct MaterialModel<'a> {
    request: MaterialRequest,
    catalogs: &'a MaterialCatalogs,
    column_volume_m3: f64,
    beam_volume_m3: f64,
    slab_volume_m3: f64,
}

impl<'a> MaterialModel<'a> {
    pub fn new(request: MaterialRequest, catalogs: &'a MaterialCatalogs) -> Self {
        let analysis = FrameAnalysis::new(request.structure);
        Self {
            column_volume_m3: analysis.column_volume_m3(&request.column),
            beam_volume_m3: analysis.beam_volume_m3(&request.beam, request.slab_thickness_mm),
            slab_volume_m3: analysis.slab_volume_m3(request.slab_thickness_mm),
            request,
            catalogs,
        }
    }

    pub fn concrete_volume_m3(&self) -> f64 {
        self.slab_volume_m3 + self.column_volume_m3 + self.beam_volume_m3
    }

    fn grade(&self, i: usize) -> &ConcreteGrade {
        &self.catalogs.concrete_grades.options()[i]
    }

    fn steel(&self, i: usize) -> f64 {
        self.catalogs.steel_ratios_percent.options()[i]
    }

    fn analysis(&self, fc_mpa: f64, column_percent: f64, beam_percent: f64) -> FrameAnalysis {
        let mut structure = self.request.structure;
        structure.material.fc_mpa = fc_mpa;
        FrameAnalysis::with_reinforcement(
            structure,
            Reinforcement {
                column_ratio: column_percent / 100.0,
                beam_ratio: beam_percent / 100.0,
            },
        )
    }

    fn column_ratio(&self, fc_mpa: f64, column_percent: f64) -> f64 {
        self.analysis(fc_mpa, column_percent, 0.0)
            .column_stress_ratio(&self.request.column, self.request.slab_thickness_mm)
    }

    fn beam_ratio(&self, fc_mpa: f64, beam_percent: f64) -> f64 {
        self.analysis(fc_mpa, 0.0, beam_percent)
            .beam_stress_ratio(&self.request.beam, self.request.slab_thickness_mm)
    }

    fn steel_cost(&self, percent: f64, member_volume_m3: f64) -> f64 {
        percent / 100.0 * member_volume_m3 * STEEL_DENSITY_KG_M3 * self.catalogs.steel_price_per_kg
    }

    /// Decodes a catalog selection into quantities, costs and check results.
    pub fn report(
        &self,
        selection: &[usize],
        thresholds_stress: f64,
        solver: SolverSummary,
    ) -> Result<MaterialReport, LayoutError> {
        if selection.len() != 3 {
            return Err(LayoutError::SelectionLength {
                expected: 3,
                actual: selection.len(),
            });
        }
        let grades = &self.catalogs.concrete_grades;
        let ratios = &self.catalogs.steel_ratios_percent;
        let grade = *grades
            .get(selection[GRADES])
            .ok_or(LayoutError::OptionOutOfRange {
                name: "concrete_grades",
                option: selection[GRADES],
                len: grades.len(),
            })?;
        let steel_at = |name: &'static str, index: usize| {
            ratios
                .get(index)
                .copied()
                .ok_or(LayoutError::OptionOutOfRange {
                    name,
                    option: index,
                    len: ratios.len(),
                })
        };
        let column_steel_percent = steel_at("column_steel", selection[COLUMN_STEEL])?;
        let beam_steel_percent = steel_at("beam_steel", selection[BEAM_STEEL])?;

        let column_stress_ratio = self.column_ratio(grade.fc_mpa, column_steel_percent);
        let beam_stress_ratio = self.beam_ratio(grade.fc_mpa, beam_steel_percent);
        let concrete_volume_m3 = self.concrete_volume_m3();
        let steel_weight_kg = (column_steel_percent / 100.0 * self.column_volume_m3
            + beam_steel_percent / 100.0 * self.beam_volume_m3
            + SLAB_MESH_RATIO * self.slab_volume_m3)
            * STEEL_DENSITY_KG_M3;
        let concrete_cost = grade.price_per_m3 * concrete_volume_m3;
        let steel_cost = steel_weight_kg * self.catalogs.steel_price_per_kg;
        let all_checks_pass = column_stress_ratio <= thresholds_stress
            && beam_stress_ratio <= thresholds_stress
            && ductility_ratio(column_steel_percent) <= 1.0
            && ductility_ratio(beam_steel_percent) <= 1.0;

        Ok(MaterialReport {
            concrete_grade: grade,
            column_steel_percent,
            beam_steel_percent,
            selection: selection.to_vec(),
            column_stress_ratio,
            beam_stress_ratio,
            concrete_volume_m3,
            steel_weight_kg,
            concrete_cost,
            steel_cost,
            total_cost: concrete_cost + steel_cost,
            all_checks_pass,
            solver,
        })
    }
}

impl CatalogModel for MaterialModel<'_> {
    fn blocks(&self) -> Vec<BlockSpec> {
        vec![
            BlockSpec::new("concrete_grades", self.catalogs.concrete_grades.len()),
            BlockSpec::new("column_steel", self.catalogs.steel_ratios_percent.len()),
            BlockSpec::new("beam_steel", self.catalogs.steel_ratios_percent.len()),
        ]
    }

    fn objective(&self, block: usize, option: usize) -> f64 {
        match block {
            GRADES => self.grade(option).price_per_m3 * self.concrete_volume_m3() / COST_UNIT,
            COLUMN_STEEL => self.steel_cost(self.steel(option), self.column_volume_m3) / COST_UNIT,
            BEAM_STEEL => self.steel_cost(self.steel(option), self.beam_volume_m3) / COST_UNIT,
            _ => f64::NAN,
        }
    }

    fn constraints(&self, penalties: &PenaltyConfig) -> Vec<Constraint<'_>> {
        let stress = penalties.thresholds.stress;
        vec![
            Constraint::pairwise(
                "column_stress",
                penalties.stress,
                stress,
                GRADES,
                COLUMN_STEEL,
                move |g, r| self.column_ratio(self.grade(g).fc_mpa, self.steel(r)),
            ),
            Constraint::pairwise(
                "beam_stress",
                penalties.stress,
                stress,
                GRADES,
                BEAM_STEEL,
                move |g, r| self.beam_ratio(self.grade(g).fc_mpa, self.steel(r)),
            ),
            Constraint::unary(
                "column_ductility",
                penalties.ductility,
                1.0,
                COLUMN_STEEL,
                move |r| ductility_ratio(self.steel(r)),
            ),
            Constraint::unary(
                "beam_ductility",
                penalties.ductility,
                1.0,
                BEAM_STEEL,
                move |r| ductility_ratio(self.steel(r)),
            ),
        ]
    }
}

#[instrument(skip_all, name = "materials_workflow")]
pub fn run(
    request: &MaterialRequest,
    catalogs: &dyn CatalogProvider,
    config: &OptimizationConfig,
    reporter: &ProgressReporter,
) -> Result<MaterialReport, EngineError> {
    request.validate()?;
    let snapshot: Arc<MaterialCatalogs> = catalogs.material_catalogs();
    info!(
        grades = snapshot.concrete_grades.len(),
        steel_ratios = snapshot.steel_ratios_percent.len(),
        "Starting material optimization."
    );

    let model = MaterialModel::new(*request, &snapshot);
    let outcome = pipeline::optimize(&model, config, reporter)?;
    let report = model.report(
        &outcome.selection,
        config.penalties.thresholds.stress,
        outcome.summary,
    )?;

    info!(
        fc_mpa = report.concrete_grade.fc_mpa,
        total_cost = report.total_cost,
        all_checks_pass = report.all_checks_pass,
        "Material optimization complete."
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::catalog::{ReferenceCatalogs, SizeCatalog};
    use crate::engine::config::{OptimizationConfigBuilder, SolverSelection};
    use crate::engine::encoder::encode;

    const TOLERANCE: f64 = 1e-6;

    fn config(seed: u64) -> OptimizationConfig {
        OptimizationConfigBuilder::new()
            .num_reads(50)
            .seed(seed)
            .solver(SolverSelection::Local)
            .build()
            .unwrap()
    }

    fn reference_request() -> MaterialRequest {
        MaterialRequest::new(
            StructureInput::default(),
            MemberSize::square(300.0),
            MemberSize::new(300.0, 450.0),
            150.0,
        )
    }

    #[test]
    fn ductility_ratio_is_within_bounds_only_between_one_and_four_percent() {
        assert!(ductility_ratio(1.0) <= 1.0);
        assert!(ductility_ratio(2.5) <= 1.0);
        assert!(ductility_ratio(4.0) <= 1.0);
        assert!((ductility_ratio(0.5) - 2.0).abs() < TOLERANCE);
        assert!((ductility_ratio(6.0) - 1.5).abs() < TOLERANCE);
        assert!(ductility_ratio(0.0).is_infinite());
    }

    #[test]
    fn encoding_has_one_block_per_decision() {
        let catalogs = MaterialCatalogs::reference();
        let model = MaterialModel::new(reference_request(), &catalogs);
        let encoded = encode(&model, &PenaltyConfig::default()).unwrap();
        assert_eq!(encoded.layout.num_blocks(), 3);
        assert_eq!(encoded.layout.num_variables(), 21);
        // Every reference steel ratio is ductile, so only stress couplings fire.
        assert_eq!(encoded.stats.unary_penalties, 0);
    }

    #[test]
    fn lightly_loaded_frame_takes_the_cheapest_materials() {
        let report = run(
            &reference_request(),
            &ReferenceCatalogs::default(),
            &config(11),
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(report.selection, vec![0, 0, 0]);
        assert_eq!(report.concrete_grade.fc_mpa, 21.0);
        assert!(report.all_checks_pass);
        assert!((report.concrete_volume_m3 - 5.7).abs() < TOLERANCE);
        // 1 % in columns and beams plus the slab mesh.
        let steel = (0.01 * 1.08 + 0.01 * 1.62 + 0.003 * 3.0) * STEEL_DENSITY_KG_M3;
        assert!((report.steel_weight_kg - steel).abs() < TOLERANCE);
        assert!((report.concrete_cost - 4000.0 * 5.7).abs() < TOLERANCE);
        assert!((report.total_cost - report.concrete_cost - report.steel_cost).abs() < TOLERANCE);
    }

    #[test]
    fn shallow_beam_forces_stronger_materials() {
        let mut request = reference_request();
        request.beam = MemberSize::new(200.0, 300.0);
        let catalogs = MaterialCatalogs::reference();
        let model = MaterialModel::new(request, &catalogs);
        assert!(model.beam_ratio(21.0, 1.0) > 0.95);

        // At the default stress weight a marginal overstress (ratio ~0.97) is a
        // local minimum of the encoding; a stiffer weight makes both minima feasible.
        let stiff = OptimizationConfigBuilder::new()
            .penalties(PenaltyConfig {
                stress: 4000.0,
                ..PenaltyConfig::default()
            })
            .num_reads(50)
            .seed(5)
            .solver(SolverSelection::Local)
            .build()
            .unwrap();
        let report = run(&request, &ReferenceCatalogs::default(), &stiff, &ProgressReporter::new())
            .unwrap();
        assert!(report.all_checks_pass);
        assert!(report.beam_stress_ratio <= 0.95);
        assert!(report.concrete_grade.fc_mpa > 21.0 || report.beam_steel_percent > 1.0);
    }

    #[test]
    fn non_ductile_catalog_ratio_is_penalized_and_avoided() {
        struct Custom(Arc<MaterialCatalogs>);
        impl CatalogProvider for Custom {
            fn member_catalogs(&self) -> Arc<crate::core::models::catalog::MemberCatalogs> {
                Arc::new(crate::core::models::catalog::MemberCatalogs::reference())
            }
            fn material_catalogs(&self) -> Arc<MaterialCatalogs> {
                Arc::clone(&self.0)
            }
        }
        let reference = MaterialCatalogs::reference();
        let catalogs = MaterialCatalogs {
            concrete_grades: reference.concrete_grades.clone(),
            steel_ratios_percent: SizeCatalog::new("steel_ratios_percent", vec![0.5, 1.0, 2.0])
                .unwrap(),
            steel_price_per_kg: reference.steel_price_per_kg,
        };
        let model = MaterialModel::new(reference_request(), &catalogs);
        let encoded = encode(&model, &PenaltyConfig::default()).unwrap();
        assert_eq!(encoded.stats.unary_penalties, 2);

        let report = run(
            &reference_request(),
            &Custom(Arc::new(catalogs)),
            &config(3),
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(report.column_steel_percent, 1.0);
        assert_eq!(report.beam_steel_percent, 1.0);
        assert!(report.all_checks_pass);
    }

    #[test]
    fn zero_slab_thickness_is_rejected() {
        let mut request = reference_request();
        request.slab_thickness_mm = 0.0;
        let result = run(&request, &ReferenceCatalogs::default(), &config(1), &ProgressReporter::new());
        assert!(matches!(result, Err(EngineError::Validation { .. })));
    }
}
