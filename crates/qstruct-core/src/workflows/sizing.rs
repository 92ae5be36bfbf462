use crate::core::analysis::{FrameAnalysis, FrameEvaluation};
use crate::core::models::catalog::{CatalogProvider, MemberCatalogs, SizeCatalog};
use crate::core::models::design::{FrameDesign, StructureInput};
use crate::core::models::member::MemberSize;
use crate::core::models::require_positive;
use crate::engine::config::{OptimizationConfig, PenaltyConfig};
use crate::engine::encoder::EncodingStats;
use crate::engine::error::EngineError;
use crate::engine::layout::LayoutError;
use crate::engine::model::{BlockSpec, CatalogModel, Constraint};
use crate::engine::pipeline::{self, SolverSummary};
use crate::engine::progress::ProgressReporter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

const COLUMNS: usize = 0;
const BEAMS: usize = 1;
const SLABS: usize = 2;
const FOOTINGS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizingRequest {
    #[serde(default)]
    pub structure: StructureInput,
    /// Comparison design; the mid-range reference design when unset.
    #[serde(default)]
    pub baseline: Option<FrameDesign>,
    #[serde(default = "default_concrete_price")]
    pub concrete_price_per_m3: f64,
}

fn default_concrete_price() -> f64 {
    5000.0
}

impl Default for SizingRequest {
    fn default() -> Self {
        Self {
            structure: StructureInput::default(),
            baseline: None,
            concrete_price_per_m3: default_concrete_price(),
        }
    }
}

impl SizingRequest {
    pub fn new(structure: StructureInput) -> Self {
        Self {
            structure,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.structure.validate()?;
        if let Some(baseline) = &self.baseline {
            baseline.validate()?;
        }
        require_positive("concrete_price_per_m3", self.concrete_price_per_m3)?;
        Ok(())
    }
}

/// Catalog positions of the chosen sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemberSelection {
    pub column: usize,
    pub beam: usize,
    pub slab: usize,
    pub footing: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BaselineComparison {
    pub default_design: FrameDesign,
    pub default_volume_m3: f64,
    pub default_all_satisfied: bool,
    pub optimized_volume_m3: f64,
    pub savings_m3: f64,
    pub savings_percent: f64,
    pub cost_savings: f64,
}

impl BaselineComparison {
    fn new(
        baseline: &FrameEvaluation,
        optimized: &FrameEvaluation,
        concrete_price_per_m3: f64,
    ) -> Self {
        let default_volume_m3 = baseline.volumes.total_m3;
        let optimized_volume_m3 = optimized.volumes.total_m3;
        let savings_m3 = default_volume_m3 - optimized_volume_m3;
        let savings_percent = if default_volume_m3 > 0.0 {
            savings_m3 / default_volume_m3 * 100.0
        } else {
            0.0
        };
        Self {
            default_design: baseline.design,
            default_volume_m3,
            default_all_satisfied: baseline.checks.all_satisfied,
            optimized_volume_m3,
            savings_m3,
            savings_percent,
            cost_savings: savings_m3 * concrete_price_per_m3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizingReport {
    pub design: FrameDesign,
    pub selection: MemberSelection,
    pub evaluation: FrameEvaluation,
    pub comparison: BaselineComparison,
    pub solver: SolverSummary,
    pub encoding: EncodingStats,
    /// Per-option objective volumes (m³) used in the encoding, by block.
    pub option_volumes_m3: Vec<Vec<f64>>,
}

/// Member sizing as a catalog problem over columns, beams, slabs and footings.
///
/// Beam volumes in the objective use the catalog's mean slab thickness, since
/// the true drop below the slab depends on the slab decision.
pub struct SizingModel<'a> {
    analysis: FrameAnalysis,
    catalogs: &'a MemberCatalogs,
    average_slab_mm: f64,
}

impl<'a> SizingModel<'a> {
    pub fn new(structure: StructureInput, catalogs: &'a MemberCatalogs) -> Self {
        Self {
            analysis: FrameAnalysis::new(structure),
            catalogs,
            average_slab_mm: catalogs.average_slab_thickness_mm(),
        }
    }

    fn column(&self, i: usize) -> &MemberSize {
        &self.catalogs.columns.options()[i]
    }
    fn beam(&self, i: usize) -> &MemberSize {
        &self.catalogs.beams.options()[i]
    }
    fn slab(&self, i: usize) -> f64 {
        self.catalogs.slabs.options()[i]
    }
    fn footing(&self, i: usize) -> &MemberSize {
        &self.catalogs.footings.options()[i]
    }

    /// Looks up the catalog entries for a decoded selection.
    pub fn design_for(&self, selection: &[usize]) -> Result<FrameDesign, LayoutError> {
        if selection.len() != 4 {
            return Err(LayoutError::SelectionLength {
                expected: 4,
                actual: selection.len(),
            });
        }
        Ok(FrameDesign {
            column: *pick(&self.catalogs.columns, "columns", selection[COLUMNS])?,
            beam: *pick(&self.catalogs.beams, "beams", selection[BEAMS])?,
            slab_thickness_mm: *pick(&self.catalogs.slabs, "slabs", selection[SLABS])?,
            footing: *pick(&self.catalogs.footings, "footings", selection[FOOTINGS])?,
        })
    }
}

fn pick<'c, T>(
    catalog: &'c SizeCatalog<T>,
    name: &'static str,
    index: usize,
) -> Result<&'c T, LayoutError> {
    catalog.get(index).ok_or(LayoutError::OptionOutOfRange {
        name,
        option: index,
        len: catalog.len(),
    })
}

impl CatalogModel for SizingModel<'_> {
    fn blocks(&self) -> Vec<BlockSpec> {
        vec![
            BlockSpec::new("columns", self.catalogs.columns.len()),
            BlockSpec::new("beams", self.catalogs.beams.len()),
            BlockSpec::new("slabs", self.catalogs.slabs.len()),
            BlockSpec::new("footings", self.catalogs.footings.len()),
        ]
    }

    fn objective(&self, block: usize, option: usize) -> f64 {
        let a = &self.analysis;
        match block {
            COLUMNS => a.column_volume_m3(self.column(option)),
            BEAMS => a.beam_volume_m3(self.beam(option), self.average_slab_mm),
            SLABS => a.slab_volume_m3(self.slab(option)),
            FOOTINGS => a.footing_volume_m3(self.footing(option)),
            _ => f64::NAN,
        }
    }

    fn constraints(&self, penalties: &PenaltyConfig) -> Vec<Constraint<'_>> {
        let t = &penalties.thresholds;
        vec![
            Constraint::pairwise(
                "column_stress",
                penalties.stress,
                t.stress,
                COLUMNS,
                SLABS,
                move |c, s| self.analysis.column_stress_ratio(self.column(c), self.slab(s)),
            ),
            Constraint::pairwise(
                "beam_stress",
                penalties.stress,
                t.stress,
                BEAMS,
                SLABS,
                move |b, s| self.analysis.beam_stress_ratio(self.beam(b), self.slab(s)),
            ),
            Constraint::unary(
                "beam_deflection",
                penalties.deflection,
                t.deflection,
                BEAMS,
                move |b| self.analysis.beam_deflection_ratio(self.beam(b)),
            ),
            Constraint::pairwise(
                "footing_bearing",
                penalties.bearing,
                t.bearing,
                FOOTINGS,
                SLABS,
                move |f, s| self.analysis.footing_bearing_ratio(self.footing(f), self.slab(s)),
            ),
        ]
    }
}

#[instrument(skip_all, name = "sizing_workflow")]
pub fn run(
    request: &SizingRequest,
    catalogs: &dyn CatalogProvider,
    config: &OptimizationConfig,
    reporter: &ProgressReporter,
) -> Result<SizingReport, EngineError> {
    request.validate()?;
    let snapshot: Arc<MemberCatalogs> = catalogs.member_catalogs();
    info!(
        options = snapshot.total_options(),
        num_reads = config.annealing.num_reads,
        "Starting member sizing."
    );

    let model = SizingModel::new(request.structure, &snapshot);
    let outcome = pipeline::optimize(&model, config, reporter)?;
    let design = model.design_for(&outcome.selection)?;

    let thresholds = &config.penalties.thresholds;
    let evaluation = model.analysis.evaluate(&design, thresholds);
    let baseline_design = request
        .baseline
        .unwrap_or_else(FrameDesign::reference_baseline);
    let baseline = model.analysis.evaluate(&baseline_design, thresholds);
    let comparison = BaselineComparison::new(&baseline, &evaluation, request.concrete_price_per_m3);

    info!(
        volume_m3 = evaluation.volumes.total_m3,
        all_satisfied = evaluation.checks.all_satisfied,
        savings_percent = comparison.savings_percent,
        "Member sizing complete."
    );

    Ok(SizingReport {
        design,
        selection: MemberSelection {
            column: outcome.selection[COLUMNS],
            beam: outcome.selection[BEAMS],
            slab: outcome.selection[SLABS],
            footing: outcome.selection[FOOTINGS],
        },
        evaluation,
        comparison,
        solver: outcome.summary,
        encoding: outcome.encoded.stats,
        option_volumes_m3: outcome.encoded.objective_terms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::catalog::{MemberCatalogs, ReferenceCatalogs};
    use crate::engine::config::{OptimizationConfigBuilder, RemoteSolverConfig, SolverSelection};
    use crate::engine::decoder::decode;
    use crate::engine::encoder::encode;

    fn config(num_reads: usize, seed: u64) -> OptimizationConfig {
        OptimizationConfigBuilder::new()
            .num_reads(num_reads)
            .seed(seed)
            .solver(SolverSelection::Local)
            .build()
            .unwrap()
    }

    #[test]
    fn reference_encoding_has_forty_symmetric_variables() {
        let catalogs = MemberCatalogs::reference();
        let model = SizingModel::new(StructureInput::default(), &catalogs);
        let encoded = encode(&model, &PenaltyConfig::default()).unwrap();
        assert_eq!(encoded.layout.num_variables(), 40);
        let q = encoded.problem.matrix();
        assert_eq!(q, &q.transpose());
        assert!(q.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn decoding_a_single_catalog_option_returns_that_option() {
        let catalogs = MemberCatalogs::reference();
        let model = SizingModel::new(StructureInput::default(), &catalogs);
        let encoded = encode(&model, &PenaltyConfig::default()).unwrap();
        for (block, range) in encoded.layout.blocks().iter().enumerate() {
            for k in 0..range.len {
                let mut x = vec![false; 40];
                x[range.start + k] = true;
                let selection = decode(&encoded.layout, &x).unwrap();
                assert_eq!(selection.options[block], k);
            }
        }
        let design = model.design_for(&[4, 6, 6, 6]).unwrap();
        assert_eq!(design, FrameDesign::reference_baseline());
    }

    #[test]
    fn feasible_combination_has_zero_penalty_in_the_encoding() {
        let catalogs = MemberCatalogs::reference();
        let model = SizingModel::new(StructureInput::default(), &catalogs);
        let penalties = PenaltyConfig::default();
        let encoded = encode(&model, &penalties).unwrap();
        let selection = [4, 6, 6, 6];
        let x = encoded.layout.one_hot(&selection).unwrap();
        let objective: f64 = selection
            .iter()
            .enumerate()
            .map(|(b, &k)| encoded.objective_terms[b][k] * penalties.objective_scale)
            .sum();
        let energy = encoded.problem.shifted_energy(&x).unwrap();
        assert!((energy - objective).abs() < 1e-6);
    }

    #[test]
    fn one_hot_violation_costs_more_than_any_single_feasibility_violation() {
        let catalogs = MemberCatalogs::reference();
        let model = SizingModel::new(StructureInput::default(), &catalogs);
        let penalties = PenaltyConfig::default();
        let encoded = encode(&model, &penalties).unwrap();
        assert!(encoded.stats.max_penalty <= penalties.penalty_cap);
        assert!(encoded.stats.max_penalty < penalties.one_hot);

        // Leaving one block empty from a feasible state costs at least λ
        // minus that block's objective, which beats the largest single penalty.
        let max_objective = encoded
            .objective_terms
            .iter()
            .flatten()
            .fold(0.0_f64, |m, &v| m.max(v * penalties.objective_scale));
        assert!(penalties.one_hot - max_objective > encoded.stats.max_penalty);
    }

    #[test]
    fn degenerate_catalog_entry_does_not_poison_the_matrix() {
        let mut columns: Vec<MemberSize> = MemberCatalogs::reference().columns.options().to_vec();
        columns[0] = MemberSize::new(1e-9, 1e-9);
        let reference = MemberCatalogs::reference();
        let catalogs = MemberCatalogs::new(
            columns,
            reference.beams.options().to_vec(),
            reference.slabs.options().to_vec(),
            reference.footings.options().to_vec(),
        )
        .unwrap();
        let model = SizingModel::new(StructureInput::default(), &catalogs);
        let encoded = encode(&model, &PenaltyConfig::default()).unwrap();
        assert!(encoded.problem.matrix().iter().all(|v| v.is_finite()));
        assert!(encoded.stats.capped_penalties > 0);
    }

    #[test]
    fn optimized_design_beats_the_mid_range_default() {
        let report = run(
            &SizingRequest::default(),
            &ReferenceCatalogs::default(),
            &config(100, 2024),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert!(report.evaluation.checks.all_satisfied);
        assert!(report.comparison.default_all_satisfied);
        assert!((report.comparison.default_volume_m3 - 7.428).abs() < 1e-9);
        let analysis = FrameAnalysis::new(StructureInput::default());
        assert!(
            (report.comparison.optimized_volume_m3 - analysis.total_volume_m3(&report.design)).abs()
                < 1e-9
        );
        assert!(report.comparison.optimized_volume_m3 <= report.comparison.default_volume_m3);
        assert!(report.comparison.savings_m3 >= 0.0);
        assert!(
            (report.comparison.cost_savings - report.comparison.savings_m3 * 5000.0).abs() < 1e-6
        );
        assert_eq!(report.design.slab_thickness_mm, 100.0);
        assert_eq!(report.design.column, MemberSize::square(200.0));
        assert_eq!(report.design.beam, MemberSize::new(250.0, 350.0));
        assert_eq!(report.design.footing, MemberSize::square(700.0));
    }

    #[test]
    fn sizing_is_reproducible_for_a_fixed_seed() {
        let provider = ReferenceCatalogs::default();
        let a = run(&SizingRequest::default(), &provider, &config(20, 9), &ProgressReporter::new())
            .unwrap();
        let b = run(&SizingRequest::default(), &provider, &config(20, 9), &ProgressReporter::new())
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn external_request_without_endpoint_is_sized_locally() {
        let external = OptimizationConfigBuilder::new()
            .num_reads(100)
            .seed(1)
            .solver(SolverSelection::External(RemoteSolverConfig::new("")))
            .build()
            .unwrap();
        let provider = ReferenceCatalogs::default();
        let report =
            run(&SizingRequest::default(), &provider, &external, &ProgressReporter::new()).unwrap();
        let local =
            run(&SizingRequest::default(), &provider, &config(100, 1), &ProgressReporter::new())
                .unwrap();

        assert!(!report.solver.external_used);
        assert!(report.solver.fallback_reason.is_some());
        assert_eq!(report.design, local.design);
        assert!(report.evaluation.checks.all_satisfied);
    }

    #[test]
    fn invalid_structure_is_rejected_before_encoding() {
        let mut request = SizingRequest::default();
        request.structure.geometry.width_m = -4.0;
        let result = run(
            &request,
            &ReferenceCatalogs::default(),
            &config(5, 1),
            &ProgressReporter::new(),
        );
        assert!(matches!(result, Err(EngineError::Validation { .. })));
    }

    #[test]
    fn small_synthetic_catalog_can_be_injected() {
        struct Tiny(Arc<MemberCatalogs>);
        impl CatalogProvider for Tiny {
            fn member_catalogs(&self) -> Arc<MemberCatalogs> {
                Arc::clone(&self.0)
            }
            fn material_catalogs(&self) -> Arc<crate::core::models::catalog::MaterialCatalogs> {
                Arc::new(crate::core::models::catalog::MaterialCatalogs::reference())
            }
        }
        let catalogs = MemberCatalogs::new(
            vec![MemberSize::square(300.0)],
            vec![MemberSize::new(200.0, 300.0), MemberSize::new(300.0, 450.0)],
            vec![150.0],
            vec![MemberSize::square(1200.0)],
        )
        .unwrap();
        let report = run(
            &SizingRequest::default(),
            &Tiny(Arc::new(catalogs)),
            &config(10, 4),
            &ProgressReporter::new(),
        )
        .unwrap();
        // The shallow beam fails stress and deflection; only the deep one passes.
        assert_eq!(report.design.beam, MemberSize::new(300.0, 450.0));
        assert_eq!(report.selection.beam, 1);
        assert!(report.evaluation.checks.all_satisfied);
    }
}
