//! Hollow block geometry optimization.
//!
//! Choose a block face (length × height), a section (width and core
//! diameter) and a nub pattern from [`BlockCatalogs`] so that the wall uses
//! as little concrete per square metre as possible while every block
//!
//! - carries the required line load through its face shells,
//! - stays light enough to lay by hand,
//! - keeps a minimum solid fraction of its bed area.
//!
//! Concrete per square metre couples all three choices. Each option's
//! objective is that quantity averaged over every option of the other two
//! blocks, which keeps the objective unary. The checks are exact couplings.

use crate::core::analysis::capacity::demand_ratio;
use crate::core::models::block::{
    BLOCK_DENSITY_KG_M3, BlockCatalogs, BlockFace, BlockSection, HollowBlock, RebarCapacity,
    WallEstimate,
};
use crate::core::models::{ValidationError, require_positive};
use crate::engine::config::{ConfigError, OptimizationConfig, PenaltyConfig};
use crate::engine::error::EngineError;
use crate::engine::layout::LayoutError;
use crate::engine::model::{BlockSpec, CatalogModel, Constraint};
use crate::engine::pipeline::{self, SolverSummary};
use crate::engine::progress::ProgressReporter;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

const FACES: usize = 0;
const SECTIONS: usize = 1;
const NUBS: usize = 2;

/// Share of `f'c` the face shells may carry under a line load.
pub const SHELL_STRESS_FACTOR: f64 = 0.2;

/// Penalty weights of the three block checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockPenaltyWeights {
    pub strength: f64,
    pub weight: f64,
    pub solid: f64,
}

impl Default for BlockPenaltyWeights {
    fn default() -> Self {
        Self {
            strength: 2000.0,
            weight: 1500.0,
            solid: 1000.0,
        }
    }
}

impl BlockPenaltyWeights {
    /// Same ordering the frame weights obey: above the objective scale and
    /// below the one-hot weight.
    pub fn validate(&self, penalties: &PenaltyConfig) -> Result<(), ConfigError> {
        for (name, weight) in [
            ("strength", self.strength),
            ("weight", self.weight),
            ("solid", self.solid),
        ] {
            if !(weight.is_finite() && weight > penalties.objective_scale) {
                return Err(ConfigError::PenaltyOrdering(format!(
                    "block {name} weight {weight} must exceed the objective scale {}",
                    penalties.objective_scale
                )));
            }
            if weight >= penalties.one_hot {
                return Err(ConfigError::PenaltyOrdering(format!(
                    "block {name} weight {weight} must be below the one-hot weight {}",
                    penalties.one_hot
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockRequest {
    /// Line load the wall must carry (kN/m).
    pub required_strength_kn_m: f64,
    pub max_block_weight_kg: f64,
    /// Lower bound on net over gross bed area.
    pub min_solid_ratio: f64,
    /// Block concrete strength (MPa).
    pub fc_mpa: f64,
    /// Wall used for the quantity estimate.
    pub wall_length_m: f64,
    pub wall_height_m: f64,
    pub weights: BlockPenaltyWeights,
}

impl Default for BlockRequest {
    fn default() -> Self {
        Self {
            required_strength_kn_m: 50.0,
            max_block_weight_kg: 15.0,
            min_solid_ratio: 0.55,
            fc_mpa: 17.5,
            wall_length_m: 5.0,
            wall_height_m: 3.0,
            weights: BlockPenaltyWeights::default(),
        }
    }
}

impl BlockRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("required_strength_kn_m", self.required_strength_kn_m)?;
        require_positive("max_block_weight_kg", self.max_block_weight_kg)?;
        require_positive("fc_mpa", self.fc_mpa)?;
        require_positive("wall_length_m", self.wall_length_m)?;
        require_positive("wall_height_m", self.wall_height_m)?;
        if !(self.min_solid_ratio > 0.0 && self.min_solid_ratio < 1.0) {
            return Err(ValidationError::new(
                "min_solid_ratio",
                self.min_solid_ratio,
                "must lie strictly between 0 and 1",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockReport {
    pub block: HollowBlock,
    /// Catalog positions: face, section, nub pattern.
    pub selection: Vec<usize>,
    pub solid_ratio: f64,
    pub weight_kg: f64,
    pub blocks_per_m2: f64,
    pub concrete_m3_per_m2: f64,
    pub rebar: RebarCapacity,
    pub strength_capacity_kn_m: f64,
    pub strength_ratio: f64,
    pub weight_ratio: f64,
    pub solid_check_ratio: f64,
    pub all_checks_pass: bool,
    pub wall: WallEstimate,
    pub solver: SolverSummary,
}

pub struct BlockModel<'a> {
    request: BlockRequest,
    catalogs: &'a BlockCatalogs,
    objectives: [Vec<f64>; 3],
}

impl<'a> BlockModel<'a> {
    pub fn new(request: BlockRequest, catalogs: &'a BlockCatalogs) -> Self {
        let combinations: Vec<(usize, usize, usize, f64)> = (0..catalogs.faces.len())
            .flat_map(|f| (0..catalogs.sections.len()).map(move |s| (f, s)))
            .flat_map(|(f, s)| (0..catalogs.nubs.len()).map(move |n| (f, s, n)))
            .map(|(f, s, n)| {
                let block = HollowBlock::new(
                    catalogs.faces.options()[f],
                    catalogs.sections.options()[s],
                    catalogs.nubs.options()[n],
                );
                (f, s, n, block.concrete_m3_per_m2())
            })
            .collect();

        let mut objectives = [
            vec![0.0; catalogs.faces.len()],
            vec![0.0; catalogs.sections.len()],
            vec![0.0; catalogs.nubs.len()],
        ];
        for &(f, s, n, concrete) in &combinations {
            objectives[FACES][f] += concrete;
            objectives[SECTIONS][s] += concrete;
            objectives[NUBS][n] += concrete;
        }
        for sums in &mut objectives {
            let others = (combinations.len() / sums.len()) as f64;
            sums.iter_mut().for_each(|sum| *sum /= others);
        }

        Self {
            request,
            catalogs,
            objectives,
        }
    }

    fn face(&self, i: usize) -> BlockFace {
        self.catalogs.faces.options()[i]
    }

    fn section(&self, i: usize) -> BlockSection {
        self.catalogs.sections.options()[i]
    }

    /// Line load the face shells carry (kN/m).
    pub fn strength_capacity_kn_m(&self, section: &BlockSection) -> f64 {
        SHELL_STRESS_FACTOR * self.request.fc_mpa * section.shell_thickness_mm()
    }

    pub fn strength_ratio(&self, section: &BlockSection) -> f64 {
        demand_ratio(
            self.request.required_strength_kn_m,
            self.strength_capacity_kn_m(section),
        )
    }

    /// Weight of a full-height body without nub recesses over the limit.
    /// Never below the ratio of the finished block while its nubs fit in
    /// the recess they leave.
    pub fn weight_bound_ratio(&self, face: &BlockFace, section: &BlockSection) -> f64 {
        let body_mm3 =
            (face.length_mm * section.width_mm - section.core_area_mm2()) * face.height_mm;
        body_mm3 / 1.0e9 * BLOCK_DENSITY_KG_M3 / self.request.max_block_weight_kg
    }

    pub fn solid_check_ratio(&self, face: &BlockFace, section: &BlockSection) -> f64 {
        let gross = face.length_mm * section.width_mm;
        demand_ratio(
            self.request.min_solid_ratio,
            1.0 - section.core_area_mm2() / gross,
        )
    }

    /// Decodes a catalog selection into the block, its metrics and its checks.
    pub fn report(
        &self,
        selection: &[usize],
        solver: SolverSummary,
    ) -> Result<BlockReport, LayoutError> {
        if selection.len() != 3 {
            return Err(LayoutError::SelectionLength {
                expected: 3,
                actual: selection.len(),
            });
        }
        let out_of_range = |name: &'static str, option: usize, len: usize| {
            LayoutError::OptionOutOfRange { name, option, len }
        };
        let catalogs = self.catalogs;
        let face = *catalogs
            .faces
            .get(selection[FACES])
            .ok_or_else(|| out_of_range("faces", selection[FACES], catalogs.faces.len()))?;
        let section = *catalogs.sections.get(selection[SECTIONS]).ok_or_else(|| {
            out_of_range("sections", selection[SECTIONS], catalogs.sections.len())
        })?;
        let nubs = *catalogs
            .nubs
            .get(selection[NUBS])
            .ok_or_else(|| out_of_range("nubs", selection[NUBS], catalogs.nubs.len()))?;

        let block = HollowBlock::new(face, section, nubs);
        let weight_kg = block.weight_kg();
        let strength_ratio = self.strength_ratio(&section);
        let weight_ratio = weight_kg / self.request.max_block_weight_kg;
        let solid_check_ratio = self.solid_check_ratio(&face, &section);

        Ok(BlockReport {
            block,
            selection: selection.to_vec(),
            solid_ratio: block.solid_ratio(),
            weight_kg,
            blocks_per_m2: face.blocks_per_m2(),
            concrete_m3_per_m2: block.concrete_m3_per_m2(),
            rebar: block.rebar_capacity(),
            strength_capacity_kn_m: self.strength_capacity_kn_m(&section),
            strength_ratio,
            weight_ratio,
            solid_check_ratio,
            all_checks_pass: strength_ratio <= 1.0
                && weight_ratio <= 1.0
                && solid_check_ratio <= 1.0,
            wall: WallEstimate::new(
                &block,
                self.request.wall_length_m,
                self.request.wall_height_m,
            ),
            solver,
        })
    }
}

impl CatalogModel for BlockModel<'_> {
    fn blocks(&self) -> Vec<BlockSpec> {
        vec![
            BlockSpec::new("faces", self.catalogs.faces.len()),
            BlockSpec::new("sections", self.catalogs.sections.len()),
            BlockSpec::new("nubs", self.catalogs.nubs.len()),
        ]
    }

    fn objective(&self, block: usize, option: usize) -> f64 {
        self.objectives
            .get(block)
            .and_then(|values| values.get(option))
            .copied()
            .unwrap_or(f64::NAN)
    }

    fn constraints(&self, _penalties: &PenaltyConfig) -> Vec<Constraint<'_>> {
        let weights = self.request.weights;
        vec![
            Constraint::unary("block_strength", weights.strength, 1.0, SECTIONS, move |s| {
                self.strength_ratio(&self.section(s))
            }),
            Constraint::pairwise(
                "block_weight",
                weights.weight,
                1.0,
                FACES,
                SECTIONS,
                move |f, s| self.weight_bound_ratio(&self.face(f), &self.section(s)),
            ),
            Constraint::pairwise(
                "block_solid_ratio",
                weights.solid,
                1.0,
                FACES,
                SECTIONS,
                move |f, s| self.solid_check_ratio(&self.face(f), &self.section(s)),
            ),
        ]
    }
}

#[instrument(skip_all, name = "blocks_workflow")]
pub fn run(
    request: &BlockRequest,
    catalogs: &BlockCatalogs,
    config: &OptimizationConfig,
    reporter: &ProgressReporter,
) -> Result<BlockReport, EngineError> {
    request.validate()?;
    request.weights.validate(&config.penalties)?;
    info!(
        faces = catalogs.faces.len(),
        sections = catalogs.sections.len(),
        nubs = catalogs.nubs.len(),
        "Starting block geometry optimization."
    );

    let model = BlockModel::new(*request, catalogs);
    let outcome = pipeline::optimize(&model, config, reporter)?;
    let report = model.report(&outcome.selection, outcome.summary)?;

    info!(
        block = %format!("{} / {} / {}", report.block.face, report.block.section, report.block.nubs),
        concrete_m3_per_m2 = report.concrete_m3_per_m2,
        all_checks_pass = report.all_checks_pass,
        "Block geometry optimization complete."
    );
    Ok(report)
}
