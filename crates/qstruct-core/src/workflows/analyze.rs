use crate::core::analysis::{FrameAnalysis, FrameEvaluation, Reinforcement, Thresholds};
use crate::core::models::design::{FrameDesign, StructureInput};
use crate::engine::error::EngineError;
use tracing::{debug, instrument};

/// Evaluates one design against the structural checks without optimizing.
#[instrument(skip_all, name = "analyze_workflow")]
pub fn run(
    structure: &StructureInput,
    design: &FrameDesign,
    reinforcement: Reinforcement,
    thresholds: &Thresholds,
) -> Result<FrameEvaluation, EngineError> {
    structure.validate()?;
    design.validate()?;
    let evaluation =
        FrameAnalysis::with_reinforcement(*structure, reinforcement).evaluate(design, thresholds);
    debug!(
        volume_m3 = evaluation.volumes.total_m3,
        all_satisfied = evaluation.checks.all_satisfied,
        "Design evaluated."
    );
    Ok(evaluation)
}
