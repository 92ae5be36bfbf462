use crate::error::Result;
use qstruct::core::analysis::frame::{FrameEvaluation, RatioCheck};
use qstruct::core::models::block::CORES_PER_BLOCK;
use qstruct::core::models::catalog::{MaterialCatalogs, MemberCatalogs};
use qstruct::workflows::blocks::BlockReport;
use qstruct::workflows::materials::MaterialReport;
use qstruct::workflows::sizing::SizingReport;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

fn ratio_cell(ratio: f64) -> String {
    if ratio.is_finite() {
        format!("{:.3}", ratio)
    } else {
        "∞".to_string()
    }
}

fn check_row(out: &mut String, label: &str, check: &RatioCheck) {
    let _ = writeln!(
        out,
        "  {:<18} {:>10} / {:<10} ratio {:>7} (≤ {:.2})  {}",
        label,
        format!("{:.1}", check.demand),
        format!("{:.1}", check.capacity),
        ratio_cell(check.ratio),
        check.threshold,
        if check.passes { "OK" } else { "FAIL" }
    );
}

pub fn evaluation_table(evaluation: &FrameEvaluation) -> String {
    let d = &evaluation.design;
    let v = &evaluation.volumes;
    let l = &evaluation.loads;
    let c = &evaluation.checks;
    let mut out = String::new();
    let _ = writeln!(out, "Design");
    let _ = writeln!(out, "  column   {} mm", d.column);
    let _ = writeln!(out, "  beam     {} mm", d.beam);
    let _ = writeln!(out, "  slab     {} mm", d.slab_thickness_mm);
    let _ = writeln!(out, "  footing  {} mm", d.footing);
    let _ = writeln!(out, "Loads");
    let _ = writeln!(out, "  column service   {:.1} kN", l.column_service_kn);
    let _ = writeln!(out, "  column factored  {:.1} kN", l.column_factored_kn);
    let _ = writeln!(out, "  max beam moment  {:.1} kN·m", l.max_beam_moment_knm);
    let _ = writeln!(out, "Checks (demand / capacity)");
    check_row(&mut out, "column axial", &c.column);
    check_row(&mut out, "beam flexure", &c.beam);
    check_row(&mut out, "beam deflection", &c.deflection);
    check_row(&mut out, "footing bearing", &c.footing);
    let _ = writeln!(out, "Concrete volume");
    let _ = writeln!(
        out,
        "  slab {:.3}  columns {:.3}  beams {:.3}  footings {:.3}  total {:.3} m³",
        v.slab_m3, v.columns_m3, v.beams_m3, v.footings_m3, v.total_m3
    );
    let _ = writeln!(out, "  weight {:.1} kN", evaluation.weight_kn);
    let _ = write!(
        out,
        "All checks satisfied: {}",
        if c.all_satisfied { "yes" } else { "no" }
    );
    out
}

pub fn sizing_summary(report: &SizingReport) -> String {
    let mut out = evaluation_table(&report.evaluation);
    let cmp = &report.comparison;
    let s = &report.solver;
    let _ = writeln!(out);
    let _ = writeln!(out, "Compared with the default design");
    let _ = writeln!(
        out,
        "  default {:.3} m³ → optimized {:.3} m³  (saves {:.3} m³, {:.1}%, ≈ {:.0} in concrete)",
        cmp.default_volume_m3,
        cmp.optimized_volume_m3,
        cmp.savings_m3,
        cmp.savings_percent,
        cmp.cost_savings
    );
    let _ = writeln!(out, "Solver");
    let _ = writeln!(
        out,
        "  backend {}  reads {}  seed {}  variables {}",
        s.backend, s.num_reads, s.seed, report.encoding.num_variables
    );
    if let Some(reason) = &s.fallback_reason {
        let _ = writeln!(out, "  external solver failed: {}", reason);
    }
    let _ = write!(
        out,
        "  raw energy {:.3} (one-hot: {})  final energy {:.3} after {} refinement change(s)",
        s.raw_energy,
        if s.raw_one_hot { "yes" } else { "no" },
        s.final_energy,
        s.refinement_changes
    );
    out
}

pub fn material_summary(report: &MaterialReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Materials");
    let _ = writeln!(
        out,
        "  concrete  f'c {} MPa at {:.0} per m³",
        report.concrete_grade.fc_mpa, report.concrete_grade.price_per_m3
    );
    let _ = writeln!(out, "  column steel  {:.1} %", report.column_steel_percent);
    let _ = writeln!(out, "  beam steel    {:.1} %", report.beam_steel_percent);
    let _ = writeln!(out, "Checks");
    let _ = writeln!(out, "  column stress ratio {}", ratio_cell(report.column_stress_ratio));
    let _ = writeln!(out, "  beam stress ratio   {}", ratio_cell(report.beam_stress_ratio));
    let _ = writeln!(out, "Quantities and cost");
    let _ = writeln!(
        out,
        "  concrete {:.3} m³ ({:.0})  steel {:.1} kg ({:.0})",
        report.concrete_volume_m3, report.concrete_cost, report.steel_weight_kg, report.steel_cost
    );
    let _ = writeln!(out, "  total {:.0}", report.total_cost);
    let _ = write!(
        out,
        "All checks pass: {}",
        if report.all_checks_pass { "yes" } else { "no" }
    );
    out
}

pub fn block_summary(report: &BlockReport) -> String {
    let b = &report.block;
    let mut out = String::new();
    let _ = writeln!(out, "Block");
    let _ = writeln!(
        out,
        "  {} × {} × {} mm (length × width × height)",
        b.face.length_mm, b.section.width_mm, b.face.height_mm
    );
    let _ = writeln!(out, "  cores  {} × ⌀{} mm", CORES_PER_BLOCK, b.section.core_diameter_mm);
    let _ = writeln!(out, "  nubs   {}", b.nubs);
    let _ = writeln!(
        out,
        "  solid {:.1} %  weight {:.2} kg  {:.2} per m²  concrete {:.4} m³/m²",
        report.solid_ratio * 100.0,
        report.weight_kg,
        report.blocks_per_m2,
        report.concrete_m3_per_m2
    );
    let _ = writeln!(
        out,
        "  bars up to ⌀{} mm, {} per block",
        report.rebar.max_bar_diameter_mm, report.rebar.total_bars
    );
    let _ = writeln!(out, "Checks");
    let _ = writeln!(
        out,
        "  shell strength {}  ({:.1} kN/m capacity)",
        ratio_cell(report.strength_ratio),
        report.strength_capacity_kn_m
    );
    let _ = writeln!(out, "  handling weight {}", ratio_cell(report.weight_ratio));
    let _ = writeln!(out, "  solid fraction  {}", ratio_cell(report.solid_check_ratio));
    let w = &report.wall;
    let _ = writeln!(out, "Wall {} × {} m", w.length_m, w.height_m);
    let _ = writeln!(
        out,
        "  {} blocks ({:.0} kg)  grout {:.3} m³  rebar {:.1} m",
        w.blocks, w.block_weight_kg, w.grout_m3, w.rebar_m
    );
    let _ = write!(
        out,
        "All checks pass: {}",
        if report.all_checks_pass { "yes" } else { "no" }
    );
    out
}

#[derive(Serialize)]
pub struct CatalogListing<'a> {
    pub members: &'a MemberCatalogs,
    pub materials: &'a MaterialCatalogs,
}

pub fn catalog_listing(members: &MemberCatalogs, materials: &MaterialCatalogs) -> String {
    let join = |items: Vec<String>| items.join(", ");
    let mut out = String::new();
    let _ = writeln!(
        out,
        "columns  ({:>2}): {}",
        members.columns.len(),
        join(members.columns.iter().map(ToString::to_string).collect())
    );
    let _ = writeln!(
        out,
        "beams    ({:>2}): {}",
        members.beams.len(),
        join(members.beams.iter().map(ToString::to_string).collect())
    );
    let _ = writeln!(
        out,
        "slabs    ({:>2}): {}",
        members.slabs.len(),
        join(members.slabs.iter().map(|t| format!("{t}")).collect())
    );
    let _ = writeln!(
        out,
        "footings ({:>2}): {}",
        members.footings.len(),
        join(members.footings.iter().map(ToString::to_string).collect())
    );
    let _ = writeln!(
        out,
        "concrete grades: {}",
        join(
            materials
                .concrete_grades
                .iter()
                .map(|g| format!("{} MPa @ {}", g.fc_mpa, g.price_per_m3))
                .collect()
        )
    );
    let _ = write!(
        out,
        "steel ratios (%): {}  at {} per kg",
        join(
            materials
                .steel_ratios_percent
                .iter()
                .map(|r| format!("{r}"))
                .collect()
        ),
        materials.steel_price_per_kg
    );
    out
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qstruct::core::analysis::{FrameAnalysis, Thresholds};
    use qstruct::core::models::block::BlockCatalogs;
    use qstruct::core::models::design::{FrameDesign, StructureInput};
    use qstruct::engine::config::{OptimizationConfigBuilder, SolverSelection};
    use qstruct::engine::progress::ProgressReporter;
    use qstruct::workflows::blocks::{self, BlockRequest};

    fn reference_evaluation() -> FrameEvaluation {
        FrameAnalysis::new(StructureInput::default())
            .evaluate(&FrameDesign::reference_baseline(), &Thresholds::default())
    }

    #[test]
    fn evaluation_table_lists_every_check() {
        let table = evaluation_table(&reference_evaluation());
        for label in ["column axial", "beam flexure", "beam deflection", "footing bearing"] {
            assert!(table.contains(label), "missing {label}");
        }
        assert!(table.contains("300×450"));
        assert!(table.contains("total 7.428"));
        assert!(table.ends_with("All checks satisfied: yes"));
    }

    #[test]
    fn infinite_ratio_is_shown_as_infinity() {
        assert_eq!(ratio_cell(f64::INFINITY), "∞");
        assert_eq!(ratio_cell(0.5), "0.500");
    }

    #[test]
    fn catalog_listing_shows_all_reference_options() {
        let listing = catalog_listing(&MemberCatalogs::reference(), &MaterialCatalogs::reference());
        assert!(listing.contains("columns  (10)"));
        assert!(listing.contains("1800×1800"));
        assert!(listing.contains("45 MPa @ 7000"));
        assert!(listing.contains("at 65 per kg"));
    }

    #[test]
    fn block_summary_shows_geometry_checks_and_wall() {
        let config = OptimizationConfigBuilder::new()
            .num_reads(10)
            .seed(2)
            .solver(SolverSelection::Local)
            .build()
            .unwrap();
        let report = blocks::run(
            &BlockRequest::default(),
            &BlockCatalogs::reference(),
            &config,
            &ProgressReporter::new(),
        )
        .unwrap();
        let summary = block_summary(&report);
        assert!(summary.contains("300 × 100 × 150 mm"));
        assert!(summary.contains("cores  2 × ⌀80 mm"));
        assert!(summary.contains("shell strength 0.714"));
        assert!(summary.contains("Wall 5 × 3 m"));
        assert!(summary.contains("334 blocks"));
        assert!(summary.ends_with("All checks pass: yes"));
    }

    #[test]
    fn json_output_uses_null_for_non_finite_ratios() {
        let mut evaluation = reference_evaluation();
        evaluation.checks.column.ratio = f64::INFINITY;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evaluation.json");
        write_json(&path, &evaluation).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(parsed["checks"]["column"]["ratio"].is_null());
        assert_eq!(parsed["design"]["slab_thickness_mm"], 150.0);
    }
}
