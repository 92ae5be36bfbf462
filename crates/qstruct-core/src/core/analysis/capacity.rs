use crate::core::models::member::MemberSize;

/// Sentinel ratio for a member whose capacity is zero, negative or undefined.
pub const INFEASIBLE_RATIO: f64 = f64::INFINITY;

pub const COLUMN_PHI: f64 = 0.65; // tied column
pub const COLUMN_AXIAL_REDUCTION: f64 = 0.80;
pub const BEAM_PHI: f64 = 0.90;
pub const STRESS_BLOCK_FACTOR: f64 = 0.85;
pub const BEAM_COVER_MM: f64 = 50.0;
pub const SPAN_TO_DEPTH_LIMIT: f64 = 16.0; // simply supported
pub const FOOTING_THICKNESS_MM: f64 = 300.0;

/// Design axial capacity of a tied column (kN).
///
/// `φ·0.80·[0.85·f'c·(Ag − Ast) + fy·Ast]` with `Ast = ρ·Ag`.
#[inline]
pub fn column_axial_capacity(size: &MemberSize, fc_mpa: f64, fy_mpa: f64, steel_ratio: f64) -> f64 {
    let gross = size.area_mm2();
    let steel = steel_ratio * gross;
    let nominal = STRESS_BLOCK_FACTOR * fc_mpa * (gross - steel) + fy_mpa * steel;
    (COLUMN_PHI * COLUMN_AXIAL_REDUCTION * nominal / 1000.0).max(0.0)
}

/// Design moment capacity of a singly reinforced rectangular beam (kN·m).
///
/// Returns zero when the section is too shallow to have an effective depth.
#[inline]
pub fn beam_moment_capacity(size: &MemberSize, fc_mpa: f64, fy_mpa: f64, steel_ratio: f64) -> f64 {
    let b = size.width_mm;
    let d = size.depth_mm - BEAM_COVER_MM;
    if b <= 0.0 || d <= 0.0 || fc_mpa <= 0.0 {
        return 0.0;
    }
    let steel_area = steel_ratio * b * d;
    let block_depth = steel_area * fy_mpa / (STRESS_BLOCK_FACTOR * fc_mpa * b);
    let nominal = steel_area * fy_mpa * (d - block_depth / 2.0);
    (BEAM_PHI * nominal / 1e6).max(0.0)
}

/// Simply supported beam moment `wL²/8` (kN·m) for a line load in kN/m.
#[inline]
pub fn simple_span_moment(line_load_kn_m: f64, span_m: f64) -> f64 {
    line_load_kn_m * span_m * span_m / 8.0
}

/// `demand / capacity`, or [`INFEASIBLE_RATIO`] when the capacity cannot carry anything.
#[inline]
pub fn demand_ratio(demand: f64, capacity: f64) -> f64 {
    if !(capacity.is_finite() && capacity > 0.0) {
        return INFEASIBLE_RATIO;
    }
    let ratio = demand / capacity;
    if ratio.is_nan() { INFEASIBLE_RATIO } else { ratio }
}

/// Span-to-depth surrogate: required minimum depth over the actual depth.
#[inline]
pub fn deflection_ratio(depth_mm: f64, max_span_m: f64) -> f64 {
    let min_depth_mm = max_span_m * 1000.0 / SPAN_TO_DEPTH_LIMIT;
    demand_ratio(min_depth_mm, depth_mm)
}

/// Soil pressure under one footing (kPa).
#[inline]
pub fn footing_pressure(column_load_kn: f64, footing: &MemberSize) -> f64 {
    let area = footing.area_m2();
    if area > 0.0 {
        column_load_kn / area
    } else {
        INFEASIBLE_RATIO
    }
}
