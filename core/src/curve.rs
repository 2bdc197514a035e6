//! Shock curves — per-month magnitude shaping across a shock's window.
//!
//! A curve value is the fraction of full shock strength applied at a
//! relative month within the window, always in [0, 1].
//!
//! The curvature exponent is coupled to the baseline: it derives from
//! the trend strength of baseline revenue, so scenarios on steeply
//! growing baselines decay and recover FASTER than on flat ones. This
//! coupling is deliberate (a growing business absorbs and escapes a
//! shock more quickly), not an accident of implementation.

use crate::kpi_spine::KpiSpineRow;
use crate::stats;
use serde::{Deserialize, Serialize};

/// Trend strength is clamped to this band before deriving the exponent.
pub const TREND_STRENGTH_CLAMP: f64 = 0.25;
/// The curvature exponent is kept inside this band.
pub const EXPONENT_MIN: f64 = 0.7;
pub const EXPONENT_MAX: f64 = 1.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    /// Full strength every month — no shaping.
    Flat,
    /// Starts at full strength and fades toward zero.
    Decay,
    /// Starts near zero and builds toward full strength.
    Recovery,
}

impl CurveKind {
    pub fn name(self) -> &'static str {
        match self {
            CurveKind::Flat => "flat",
            CurveKind::Decay => "decay",
            CurveKind::Recovery => "recovery",
        }
    }
}

/// Build the magnitude curve for one shock window.
///
/// `horizon_months` is the window length; index i is the relative month
/// within the window. The baseline KPI series supplies the revenue
/// trend the exponent derives from.
pub fn build_curve(
    kind: CurveKind,
    horizon_months: usize,
    baseline_kpis: &[KpiSpineRow],
) -> Vec<f64> {
    build_curve_with_exponent(kind, horizon_months, curve_exponent(baseline_kpis))
}

/// Same as [`build_curve`] with a precomputed exponent, so a scenario
/// with many shocks derives the baseline trend once.
pub fn build_curve_with_exponent(kind: CurveKind, horizon_months: usize, e: f64) -> Vec<f64> {
    (0..horizon_months)
        .map(|i| {
            let progress = if horizon_months <= 1 {
                0.0
            } else {
                i as f64 / (horizon_months - 1) as f64
            };
            let magnitude = match kind {
                CurveKind::Flat => 1.0,
                CurveKind::Decay => 1.0 - progress.powf(e),
                CurveKind::Recovery => progress.powf(e),
            };
            magnitude.clamp(0.0, 1.0)
        })
        .collect()
}

/// Curvature exponent for a baseline: `clamp(1 - trend, 0.7, 1.6)`.
pub fn curve_exponent(baseline_kpis: &[KpiSpineRow]) -> f64 {
    let trend = revenue_trend_strength(baseline_kpis);
    (1.0 - trend).clamp(EXPONENT_MIN, EXPONENT_MAX)
}

/// Normalized linear-regression slope of baseline revenue over period
/// index, clamped to [-0.25, 0.25]. Null revenue periods are excluded
/// from the fit; fewer than two observed points means no trend.
pub fn revenue_trend_strength(baseline_kpis: &[KpiSpineRow]) -> f64 {
    let points: Vec<(f64, f64)> = baseline_kpis
        .iter()
        .enumerate()
        .filter_map(|(i, row)| row.total_revenue.map(|r| (i as f64, r)))
        .collect();

    let slope = match stats::ols_slope(&points) {
        Some(s) => s,
        None => return 0.0,
    };
    let scale = stats::mean(&points.iter().map(|(_, r)| r.abs()).collect::<Vec<_>>());
    match scale {
        Some(s) if s > 0.0 => (slope / s).clamp(-TREND_STRENGTH_CLAMP, TREND_STRENGTH_CLAMP),
        _ => 0.0,
    }
}
