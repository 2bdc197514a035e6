//! Derived KPIs — margins and ratios computed from the KPI spine.
//!
//! All ratios are fractions (0.68 = 68%), and every division is safe:
//! a null numerator, null denominator, or zero denominator yields null.
//! `NaN` and `Infinity` never escape this module.

use crate::kpi_spine::KpiSpineRow;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedKpiRow {
    pub period: String,
    pub gross_margin_pct: Option<f64>,
    pub cogs_pct: Option<f64>,
    pub wage_pct: Option<f64>,
    pub prime_cost: Option<f64>,
    pub prime_cost_pct: Option<f64>,
    pub net_margin: Option<f64>,
    pub breakeven_revenue: Option<f64>,
}

/// Compute derived ratios for a whole KPI series, one row per input row.
pub fn compute_derived(kpi_series: &[KpiSpineRow]) -> Vec<DerivedKpiRow> {
    kpi_series.iter().map(compute_row).collect()
}

fn compute_row(kpi: &KpiSpineRow) -> DerivedKpiRow {
    let revenue = kpi.total_revenue;

    let gross_margin_pct = safe_div(kpi.gross_profit, revenue);
    let cogs_pct = safe_div(kpi.cogs, revenue);
    let wage_pct = safe_div(kpi.wage_costs, revenue);

    let prime_cost = match (kpi.cogs, kpi.wage_costs) {
        (Some(c), Some(w)) => Some(c + w),
        _ => None,
    };
    let prime_cost_pct = safe_div(prime_cost, revenue);
    let net_margin = safe_div(kpi.net_profit, revenue);

    // Breakeven: fixed costs / gross margin. A non-positive margin has
    // no finite breakeven, so it stays null rather than exploding.
    let fixed_costs = match (
        kpi.wage_costs,
        kpi.operating_expenses,
        kpi.non_operating_expenses,
    ) {
        (Some(w), Some(o), Some(n)) => Some(w + o + n),
        _ => None,
    };
    let breakeven_revenue = match (fixed_costs, gross_margin_pct) {
        (Some(fc), Some(margin)) if margin > 0.0 => Some(fc / margin),
        _ => None,
    };

    DerivedKpiRow {
        period: kpi.period.clone(),
        gross_margin_pct,
        cogs_pct,
        wage_pct,
        prime_cost,
        prime_cost_pct,
        net_margin,
        breakeven_revenue,
    }
}

/// `a / b`, null when `a` is null, `b` is null, or `b == 0`.
pub fn safe_div(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(num), Some(den)) if den != 0.0 => Some(num / den),
        _ => None,
    }
}
