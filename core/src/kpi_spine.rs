//! KPI spine — the seven-field monthly P&L computed from drivers.
//!
//! This is the heart of the engine and it is REACTIVE in the purest
//! sense: one output row per input row, each period computed from its
//! own drivers only, no cross-period state.
//!
//! Null policy: any missing operand makes the whole formula null, and
//! the null propagates transitively (a null COGS forces a null gross
//! profit and a null net profit). A driver is never silently treated
//! as zero.

use crate::driver::{DriverKey, DriverRow};
use serde::{Deserialize, Serialize};

/// The canonical seven-field P&L for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSpineRow {
    pub period: String,
    pub total_revenue: Option<f64>,
    pub cogs: Option<f64>,
    pub gross_profit: Option<f64>,
    pub wage_costs: Option<f64>,
    pub operating_expenses: Option<f64>,
    pub non_operating_expenses: Option<f64>,
    pub net_profit: Option<f64>,
}

/// Compute the KPI spine for a whole driver series.
/// Order-preserving; one output row per input row.
pub fn compute_kpi_spine(series: &[DriverRow]) -> Vec<KpiSpineRow> {
    series.iter().map(compute_row).collect()
}

fn compute_row(row: &DriverRow) -> KpiSpineRow {
    let covers = row.get(DriverKey::Covers);

    // ── Revenue ────────────────────────────────────────────
    let gross_revenue = mul2(covers, row.get(DriverKey::AverageCheck));
    let total_revenue = map2(gross_revenue, row.get(DriverKey::DiscountRate), |g, d| {
        g * (1.0 - d)
    });

    // ── COGS ───────────────────────────────────────────────
    let food_cost_base = add2(
        row.get(DriverKey::FoodCostProtein),
        row.get(DriverKey::FoodCostProduce),
    );
    let cogs = map2(
        mul2(covers, food_cost_base),
        mul2(
            row.get(DriverKey::WastePct).map(|w| 1.0 + w),
            row.get(DriverKey::MenuMix).map(|m| 1.0 + m),
        ),
        |base, uplift| base * uplift,
    );

    // ── Labor ──────────────────────────────────────────────
    let wage_costs = map2(
        mul2(row.get(DriverKey::LaborHours), row.get(DriverKey::WageRate)),
        row.get(DriverKey::OvertimePct),
        |base, ot| base * (1.0 + ot),
    );

    // ── Operating expenses ─────────────────────────────────
    let delivery_expense = mul2(
        mul2(total_revenue, row.get(DriverKey::ChannelMix)),
        row.get(DriverKey::DeliveryCommission),
    );
    let operating_expenses = add2(
        add2(row.get(DriverKey::Rent), row.get(DriverKey::Utilities)),
        add2(row.get(DriverKey::Marketing), delivery_expense),
    );

    // ── Non-operating ──────────────────────────────────────
    let non_operating_expenses = add2(
        row.get(DriverKey::InterestExpense),
        row.get(DriverKey::OneTimeCosts),
    );

    // ── Bottom line ────────────────────────────────────────
    let gross_profit = map2(total_revenue, cogs, |r, c| r - c);
    let net_profit = map2(
        map2(gross_profit, wage_costs, |g, w| g - w),
        add2(operating_expenses, non_operating_expenses),
        |p, e| p - e,
    );

    KpiSpineRow {
        period: row.period.clone(),
        total_revenue,
        cogs,
        gross_profit,
        wage_costs,
        operating_expenses,
        non_operating_expenses,
        net_profit,
    }
}

/// Operating profit before non-operating items (EBITDA-equivalent for
/// this model). Used by the breakpoint cascade.
pub fn operating_profit(row: &KpiSpineRow) -> Option<f64> {
    map2(
        map2(row.gross_profit, row.wage_costs, |g, w| g - w),
        row.operating_expenses,
        |p, o| p - o,
    )
}

fn map2(a: Option<f64>, b: Option<f64>, f: impl FnOnce(f64, f64) -> f64) -> Option<f64> {
    Some(f(a?, b?))
}

fn add2(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    map2(a, b, |x, y| x + y)
}

fn mul2(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    map2(a, b, |x, y| x * y)
}
