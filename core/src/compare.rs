//! Comparison engine — aligned deltas between two computation runs.
//!
//! Metric access goes through a closed enum, not string keys, so adding
//! a KPI field without teaching the comparison about it is a compile
//! error. Aggregation: absolute dollar fields sum across the horizon;
//! ratio fields average. Percentage deltas are relative to |reference|
//! and are null when the reference is zero or null — `Infinity` never
//! leaves this module.

use crate::derived::DerivedKpiRow;
use crate::error::{EngineError, EngineResult};
use crate::kpi_spine::KpiSpineRow;
use crate::run::{ComputationRun, RunSummary};
use crate::stats;
use serde::{Deserialize, Serialize};

/// Which run the deltas are measured against. Carried on the result so
/// a caller can present "stressed vs baseline", "mitigated vs
/// stressed", or "mitigated vs baseline" without recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceChoice {
    Baseline,
    Stressed,
    Mitigated,
}

/// The closed set of comparable metrics: the seven spine fields plus
/// the derived ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    TotalRevenue,
    Cogs,
    GrossProfit,
    WageCosts,
    OperatingExpenses,
    NonOperatingExpenses,
    NetProfit,
    GrossMarginPct,
    CogsPct,
    WagePct,
    PrimeCost,
    PrimeCostPct,
    NetMargin,
    BreakevenRevenue,
}

/// How a metric aggregates across the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Sum,
    Mean,
}

impl MetricKey {
    pub const ALL: [MetricKey; 14] = [
        MetricKey::TotalRevenue,
        MetricKey::Cogs,
        MetricKey::GrossProfit,
        MetricKey::WageCosts,
        MetricKey::OperatingExpenses,
        MetricKey::NonOperatingExpenses,
        MetricKey::NetProfit,
        MetricKey::GrossMarginPct,
        MetricKey::CogsPct,
        MetricKey::WagePct,
        MetricKey::PrimeCost,
        MetricKey::PrimeCostPct,
        MetricKey::NetMargin,
        MetricKey::BreakevenRevenue,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MetricKey::TotalRevenue => "total_revenue",
            MetricKey::Cogs => "cogs",
            MetricKey::GrossProfit => "gross_profit",
            MetricKey::WageCosts => "wage_costs",
            MetricKey::OperatingExpenses => "operating_expenses",
            MetricKey::NonOperatingExpenses => "non_operating_expenses",
            MetricKey::NetProfit => "net_profit",
            MetricKey::GrossMarginPct => "gross_margin_pct",
            MetricKey::CogsPct => "cogs_pct",
            MetricKey::WagePct => "wage_pct",
            MetricKey::PrimeCost => "prime_cost",
            MetricKey::PrimeCostPct => "prime_cost_pct",
            MetricKey::NetMargin => "net_margin",
            MetricKey::BreakevenRevenue => "breakeven_revenue",
        }
    }

    /// Dollar-level fields sum; ratios and the derived breakeven level
    /// average.
    pub fn aggregate(self) -> Aggregate {
        match self {
            MetricKey::TotalRevenue
            | MetricKey::Cogs
            | MetricKey::GrossProfit
            | MetricKey::WageCosts
            | MetricKey::OperatingExpenses
            | MetricKey::NonOperatingExpenses
            | MetricKey::NetProfit
            | MetricKey::PrimeCost => Aggregate::Sum,
            MetricKey::GrossMarginPct
            | MetricKey::CogsPct
            | MetricKey::WagePct
            | MetricKey::PrimeCostPct
            | MetricKey::NetMargin
            | MetricKey::BreakevenRevenue => Aggregate::Mean,
        }
    }

    /// The enumerated accessor: read this metric from one period's rows.
    pub fn read(self, kpi: &KpiSpineRow, derived: &DerivedKpiRow) -> Option<f64> {
        match self {
            MetricKey::TotalRevenue => kpi.total_revenue,
            MetricKey::Cogs => kpi.cogs,
            MetricKey::GrossProfit => kpi.gross_profit,
            MetricKey::WageCosts => kpi.wage_costs,
            MetricKey::OperatingExpenses => kpi.operating_expenses,
            MetricKey::NonOperatingExpenses => kpi.non_operating_expenses,
            MetricKey::NetProfit => kpi.net_profit,
            MetricKey::GrossMarginPct => derived.gross_margin_pct,
            MetricKey::CogsPct => derived.cogs_pct,
            MetricKey::WagePct => derived.wage_pct,
            MetricKey::PrimeCost => derived.prime_cost,
            MetricKey::PrimeCostPct => derived.prime_cost_pct,
            MetricKey::NetMargin => derived.net_margin,
            MetricKey::BreakevenRevenue => derived.breakeven_revenue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    pub period: String,
    pub reference: Option<f64>,
    pub comparison: Option<f64>,
    pub delta: Option<f64>,
    pub pct_delta: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub metric: MetricKey,
    pub per_period: Vec<MetricDelta>,
    pub reference_total: Option<f64>,
    pub comparison_total: Option<f64>,
    pub delta: Option<f64>,
    pub pct_delta: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub reference: ReferenceChoice,
    pub metrics: Vec<MetricComparison>,
}

impl ComparisonResult {
    pub fn metric(&self, key: MetricKey) -> Option<&MetricComparison> {
        self.metrics.iter().find(|m| m.metric == key)
    }
}

/// Compare two runs of equal horizon, metric by metric.
pub fn compare(
    reference: &ComputationRun,
    comparison: &ComputationRun,
    reference_choice: ReferenceChoice,
) -> EngineResult<ComparisonResult> {
    if reference.horizon() != comparison.horizon() {
        return Err(EngineError::LengthMismatch {
            reference: reference.horizon(),
            comparison: comparison.horizon(),
        });
    }

    let metrics = MetricKey::ALL
        .into_iter()
        .map(|metric| compare_metric(metric, reference, comparison))
        .collect();

    Ok(ComparisonResult {
        reference: reference_choice,
        metrics,
    })
}

/// Headline summary deltas for a run versus a baseline, lifted from the
/// aggregate rows of a full comparison.
pub fn summarize_against(
    baseline: &ComputationRun,
    run: &ComputationRun,
) -> EngineResult<RunSummary> {
    let result = compare(baseline, run, ReferenceChoice::Baseline)?;
    let lift = |key| result.metric(key).and_then(|m| m.pct_delta);
    Ok(RunSummary {
        revenue_delta_pct: lift(MetricKey::TotalRevenue),
        net_profit_delta_pct: lift(MetricKey::NetProfit),
        prime_cost_delta_pct: lift(MetricKey::PrimeCost),
        gross_margin_delta_pct: lift(MetricKey::GrossMarginPct),
    })
}

fn compare_metric(
    metric: MetricKey,
    reference: &ComputationRun,
    comparison: &ComputationRun,
) -> MetricComparison {
    let per_period: Vec<MetricDelta> = reference
        .kpis
        .iter()
        .zip(&reference.derived)
        .zip(comparison.kpis.iter().zip(&comparison.derived))
        .map(|((ref_kpi, ref_derived), (cmp_kpi, cmp_derived))| {
            let r = metric.read(ref_kpi, ref_derived);
            let c = metric.read(cmp_kpi, cmp_derived);
            MetricDelta {
                period: ref_kpi.period.clone(),
                reference: r,
                comparison: c,
                delta: match (r, c) {
                    (Some(r), Some(c)) => Some(c - r),
                    _ => None,
                },
                pct_delta: pct_delta(r, c),
            }
        })
        .collect();

    let reference_total = aggregate(metric, per_period.iter().map(|d| d.reference));
    let comparison_total = aggregate(metric, per_period.iter().map(|d| d.comparison));
    let delta = match (reference_total, comparison_total) {
        (Some(r), Some(c)) => Some(c - r),
        _ => None,
    };

    MetricComparison {
        metric,
        per_period,
        reference_total,
        comparison_total,
        delta,
        pct_delta: pct_delta(reference_total, comparison_total),
    }
}

/// `(comparison - reference) / |reference|`; null when the reference is
/// null or zero.
pub fn pct_delta(reference: Option<f64>, comparison: Option<f64>) -> Option<f64> {
    match (reference, comparison) {
        (Some(r), Some(c)) if r != 0.0 => Some((c - r) / r.abs()),
        _ => None,
    }
}

/// Aggregate observed (non-null) periods; null when nothing observed.
fn aggregate(metric: MetricKey, values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let observed: Vec<f64> = values.flatten().collect();
    if observed.is_empty() {
        return None;
    }
    match metric.aggregate() {
        Aggregate::Sum => Some(observed.iter().sum()),
        Aggregate::Mean => stats::mean(&observed),
    }
}
