//! Survival curve and linear risk scorer — two independent derived
//! views of one trajectory, used to rank scenario and mitigation
//! outcomes.
//!
//! The survival curve is a parametrized hazard model: each period's
//! losses (scaled by the trajectory's own dispersion) feed a logistic
//! hazard, and the running survival probability decays by that hazard.
//! The risk score is a transparent fixed-weight linear combination of
//! four trajectory features — NOT a fitted model. Weights live in
//! [`RiskWeights`] as named configuration.

use crate::config::{HazardPolicy, RiskWeights};
use crate::run::ComputationRun;
use crate::stats;
use serde::{Deserialize, Serialize};

/// The four features the linear scorer consumes. Each is a plain
/// scalar; an undefined feature (all-null trajectory) reads as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskFeatureSet {
    pub revenue_trend: f64,
    pub net_margin_volatility: f64,
    pub avg_net_margin: f64,
    pub prime_cost_pct_avg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub score: f64,
    pub features: RiskFeatureSet,
}

/// Per-period survival probabilities for a trajectory.
///
/// Monotone non-increasing by construction, modulo the clamp floor:
/// hazard is non-negative, so survival only decays, and each running
/// value is clamped into [floor, ceiling].
pub fn score_survival(policy: &HazardPolicy, run: &ComputationRun) -> Vec<f64> {
    let profits: Vec<f64> = run.kpis.iter().filter_map(|r| r.net_profit).collect();
    let margins: Vec<f64> = run.derived.iter().filter_map(|r| r.net_margin).collect();

    // Signal scales: the trajectory's own dispersion, floored so a
    // flat trajectory cannot divide by (near) zero.
    let profit_scale = stats::population_stddev(&profits)
        .unwrap_or(0.0)
        .max(policy.profit_scale_floor);
    let margin_scale = stats::population_stddev(&margins)
        .unwrap_or(0.0)
        .max(policy.margin_scale_floor);

    let mut survival = 1.0;
    run.kpis
        .iter()
        .zip(&run.derived)
        .map(|(kpi, derived)| {
            // A null period is neutral: signal 0, hazard at midpoint.
            let profit_signal = kpi.net_profit.map(|p| -p / profit_scale).unwrap_or(0.0);
            let margin_signal = derived.net_margin.map(|m| -m / margin_scale).unwrap_or(0.0);

            let hazard =
                stats::sigmoid((profit_signal + margin_signal) / 2.0) * policy.hazard_ceiling;
            survival *= 1.0 - hazard;
            survival = survival.clamp(policy.survival_floor, policy.survival_ceiling);
            survival
        })
        .collect()
}

/// Extract the risk features from a trajectory.
pub fn risk_features(run: &ComputationRun) -> RiskFeatureSet {
    let revenues: Vec<f64> = run.kpis.iter().filter_map(|r| r.total_revenue).collect();
    let margins: Vec<f64> = run.derived.iter().filter_map(|r| r.net_margin).collect();
    let prime_pcts: Vec<f64> = run.derived.iter().filter_map(|r| r.prime_cost_pct).collect();

    let revenue_trend = match (revenues.first(), revenues.last()) {
        (Some(first), Some(last)) => (last - first) / first.max(1.0),
        _ => 0.0,
    };

    RiskFeatureSet {
        revenue_trend,
        net_margin_volatility: stats::population_stddev(&margins).unwrap_or(0.0),
        avg_net_margin: stats::mean(&margins).unwrap_or(0.0),
        prime_cost_pct_avg: stats::mean(&prime_pcts).unwrap_or(0.0),
    }
}

/// The fixed-weight linear score. Higher score means higher modeled
/// hazard.
pub fn score_risk(weights: &RiskWeights, run: &ComputationRun) -> RiskScore {
    let features = risk_features(run);
    let score = features.revenue_trend * weights.revenue_trend
        + features.net_margin_volatility * weights.margin_volatility
        + features.avg_net_margin * weights.avg_net_margin
        + features.prime_cost_pct_avg * weights.prime_cost_pct_avg;
    RiskScore { score, features }
}
