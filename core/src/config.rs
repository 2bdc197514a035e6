//! Engine policy configuration.
//!
//! Every threshold the breakpoint cascade tests and every weight the
//! risk scorer sums lives here as a named field with a documented
//! default. The defaults are operating policy inherited from the
//! original planning model, NOT verified domain constants — operators
//! are expected to recalibrate them per business.
//!
//! Load from a JSON policy file in production; use
//! `EnginePolicy::default()` in tests.

use serde::{Deserialize, Serialize};

/// Thresholds for the breakpoint rule cascade, in cascade order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakpointPolicy {
    /// Cash-equivalent balance the running trajectory starts from.
    pub opening_cash: f64,
    /// Rule 1: any period's cash balance below this fails outright.
    pub cash_floor: f64,
    /// Rule 2: maximum tolerated final-period cash decline vs baseline.
    pub max_final_cash_decline: f64,
    /// Rule 3: minimum tolerated gross margin in any period (fraction).
    pub min_gross_margin: f64,
    /// Rule 5: maximum tolerated final operating-profit decline.
    pub max_final_operating_decline: f64,
    /// Rule 6: minimum tolerated final covers as a ratio of baseline.
    pub min_final_covers_ratio: f64,
    /// Rule 7 (expected-to-break re-test): loosened cash decline bound.
    pub loosened_cash_decline: f64,
    /// Rule 7 (expected-to-break re-test): loosened operating decline bound.
    pub loosened_operating_decline: f64,
}

impl Default for BreakpointPolicy {
    fn default() -> Self {
        Self {
            opening_cash: 50_000.0,
            cash_floor: 0.0,
            max_final_cash_decline: 0.30,
            min_gross_margin: 0.68,
            max_final_operating_decline: 0.50,
            min_final_covers_ratio: 0.90,
            loosened_cash_decline: 0.15,
            loosened_operating_decline: 0.30,
        }
    }
}

/// Parameters of the survival hazard model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardPolicy {
    /// Floor on the profit-signal scale (stddev of net profit).
    pub profit_scale_floor: f64,
    /// Floor on the margin-signal scale (stddev of net margin).
    pub margin_scale_floor: f64,
    /// Per-period hazard ceiling applied to the sigmoid output.
    pub hazard_ceiling: f64,
    /// Running survival is clamped into [floor, ceiling] each period.
    pub survival_floor: f64,
    pub survival_ceiling: f64,
}

impl Default for HazardPolicy {
    fn default() -> Self {
        Self {
            profit_scale_floor: 1.0,
            margin_scale_floor: 0.5,
            hazard_ceiling: 0.25,
            survival_floor: 0.05,
            survival_ceiling: 0.98,
        }
    }
}

/// Fixed weights of the linear risk scorer. A transparent linear model,
/// not a fitted one; higher score means higher modeled hazard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub revenue_trend: f64,
    pub margin_volatility: f64,
    pub avg_net_margin: f64,
    pub prime_cost_pct_avg: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            revenue_trend: -0.8,
            margin_volatility: 1.2,
            avg_net_margin: -1.5,
            prime_cost_pct_avg: 1.1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnginePolicy {
    pub breakpoint: BreakpointPolicy,
    pub hazard: HazardPolicy,
    pub risk_weights: RiskWeights,
}

impl EnginePolicy {
    /// Load a policy file. Absent fields fall back to the documented
    /// defaults, so a policy file only states its overrides.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let policy: EnginePolicy = serde_json::from_str(&content)?;
        Ok(policy)
    }
}
