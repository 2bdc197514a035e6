//! Breakpoint detector — the ordered rule cascade that decides whether
//! a stressed trajectory breaks the plan.
//!
//! This is a state machine with a single terminal decision. Rules are
//! evaluated in a fixed, documented order and the FIRST rule that fires
//! wins: later rules never overwrite an earlier failure's month or
//! reason. Only the expected-to-break re-test (rule 7) may set a reason
//! when none of the strict rules fired.
//!
//! Thresholds come from [`BreakpointPolicy`] — operating policy, not
//! magic literals.

use crate::config::BreakpointPolicy;
use crate::driver::DriverKey;
use crate::kpi_spine::{operating_profit, KpiSpineRow};
use crate::run::ComputationRun;
use crate::shock::Scenario;
use crate::types::MonthIndex;
use serde::{Deserialize, Serialize};

/// The cascade's verdict. `first_failure_month` and `reason` are set by
/// exactly one rule, or by none when the plan holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub fails: bool,
    pub first_failure_month: Option<MonthIndex>,
    pub period: Option<String>,
    pub reason: Option<String>,
}

impl Breakpoint {
    fn holds() -> Self {
        Self {
            fails: false,
            first_failure_month: None,
            period: None,
            reason: None,
        }
    }

    fn fails_at(month: MonthIndex, period: &str, reason: impl Into<String>) -> Self {
        Self {
            fails: true,
            first_failure_month: Some(month),
            period: Some(period.to_string()),
            reason: Some(reason.into()),
        }
    }
}

/// Run the cascade for a stressed run against its baseline.
///
/// Periods with null inputs are skipped by the rule that needs them;
/// missing data never trips a failure on its own.
pub fn detect_breakpoint(
    policy: &BreakpointPolicy,
    baseline: &ComputationRun,
    stressed: &ComputationRun,
    scenario: &Scenario,
) -> Breakpoint {
    let baseline_cash = cash_trajectory(&baseline.kpis, policy.opening_cash);
    let stressed_cash = cash_trajectory(&stressed.kpis, policy.opening_cash);
    let last = stressed.kpis.len().saturating_sub(1);
    let last_period = stressed
        .kpis
        .last()
        .map(|row| row.period.as_str())
        .unwrap_or("");

    // Rule 1: cash below zero in any period.
    for (month, cash) in stressed_cash.iter().enumerate() {
        if let Some(balance) = cash {
            if *balance < policy.cash_floor {
                return Breakpoint::fails_at(
                    month,
                    &stressed.kpis[month].period,
                    "cash below zero",
                );
            }
        }
    }

    let final_cash_decline = decline(
        stressed_cash.last().copied().flatten(),
        baseline_cash.last().copied().flatten(),
    );

    // Rule 2: final cash decline vs baseline beyond tolerance.
    if let Some(d) = final_cash_decline {
        if d > policy.max_final_cash_decline {
            return Breakpoint::fails_at(
                last,
                last_period,
                format!(
                    "final cash declines {:.0}% vs baseline (limit {:.0}%)",
                    d * 100.0,
                    policy.max_final_cash_decline * 100.0
                ),
            );
        }
    }

    // Rule 3: gross margin below the policy floor in any period.
    for (month, derived) in stressed.derived.iter().enumerate() {
        if let Some(margin) = derived.gross_margin_pct {
            if margin < policy.min_gross_margin {
                return Breakpoint::fails_at(
                    month,
                    &derived.period,
                    format!(
                        "gross margin {:.1}% below floor {:.1}%",
                        margin * 100.0,
                        policy.min_gross_margin * 100.0
                    ),
                );
            }
        }
    }

    let baseline_final_op = baseline.kpis.last().and_then(operating_profit);
    let stressed_final_op = stressed.kpis.last().and_then(operating_profit);

    // Rule 4: a plan that was profitable at the horizon turns negative.
    if let (Some(base), Some(stress)) = (baseline_final_op, stressed_final_op) {
        if base > 0.0 && stress < 0.0 {
            return Breakpoint::fails_at(last, last_period, "fails to turn positive");
        }
    }

    let final_op_decline = decline(stressed_final_op, baseline_final_op);

    // Rule 5: final operating profit decline beyond tolerance.
    if let Some(d) = final_op_decline {
        if d > policy.max_final_operating_decline {
            return Breakpoint::fails_at(
                last,
                last_period,
                format!(
                    "final operating profit declines {:.0}% vs baseline (limit {:.0}%)",
                    d * 100.0,
                    policy.max_final_operating_decline * 100.0
                ),
            );
        }
    }

    // Rule 6: final covers fall below the volume floor.
    let baseline_covers = baseline
        .drivers
        .last()
        .and_then(|row| row.get(DriverKey::Covers));
    let stressed_covers = stressed
        .drivers
        .last()
        .and_then(|row| row.get(DriverKey::Covers));
    if let (Some(base), Some(stress)) = (baseline_covers, stressed_covers) {
        if base > 0.0 && stress < policy.min_final_covers_ratio * base {
            return Breakpoint::fails_at(
                last,
                last_period,
                format!(
                    "final covers at {:.0}% of baseline (floor {:.0}%)",
                    stress / base * 100.0,
                    policy.min_final_covers_ratio * 100.0
                ),
            );
        }
    }

    // Rule 7: the author expected a break — re-test with loosened
    // thresholds and report the authored reason.
    if scenario.expected_to_break {
        let cash_breach = final_cash_decline
            .map(|d| d > policy.loosened_cash_decline)
            .unwrap_or(false);
        let op_breach = final_op_decline
            .map(|d| d > policy.loosened_operating_decline)
            .unwrap_or(false);
        if cash_breach || op_breach {
            let reason = scenario
                .break_reason
                .clone()
                .unwrap_or_else(|| "breaks under loosened thresholds".to_string());
            return Breakpoint::fails_at(last, last_period, reason);
        }
    }

    Breakpoint::holds()
}

/// Running cash-equivalent balance: opening cash plus cumulative net
/// profit. A period with null net profit contributes nothing and reads
/// as null; the accumulator carries forward from the last observed
/// period.
pub fn cash_trajectory(kpis: &[KpiSpineRow], opening_cash: f64) -> Vec<Option<f64>> {
    let mut balance = opening_cash;
    kpis.iter()
        .map(|row| {
            row.net_profit.map(|net| {
                balance += net;
                balance
            })
        })
        .collect()
}

/// Fractional decline of `stressed` below `base`, relative to |base|.
/// Null when either side is unobserved or base is zero.
fn decline(stressed: Option<f64>, base: Option<f64>) -> Option<f64> {
    match (base, stressed) {
        (Some(b), Some(s)) if b != 0.0 => Some((b - s) / b.abs()),
        _ => None,
    }
}
