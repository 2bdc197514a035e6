//! Shock application — the one algorithm behind scenarios and
//! mitigations.
//!
//! A shock (stress) and an adjustment (countermeasure) are the same
//! record: a timed, bounded perturbation of one driver. Both paths use
//! identical window, ordering, and null rules, so a mitigation is
//! literally a scenario pointed the other way.
//!
//! RULES:
//!   - A shock is active for period i iff
//!     start_month_offset <= i < start_month_offset + duration_months.
//!   - Shocks on the same driver in the same period apply sequentially
//!     in list order. Order is part of the contract.
//!   - A null driver stays null. Shocks never repair missing data.
//!   - Curve shaping scales add/multiply strength only; `set` states an
//!     absolute target and is never scaled.

use crate::curve::{self, CurveKind};
use crate::driver::{DriverKey, DriverRow};
use crate::kpi_spine::compute_kpi_spine;
use crate::types::MonthIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ── Shock records ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShockMode {
    Add,
    Multiply,
    Set,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shock {
    pub driver: DriverKey,
    pub mode: ShockMode,
    pub value: f64,
    #[serde(default)]
    pub start_month_offset: MonthIndex,
    pub duration_months: usize,
}

impl Shock {
    pub fn is_active(&self, month: MonthIndex) -> bool {
        month >= self.start_month_offset && month < self.start_month_offset + self.duration_months
    }
}

/// A mitigation adjustment is structurally a shock; one algorithm backs
/// both.
pub type Adjustment = Shock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Moderate,
    Severe,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub description: String,
    pub shocks: Vec<Shock>,
    /// Probability of the scenario materializing, in [0, 1].
    pub probability: f64,
    pub severity: Severity,
    /// Authored risk score, in [0, 100].
    pub risk_score: f64,
    /// Optional magnitude shaping applied uniformly to all shocks.
    pub shock_curve: Option<CurveKind>,
    /// The author expects this scenario to break the plan; the cascade
    /// re-tests with loosened thresholds when the strict rules pass.
    #[serde(default)]
    pub expected_to_break: bool,
    #[serde(default)]
    pub break_reason: Option<String>,
    #[serde(default)]
    pub evidence_refs: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MitigationCategory {
    Revenue,
    Cost,
    Labor,
    Financing,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mitigation {
    pub id: String,
    pub name: String,
    pub adjustments: Vec<Adjustment>,
    pub enabled: bool,
    pub category: MitigationCategory,
    #[serde(default)]
    pub evidence_refs: Vec<String>,
}

/// Which mitigations a caller has toggled on for a given evaluation.
/// This is session state modeled OUTSIDE the engine: the engine only
/// ever sees it as an explicit argument.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MitigationSelection {
    pub selected: BTreeSet<String>,
}

impl MitigationSelection {
    pub fn of<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selected: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.selected.contains(id)
    }
}

// ── Application ──────────────────────────────────────────────────────────────

/// Apply a scenario's shocks to a driver series, returning a new series.
///
/// If the scenario configures a curve, the exponent derives from the
/// input series' own KPI spine (the pre-shock baseline), and each shock
/// gets a curve sized to its own window.
pub fn apply_shocks(series: &[DriverRow], scenario: &Scenario) -> Vec<DriverRow> {
    let curves = scenario.shock_curve.map(|kind| {
        let e = curve::curve_exponent(&compute_kpi_spine(series));
        scenario
            .shocks
            .iter()
            .map(|s| curve::build_curve_with_exponent(kind, s.duration_months, e))
            .collect::<Vec<_>>()
    });
    apply_timed_shocks(series, &scenario.shocks, curves.as_deref())
}

/// Apply one mitigation's adjustments to a driver series. Mitigations
/// are never curve-shaped; a countermeasure is modeled at the strength
/// its author stated.
pub fn apply_adjustments(series: &[DriverRow], mitigation: &Mitigation) -> Vec<DriverRow> {
    apply_timed_shocks(series, &mitigation.adjustments, None)
}

/// Apply every mitigation that is both enabled and selected, in list
/// order. The selection is the caller's bundle/toggle state.
pub fn apply_selected(
    series: &[DriverRow],
    mitigations: &[Mitigation],
    selection: &MitigationSelection,
) -> Vec<DriverRow> {
    let mut out = series.to_vec();
    for mitigation in mitigations {
        if mitigation.enabled && selection.contains(&mitigation.id) {
            out = apply_adjustments(&out, mitigation);
        }
    }
    out
}

/// The shared applier. `curves`, when present, holds one magnitude
/// curve per shock, indexed by the shock's relative month-in-window.
fn apply_timed_shocks(
    series: &[DriverRow],
    shocks: &[Shock],
    curves: Option<&[Vec<f64>]>,
) -> Vec<DriverRow> {
    series
        .iter()
        .enumerate()
        .map(|(month, row)| {
            let mut out = row.clone();
            for (shock_idx, shock) in shocks.iter().enumerate() {
                if !shock.is_active(month) {
                    continue;
                }
                let magnitude = curves
                    .and_then(|c| c.get(shock_idx))
                    .and_then(|c| c.get(month - shock.start_month_offset))
                    .copied()
                    .unwrap_or(1.0);
                let current = out.get(shock.driver);
                out.set(shock.driver, apply_one(current, shock, magnitude));
            }
            out
        })
        .collect()
}

/// Apply a single shock to a single driver value. Null stays null.
///
/// Curve scaling: `add` scales the added amount; `multiply` scales the
/// distance of the factor from 1 (so magnitude 0 means "no shock", not
/// "multiply by 0"); `set` ignores the curve entirely.
fn apply_one(current: Option<f64>, shock: &Shock, magnitude: f64) -> Option<f64> {
    let value = current?;
    Some(match shock.mode {
        ShockMode::Add => value + shock.value * magnitude,
        ShockMode::Multiply => value * (1.0 + (shock.value - 1.0) * magnitude),
        ShockMode::Set => shock.value,
    })
}
