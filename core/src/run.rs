//! Computation runs — the immutable result of pushing one driver series
//! through the KPI spine and the derived calculator.
//!
//! RULE: a run is never mutated after it is built. When upstream inputs
//! change, the run is recomputed and the stored copy is superseded
//! whole; patching a stored run would corrupt every comparison that
//! referenced it.

use crate::derived::{compute_derived, DerivedKpiRow};
use crate::driver::DriverRow;
use crate::kpi_spine::{compute_kpi_spine, KpiSpineRow};
use crate::types::RunId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    Baseline,
    Scenario,
    Mitigated,
}

impl RunKind {
    pub fn name(self) -> &'static str {
        match self {
            RunKind::Baseline => "baseline",
            RunKind::Scenario => "scenario",
            RunKind::Mitigated => "mitigated",
        }
    }
}

/// Headline percentage deltas versus the baseline run. All `None` until
/// a baseline exists to compare against; a baseline's own summary is
/// all zeros by reflexivity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub revenue_delta_pct: Option<f64>,
    pub net_profit_delta_pct: Option<f64>,
    pub prime_cost_delta_pct: Option<f64>,
    pub gross_margin_delta_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationRun {
    pub run_id: RunId,
    pub kind: RunKind,
    /// Human label: the scenario or mitigation-bundle name.
    pub label: String,
    pub drivers: Vec<DriverRow>,
    pub kpis: Vec<KpiSpineRow>,
    pub derived: Vec<DerivedKpiRow>,
    pub summary: RunSummary,
}

impl ComputationRun {
    /// Build a run from a driver series: KPI spine, then derived rows.
    /// The summary starts empty; the orchestrator attaches it once a
    /// baseline is available.
    pub fn from_drivers(
        run_id: impl Into<RunId>,
        kind: RunKind,
        label: impl Into<String>,
        drivers: Vec<DriverRow>,
    ) -> Self {
        let kpis = compute_kpi_spine(&drivers);
        let derived = compute_derived(&kpis);
        Self {
            run_id: run_id.into(),
            kind,
            label: label.into(),
            drivers,
            kpis,
            derived,
            summary: RunSummary::default(),
        }
    }

    /// Consuming builder for the summary, preserving run immutability
    /// at rest: callers attach the summary before the run is stored.
    pub fn with_summary(mut self, summary: RunSummary) -> Self {
        self.summary = summary;
        self
    }

    pub fn horizon(&self) -> usize {
        self.kpis.len()
    }
}
