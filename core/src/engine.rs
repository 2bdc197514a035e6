//! The plan engine — the thin stateful shell over the pure functions.
//!
//! RULES:
//!   - All computation is pure and deterministic; identical inputs
//!     produce identical runs, bit for bit. The engine adds only
//!     validation, run-id minting, summaries, logging, and storage.
//!   - Scenario and mitigation evaluations are mutually independent;
//!     nothing here holds mutable session state between calls.
//!   - Recomputing with unchanged inputs is idempotent at the store.

use crate::breakpoint::{detect_breakpoint, Breakpoint};
use crate::compare::{compare, summarize_against, ComparisonResult, ReferenceChoice};
use crate::config::EnginePolicy;
use crate::driver::{validate_series, DriverRow};
use crate::error::{EngineError, EngineResult};
use crate::run::{ComputationRun, RunKind};
use crate::shock::{apply_shocks, apply_selected, Mitigation, MitigationSelection, Scenario};
use crate::store::PlanStore;
use crate::survival::{score_risk, score_survival, RiskScore};

pub struct PlanEngine {
    pub policy: EnginePolicy,
    store: PlanStore,
}

impl PlanEngine {
    pub fn new(policy: EnginePolicy, store: PlanStore) -> Self {
        Self { policy, store }
    }

    /// Compute and persist the baseline run for a driver series.
    /// Its summary is all zeros by reflexivity.
    pub fn run_baseline(&self, drivers: &[DriverRow]) -> EngineResult<ComputationRun> {
        validate_series(drivers)?;
        let run_id = mint_run_id("baseline");
        let run = ComputationRun::from_drivers(
            run_id,
            RunKind::Baseline,
            "baseline",
            drivers.to_vec(),
        );
        let summary = summarize_against(&run, &run)?;
        let run = run.with_summary(summary);
        self.store.save_run(&run)?;

        log_run(&run);
        Ok(run)
    }

    /// Apply a scenario to the baseline's drivers and persist the
    /// stressed run, summarized against the baseline.
    pub fn run_scenario(
        &self,
        baseline: &ComputationRun,
        scenario: &Scenario,
    ) -> EngineResult<ComputationRun> {
        let stressed_drivers = apply_shocks(&baseline.drivers, scenario);
        let run = ComputationRun::from_drivers(
            mint_run_id(&format!("scenario-{}", scenario.id)),
            RunKind::Scenario,
            scenario.name.clone(),
            stressed_drivers,
        );
        let summary = summarize_against(baseline, &run)?;
        let run = run.with_summary(summary);
        self.store.save_run(&run)?;

        log_run(&run);
        Ok(run)
    }

    /// Apply the selected mitigations on top of a stressed run and
    /// persist the mitigated run, summarized against the baseline.
    pub fn run_mitigated(
        &self,
        baseline: &ComputationRun,
        stressed: &ComputationRun,
        mitigations: &[Mitigation],
        selection: &MitigationSelection,
    ) -> EngineResult<ComputationRun> {
        let mitigated_drivers = apply_selected(&stressed.drivers, mitigations, selection);
        let run = ComputationRun::from_drivers(
            mint_run_id("mitigated"),
            RunKind::Mitigated,
            format!("{} (mitigated)", stressed.label),
            mitigated_drivers,
        );
        let summary = summarize_against(baseline, &run)?;
        let run = run.with_summary(summary);
        self.store.save_run(&run)?;

        log_run(&run);
        Ok(run)
    }

    // ── Pass-throughs with engine policy applied ───────────────────

    pub fn compare_runs(
        &self,
        reference: &ComputationRun,
        comparison: &ComputationRun,
        reference_choice: ReferenceChoice,
    ) -> EngineResult<ComparisonResult> {
        compare(reference, comparison, reference_choice)
    }

    pub fn detect(
        &self,
        baseline: &ComputationRun,
        stressed: &ComputationRun,
        scenario: &Scenario,
    ) -> Breakpoint {
        let verdict = detect_breakpoint(&self.policy.breakpoint, baseline, stressed, scenario);
        if verdict.fails {
            log::warn!(
                "scenario '{}' breaks at month {:?}: {}",
                scenario.name,
                verdict.first_failure_month,
                verdict.reason.as_deref().unwrap_or("unspecified"),
            );
        }
        verdict
    }

    pub fn survival(&self, run: &ComputationRun) -> Vec<f64> {
        score_survival(&self.policy.hazard, run)
    }

    pub fn risk(&self, run: &ComputationRun) -> RiskScore {
        score_risk(&self.policy.risk_weights, run)
    }

    // ── Store access ───────────────────────────────────────────────

    pub fn load_run(&self, run_id: &str) -> EngineResult<ComputationRun> {
        self.store
            .load_run(run_id)?
            .ok_or_else(|| EngineError::RunNotFound {
                run_id: run_id.to_string(),
            })
    }

    pub fn list_versions(&self, prefix: &str) -> EngineResult<Vec<String>> {
        self.store.list_versions(prefix)
    }

    /// Replace a stored run after its upstream inputs changed.
    pub fn supersede(&self, run: &ComputationRun) -> EngineResult<()> {
        self.store.supersede_run(run)
    }
}

fn mint_run_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}

fn log_run(run: &ComputationRun) {
    let final_net = run
        .kpis
        .last()
        .and_then(|row| row.net_profit)
        .map(|v| format!("${v:.0}"))
        .unwrap_or_else(|| "null".to_string());
    log::info!(
        "{} run '{}' over {} months: final net profit {}, net profit delta {}",
        run.kind.name(),
        run.label,
        run.horizon(),
        final_net,
        run.summary
            .net_profit_delta_pct
            .map(|d| format!("{:+.1}%", d * 100.0))
            .unwrap_or_else(|| "n/a".to_string()),
    );
}
