//! plan-runner: headless stress-test runner.
//!
//! Usage:
//!   plan-runner --drivers plan.json --scenario scenario.json --db runs.db
//!   plan-runner                      (built-in 12-month demo plan)

use anyhow::{Context, Result};
use stressplan_core::{
    boundary::{normalize_scenario, RawScenario},
    config::EnginePolicy,
    driver::{DriverKey, DriverRow},
    engine::PlanEngine,
    run::ComputationRun,
    shock::{Mitigation, MitigationCategory, MitigationSelection, Scenario, Shock, ShockMode},
    store::PlanStore,
};

/// File shape for --drivers input.
#[derive(serde::Deserialize)]
struct PlanFile {
    drivers: Vec<DriverRow>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let policy = match flag_value(&args, "--policy") {
        Some(path) => EnginePolicy::load(path)?,
        None => EnginePolicy::default(),
    };

    let drivers: Vec<DriverRow> = match flag_value(&args, "--drivers") {
        Some(path) => {
            let content =
                std::fs::read_to_string(path).with_context(|| format!("Cannot read {path}"))?;
            let file: PlanFile =
                serde_json::from_str(&content).with_context(|| format!("Cannot parse {path}"))?;
            file.drivers
        }
        None => demo_drivers(12),
    };

    let scenario: Scenario = match flag_value(&args, "--scenario") {
        Some(path) => {
            let content =
                std::fs::read_to_string(path).with_context(|| format!("Cannot read {path}"))?;
            let raw: RawScenario =
                serde_json::from_str(&content).with_context(|| format!("Cannot parse {path}"))?;
            normalize_scenario(raw)?
        }
        None => demo_scenario(),
    };

    println!("stressplan — plan-runner");
    println!("  db:       {db}");
    println!("  months:   {}", drivers.len());
    println!("  scenario: {}", scenario.name);
    println!();

    let store = PlanStore::open(db)?;
    store.migrate()?;
    let engine = PlanEngine::new(policy, store);

    let baseline = engine.run_baseline(&drivers)?;
    let stressed = engine.run_scenario(&baseline, &scenario)?;

    let mitigations = demo_mitigations();
    let selection = MitigationSelection::of(mitigations.iter().map(|m| m.id.clone()));
    let mitigated = engine.run_mitigated(&baseline, &stressed, &mitigations, &selection)?;

    let verdict = engine.detect(&baseline, &stressed, &scenario);

    print_summary(&engine, &baseline, &stressed, &mitigated)?;

    println!();
    println!("=== BREAKPOINT ===");
    if verdict.fails {
        println!(
            "  FAILS at month {} ({}): {}",
            verdict.first_failure_month.unwrap_or_default(),
            verdict.period.as_deref().unwrap_or("?"),
            verdict.reason.as_deref().unwrap_or("unspecified"),
        );
    } else {
        println!("  holds under '{}'", scenario.name);
    }

    Ok(())
}

fn print_summary(
    engine: &PlanEngine,
    baseline: &ComputationRun,
    stressed: &ComputationRun,
    mitigated: &ComputationRun,
) -> Result<()> {
    println!("=== RUN SUMMARY ===");
    for run in [baseline, stressed, mitigated] {
        let survival = engine.survival(run);
        let risk = engine.risk(run);
        println!(
            "  {:<10} | net Δ {:>7} | prime Δ {:>7} | survival {:.2} | risk {:+.3}",
            run.kind.name(),
            fmt_pct(run.summary.net_profit_delta_pct),
            fmt_pct(run.summary.prime_cost_delta_pct),
            survival.last().copied().unwrap_or(1.0),
            risk.score,
        );
    }
    Ok(())
}

fn fmt_pct(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:+.1}%", v * 100.0))
        .unwrap_or_else(|| "n/a".to_string())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// A steady mid-size restaurant plan with mild growth.
fn demo_drivers(months: usize) -> Vec<DriverRow> {
    (0..months)
        .map(|i| {
            DriverRow::empty(format!("M{:02}", i + 1))
                .with(DriverKey::Covers, 2400.0 * (1.0 + 0.01 * i as f64))
                .with(DriverKey::AverageCheck, 38.0)
                .with(DriverKey::DiscountRate, 0.03)
                .with(DriverKey::ChannelMix, 0.22)
                .with(DriverKey::FoodCostProtein, 6.10)
                .with(DriverKey::FoodCostProduce, 2.90)
                .with(DriverKey::WastePct, 0.04)
                .with(DriverKey::MenuMix, 0.02)
                .with(DriverKey::LaborHours, 3100.0)
                .with(DriverKey::WageRate, 16.50)
                .with(DriverKey::OvertimePct, 0.06)
                .with(DriverKey::Rent, 11_000.0)
                .with(DriverKey::Utilities, 2_400.0)
                .with(DriverKey::Marketing, 1_800.0)
                .with(DriverKey::DeliveryCommission, 0.28)
                .with(DriverKey::InterestExpense, 950.0)
                .with(DriverKey::OneTimeCosts, 0.0)
        })
        .collect()
}

fn demo_scenario() -> Scenario {
    Scenario {
        id: "demand-slump".to_string(),
        name: "Six-month demand slump".to_string(),
        description: "Neighborhood construction cuts walk-in traffic".to_string(),
        shocks: vec![
            Shock {
                driver: DriverKey::Covers,
                mode: ShockMode::Multiply,
                value: 0.82,
                start_month_offset: 2,
                duration_months: 6,
            },
            Shock {
                driver: DriverKey::Marketing,
                mode: ShockMode::Add,
                value: 600.0,
                start_month_offset: 2,
                duration_months: 6,
            },
        ],
        probability: 0.35,
        severity: stressplan_core::shock::Severity::Severe,
        risk_score: 62.0,
        shock_curve: Some(stressplan_core::curve::CurveKind::Recovery),
        expected_to_break: false,
        break_reason: None,
        evidence_refs: vec![],
    }
}

fn demo_mitigations() -> Vec<Mitigation> {
    vec![
        Mitigation {
            id: "trim-labor".to_string(),
            name: "Trim scheduled labor 5%".to_string(),
            adjustments: vec![Shock {
                driver: DriverKey::LaborHours,
                mode: ShockMode::Multiply,
                value: 0.95,
                start_month_offset: 2,
                duration_months: 6,
            }],
            enabled: true,
            category: MitigationCategory::Labor,
            evidence_refs: vec![],
        },
        Mitigation {
            id: "renegotiate-produce".to_string(),
            name: "Renegotiate produce contract".to_string(),
            adjustments: vec![Shock {
                driver: DriverKey::FoodCostProduce,
                mode: ShockMode::Multiply,
                value: 0.93,
                start_month_offset: 0,
                duration_months: 12,
            }],
            enabled: true,
            category: MitigationCategory::Cost,
            evidence_refs: vec![],
        },
    ]
}
