//! Shock applier tests: identity laws, windows, ordering, curve
//! scaling, null handling, and mitigation parity.

use stressplan_core::curve::CurveKind;
use stressplan_core::driver::{DriverKey, DriverRow};
use stressplan_core::kpi_spine::compute_kpi_spine;
use stressplan_core::shock::{
    apply_adjustments, apply_shocks, apply_selected, Mitigation, MitigationCategory,
    MitigationSelection, Scenario, Severity, Shock, ShockMode,
};

fn steady_row(period: &str) -> DriverRow {
    DriverRow::empty(period)
        .with(DriverKey::Covers, 1000.0)
        .with(DriverKey::AverageCheck, 40.0)
        .with(DriverKey::DiscountRate, 0.0)
        .with(DriverKey::ChannelMix, 0.25)
        .with(DriverKey::FoodCostProtein, 6.0)
        .with(DriverKey::FoodCostProduce, 3.0)
        .with(DriverKey::WastePct, 0.0)
        .with(DriverKey::MenuMix, 0.0)
        .with(DriverKey::LaborHours, 800.0)
        .with(DriverKey::WageRate, 15.0)
        .with(DriverKey::OvertimePct, 0.0)
        .with(DriverKey::Rent, 5000.0)
        .with(DriverKey::Utilities, 1000.0)
        .with(DriverKey::Marketing, 500.0)
        .with(DriverKey::DeliveryCommission, 0.3)
        .with(DriverKey::InterestExpense, 200.0)
        .with(DriverKey::OneTimeCosts, 0.0)
}

fn steady_series(months: usize) -> Vec<DriverRow> {
    (0..months).map(|i| steady_row(&format!("M{i:02}"))).collect()
}

fn scenario_with(shocks: Vec<Shock>, curve: Option<CurveKind>) -> Scenario {
    Scenario {
        id: "test".to_string(),
        name: "test scenario".to_string(),
        description: String::new(),
        shocks,
        probability: 0.5,
        severity: Severity::Moderate,
        risk_score: 50.0,
        shock_curve: curve,
        expected_to_break: false,
        break_reason: None,
        evidence_refs: vec![],
    }
}

fn shock(driver: DriverKey, mode: ShockMode, value: f64, start: usize, duration: usize) -> Shock {
    Shock {
        driver,
        mode,
        value,
        start_month_offset: start,
        duration_months: duration,
    }
}

#[test]
fn empty_shock_list_is_identity() {
    let series = steady_series(6);
    let out = apply_shocks(&series, &scenario_with(vec![], None));
    assert_eq!(out, series);
}

#[test]
fn multiply_by_one_is_identity_for_any_duration() {
    let series = steady_series(6);
    for duration in 1..=6 {
        let scenario = scenario_with(
            vec![shock(DriverKey::Covers, ShockMode::Multiply, 1.0, 0, duration)],
            None,
        );
        assert_eq!(apply_shocks(&series, &scenario), series);
    }
}

/// Curve shaping scales the distance from identity, so multiply-by-one
/// stays identity even under a decay curve.
#[test]
fn multiply_by_one_is_identity_under_curve() {
    let series = steady_series(6);
    let scenario = scenario_with(
        vec![shock(DriverKey::Covers, ShockMode::Multiply, 1.0, 0, 6)],
        Some(CurveKind::Decay),
    );
    assert_eq!(apply_shocks(&series, &scenario), series);
}

/// Active iff start <= i < start + duration.
#[test]
fn window_bounds_are_half_open() {
    let series = steady_series(6);
    let scenario = scenario_with(
        vec![shock(DriverKey::Covers, ShockMode::Set, 500.0, 2, 3)],
        None,
    );
    let out = apply_shocks(&series, &scenario);

    for (i, row) in out.iter().enumerate() {
        let expected = if (2..5).contains(&i) { 500.0 } else { 1000.0 };
        assert_eq!(row.get(DriverKey::Covers), Some(expected), "month {i}");
    }
}

/// Same-driver shocks in one period stack sequentially in list order.
#[test]
fn shocks_apply_in_list_order() {
    let series = steady_series(1);

    let add_then_mul = scenario_with(
        vec![
            shock(DriverKey::Rent, ShockMode::Add, 1000.0, 0, 1),
            shock(DriverKey::Rent, ShockMode::Multiply, 2.0, 0, 1),
        ],
        None,
    );
    let mul_then_add = scenario_with(
        vec![
            shock(DriverKey::Rent, ShockMode::Multiply, 2.0, 0, 1),
            shock(DriverKey::Rent, ShockMode::Add, 1000.0, 0, 1),
        ],
        None,
    );

    let a = apply_shocks(&series, &add_then_mul);
    let b = apply_shocks(&series, &mul_then_add);
    assert_eq!(a[0].get(DriverKey::Rent), Some(12_000.0)); // (5000+1000)*2
    assert_eq!(b[0].get(DriverKey::Rent), Some(11_000.0)); // 5000*2+1000
}

/// A null driver is never repaired, not even by `set`.
#[test]
fn null_driver_stays_null() {
    let mut series = steady_series(3);
    series[1].set(DriverKey::Covers, None);

    let scenario = scenario_with(
        vec![
            shock(DriverKey::Covers, ShockMode::Multiply, 0.5, 0, 3),
            shock(DriverKey::Covers, ShockMode::Set, 777.0, 0, 3),
        ],
        None,
    );
    let out = apply_shocks(&series, &scenario);

    assert_eq!(out[0].get(DriverKey::Covers), Some(777.0));
    assert_eq!(out[1].get(DriverKey::Covers), None);
    assert_eq!(out[2].get(DriverKey::Covers), Some(777.0));
}

/// On a flat baseline the decay exponent is 1, so a 3-month decaying
/// add applies full strength, half strength, then nothing.
#[test]
fn decay_curve_scales_added_amounts() {
    let series = steady_series(3);
    let scenario = scenario_with(
        vec![shock(DriverKey::Marketing, ShockMode::Add, 100.0, 0, 3)],
        Some(CurveKind::Decay),
    );
    let out = apply_shocks(&series, &scenario);

    let marketing: Vec<f64> = out
        .iter()
        .filter_map(|r| r.get(DriverKey::Marketing))
        .collect();
    assert!((marketing[0] - 600.0).abs() < 1e-9);
    assert!((marketing[1] - 550.0).abs() < 1e-9);
    assert!((marketing[2] - 500.0).abs() < 1e-9);
}

/// `set` states an absolute target: the curve never scales it.
#[test]
fn set_shocks_ignore_the_curve() {
    let series = steady_series(4);
    let scenario = scenario_with(
        vec![shock(DriverKey::Covers, ShockMode::Set, 100.0, 0, 4)],
        Some(CurveKind::Recovery),
    );
    let out = apply_shocks(&series, &scenario);

    for row in &out {
        assert_eq!(row.get(DriverKey::Covers), Some(100.0));
    }
}

/// The documented stress example: a 0.9 covers multiplier strictly
/// lowers revenue for the shocked month.
#[test]
fn covers_shock_lowers_revenue() {
    let series = steady_series(1);
    let scenario = scenario_with(
        vec![shock(DriverKey::Covers, ShockMode::Multiply, 0.9, 0, 1)],
        None,
    );
    let shocked = apply_shocks(&series, &scenario);

    assert_eq!(shocked[0].get(DriverKey::Covers), Some(900.0));

    let base_kpi = compute_kpi_spine(&series);
    let shocked_kpi = compute_kpi_spine(&shocked);
    assert_eq!(base_kpi[0].total_revenue, Some(40_000.0));
    assert!(shocked_kpi[0].total_revenue.unwrap() < base_kpi[0].total_revenue.unwrap());
}

/// The documented mitigation example: a 0.95 labor-hours adjustment
/// strictly reduces wage costs for the same period.
#[test]
fn labor_mitigation_reduces_wage_costs() {
    let series = steady_series(1);
    let mitigation = Mitigation {
        id: "trim-labor".to_string(),
        name: "Trim scheduled labor".to_string(),
        adjustments: vec![shock(DriverKey::LaborHours, ShockMode::Multiply, 0.95, 0, 1)],
        enabled: true,
        category: MitigationCategory::Labor,
        evidence_refs: vec![],
    };
    let mitigated = apply_adjustments(&series, &mitigation);

    let base = compute_kpi_spine(&series);
    let out = compute_kpi_spine(&mitigated);
    assert!(out[0].wage_costs.unwrap() < base[0].wage_costs.unwrap());
    assert!((out[0].wage_costs.unwrap() - 11_400.0).abs() < 1e-9);
}

/// Only mitigations that are both enabled and selected apply.
#[test]
fn selection_gates_mitigations() {
    let series = steady_series(1);
    let make = |id: &str, enabled: bool, value: f64| Mitigation {
        id: id.to_string(),
        name: id.to_string(),
        adjustments: vec![shock(DriverKey::Rent, ShockMode::Add, value, 0, 1)],
        enabled,
        category: MitigationCategory::Cost,
        evidence_refs: vec![],
    };
    let mitigations = vec![
        make("selected-enabled", true, -1000.0),
        make("selected-disabled", false, -100.0),
        make("unselected", true, -10.0),
    ];
    let selection = MitigationSelection::of(["selected-enabled", "selected-disabled"]);

    let out = apply_selected(&series, &mitigations, &selection);
    assert_eq!(out[0].get(DriverKey::Rent), Some(4_000.0));
}

/// The applier is non-destructive: the input series is untouched.
#[test]
fn applier_does_not_mutate_input() {
    let series = steady_series(3);
    let original = series.clone();
    let scenario = scenario_with(
        vec![shock(DriverKey::Covers, ShockMode::Multiply, 0.5, 0, 3)],
        None,
    );
    let _ = apply_shocks(&series, &scenario);
    assert_eq!(series, original);
}
