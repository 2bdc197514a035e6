//! Generation-boundary tests: clamps, defaults, and rejection of
//! unknown enumerated keys.

use stressplan_core::boundary::{
    normalize_assumption, normalize_mitigation, normalize_scenario, RawAssumption, RawMitigation,
    RawScenario, RawShock,
};
use stressplan_core::curve::CurveKind;
use stressplan_core::driver::DriverKey;
use stressplan_core::error::EngineError;
use stressplan_core::shock::{MitigationCategory, Severity, ShockMode};

fn raw_shock(driver_key: &str, mode: &str) -> RawShock {
    RawShock {
        driver_key: driver_key.to_string(),
        mode: mode.to_string(),
        value: 0.9,
        start_month_offset: Some(0),
        duration_months: Some(3),
    }
}

fn raw_scenario(shocks: Vec<RawShock>) -> RawScenario {
    RawScenario {
        id: "scn-1".to_string(),
        name: "Generated scenario".to_string(),
        description: "from the generator".to_string(),
        shocks,
        probability: None,
        severity: None,
        risk_score: None,
        shock_curve: None,
        expected_to_break: false,
        break_reason: None,
        evidence_refs: vec!["doc-7".to_string()],
    }
}

#[test]
fn wellformed_scenario_normalizes() {
    let mut raw = raw_scenario(vec![raw_shock("covers", "multiply")]);
    raw.probability = Some(0.4);
    raw.severity = Some("severe".to_string());
    raw.risk_score = Some(62.0);
    raw.shock_curve = Some("recovery".to_string());

    let scenario = normalize_scenario(raw).unwrap();
    assert_eq!(scenario.shocks[0].driver, DriverKey::Covers);
    assert_eq!(scenario.shocks[0].mode, ShockMode::Multiply);
    assert_eq!(scenario.probability, 0.4);
    assert_eq!(scenario.severity, Severity::Severe);
    assert_eq!(scenario.risk_score, 62.0);
    assert_eq!(scenario.shock_curve, Some(CurveKind::Recovery));
    assert_eq!(scenario.evidence_refs, vec!["doc-7".to_string()]);
}

/// Out-of-range numbers are clamped at the boundary, never thrown.
#[test]
fn ranges_are_clamped() {
    let mut raw = raw_scenario(vec![raw_shock("covers", "multiply")]);
    raw.probability = Some(1.7);
    raw.risk_score = Some(180.0);
    raw.shocks[0].duration_months = Some(0);
    raw.shocks[0].start_month_offset = Some(-4);

    let scenario = normalize_scenario(raw).unwrap();
    assert_eq!(scenario.probability, 1.0);
    assert_eq!(scenario.risk_score, 100.0);
    assert_eq!(scenario.shocks[0].duration_months, 1);
    assert_eq!(scenario.shocks[0].start_month_offset, 0);

    let mut raw = raw_scenario(vec![raw_shock("covers", "multiply")]);
    raw.probability = Some(-0.3);
    raw.risk_score = Some(-5.0);
    let scenario = normalize_scenario(raw).unwrap();
    assert_eq!(scenario.probability, 0.0);
    assert_eq!(scenario.risk_score, 0.0);
}

/// Absent fields take safe defaults.
#[test]
fn absent_fields_take_defaults() {
    let mut raw = raw_scenario(vec![raw_shock("covers", "multiply")]);
    raw.shocks[0].start_month_offset = None;
    raw.shocks[0].duration_months = None;

    let scenario = normalize_scenario(raw).unwrap();
    assert_eq!(scenario.probability, 0.5);
    assert_eq!(scenario.risk_score, 50.0);
    assert_eq!(scenario.severity, Severity::Moderate);
    assert_eq!(scenario.shock_curve, None);
    assert_eq!(scenario.shocks[0].start_month_offset, 0);
    assert_eq!(scenario.shocks[0].duration_months, 1);
}

/// An unknown driver key is a shape error, named in the message.
#[test]
fn unknown_driver_is_rejected() {
    let raw = raw_scenario(vec![raw_shock("table_turns", "multiply")]);
    match normalize_scenario(raw) {
        Err(EngineError::UnknownDriver { key, context }) => {
            assert_eq!(key, "table_turns");
            assert!(context.contains("scn-1"));
        }
        other => panic!("expected UnknownDriver, got {other:?}"),
    }
}

#[test]
fn unknown_mode_and_curve_are_rejected() {
    let raw = raw_scenario(vec![raw_shock("covers", "divide")]);
    assert!(matches!(
        normalize_scenario(raw),
        Err(EngineError::UnknownField { field: "shock mode", .. })
    ));

    let mut raw = raw_scenario(vec![raw_shock("covers", "multiply")]);
    raw.shock_curve = Some("sawtooth".to_string());
    assert!(matches!(
        normalize_scenario(raw),
        Err(EngineError::UnknownField { field: "shock curve", .. })
    ));
}

/// Loose classification strings fall back to a neutral default rather
/// than failing the whole record.
#[test]
fn loose_classifications_fall_back() {
    let mut raw = raw_scenario(vec![raw_shock("covers", "multiply")]);
    raw.severity = Some("apocalyptic".to_string());
    let scenario = normalize_scenario(raw).unwrap();
    assert_eq!(scenario.severity, Severity::Moderate);

    let raw = RawMitigation {
        id: "mit-1".to_string(),
        name: "Generated mitigation".to_string(),
        adjustments: vec![raw_shock("labor_hours", "multiply")],
        enabled: None,
        category: Some("vibes".to_string()),
        evidence_refs: vec![],
    };
    let mitigation = normalize_mitigation(raw).unwrap();
    assert!(mitigation.enabled, "enabled defaults to true");
    assert_eq!(mitigation.category, MitigationCategory::Other);
}

#[test]
fn assumptions_normalize_with_evidence() {
    let raw = RawAssumption {
        id: "asm-1".to_string(),
        driver_key: "average_check".to_string(),
        description: "Check average from POS export".to_string(),
        value: 38.5,
        evidence_refs: vec!["pos-2026-06.csv".to_string()],
    };
    let assumption = normalize_assumption(raw).unwrap();
    assert_eq!(assumption.driver, DriverKey::AverageCheck);
    assert_eq!(assumption.value, 38.5);
    assert_eq!(assumption.evidence_refs.len(), 1);

    let bad = RawAssumption {
        id: "asm-2".to_string(),
        driver_key: "tips".to_string(),
        description: String::new(),
        value: 1.0,
        evidence_refs: vec![],
    };
    assert!(matches!(
        normalize_assumption(bad),
        Err(EngineError::UnknownDriver { .. })
    ));
}
