//! Generation boundary — where AI-generated content becomes canonical.
//!
//! The generator collaborator returns loosely-shaped records. They are
//! normalized HERE, exactly once, into the single canonical types the
//! engine consumes; dual-shape ambiguity never crosses this module.
//!
//! Policy per field class:
//!   - Out-of-range numbers (probability, risk score, duration) are
//!     clamped to a safe default — never thrown past the boundary.
//!   - Unknown enumerated keys (driver, mode, curve) are REJECTED with
//!     a descriptive error naming the offending field; dropping them
//!     silently would corrupt every downstream comparison.
//!   - Loose classification strings (severity, category) fall back to a
//!     neutral default.

use crate::curve::CurveKind;
use crate::driver::DriverKey;
use crate::error::{EngineError, EngineResult};
use crate::shock::{
    Adjustment, Mitigation, MitigationCategory, Scenario, Severity, Shock, ShockMode,
};
use serde::Deserialize;

pub const DEFAULT_PROBABILITY: f64 = 0.5;
pub const DEFAULT_RISK_SCORE: f64 = 50.0;

// ── Raw shapes, as the generator emits them ──────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct RawShock {
    pub driver_key: String,
    pub mode: String,
    pub value: f64,
    #[serde(default)]
    pub start_month_offset: Option<i64>,
    #[serde(default)]
    pub duration_months: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawScenario {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub shocks: Vec<RawShock>,
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub risk_score: Option<f64>,
    #[serde(default)]
    pub shock_curve: Option<String>,
    #[serde(default)]
    pub expected_to_break: bool,
    #[serde(default)]
    pub break_reason: Option<String>,
    #[serde(default)]
    pub evidence_refs: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMitigation {
    pub id: String,
    pub name: String,
    pub adjustments: Vec<RawShock>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub evidence_refs: Vec<String>,
}

/// A generated planning assumption: a stated baseline value for one
/// driver, with the evidence it was derived from.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAssumption {
    pub id: String,
    pub driver_key: String,
    #[serde(default)]
    pub description: String,
    pub value: f64,
    #[serde(default)]
    pub evidence_refs: Vec<String>,
}

/// The normalized assumption record.
#[derive(Debug, Clone, PartialEq, serde::Serialize, Deserialize)]
pub struct Assumption {
    pub id: String,
    pub driver: DriverKey,
    pub description: String,
    pub value: f64,
    pub evidence_refs: Vec<String>,
}

// ── Normalization ────────────────────────────────────────────────────────────

pub fn normalize_scenario(raw: RawScenario) -> EngineResult<Scenario> {
    let context = format!("scenario '{}'", raw.id);
    let shocks = raw
        .shocks
        .into_iter()
        .map(|s| normalize_shock(s, &context))
        .collect::<EngineResult<Vec<Shock>>>()?;
    let shock_curve = raw
        .shock_curve
        .as_deref()
        .map(|c| parse_curve(c, &context))
        .transpose()?;

    Ok(Scenario {
        id: raw.id,
        name: raw.name,
        description: raw.description,
        shocks,
        probability: raw.probability.unwrap_or(DEFAULT_PROBABILITY).clamp(0.0, 1.0),
        severity: parse_severity(raw.severity.as_deref()),
        risk_score: raw
            .risk_score
            .unwrap_or(DEFAULT_RISK_SCORE)
            .clamp(0.0, 100.0),
        shock_curve,
        expected_to_break: raw.expected_to_break,
        break_reason: raw.break_reason,
        evidence_refs: raw.evidence_refs,
    })
}

pub fn normalize_mitigation(raw: RawMitigation) -> EngineResult<Mitigation> {
    let context = format!("mitigation '{}'", raw.id);
    let adjustments = raw
        .adjustments
        .into_iter()
        .map(|s| normalize_shock(s, &context))
        .collect::<EngineResult<Vec<Adjustment>>>()?;

    Ok(Mitigation {
        id: raw.id,
        name: raw.name,
        adjustments,
        enabled: raw.enabled.unwrap_or(true),
        category: parse_category(raw.category.as_deref()),
        evidence_refs: raw.evidence_refs,
    })
}

pub fn normalize_assumption(raw: RawAssumption) -> EngineResult<Assumption> {
    let context = format!("assumption '{}'", raw.id);
    Ok(Assumption {
        driver: DriverKey::parse(&raw.driver_key, &context)?,
        id: raw.id,
        description: raw.description,
        value: raw.value,
        evidence_refs: raw.evidence_refs,
    })
}

fn normalize_shock(raw: RawShock, context: &str) -> EngineResult<Shock> {
    let driver = DriverKey::parse(&raw.driver_key, context)?;
    let mode = match raw.mode.as_str() {
        "add" => ShockMode::Add,
        "multiply" => ShockMode::Multiply,
        "set" => ShockMode::Set,
        other => {
            return Err(EngineError::UnknownField {
                field: "shock mode",
                value: other.to_string(),
                context: context.to_string(),
            })
        }
    };

    Ok(Shock {
        driver,
        mode,
        value: raw.value,
        start_month_offset: raw.start_month_offset.unwrap_or(0).max(0) as usize,
        duration_months: raw.duration_months.unwrap_or(1).max(1) as usize,
    })
}

fn parse_curve(value: &str, context: &str) -> EngineResult<CurveKind> {
    match value {
        "flat" => Ok(CurveKind::Flat),
        "decay" => Ok(CurveKind::Decay),
        "recovery" => Ok(CurveKind::Recovery),
        other => Err(EngineError::UnknownField {
            field: "shock curve",
            value: other.to_string(),
            context: context.to_string(),
        }),
    }
}

fn parse_severity(value: Option<&str>) -> Severity {
    match value {
        Some("low") => Severity::Low,
        Some("moderate") => Severity::Moderate,
        Some("severe") => Severity::Severe,
        Some("critical") => Severity::Critical,
        // Unknown or absent classification normalizes to the middle.
        _ => Severity::Moderate,
    }
}

fn parse_category(value: Option<&str>) -> MitigationCategory {
    match value {
        Some("revenue") => MitigationCategory::Revenue,
        Some("cost") => MitigationCategory::Cost,
        Some("labor") => MitigationCategory::Labor,
        Some("financing") => MitigationCategory::Financing,
        _ => MitigationCategory::Other,
    }
}
