//! Driver model — the primitive inputs every KPI is derived from.
//!
//! RULE: the driver-key set is closed. Every period in a series carries
//! every key; missing data is `null`, never omitted and never zero.
//! Unknown keys are rejected at the boundary — silently dropping them
//! would corrupt every downstream comparison.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The closed set of plan drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKey {
    Covers,
    AverageCheck,
    DiscountRate,
    ChannelMix,
    FoodCostProtein,
    FoodCostProduce,
    WastePct,
    MenuMix,
    LaborHours,
    WageRate,
    OvertimePct,
    Rent,
    Utilities,
    Marketing,
    DeliveryCommission,
    InterestExpense,
    OneTimeCosts,
}

impl DriverKey {
    /// Every driver key, in canonical order. Used for exhaustive
    /// validation and for stable table layouts in tooling.
    pub const ALL: [DriverKey; 17] = [
        DriverKey::Covers,
        DriverKey::AverageCheck,
        DriverKey::DiscountRate,
        DriverKey::ChannelMix,
        DriverKey::FoodCostProtein,
        DriverKey::FoodCostProduce,
        DriverKey::WastePct,
        DriverKey::MenuMix,
        DriverKey::LaborHours,
        DriverKey::WageRate,
        DriverKey::OvertimePct,
        DriverKey::Rent,
        DriverKey::Utilities,
        DriverKey::Marketing,
        DriverKey::DeliveryCommission,
        DriverKey::InterestExpense,
        DriverKey::OneTimeCosts,
    ];

    /// Stable snake_case name, matching the serde wire form.
    pub fn name(self) -> &'static str {
        match self {
            DriverKey::Covers => "covers",
            DriverKey::AverageCheck => "average_check",
            DriverKey::DiscountRate => "discount_rate",
            DriverKey::ChannelMix => "channel_mix",
            DriverKey::FoodCostProtein => "food_cost_protein",
            DriverKey::FoodCostProduce => "food_cost_produce",
            DriverKey::WastePct => "waste_pct",
            DriverKey::MenuMix => "menu_mix",
            DriverKey::LaborHours => "labor_hours",
            DriverKey::WageRate => "wage_rate",
            DriverKey::OvertimePct => "overtime_pct",
            DriverKey::Rent => "rent",
            DriverKey::Utilities => "utilities",
            DriverKey::Marketing => "marketing",
            DriverKey::DeliveryCommission => "delivery_commission",
            DriverKey::InterestExpense => "interest_expense",
            DriverKey::OneTimeCosts => "one_time_costs",
        }
    }

    /// Parse a wire-form key. Used by the generation boundary, where an
    /// unknown key must surface as a descriptive error, not a panic.
    pub fn parse(key: &str, context: &str) -> EngineResult<Self> {
        DriverKey::ALL
            .into_iter()
            .find(|k| k.name() == key)
            .ok_or_else(|| EngineError::UnknownDriver {
                key: key.to_string(),
                context: context.to_string(),
            })
    }
}

impl fmt::Display for DriverKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One period's driver values. `None` means "not known", and it stays
/// `None` through every formula downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverRow {
    pub period: String,
    pub drivers: BTreeMap<DriverKey, Option<f64>>,
}

impl DriverRow {
    /// A row with every driver present and null.
    pub fn empty(period: impl Into<String>) -> Self {
        let drivers = DriverKey::ALL.into_iter().map(|k| (k, None)).collect();
        Self {
            period: period.into(),
            drivers,
        }
    }

    pub fn get(&self, key: DriverKey) -> Option<f64> {
        self.drivers.get(&key).copied().flatten()
    }

    pub fn set(&mut self, key: DriverKey, value: Option<f64>) {
        self.drivers.insert(key, value);
    }

    /// Builder-style set, used heavily by tests and tooling.
    pub fn with(mut self, key: DriverKey, value: f64) -> Self {
        self.set(key, Some(value));
        self
    }
}

/// Reject series that violate the structural contract: empty series, or
/// a period that omits a driver key entirely. Null values are fine —
/// omission is not.
pub fn validate_series(series: &[DriverRow]) -> EngineResult<()> {
    if series.is_empty() {
        return Err(EngineError::EmptySeries);
    }
    for row in series {
        for key in DriverKey::ALL {
            if !row.drivers.contains_key(&key) {
                return Err(EngineError::MissingDriver {
                    period: row.period.clone(),
                    key: key.name().to_string(),
                });
            }
        }
    }
    Ok(())
}
