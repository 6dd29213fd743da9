//! Coefficients shared by every production and budget formula.

use nation_core::Level;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Errors produced while loading a tuning file.
#[derive(Debug, Error, PartialEq)]
pub enum TuningError {
    /// The file could not be read.
    #[error("io error: {0}")]
    Io(String),
    /// The file is not valid YAML for a tuning table.
    #[error("invalid tuning file: {0}")]
    Parse(String),
    /// Coefficient is NaN or infinite.
    #[error("coefficient {0} must be finite")]
    NonFinite(&'static str),
    /// Coefficient is below zero.
    #[error("coefficient {name} must be >= 0, got {value}")]
    Negative { name: &'static str, value: f64 },
    /// Level multiplier is zero or negative.
    #[error("level {level} multiplier must be > 0, got {value}")]
    NonPositiveLevel { level: u8, value: f64 },
}

impl From<std::io::Error> for TuningError {
    fn from(e: std::io::Error) -> Self {
        TuningError::Io(e.to_string())
    }
}

impl From<serde_yaml::Error> for TuningError {
    fn from(e: serde_yaml::Error) -> Self {
        TuningError::Parse(e.to_string())
    }
}

/// Multipliers for site levels 1..=5.
///
/// Serialized as a map keyed by level so a tuning file can override a
/// single entry: `level: { 5: 1.5 }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<u8, f64>", into = "BTreeMap<u8, f64>")]
pub struct LevelTable([f64; 5]);

impl LevelTable {
    pub const DEFAULT: LevelTable = LevelTable([0.7, 0.85, 1.0, 1.2, 1.4]);

    pub fn multiplier(&self, level: Level) -> f64 {
        self.0[level.index()]
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<BTreeMap<u8, f64>> for LevelTable {
    fn from(map: BTreeMap<u8, f64>) -> Self {
        let mut table = Self::DEFAULT;
        for (level, value) in map {
            if (1..=5).contains(&level) {
                table.0[usize::from(level - 1)] = value;
            }
        }
        table
    }
}

impl From<LevelTable> for BTreeMap<u8, f64> {
    fn from(table: LevelTable) -> Self {
        (1u8..).zip(table.0).collect()
    }
}

/// Named coefficients for the derivation formulas.
///
/// Built once at startup and passed by reference; nothing mutates it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TuningTable {
    /// Site level → multiplier.
    pub level: LevelTable,
    /// Technology effect on food, in percent of output per technology point.
    pub tech_food_alpha: f64,
    pub tech_fuel_alpha: f64,
    pub tech_metal_alpha: f64,
    /// Food produced per rural inhabitant.
    pub base_food_per_rural_capita: f64,
    /// Food consumed per inhabitant.
    pub food_consumption_per_capita: f64,
    /// Barrels per well size unit.
    pub fuel_size_unit_to_bbl: f64,
    /// Tons per mine size unit.
    pub metal_size_unit_to_ton: f64,
    /// Share of GDP available as budget before modifiers.
    #[serde(rename = "orcamentoPIBBase")]
    pub budget_gdp_base: f64,
    /// Extra GDP share at full stability.
    #[serde(rename = "orcamentoPIBEstabilidade")]
    pub budget_gdp_stability: f64,
    /// Extra GDP share at full technology.
    #[serde(rename = "orcamentoPIBTecnologia")]
    pub budget_gdp_technology: f64,
}

impl Default for TuningTable {
    fn default() -> Self {
        Self {
            level: LevelTable::DEFAULT,
            tech_food_alpha: 0.5,
            tech_fuel_alpha: 0.4,
            tech_metal_alpha: 0.4,
            base_food_per_rural_capita: 0.008,
            food_consumption_per_capita: 0.007,
            fuel_size_unit_to_bbl: 1000.0,
            metal_size_unit_to_ton: 1000.0,
            budget_gdp_base: 0.05,
            budget_gdp_stability: 0.005,
            budget_gdp_technology: 0.0025,
        }
    }
}

impl TuningTable {
    /// Parse a YAML tuning file; keys left out keep their default values.
    ///
    /// Example:
    /// let t = TuningTable::from_yaml_str("techFoodAlpha: 0.6").unwrap();
    /// assert_eq!(t.tech_food_alpha, 0.6);
    pub fn from_yaml_str(text: &str) -> Result<Self, TuningError> {
        // an empty document deserializes to unit, not to an empty map
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let table: TuningTable = serde_yaml::from_str(text)?;
        table.validate()?;
        Ok(table)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, TuningError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let table = Self::from_yaml_str(&text)?;
        info!(path = %path.as_ref().display(), "loaded tuning table");
        Ok(table)
    }

    /// Check every coefficient is finite and non-negative, and every level
    /// multiplier is strictly positive.
    pub fn validate(&self) -> Result<(), TuningError> {
        let coefficients = [
            ("techFoodAlpha", self.tech_food_alpha),
            ("techFuelAlpha", self.tech_fuel_alpha),
            ("techMetalAlpha", self.tech_metal_alpha),
            ("baseFoodPerRuralCapita", self.base_food_per_rural_capita),
            ("foodConsumptionPerCapita", self.food_consumption_per_capita),
            ("fuelSizeUnitToBbl", self.fuel_size_unit_to_bbl),
            ("metalSizeUnitToTon", self.metal_size_unit_to_ton),
            ("orcamentoPIBBase", self.budget_gdp_base),
            ("orcamentoPIBEstabilidade", self.budget_gdp_stability),
            ("orcamentoPIBTecnologia", self.budget_gdp_technology),
        ];
        for (name, value) in coefficients {
            if !value.is_finite() {
                return Err(TuningError::NonFinite(name));
            }
            if value < 0.0 {
                return Err(TuningError::Negative { name, value });
            }
        }
        for (level, value) in (1u8..).zip(self.level.0) {
            if !value.is_finite() {
                return Err(TuningError::NonFinite("level"));
            }
            if value <= 0.0 {
                return Err(TuningError::NonPositiveLevel { level, value });
            }
        }
        Ok(())
    }
}
