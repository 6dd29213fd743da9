#![deny(warnings)]

//! Economic derivation for country records.
//!
//! Pure formulas mapping raw national statistics and a [`TuningTable`] to
//! derived figures:
//! - per-capita GDP and the urban/rural population split
//! - food, fuel and metal production with level and technology multipliers
//! - the food balance and the state budget
//!
//! Every function is total. Inputs are normalized first (percentages
//! clamped to [0,100], levels to {1..5}, negative or non-finite quantities
//! to 0), so no input can make a derivation fail.

pub mod tuning;

pub use tuning::{LevelTable, TuningError, TuningTable};

use nation_core::coerce::{percent, quantity};
use nation_core::{CountryRecord, RawInputs};
use serde::{Deserialize, Serialize};

/// Figures computed from a country's raw inputs. Never edited by hand.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedFigures {
    #[serde(rename = "pib_per_capita")]
    pub gdp_per_capita: f64,
    #[serde(rename = "pop_urbana")]
    pub urban_population: f64,
    #[serde(rename = "pop_rural")]
    pub rural_population: f64,
    #[serde(rename = "producao_comida")]
    pub food_production: f64,
    #[serde(rename = "consumo_comida")]
    pub food_consumption: f64,
    /// Signed: negative means a food deficit.
    #[serde(rename = "saldo_comida")]
    pub food_balance: f64,
    /// Barrels per turn.
    #[serde(rename = "producao_combustivel")]
    pub fuel_production: f64,
    /// Tons per turn.
    #[serde(rename = "producao_metal")]
    pub metal_production: f64,
    #[serde(rename = "orcamento")]
    pub budget: f64,
}

/// Urban and rural head counts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PopulationSplit {
    pub urban: f64,
    pub rural: f64,
}

/// Food production, consumption and their difference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FoodFigures {
    pub production: f64,
    pub consumption: f64,
    pub balance: f64,
}

/// GDP divided by population, with the population floored at 1.
///
/// Example:
/// assert_eq!(gdp_per_capita(1_000_000.0, 100_000.0), 10.0);
/// assert_eq!(gdp_per_capita(500.0, 0.0), 500.0);
pub fn gdp_per_capita(gdp: f64, population: f64) -> f64 {
    quantity(gdp) / quantity(population).max(1.0)
}

/// Split population by urbanization percentage; the urban share is rounded
/// to whole inhabitants.
pub fn urban_rural_split(population: f64, urbanization: f64) -> PopulationSplit {
    let population = quantity(population);
    let urban = (population * (percent(urbanization) / 100.0)).round();
    PopulationSplit {
        urban,
        rural: (population - urban).max(0.0),
    }
}

/// Output multiplier for a sector: `1 + tech × alpha / 100`.
pub fn tech_multiplier(technology: f64, alpha: f64) -> f64 {
    1.0 + percent(technology) * (alpha / 100.0)
}

pub fn food_figures(raw: &RawInputs, split: PopulationSplit, t: &TuningTable) -> FoodFigures {
    let production = split.rural
        * t.base_food_per_rural_capita
        * t.level.multiplier(raw.soil_fertility)
        * tech_multiplier(raw.technology, t.tech_food_alpha);
    let consumption = quantity(raw.population) * t.food_consumption_per_capita;
    FoodFigures {
        production,
        consumption,
        balance: production - consumption,
    }
}

/// Barrels produced by the country's oil well.
pub fn fuel_production(raw: &RawInputs, t: &TuningTable) -> f64 {
    quantity(raw.well_size)
        * t.fuel_size_unit_to_bbl
        * t.level.multiplier(raw.well_level)
        * tech_multiplier(raw.technology, t.tech_fuel_alpha)
}

/// Tons produced by the country's mine.
pub fn metal_production(raw: &RawInputs, t: &TuningTable) -> f64 {
    quantity(raw.mine_size)
        * t.metal_size_unit_to_ton
        * t.level.multiplier(raw.ore_grade)
        * tech_multiplier(raw.technology, t.tech_metal_alpha)
}

/// State budget as a share of GDP that grows with stability and technology.
pub fn budget(raw: &RawInputs, t: &TuningTable) -> f64 {
    let rate = t.budget_gdp_base
        + (percent(raw.stability) / 100.0) * t.budget_gdp_stability
        + (percent(raw.technology) / 100.0) * t.budget_gdp_technology;
    quantity(raw.gdp) * rate
}

/// Compute every derived figure for one country.
pub fn derive(raw: &RawInputs, t: &TuningTable) -> DerivedFigures {
    let split = urban_rural_split(raw.population, raw.urbanization);
    let food = food_figures(raw, split, t);
    DerivedFigures {
        gdp_per_capita: gdp_per_capita(raw.gdp, raw.population),
        urban_population: split.urban,
        rural_population: split.rural,
        food_production: food.production,
        food_consumption: food.consumption,
        food_balance: food.balance,
        fuel_production: fuel_production(raw, t),
        metal_production: metal_production(raw, t),
        budget: budget(raw, t),
    }
}

/// A country record paired with figures derived from it, as written to the
/// store. Only [`CountryDocument::build`] creates one, so the derived half
/// always matches the raw half.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CountryDocument {
    #[serde(flatten)]
    record: CountryRecord,
    #[serde(flatten)]
    derived: DerivedFigures,
}

impl CountryDocument {
    pub fn build(record: CountryRecord, t: &TuningTable) -> Self {
        let derived = derive(&record.economy, t);
        Self { record, derived }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn record(&self) -> &CountryRecord {
        &self.record
    }

    pub fn derived(&self) -> &DerivedFigures {
        &self.derived
    }

    pub fn into_record(self) -> CountryRecord {
        self.record
    }
}
