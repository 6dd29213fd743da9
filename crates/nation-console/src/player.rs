//! Summary panel for the player governing a country.

use nation_core::coerce::{percent, quantity};
use nation_core::CountryRecord;
use nation_rank::StabilityBand;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlayerPanel {
    pub country_id: String,
    pub country_name: String,
    pub current_turn: u32,
    pub gdp: f64,
    pub population: f64,
    /// Clamped to [0, 100].
    pub stability: f64,
    pub stability_band: StabilityBand,
    pub technology: f64,
    pub urbanization: f64,
    pub bureaucracy: f64,
    pub army: u64,
    pub navy: u64,
    pub air_force: u64,
    /// The country was last updated before the current turn.
    pub is_turn_late: bool,
}

impl PlayerPanel {
    /// Panel for the country `user_id` governs, if any.
    pub fn for_player(records: &[CountryRecord], user_id: &str, current_turn: u32) -> Option<Self> {
        records
            .iter()
            .find(|r| r.player_id.as_deref() == Some(user_id))
            .map(|r| Self::new(r, current_turn))
    }

    /// Panel for a known country id, as recorded on the user document.
    pub fn for_country(records: &[CountryRecord], country_id: &str, current_turn: u32) -> Option<Self> {
        records
            .iter()
            .find(|r| r.id == country_id)
            .map(|r| Self::new(r, current_turn))
    }

    pub fn new(record: &CountryRecord, current_turn: u32) -> Self {
        let e = &record.economy;
        let m = &record.military;
        let name = if record.name.trim().is_empty() {
            record.id.clone()
        } else {
            record.name.clone()
        };
        Self {
            country_id: record.id.clone(),
            country_name: name,
            current_turn,
            gdp: quantity(e.gdp),
            population: quantity(e.population),
            stability: percent(e.stability),
            stability_band: StabilityBand::from_score(e.stability),
            technology: percent(e.technology),
            urbanization: percent(e.urbanization),
            bureaucracy: percent(e.bureaucracy),
            army: m.army,
            navy: m.navy,
            air_force: m.air_force,
            is_turn_late: record.last_updated_turn < current_turn,
        }
    }
}
