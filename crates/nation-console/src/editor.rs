//! Narrator editor form.
//!
//! The form holds what the narrator typed. Numbers are coerced when the
//! form is turned into a record or previewed. The 0–100 fields are the one
//! exception: text outside that range is replaced by the clamped bound as it
//! is typed, while in-range text such as "1." or "45,5" is kept verbatim.

use chrono::{DateTime, Utc};
use nation_core::{
    coerce, CountryRecord, Level, MilitaryForces, RawInputs, Visibility, DEFAULT_ERA,
    DEFAULT_FLAG,
};
use nation_econ::{derive, DerivedFigures, TuningTable};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("country id is required")]
    MissingId,
}

/// Free-text inputs of the editor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Id,
    Name,
    Era,
    Flag,
    PoliticalModel,
    Gdp,
    Population,
    Technology,
    Stability,
    Bureaucracy,
    Urbanization,
    WellSize,
    MineSize,
    Army,
    Vehicles,
    Navy,
    AirForce,
    MilitarySpending,
    PlayerId,
}

impl Field {
    /// Percentages clamped to [0, 100] as soon as they are typed.
    fn is_clamped_percent(self) -> bool {
        matches!(self, Field::Urbanization | Field::Technology | Field::Stability)
    }
}

/// 1–5 selectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LevelField {
    SoilFertility,
    WellLevel,
    OreGrade,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EditorMsg {
    Set(Field, String),
    SetLevel(LevelField, Level),
    SetAtWar(bool),
    /// Replace the form with a stored country.
    Load(CountryRecord),
    /// Back to a blank "new country" form.
    Reset,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EditorForm {
    texts: BTreeMap<Field, String>,
    soil_fertility: Level,
    well_level: Level,
    ore_grade: Level,
    at_war: bool,
    // carried from a loaded record, not editable here
    visibility: Visibility,
    linked_at: Option<DateTime<Utc>>,
    last_updated_turn: u32,
}

impl Default for EditorForm {
    fn default() -> Self {
        let mut texts = BTreeMap::new();
        texts.insert(Field::Era, DEFAULT_ERA.to_string());
        texts.insert(Field::Flag, DEFAULT_FLAG.to_string());
        Self {
            texts,
            soil_fertility: Level::default(),
            well_level: Level::default(),
            ore_grade: Level::default(),
            at_war: false,
            visibility: Visibility::Public,
            linked_at: None,
            last_updated_turn: 0,
        }
    }
}

/// Zero shows as an empty box, like a field nobody filled in.
fn number_text(v: f64) -> String {
    if v == 0.0 {
        String::new()
    } else {
        v.to_string()
    }
}

fn count_text(v: u64) -> String {
    if v == 0 {
        String::new()
    } else {
        v.to_string()
    }
}

pub fn update(form: EditorForm, msg: EditorMsg) -> EditorForm {
    match msg {
        EditorMsg::Set(field, text) => form.with_text(field, text),
        EditorMsg::SetLevel(field, level) => {
            let mut form = form;
            match field {
                LevelField::SoilFertility => form.soil_fertility = level,
                LevelField::WellLevel => form.well_level = level,
                LevelField::OreGrade => form.ore_grade = level,
            }
            form
        }
        EditorMsg::SetAtWar(at_war) => EditorForm { at_war, ..form },
        EditorMsg::Load(record) => EditorForm::from_record(&record),
        EditorMsg::Reset => EditorForm::default(),
    }
}

impl EditorForm {
    fn with_text(mut self, field: Field, text: String) -> Self {
        let text = match field {
            Field::Id => text.trim().to_uppercase(),
            f if f.is_clamped_percent() => {
                let value = coerce::number(&text);
                let clamped = coerce::percent(value);
                if clamped == value {
                    text
                } else {
                    clamped.to_string()
                }
            }
            _ => text,
        };
        self.texts.insert(field, text);
        self
    }

    pub fn from_record(record: &CountryRecord) -> Self {
        let e = &record.economy;
        let m = &record.military;
        let entries = [
            (Field::Id, record.id.clone()),
            (Field::Name, record.name.clone()),
            (Field::Era, record.era.clone()),
            (Field::Flag, record.flag.clone()),
            (Field::PoliticalModel, record.political_model.clone()),
            (Field::Gdp, number_text(e.gdp)),
            (Field::Population, number_text(e.population)),
            (Field::Technology, number_text(e.technology)),
            (Field::Stability, number_text(e.stability)),
            (Field::Bureaucracy, number_text(e.bureaucracy)),
            (Field::Urbanization, number_text(e.urbanization)),
            (Field::WellSize, number_text(e.well_size)),
            (Field::MineSize, number_text(e.mine_size)),
            (Field::Army, count_text(m.army)),
            (Field::Vehicles, count_text(m.vehicles)),
            (Field::Navy, count_text(m.navy)),
            (Field::AirForce, count_text(m.air_force)),
            (Field::MilitarySpending, number_text(m.spending)),
            (Field::PlayerId, record.player_id.clone().unwrap_or_default()),
        ];
        Self {
            texts: entries.into_iter().collect(),
            soil_fertility: e.soil_fertility,
            well_level: e.well_level,
            ore_grade: e.ore_grade,
            at_war: m.at_war,
            visibility: record.visibility,
            linked_at: record.linked_at,
            last_updated_turn: record.last_updated_turn,
        }
    }

    pub fn text(&self, field: Field) -> &str {
        self.texts.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn level(&self, field: LevelField) -> Level {
        match field {
            LevelField::SoilFertility => self.soil_fertility,
            LevelField::WellLevel => self.well_level,
            LevelField::OreGrade => self.ore_grade,
        }
    }

    pub fn at_war(&self) -> bool {
        self.at_war
    }

    /// The trimmed id, if any.
    pub fn id(&self) -> Option<&str> {
        let id = self.text(Field::Id).trim();
        (!id.is_empty()).then_some(id)
    }

    fn number(&self, field: Field) -> f64 {
        coerce::number(self.text(field))
    }

    fn count(&self, field: Field) -> u64 {
        coerce::count(self.number(field))
    }

    fn or_default(&self, field: Field, default: &str) -> String {
        let text = self.text(field).trim();
        if text.is_empty() {
            default.to_string()
        } else {
            text.to_string()
        }
    }

    pub fn raw_inputs(&self) -> RawInputs {
        RawInputs {
            gdp: self.number(Field::Gdp),
            population: self.number(Field::Population),
            technology: self.number(Field::Technology),
            stability: self.number(Field::Stability),
            bureaucracy: self.number(Field::Bureaucracy),
            urbanization: self.number(Field::Urbanization),
            soil_fertility: self.soil_fertility,
            well_size: self.number(Field::WellSize),
            well_level: self.well_level,
            mine_size: self.number(Field::MineSize),
            ore_grade: self.ore_grade,
        }
    }

    fn military(&self) -> MilitaryForces {
        MilitaryForces {
            army: self.count(Field::Army),
            navy: self.count(Field::Navy),
            air_force: self.count(Field::AirForce),
            vehicles: self.count(Field::Vehicles),
            spending: self.number(Field::MilitarySpending),
            at_war: self.at_war,
        }
    }

    pub fn to_record(&self) -> Result<CountryRecord, EditorError> {
        let id = self.id().ok_or(EditorError::MissingId)?;
        let player = self.text(Field::PlayerId).trim();
        Ok(CountryRecord {
            id: id.to_string(),
            name: self.text(Field::Name).trim().to_string(),
            era: self.or_default(Field::Era, DEFAULT_ERA),
            flag: self.or_default(Field::Flag, DEFAULT_FLAG),
            political_model: self.text(Field::PoliticalModel).trim().to_string(),
            visibility: self.visibility,
            player_id: (!player.is_empty()).then(|| player.to_string()),
            linked_at: self.linked_at,
            last_updated_turn: self.last_updated_turn,
            economy: self.raw_inputs(),
            military: self.military(),
        })
    }

    /// Figures the form would save right now.
    pub fn preview(&self, tuning: &TuningTable) -> DerivedFigures {
        derive(&self.raw_inputs(), tuning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(pairs: &[(Field, &str)]) -> EditorForm {
        pairs.iter().fold(EditorForm::default(), |f, (field, text)| {
            update(f, EditorMsg::Set(*field, text.to_string()))
        })
    }

    #[test]
    fn blank_form_defaults() {
        let f = EditorForm::default();
        assert_eq!(f.text(Field::Era), "1954");
        assert_eq!(f.text(Field::Flag), DEFAULT_FLAG);
        assert_eq!(f.level(LevelField::OreGrade).get(), 3);
        assert_eq!(f.to_record(), Err(EditorError::MissingId));
    }

    #[test]
    fn partial_percentages_survive_keystrokes() {
        let f = typed(&[(Field::Technology, "1."), (Field::Urbanization, "1.0")]);
        assert_eq!(f.text(Field::Technology), "1.");
        assert_eq!(f.text(Field::Urbanization), "1.0");
        let f = update(f, EditorMsg::Set(Field::Urbanization, "100.5".into()));
        assert_eq!(f.text(Field::Urbanization), "100");
    }

    #[test]
    fn percentages_clamp_on_entry() {
        let f = typed(&[
            (Field::Urbanization, "140"),
            (Field::Technology, "-5"),
            (Field::Stability, "45,5"),
            (Field::Bureaucracy, "300"),
            (Field::Gdp, ""),
        ]);
        assert_eq!(f.text(Field::Urbanization), "100");
        assert_eq!(f.text(Field::Technology), "0");
        assert_eq!(f.text(Field::Stability), "45,5");
        assert_eq!(f.text(Field::Bureaucracy), "300");
        assert_eq!(f.text(Field::Gdp), "");
    }

    #[test]
    fn ids_are_uppercased() {
        let f = typed(&[(Field::Id, "  bra ")]);
        assert_eq!(f.id(), Some("BRA"));
        assert!(typed(&[(Field::Id, "   ")]).id().is_none());
    }

    #[test]
    fn preview_matches_reference_scenario() {
        let f = typed(&[
            (Field::Gdp, "1000000"),
            (Field::Population, "100000"),
            (Field::Urbanization, "60"),
            (Field::Technology, "50"),
            (Field::WellSize, "10"),
        ]);
        let d = f.preview(&TuningTable::default());
        assert_eq!(d.urban_population, 60_000.0);
        assert_eq!(d.rural_population, 40_000.0);
        assert_eq!(d.gdp_per_capita, 10.0);
        assert!((d.food_production - 400.0).abs() < 1e-9);
        assert!((d.fuel_production - 12_000.0).abs() < 1e-9);
    }

    #[test]
    fn record_roundtrips_through_the_form() {
        let f = typed(&[
            (Field::Id, "ar"),
            (Field::Name, "Argentina"),
            (Field::Gdp, "US$ 2.500,50"),
            (Field::Army, "12.7"),
            (Field::PlayerId, " "),
        ]);
        let f = update(f, EditorMsg::SetLevel(LevelField::SoilFertility, Level::MAX));
        let f = update(f, EditorMsg::SetAtWar(true));
        let rec = f.to_record().unwrap();
        assert_eq!(rec.id, "AR");
        assert_eq!(rec.economy.gdp, 2500.5);
        assert_eq!(rec.military.army, 13);
        assert!(rec.military.at_war);
        assert_eq!(rec.player_id, None);
        assert_eq!(rec.economy.soil_fertility, Level::MAX);

        let back = update(EditorForm::default(), EditorMsg::Load(rec.clone()));
        assert_eq!(back.to_record().unwrap(), rec);
        assert_eq!(back.text(Field::Population), "");
    }

    #[test]
    fn load_keeps_link_metadata_and_reset_clears() {
        let rec = CountryRecord {
            id: "PT".into(),
            name: "Portugal".into(),
            visibility: Visibility::Private,
            player_id: Some("uid-3".into()),
            last_updated_turn: 4,
            ..CountryRecord::default()
        };
        let f = update(EditorForm::default(), EditorMsg::Load(rec));
        let saved = f.to_record().unwrap();
        assert_eq!(saved.visibility, Visibility::Private);
        assert_eq!(saved.player_id.as_deref(), Some("uid-3"));
        assert_eq!(saved.last_updated_turn, 4);
        assert_eq!(update(f, EditorMsg::Reset), EditorForm::default());
    }
}
