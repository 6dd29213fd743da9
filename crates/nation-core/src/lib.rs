#![deny(warnings)]

//! Core domain models for the War 1954 game-master console.
//!
//! This crate defines the serializable country, user and game configuration
//! documents shared by the derivation, ranking and persistence crates, plus
//! the fail-soft numeric coercion every raw input goes through.

pub mod coerce;
pub mod lenient;

use chrono::{DateTime, Utc};
use lenient::Loose;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Collection holding one document per country.
pub const COUNTRIES: &str = "paises";
/// Collection holding one document per authenticated user.
pub const USERS: &str = "usuarios";
/// Collection holding the game configuration singleton.
pub const SETTINGS: &str = "configuracoes";
/// Id of the game configuration document inside [`SETTINGS`].
pub const GAME_CONFIG_ID: &str = "jogo";

/// Site quality level in {1..5}, e.g. soil fertility or ore grade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(u8);

impl Level {
    pub const MIN: Level = Level(1);
    pub const MAX: Level = Level(5);

    /// Level from an arbitrary number: rounded to the nearest integer and
    /// clamped to {1..5}. Non-finite input maps to the lowest level.
    pub fn from_raw(v: f64) -> Self {
        let v = coerce::finite(v).round().clamp(1.0, 5.0);
        Level(v as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based position in a five-entry lookup table.
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }
}

impl Default for Level {
    fn default() -> Self {
        Level(3)
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(self.0)
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        // absent, empty and zero keep the editor default; any other text,
        // numeric or not, is coerced and clamped
        Ok(match Loose::deserialize(d)? {
            Loose::Null | Loose::Bool(false) => Level::default(),
            Loose::Num(n) if n == 0.0 || n.is_nan() => Level::default(),
            Loose::Text(s) if s.is_empty() => Level::default(),
            loose => Level::from_raw(loose.into_number()),
        })
    }
}

/// Whether a country appears on the public dashboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    /// Accepts "publico", "Público", "privado", "Privado" and English names.
    /// Unknown values are public, which is what the editor writes.
    pub fn parse(text: &str) -> Self {
        let t = text.trim().to_lowercase();
        if t.starts_with("priv") {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "publico",
            Visibility::Private => "privado",
        }
    }
}

impl Serialize for Visibility {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Visibility {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(Visibility::parse(&lenient::text(d)?))
    }
}

/// Raw economic inputs typed by a narrator. Everything derived is computed
/// from these fields only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawInputs {
    /// Gross domestic product in currency units.
    #[serde(rename = "pib", alias = "PIB", deserialize_with = "lenient::number")]
    pub gdp: f64,
    #[serde(rename = "populacao", alias = "Populacao", deserialize_with = "lenient::number")]
    pub population: f64,
    /// Civil technology, 0–100.
    #[serde(rename = "tecnologia", alias = "Tecnologia", deserialize_with = "lenient::number")]
    pub technology: f64,
    /// Stability score, 0–100.
    #[serde(rename = "estabilidade", alias = "Estabilidade", deserialize_with = "lenient::number")]
    pub stability: f64,
    /// Bureaucracy, 0–100.
    #[serde(rename = "burocracia", alias = "Burocracia", deserialize_with = "lenient::number")]
    pub bureaucracy: f64,
    /// Urbanization percentage, 0–100.
    #[serde(rename = "urbanizacao", alias = "Urbanizacao", deserialize_with = "lenient::number")]
    pub urbanization: f64,
    #[serde(rename = "fertilidadeSolo")]
    pub soil_fertility: Level,
    /// Oil well size in raw site units.
    #[serde(rename = "pocoTamanho", deserialize_with = "lenient::number")]
    pub well_size: f64,
    #[serde(rename = "pocoNivel")]
    pub well_level: Level,
    /// Mine size in raw site units.
    #[serde(rename = "minaTamanho", deserialize_with = "lenient::number")]
    pub mine_size: f64,
    #[serde(rename = "teorMinerio")]
    pub ore_grade: Level,
}

impl Default for RawInputs {
    fn default() -> Self {
        Self {
            gdp: 0.0,
            population: 0.0,
            technology: 0.0,
            stability: 0.0,
            bureaucracy: 0.0,
            urbanization: 0.0,
            soil_fertility: Level::default(),
            well_size: 0.0,
            well_level: Level::default(),
            mine_size: 0.0,
            ore_grade: Level::default(),
        }
    }
}

/// Armed forces and war footing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MilitaryForces {
    #[serde(rename = "exercito", alias = "Exercito", deserialize_with = "lenient::count")]
    pub army: u64,
    #[serde(rename = "marinha", alias = "Marinha", deserialize_with = "lenient::count")]
    pub navy: u64,
    #[serde(rename = "aeronautica", alias = "Aeronautica", deserialize_with = "lenient::count")]
    pub air_force: u64,
    #[serde(rename = "veiculos", deserialize_with = "lenient::count")]
    pub vehicles: u64,
    /// Military spending in currency units.
    #[serde(rename = "gastos_fa", deserialize_with = "lenient::number")]
    pub spending: f64,
    #[serde(rename = "em_guerra", deserialize_with = "lenient::flag")]
    pub at_war: bool,
}

/// A country document as stored in [`COUNTRIES`], without derived figures.
///
/// The id is the document key and is not part of the stored body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountryRecord {
    #[serde(skip_serializing, deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(alias = "Pais", deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub era: String,
    /// Emoji glyph or image URL.
    #[serde(alias = "Bandeira", alias = "BandeiraURL", deserialize_with = "lenient::text")]
    pub flag: String,
    #[serde(rename = "modelo_politico", alias = "ModeloPolitico", deserialize_with = "lenient::text")]
    pub political_model: String,
    #[serde(rename = "visibilidade", alias = "Visibilidade")]
    pub visibility: Visibility,
    #[serde(rename = "player_id", alias = "Player", deserialize_with = "lenient::optional_id")]
    pub player_id: Option<String>,
    #[serde(
        rename = "data_vinculacao",
        alias = "DataVinculacao",
        deserialize_with = "lenient::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub linked_at: Option<DateTime<Utc>>,
    #[serde(
        rename = "turno_ultima_atualizacao",
        alias = "TurnoUltimaAtualizacao",
        deserialize_with = "lenient::turn"
    )]
    pub last_updated_turn: u32,
    #[serde(flatten)]
    pub economy: RawInputs,
    #[serde(flatten)]
    pub military: MilitaryForces,
}

impl Default for CountryRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            era: DEFAULT_ERA.to_string(),
            flag: DEFAULT_FLAG.to_string(),
            political_model: String::new(),
            visibility: Visibility::Public,
            player_id: None,
            linked_at: None,
            last_updated_turn: 0,
            economy: RawInputs::default(),
            military: MilitaryForces::default(),
        }
    }
}

/// Era shown for countries created without one.
pub const DEFAULT_ERA: &str = "1954";
/// White flag placeholder.
pub const DEFAULT_FLAG: &str = "🏳️";

/// Current key of each country field and the spellings older dashboards
/// used for it, in lookup order.
const LEGACY_KEYS: &[(&str, &[&str])] = &[
    ("name", &["Pais"]),
    ("flag", &["Bandeira", "BandeiraURL"]),
    ("modelo_politico", &["ModeloPolitico"]),
    ("visibilidade", &["Visibilidade"]),
    ("player_id", &["Player"]),
    ("data_vinculacao", &["DataVinculacao"]),
    ("turno_ultima_atualizacao", &["TurnoUltimaAtualizacao"]),
    ("pib", &["PIB"]),
    ("populacao", &["Populacao"]),
    ("tecnologia", &["Tecnologia"]),
    ("estabilidade", &["Estabilidade"]),
    ("burocracia", &["Burocracia"]),
    ("urbanizacao", &["Urbanizacao"]),
    ("exercito", &["Exercito"]),
    ("marinha", &["Marinha"]),
    ("aeronautica", &["Aeronautica"]),
];

fn holds_value(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// Fold every legacy spelling of a country field into its current key.
///
/// The current key is looked at first, then the legacy keys in
/// [`LEGACY_KEYS`] order; the first one holding a value other than null or
/// a blank string wins. When none does, the first key present is kept.
/// Afterwards at most one key per field remains.
pub fn fold_legacy_keys(body: &mut Map<String, Value>) {
    for (key, legacy) in LEGACY_KEYS {
        let found: Vec<Value> = std::iter::once(*key)
            .chain(legacy.iter().copied())
            .filter_map(|k| body.remove(k))
            .collect();
        let pick = found.iter().position(holds_value).unwrap_or(0);
        if let Some(v) = found.into_iter().nth(pick) {
            body.insert((*key).to_string(), v);
        }
    }
}

impl CountryRecord {
    /// Parse a stored body, attaching the document key as id. Legacy keys
    /// are folded first, so documents touched by several dashboards read.
    pub fn from_document(id: &str, body: Value) -> Result<Self, serde_json::Error> {
        let body = match body {
            Value::Object(mut map) => {
                fold_legacy_keys(&mut map);
                Value::Object(map)
            }
            other => other,
        };
        let mut record: CountryRecord = serde_json::from_value(body)?;
        record.id = id.to_string();
        Ok(record)
    }

    pub fn has_player(&self) -> bool {
        self.player_id.is_some()
    }

    /// Whether the flag is an image reference rather than an emoji glyph.
    pub fn flag_is_image(&self) -> bool {
        let f = self.flag.trim();
        let lower = f.to_ascii_lowercase();
        lower.starts_with("http://")
            || lower.starts_with("https://")
            || [".svg", ".png", ".jpg"].iter().any(|ext| lower.ends_with(ext))
    }

    /// Countries need a name and a flag to be shown in public listings.
    pub fn is_listable(&self) -> bool {
        !self.name.trim().is_empty() && !self.flag.trim().is_empty()
    }
}

/// Singleton game configuration at `configuracoes/jogo`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    #[serde(rename = "turnoAtual", deserialize_with = "lenient::turn")]
    pub current_turn: u32,
    #[serde(
        rename = "ultimaAtualizacao",
        deserialize_with = "lenient::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Role stored on a user document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Role {
    #[default]
    Player,
    Narrator,
    Admin,
}

impl Role {
    /// Unknown role names fall back to [`Role::Player`].
    pub fn parse(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "narrador" | "narrator" => Role::Narrator,
            "admin" => Role::Admin,
            _ => Role::Player,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Player => "jogador",
            Role::Narrator => "narrador",
            Role::Admin => "admin",
        }
    }

    pub fn permissions(self) -> Permissions {
        Permissions {
            is_narrator: matches!(self, Role::Narrator | Role::Admin),
            is_admin: self == Role::Admin,
        }
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(Role::parse(&lenient::text(d)?))
    }
}

/// Capabilities granted by a [`Role`]. The default grants nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub is_narrator: bool,
    pub is_admin: bool,
}

/// User document stored in [`USERS`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    #[serde(rename = "nome", deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub email: String,
    #[serde(
        rename = "photoURL",
        deserialize_with = "lenient::optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub photo_url: Option<String>,
    #[serde(rename = "papel")]
    pub role: Role,
    #[serde(
        rename = "dataIngresso",
        deserialize_with = "lenient::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub joined_at: Option<DateTime<Utc>>,
    #[serde(
        rename = "ultimoLogin",
        deserialize_with = "lenient::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(rename = "ativo", deserialize_with = "lenient::flag")]
    pub active: bool,
    #[serde(
        rename = "paisId",
        deserialize_with = "lenient::optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub country_id: Option<String>,
}
