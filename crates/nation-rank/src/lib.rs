#![deny(warnings)]

//! Ranking and scoring: World Power Index, stability bands, dashboard
//! filters and world KPIs.

use nation_core::coerce::{finite, percent, quantity};
use nation_core::{CountryRecord, Visibility};
use nation_econ::gdp_per_capita;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Per-capita GDP at which the normalized GDP term saturates at 100.
pub const GDP_PER_CAPITA_CAP: f64 = 20_000.0;

/// Relative weight of normalized per-capita GDP and technology in the WPI.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WpiWeights {
    pub gdp_per_capita: f64,
    pub technology: f64,
}

impl WpiWeights {
    /// Plain average of both terms, as shown on the public dashboard.
    pub const UNWEIGHTED: WpiWeights = WpiWeights {
        gdp_per_capita: 0.5,
        technology: 0.5,
    };
    /// Technology-leaning blend.
    pub const BLENDED: WpiWeights = WpiWeights {
        gdp_per_capita: 0.45,
        technology: 0.55,
    };

    /// "unweighted" / "media" or "blended" / "ponderado".
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "unweighted" | "media" | "average" => Some(Self::UNWEIGHTED),
            "blended" | "ponderado" | "weighted" => Some(Self::BLENDED),
            _ => None,
        }
    }
}

impl Default for WpiWeights {
    fn default() -> Self {
        Self::UNWEIGHTED
    }
}

/// World Power Index in [1, 100].
///
/// `round(w_gdp × norm + w_tech × tech)` where `norm` maps per-capita GDP
/// 0–20000 onto 0–100 and technology is clamped to [0, 100].
///
/// Example:
/// assert_eq!(wpi(10_000.0, 50.0, WpiWeights::UNWEIGHTED), 50);
pub fn wpi(gdp_per_capita: f64, technology: f64, weights: WpiWeights) -> u8 {
    let normalized = finite(gdp_per_capita).clamp(0.0, GDP_PER_CAPITA_CAP) / 200.0;
    let score =
        (weights.gdp_per_capita * normalized + weights.technology * percent(technology)).round();
    if !score.is_finite() {
        return 1;
    }
    score.clamp(1.0, 100.0) as u8
}

/// WPI of a stored country, recomputing per-capita GDP from raw fields.
pub fn wpi_for(record: &CountryRecord, weights: WpiWeights) -> u8 {
    let e = &record.economy;
    wpi(gdp_per_capita(e.gdp, e.population), e.technology, weights)
}

/// Qualitative label for a stability score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StabilityBand {
    Anarchy,
    Unstable,
    Neutral,
    Calm,
}

impl StabilityBand {
    /// Upper bounds are inclusive: 20 is still anarchy, 21 is unstable.
    pub fn from_score(stability: f64) -> Self {
        let s = finite(stability);
        if s <= 20.0 {
            StabilityBand::Anarchy
        } else if s <= 49.0 {
            StabilityBand::Unstable
        } else if s <= 74.0 {
            StabilityBand::Neutral
        } else {
            StabilityBand::Calm
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StabilityBand::Anarchy => "Anarchy",
            StabilityBand::Unstable => "Unstable",
            StabilityBand::Neutral => "Neutral",
            StabilityBand::Calm => "Calm",
        }
    }
}

impl Serialize for StabilityBand {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.label())
    }
}

/// Dashboard partitions of the country set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VisibilityFilter {
    #[default]
    All,
    Public,
    Private,
    WithPlayer,
    WithoutPlayer,
}

impl VisibilityFilter {
    /// Accepts the dashboard's select values ("todos", "publicos",
    /// "privados", "com-jogadores", "sem-jogadores") and English names.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "todos" | "all" => Some(Self::All),
            "publicos" | "public" => Some(Self::Public),
            "privados" | "private" => Some(Self::Private),
            "com-jogadores" | "with-player" => Some(Self::WithPlayer),
            "sem-jogadores" | "without-player" => Some(Self::WithoutPlayer),
            _ => None,
        }
    }

    pub fn matches(self, record: &CountryRecord) -> bool {
        match self {
            Self::All => true,
            Self::Public => record.visibility == Visibility::Public,
            Self::Private => record.visibility == Visibility::Private,
            Self::WithPlayer => record.has_player(),
            Self::WithoutPlayer => !record.has_player(),
        }
    }
}

/// One line of the public leaderboard.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LeaderboardRow {
    pub id: String,
    pub name: String,
    pub flag: String,
    pub flag_is_image: bool,
    pub political_model: String,
    pub wpi: u8,
    pub stability: StabilityBand,
    pub gdp: f64,
    pub gdp_per_capita: f64,
    pub population: f64,
    pub urbanization: f64,
}

impl LeaderboardRow {
    pub fn new(record: &CountryRecord, weights: WpiWeights) -> Self {
        let e = &record.economy;
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            flag: record.flag.clone(),
            flag_is_image: record.flag_is_image(),
            political_model: record.political_model.clone(),
            wpi: wpi_for(record, weights),
            stability: StabilityBand::from_score(e.stability),
            gdp: quantity(e.gdp),
            gdp_per_capita: gdp_per_capita(e.gdp, e.population),
            population: quantity(e.population),
            urbanization: percent(e.urbanization),
        }
    }
}

/// Listable countries passing `filter`, strongest first. Ties are broken by
/// name, then id, so the order is stable across reloads.
pub fn leaderboard(
    records: &[CountryRecord],
    filter: VisibilityFilter,
    weights: WpiWeights,
) -> Vec<LeaderboardRow> {
    let mut rows: Vec<LeaderboardRow> = records
        .iter()
        .filter(|r| r.is_listable() && filter.matches(r))
        .map(|r| LeaderboardRow::new(r, weights))
        .collect();
    rows.sort_by(rank_order);
    rows
}

/// Headline numbers shown above the leaderboard.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct WorldKpis {
    /// Countries governed by a player.
    pub active_players: usize,
    /// Mean GDP over player countries.
    pub mean_gdp: f64,
    /// Mean stability (clamped to [0, 100]) over player countries.
    pub mean_stability: f64,
    pub public_countries: usize,
}

impl WorldKpis {
    pub fn compute(records: &[CountryRecord]) -> Self {
        let players: Vec<&CountryRecord> = records.iter().filter(|r| r.has_player()).collect();
        let n = players.len();
        let mean = |f: fn(&CountryRecord) -> f64| {
            if n == 0 {
                0.0
            } else {
                players.iter().map(|r| f(r)).sum::<f64>() / n as f64
            }
        };
        Self {
            active_players: n,
            mean_gdp: mean(|r| finite(r.economy.gdp)),
            mean_stability: mean(|r| percent(r.economy.stability)),
            public_countries: records
                .iter()
                .filter(|r| r.visibility == Visibility::Public)
                .count(),
        }
    }

    /// Mean stability rounded for display as "NN/100".
    pub fn mean_stability_rounded(&self) -> u32 {
        self.mean_stability.round() as u32
    }
}

/// Leaderboard ordering: higher WPI first, then name, then id.
pub fn rank_order(a: &LeaderboardRow, b: &LeaderboardRow) -> Ordering {
    b.wpi
        .cmp(&a.wpi)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nation_core::RawInputs;
    use proptest::prelude::*;

    fn country(id: &str, gdp: f64, pop: f64, tech: f64) -> CountryRecord {
        CountryRecord {
            id: id.to_string(),
            name: id.to_string(),
            flag: "🏳️".to_string(),
            economy: RawInputs {
                gdp,
                population: pop,
                technology: tech,
                ..RawInputs::default()
            },
            ..CountryRecord::default()
        }
    }

    #[test]
    fn wpi_average() {
        assert_eq!(wpi(10_000.0, 50.0, WpiWeights::UNWEIGHTED), 50);
        assert_eq!(wpi(20_000.0, 100.0, WpiWeights::UNWEIGHTED), 100);
        assert_eq!(wpi(40_000.0, 100.0, WpiWeights::UNWEIGHTED), 100);
        // (5 + 20) / 2 = 12.5 rounds away from zero
        assert_eq!(wpi(1_000.0, 20.0, WpiWeights::UNWEIGHTED), 13);
    }

    #[test]
    fn wpi_blended_leans_on_technology() {
        // 0.45 × 0 + 0.55 × 100
        assert_eq!(wpi(0.0, 100.0, WpiWeights::BLENDED), 55);
        assert_eq!(wpi(0.0, 100.0, WpiWeights::UNWEIGHTED), 50);
    }

    #[test]
    fn wpi_floor_and_pre_clamp_inputs() {
        assert_eq!(wpi(0.0, 0.0, WpiWeights::UNWEIGHTED), 1);
        assert_eq!(wpi(f64::NAN, f64::INFINITY, WpiWeights::UNWEIGHTED), 1);
        assert_eq!(wpi(0.0, 150.0, WpiWeights::UNWEIGHTED), 50);
        assert_eq!(wpi_for(&country("X", 0.0, 0.0, 0.0), WpiWeights::UNWEIGHTED), 1);
        // population 0 divides by 1
        assert_eq!(wpi_for(&country("Y", 20_000.0, 0.0, 0.0), WpiWeights::UNWEIGHTED), 50);
    }

    #[test]
    fn stability_bands_inclusive() {
        use StabilityBand::*;
        let cases = [
            (0.0, Anarchy),
            (20.0, Anarchy),
            (21.0, Unstable),
            (49.0, Unstable),
            (50.0, Neutral),
            (74.0, Neutral),
            (75.0, Calm),
            (100.0, Calm),
            (f64::NAN, Anarchy),
        ];
        for (score, band) in cases {
            assert_eq!(StabilityBand::from_score(score), band, "score {score}");
        }
        assert_eq!(Anarchy.label(), "Anarchy");
    }

    #[test]
    fn filters_partition_by_visibility_and_player() {
        let mut private = country("P", 1.0, 1.0, 1.0);
        private.visibility = Visibility::Private;
        let mut owned = country("O", 1.0, 1.0, 1.0);
        owned.player_id = Some("uid".into());
        let free = country("F", 1.0, 1.0, 1.0);
        let all = [private, owned, free];

        let ids = |f: VisibilityFilter| -> Vec<String> {
            all.iter().filter(|r| f.matches(r)).map(|r| r.id.clone()).collect()
        };
        assert_eq!(ids(VisibilityFilter::All).len(), 3);
        assert_eq!(ids(VisibilityFilter::Private), vec!["P"]);
        assert_eq!(ids(VisibilityFilter::Public), vec!["O", "F"]);
        assert_eq!(ids(VisibilityFilter::WithPlayer), vec!["O"]);
        assert_eq!(ids(VisibilityFilter::WithoutPlayer), vec!["P", "F"]);
        assert_eq!(VisibilityFilter::parse("sem-jogadores"), Some(VisibilityFilter::WithoutPlayer));
        assert_eq!(VisibilityFilter::parse("??"), None);
    }

    #[test]
    fn leaderboard_sorts_and_skips_unlisted() {
        let mut nameless = country("Z", 1e9, 1.0, 100.0);
        nameless.name.clear();
        let records = [
            country("Beta", 0.0, 1.0, 40.0),
            country("Alpha", 0.0, 1.0, 40.0),
            country("Gamma", 2_000_000.0, 100.0, 80.0),
            nameless,
        ];
        let rows = leaderboard(&records, VisibilityFilter::All, WpiWeights::UNWEIGHTED);
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Gamma", "Alpha", "Beta"]);
        assert_eq!(rows[0].wpi, 90);
        assert_eq!(rows[0].gdp_per_capita, 20_000.0);
        assert_eq!(rank_order(&rows[1], &rows[2]), Ordering::Less);
    }

    #[test]
    fn kpis_over_player_countries() {
        let mut a = country("A", 100.0, 1.0, 0.0);
        a.player_id = Some("u1".into());
        a.economy.stability = 81.0;
        let mut b = country("B", 300.0, 1.0, 0.0);
        b.player_id = Some("u2".into());
        b.economy.stability = 130.0;
        let mut c = country("C", 1e6, 1.0, 0.0);
        c.visibility = Visibility::Private;
        let k = WorldKpis::compute(&[a, b, c]);
        assert_eq!(k.active_players, 2);
        assert_eq!(k.mean_gdp, 200.0);
        assert_eq!(k.mean_stability, 90.5);
        assert_eq!(k.mean_stability_rounded(), 91);
        assert_eq!(k.public_countries, 2);
        assert_eq!(WorldKpis::compute(&[]), WorldKpis::default());
    }

    #[test]
    fn row_serializes_band_label() {
        let row = LeaderboardRow::new(&country("A", 1.0, 1.0, 1.0), WpiWeights::default());
        let v = serde_json::to_value(&row).unwrap();
        assert_eq!(v["stability"], "Anarchy");
    }

    proptest! {
        #[test]
        fn wpi_always_in_range(
            gdp in proptest::num::f64::ANY,
            pop in proptest::num::f64::ANY,
            tech in proptest::num::f64::ANY,
        ) {
            let r = country("X", gdp, pop, tech);
            for w in [WpiWeights::UNWEIGHTED, WpiWeights::BLENDED] {
                let score = wpi_for(&r, w);
                prop_assert!((1..=100).contains(&score));
            }
        }
    }
}
