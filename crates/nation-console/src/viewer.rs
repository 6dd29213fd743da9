//! Read-only dashboard state.

use crate::player::PlayerPanel;
use nation_core::{CountryRecord, GameConfig};
use nation_rank::{leaderboard, LeaderboardRow, VisibilityFilter, WorldKpis, WpiWeights};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewerState {
    countries: Vec<CountryRecord>,
    config: GameConfig,
    filter: VisibilityFilter,
    loaded: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewerMsg {
    Loaded {
        countries: Vec<CountryRecord>,
        config: GameConfig,
    },
    FilterChanged(VisibilityFilter),
    TurnChanged(u32),
}

pub fn update(state: ViewerState, msg: ViewerMsg) -> ViewerState {
    match msg {
        ViewerMsg::Loaded { countries, config } => ViewerState {
            // an empty collection keeps the dashboard in its loading state
            loaded: !countries.is_empty(),
            countries,
            config,
            ..state
        },
        ViewerMsg::FilterChanged(filter) => ViewerState { filter, ..state },
        ViewerMsg::TurnChanged(turn) => {
            let mut state = state;
            state.config.current_turn = turn;
            state
        }
    }
}

impl ViewerState {
    pub fn countries(&self) -> &[CountryRecord] {
        &self.countries
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn filter(&self) -> VisibilityFilter {
        self.filter
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Leaderboard under the active filter.
    pub fn rows(&self, weights: WpiWeights) -> Vec<LeaderboardRow> {
        leaderboard(&self.countries, self.filter, weights)
    }

    /// KPIs over every loaded country, independent of the filter.
    pub fn kpis(&self) -> WorldKpis {
        WorldKpis::compute(&self.countries)
    }

    pub fn player_panel(&self, user_id: &str) -> Option<PlayerPanel> {
        PlayerPanel::for_player(&self.countries, user_id, self.config.current_turn)
    }
}

/// Player-less countries whose name contains `term`, ignoring case.
pub fn search_available<'a>(records: &'a [CountryRecord], term: &str) -> Vec<&'a CountryRecord> {
    let term = term.trim().to_lowercase();
    records
        .iter()
        .filter(|r| !r.has_player() && r.name.to_lowercase().contains(&term))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nation_core::Visibility;

    fn country(id: &str, name: &str, tech: f64, player: Option<&str>) -> CountryRecord {
        let mut r = CountryRecord {
            id: id.into(),
            name: name.into(),
            player_id: player.map(str::to_string),
            ..CountryRecord::default()
        };
        r.economy.technology = tech;
        r.economy.stability = 60.0;
        r
    }

    fn loaded() -> ViewerState {
        let mut private = country("PT", "Portugal", 90.0, None);
        private.visibility = Visibility::Private;
        update(
            ViewerState::default(),
            ViewerMsg::Loaded {
                countries: vec![
                    country("BR", "Brasil", 40.0, Some("uid-1")),
                    country("AR", "Argentina", 60.0, None),
                    private,
                ],
                config: GameConfig {
                    current_turn: 2,
                    updated_at: None,
                },
            },
        )
    }

    #[test]
    fn empty_load_is_not_loaded() {
        let s = update(
            ViewerState::default(),
            ViewerMsg::Loaded {
                countries: vec![],
                config: GameConfig::default(),
            },
        );
        assert!(!s.is_loaded());
        assert!(loaded().is_loaded());
    }

    #[test]
    fn rows_follow_filter() {
        let s = loaded();
        let ids: Vec<String> = s.rows(WpiWeights::UNWEIGHTED).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["PT", "AR", "BR"]);

        let s = update(s, ViewerMsg::FilterChanged(VisibilityFilter::Public));
        assert_eq!(s.rows(WpiWeights::UNWEIGHTED).len(), 2);
        let s = update(s, ViewerMsg::FilterChanged(VisibilityFilter::WithPlayer));
        assert_eq!(s.rows(WpiWeights::UNWEIGHTED)[0].id, "BR");
        // KPIs ignore the filter
        assert_eq!(s.kpis().public_countries, 2);
        assert_eq!(s.kpis().active_players, 1);
    }

    #[test]
    fn turn_change_updates_player_panel() {
        let s = loaded();
        assert!(s.player_panel("uid-1").unwrap().is_turn_late);
        let s = update(s, ViewerMsg::TurnChanged(0));
        assert_eq!(s.config().current_turn, 0);
        assert!(!s.player_panel("uid-1").unwrap().is_turn_late);
    }

    #[test]
    fn search_skips_taken_countries() {
        let s = loaded();
        let hits: Vec<&str> = search_available(s.countries(), " POR")
            .into_iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(hits, vec!["PT"]);
        assert_eq!(search_available(s.countries(), "").len(), 2);
        assert!(search_available(s.countries(), "bras").is_empty());
    }
}
