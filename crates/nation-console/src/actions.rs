//! Store round-trips behind the console buttons.
//!
//! Every action reports back with a [`Notice`]. Store failures are logged
//! and turned into an error notice; they never propagate to the caller.

use crate::editor::{self, EditorForm, EditorMsg};
use crate::player::PlayerPanel;
use crate::viewer::{self, ViewerMsg, ViewerState};
use chrono::{DateTime, Utc};
use nation_core::{CountryRecord, GameConfig};
use nation_econ::{CountryDocument, TuningTable};
use persistence::{DocumentStore, Repository, StoreError};
use serde::Serialize;
use std::fmt;
use tracing::{error, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum NoticeKind {
    Success,
    Error,
    Warning,
}

/// Message shown to the user after an action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == NoticeKind::Success
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.kind {
            NoticeKind::Success => "ok",
            NoticeKind::Error => "error",
            NoticeKind::Warning => "warning",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}

/// Load the country whose id is typed in the form.
pub async fn search_country<S: DocumentStore>(
    repo: &Repository<S>,
    form: EditorForm,
) -> (EditorForm, Notice) {
    let Some(id) = form.id().map(str::to_string) else {
        return (form, Notice::error("Enter a country id to search."));
    };
    match repo.fetch_country(&id).await {
        Ok(Some(record)) => {
            let notice = Notice::success(format!(
                "Country \"{}\" ({}) loaded.",
                record.name, record.id
            ));
            (editor::update(form, EditorMsg::Load(record)), notice)
        }
        Ok(None) => (form, Notice::error(format!("No country with id \"{id}\"."))),
        Err(e) => {
            error!(%id, error = %e, "country lookup failed");
            (form, Notice::error("Could not load the country. Check the id and the connection."))
        }
    }
}

/// Derive and write the form's country in full.
pub async fn save_country<S: DocumentStore>(
    repo: &Repository<S>,
    form: &EditorForm,
    tuning: &TuningTable,
) -> Notice {
    let record = match form.to_record() {
        Ok(r) => r,
        Err(e) => return Notice::error(format!("Cannot save: {e}.")),
    };
    let doc = CountryDocument::build(record, tuning);
    match repo.save_country(&doc).await {
        Ok(()) => Notice::success(format!(
            "Country \"{}\" ({}) saved.",
            doc.record().name,
            doc.id()
        )),
        Err(e) => {
            error!(id = doc.id(), error = %e, "country save failed");
            Notice::error("Could not save the country. Check the connection and permissions.")
        }
    }
}

/// Delete the form's country; a successful delete clears the form.
pub async fn delete_country<S: DocumentStore>(
    repo: &Repository<S>,
    form: EditorForm,
) -> (EditorForm, Notice) {
    let Some(id) = form.id().map(str::to_string) else {
        return (form, Notice::error("Select a country to delete."));
    };
    match repo.delete_country(&id).await {
        Ok(()) => (
            editor::update(form, EditorMsg::Reset),
            Notice::success(format!("Country \"{id}\" deleted.")),
        ),
        Err(e) => {
            error!(%id, error = %e, "country delete failed");
            (form, Notice::error("Could not delete the country."))
        }
    }
}

/// Reload every country and the game configuration into the viewer.
pub async fn load_site_data<S: DocumentStore>(
    repo: &Repository<S>,
    state: ViewerState,
) -> (ViewerState, Notice) {
    let loaded = async {
        let countries = repo.fetch_countries().await?;
        let config = repo.game_config().await?;
        Ok::<_, StoreError>((countries, config))
    };
    match loaded.await {
        Ok((countries, config)) => {
            let n = countries.len();
            info!(countries = n, turn = config.current_turn, "site data loaded");
            let notice = if n == 0 {
                Notice::warning("No countries registered yet.")
            } else {
                Notice::success(format!("{n} countries loaded."))
            };
            (viewer::update(state, ViewerMsg::Loaded { countries, config }), notice)
        }
        Err(e) => {
            error!(error = %e, "site data load failed");
            (state, Notice::error("Could not load the world data."))
        }
    }
}

/// What a signed-in player sees first.
#[derive(Clone, Debug, PartialEq)]
pub enum PlayerEntry {
    /// Already governs a country.
    Panel(PlayerPanel),
    /// Must pick one of these countries.
    Choose(Vec<CountryRecord>),
    /// Nothing to show; the notice says why.
    Blocked(Notice),
}

pub async fn player_entry<S: DocumentStore>(
    repo: &Repository<S>,
    user_id: &str,
    current_turn: u32,
) -> PlayerEntry {
    let owned = async {
        let Some(id) = repo.player_country(user_id).await? else {
            return Ok::<_, StoreError>(None);
        };
        repo.fetch_country(&id).await
    };
    match owned.await {
        Ok(Some(record)) => return PlayerEntry::Panel(PlayerPanel::new(&record, current_turn)),
        Ok(None) => {}
        Err(e) => {
            error!(%user_id, error = %e, "player country lookup failed");
            return PlayerEntry::Blocked(Notice::error("Could not load your country."));
        }
    }
    match repo.available_countries().await {
        Ok(list) if list.is_empty() => PlayerEntry::Blocked(Notice::warning(
            "No countries are available for selection right now.",
        )),
        Ok(list) => PlayerEntry::Choose(list),
        Err(e) => {
            error!(%user_id, error = %e, "available countries lookup failed");
            PlayerEntry::Blocked(Notice::error("Could not list the available countries."))
        }
    }
}

/// Link `user_id` to a country picked from the selection list.
pub async fn link_player<S: DocumentStore>(
    repo: &Repository<S>,
    user_id: &str,
    country_id: &str,
    now: DateTime<Utc>,
) -> Notice {
    let record = match repo.fetch_country(country_id).await {
        Ok(Some(r)) => r,
        Ok(None) => return Notice::error(format!("No country with id \"{country_id}\".")),
        Err(e) => {
            error!(%country_id, error = %e, "country lookup failed");
            return Notice::error("Could not link the country. Try again.");
        }
    };
    if record.player_id.as_deref().is_some_and(|p| p != user_id) {
        warn!(%user_id, %country_id, "country already has a player");
        return Notice::error(format!("{} already has a player.", record.name));
    }
    match repo.link_player(user_id, country_id, now).await {
        Ok(()) => Notice::success(format!("You now govern {}!", record.name)),
        Err(e) => {
            error!(%user_id, %country_id, error = %e, "player link failed");
            Notice::error("Could not link the country. Try again.")
        }
    }
}

/// Set the current turn. Only narrators may; a failed permission lookup
/// counts as a refusal. Returns the stored configuration on success.
pub async fn set_turn<S: DocumentStore>(
    repo: &Repository<S>,
    user_id: &str,
    turn: u32,
    now: DateTime<Utc>,
) -> (Notice, Option<GameConfig>) {
    let permissions = match repo.user_permissions(user_id).await {
        Ok(p) => p,
        Err(e) => {
            error!(%user_id, error = %e, "permission lookup failed");
            return (Notice::error("Permission check failed; turn not changed."), None);
        }
    };
    if !permissions.is_narrator {
        warn!(%user_id, turn, "turn change refused");
        return (Notice::error("Only narrators can change the turn."), None);
    }
    match repo.update_turn(turn, now).await {
        Ok(config) => (Notice::success(format!("Turn updated to #{turn}.")), Some(config)),
        Err(e) => {
            error!(turn, error = %e, "turn update failed");
            (Notice::error("Could not save the turn."), None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::Field;
    use chrono::TimeZone;
    use nation_core::{Role, UserProfile};
    use persistence::MemoryStore;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap()
    }

    fn form(pairs: &[(Field, &str)]) -> EditorForm {
        pairs.iter().fold(EditorForm::default(), |f, (field, text)| {
            editor::update(f, EditorMsg::Set(*field, text.to_string()))
        })
    }

    async fn seeded() -> Repository<MemoryStore> {
        let repo = Repository::new(MemoryStore::new());
        let f = form(&[
            (Field::Id, "br"),
            (Field::Name, "Brasil"),
            (Field::Gdp, "1000000"),
            (Field::Population, "100000"),
        ]);
        assert!(save_country(&repo, &f, &TuningTable::default()).await.is_success());
        repo
    }

    #[tokio::test]
    async fn save_requires_id() {
        let repo = Repository::new(MemoryStore::new());
        let n = save_country(&repo, &EditorForm::default(), &TuningTable::default()).await;
        assert_eq!(n.kind, NoticeKind::Error);
        assert_eq!(repo.store().count(nation_core::COUNTRIES).await, 0);
    }

    #[tokio::test]
    async fn search_loads_into_form() {
        let repo = seeded().await;
        let (f, n) = search_country(&repo, form(&[(Field::Id, "BR")])).await;
        assert!(n.is_success(), "{n}");
        assert_eq!(f.text(Field::Name), "Brasil");
        assert_eq!(f.text(Field::Gdp), "1000000");

        let (f, n) = search_country(&repo, form(&[(Field::Id, "ZZ")])).await;
        assert_eq!(n.kind, NoticeKind::Error);
        assert_eq!(f.id(), Some("ZZ"));
    }

    #[tokio::test]
    async fn delete_resets_form() {
        let repo = seeded().await;
        let (f, n) = delete_country(&repo, form(&[(Field::Id, "BR")])).await;
        assert!(n.is_success());
        assert_eq!(f, EditorForm::default());
        assert!(repo.fetch_country("BR").await.unwrap().is_none());

        let (_, n) = delete_country(&repo, EditorForm::default()).await;
        assert_eq!(n.kind, NoticeKind::Error);
    }

    #[tokio::test]
    async fn site_data_fills_viewer() {
        let empty = Repository::new(MemoryStore::new());
        let (s, n) = load_site_data(&empty, ViewerState::default()).await;
        assert_eq!(n.kind, NoticeKind::Warning);
        assert!(!s.is_loaded());

        let repo = seeded().await;
        repo.update_turn(3, now()).await.unwrap();
        let (s, n) = load_site_data(&repo, ViewerState::default()).await;
        assert!(n.is_success());
        assert!(s.is_loaded());
        assert_eq!(s.config().current_turn, 3);
        assert_eq!(s.countries().len(), 1);
    }

    #[tokio::test]
    async fn player_flow_choose_then_panel() {
        let repo = seeded().await;
        match player_entry(&repo, "uid-1", 1).await {
            PlayerEntry::Choose(list) => assert_eq!(list[0].id, "BR"),
            other => panic!("expected a choice, got {other:?}"),
        }
        assert!(link_player(&repo, "uid-1", "BR", now()).await.is_success());
        match player_entry(&repo, "uid-1", 1).await {
            PlayerEntry::Panel(p) => {
                assert_eq!(p.country_id, "BR");
                assert!(p.is_turn_late);
            }
            other => panic!("expected a panel, got {other:?}"),
        }
        let n = link_player(&repo, "uid-2", "BR", now()).await;
        assert_eq!(n.kind, NoticeKind::Error);
        assert!(matches!(
            player_entry(&repo, "uid-2", 1).await,
            PlayerEntry::Blocked(Notice { kind: NoticeKind::Warning, .. })
        ));
    }

    #[tokio::test]
    async fn only_narrators_set_the_turn() {
        let repo = Repository::new(MemoryStore::new());
        let (n, cfg) = set_turn(&repo, "nobody", 4, now()).await;
        assert_eq!(n.kind, NoticeKind::Error);
        assert!(cfg.is_none());

        let narrator = UserProfile {
            role: Role::Narrator,
            ..UserProfile::default()
        };
        repo.upsert_user("uid-n", &narrator).await.unwrap();
        let (n, cfg) = set_turn(&repo, "uid-n", 4, now()).await;
        assert!(n.is_success());
        assert_eq!(cfg.unwrap().current_turn, 4);
        assert_eq!(repo.game_config().await.unwrap().current_turn, 4);
    }
}
