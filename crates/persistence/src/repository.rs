//! Typed operations over the `paises`, `usuarios` and `configuracoes`
//! collections.

use crate::{into_body, Body, DocumentStore, StoreError};
use chrono::{DateTime, Utc};
use nation_core::{
    fold_legacy_keys, CountryRecord, GameConfig, Permissions, Role, UserProfile, COUNTRIES, GAME_CONFIG_ID, SETTINGS,
    USERS,
};
use nation_econ::CountryDocument;
use serde_json::{json, Value};
use tracing::{info, warn};

/// Country, user and game-configuration access over any [`DocumentStore`].
#[derive(Debug)]
pub struct Repository<S> {
    store: S,
}

fn patch(value: Value) -> Body {
    match value {
        Value::Object(map) => map,
        _ => Body::new(),
    }
}

impl<S: DocumentStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Every readable country, ordered by id. Documents that cannot be
    /// parsed are skipped so one bad entry does not hide the rest.
    pub async fn fetch_countries(&self) -> Result<Vec<CountryRecord>, StoreError> {
        let docs = self.store.list(COUNTRIES).await?;
        let mut out = Vec::with_capacity(docs.len());
        for (id, body) in docs {
            match CountryRecord::from_document(&id, Value::Object(body)) {
                Ok(record) => out.push(record),
                Err(e) => warn!(%id, error = %e, "skipping unreadable country"),
            }
        }
        Ok(out)
    }

    pub async fn fetch_country(&self, id: &str) -> Result<Option<CountryRecord>, StoreError> {
        let Some(body) = self.store.get(COUNTRIES, id).await? else {
            return Ok(None);
        };
        CountryRecord::from_document(id, Value::Object(body))
            .map(Some)
            .map_err(|source| StoreError::Malformed {
                collection: COUNTRIES.to_string(),
                id: id.to_string(),
                source,
            })
    }

    /// Overwrite the country document with raw and derived fields together.
    pub async fn save_country(&self, doc: &CountryDocument) -> Result<(), StoreError> {
        let body = into_body(COUNTRIES, doc.id(), serde_json::to_value(doc)?)?;
        self.store.set(COUNTRIES, doc.id(), body).await?;
        info!(id = doc.id(), name = %doc.record().name, "saved country");
        Ok(())
    }

    pub async fn delete_country(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(COUNTRIES, id).await?;
        info!(%id, "deleted country");
        Ok(())
    }

    /// Countries no player governs yet.
    pub async fn available_countries(&self) -> Result<Vec<CountryRecord>, StoreError> {
        let mut all = self.fetch_countries().await?;
        all.retain(|c| !c.has_player());
        Ok(all)
    }

    /// Assign `country_id` to `user_id` and record the link on both
    /// documents. The country must exist. Its legacy keys are folded and the
    /// whole document rewritten, so no stale `Player` survives the link. A
    /// user document is created when missing; an existing role is left
    /// untouched.
    pub async fn link_player(
        &self,
        user_id: &str,
        country_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let stamp = now.to_rfc3339();
        let mut country = self
            .store
            .get(COUNTRIES, country_id)
            .await?
            .ok_or_else(|| StoreError::not_found(COUNTRIES, country_id))?;
        fold_legacy_keys(&mut country);
        country.insert("player_id".into(), Value::from(user_id));
        country.insert("data_vinculacao".into(), Value::from(stamp.clone()));
        self.store.set(COUNTRIES, country_id, country).await?;

        let mut user = patch(json!({
            "paisId": country_id,
            "dataIngresso": stamp,
            "ativo": true,
        }));
        if self.store.get(USERS, user_id).await?.is_none() {
            user.insert("papel".into(), Value::from(Role::Player.as_str()));
        }
        self.store.merge(USERS, user_id, user).await?;
        info!(%user_id, %country_id, "linked player to country");
        Ok(())
    }

    /// Country governed by `user_id`: the user's `paisId` when set, else the
    /// first country naming the user as player.
    pub async fn player_country(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        if let Some(id) = self.user(user_id).await?.and_then(|u| u.country_id) {
            return Ok(Some(id));
        }
        Ok(self
            .fetch_countries()
            .await?
            .into_iter()
            .find(|c| c.player_id.as_deref() == Some(user_id))
            .map(|c| c.id))
    }

    pub async fn user(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        let Some(body) = self.store.get(USERS, user_id).await? else {
            return Ok(None);
        };
        serde_json::from_value(Value::Object(body))
            .map(Some)
            .map_err(|source| StoreError::Malformed {
                collection: USERS.to_string(),
                id: user_id.to_string(),
                source,
            })
    }

    /// Role-derived permissions; unknown users get none.
    pub async fn user_permissions(&self, user_id: &str) -> Result<Permissions, StoreError> {
        Ok(self
            .user(user_id)
            .await?
            .map(|u| u.role.permissions())
            .unwrap_or_default())
    }

    /// Merge a profile into the user's document.
    pub async fn upsert_user(&self, user_id: &str, profile: &UserProfile) -> Result<(), StoreError> {
        let body = into_body(USERS, user_id, serde_json::to_value(profile)?)?;
        self.store.merge(USERS, user_id, body).await
    }

    /// Stamp the user's last login time.
    pub async fn record_login(&self, user_id: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.store
            .update(USERS, user_id, patch(json!({ "ultimoLogin": now.to_rfc3339() })))
            .await
    }

    /// The game configuration, or defaults when it was never written.
    pub async fn game_config(&self) -> Result<GameConfig, StoreError> {
        match self.store.get(SETTINGS, GAME_CONFIG_ID).await? {
            Some(body) => serde_json::from_value(Value::Object(body)).map_err(|source| {
                StoreError::Malformed {
                    collection: SETTINGS.to_string(),
                    id: GAME_CONFIG_ID.to_string(),
                    source,
                }
            }),
            None => Ok(GameConfig::default()),
        }
    }

    pub async fn update_turn(&self, turn: u32, now: DateTime<Utc>) -> Result<GameConfig, StoreError> {
        let config = GameConfig {
            current_turn: turn,
            updated_at: Some(now),
        };
        let body = into_body(SETTINGS, GAME_CONFIG_ID, serde_json::to_value(&config)?)?;
        self.store.merge(SETTINGS, GAME_CONFIG_ID, body).await?;
        info!(turn, "turn updated");
        Ok(config)
    }
}
