//! SQLite-backed document store.

use crate::{into_body, overlay, Body, DocumentStore, StoreError};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    body TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (collection, id)
)";

const UPSERT: &str = "INSERT INTO documents (collection, id, body, updated_at)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT (collection, id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at";

/// Documents stored as JSON text in a single `documents` table.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

/// Create the directory a file-backed `sqlite://` URL points into.
pub fn ensure_parent_dir(url: &str) -> std::io::Result<()> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .map(|p| p.split('?').next().unwrap_or(p));
    match path {
        Some(p) if !p.contains(":memory:") => match Path::new(p).parent() {
            Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
            _ => Ok(()),
        },
        _ => Ok(()),
    }
}

/// Open (creating if missing) the database at `url` and apply the schema.
///
/// `sqlite::memory:` URLs get a single long-lived connection so every
/// query sees the same in-memory database.
pub async fn init_db(url: &str) -> Result<SqliteStore, StoreError> {
    let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let in_memory = url.contains(":memory:");
    let pool = SqlitePoolOptions::new()
        .max_connections(if in_memory { 1 } else { 4 })
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect_with(opts)
        .await?;
    sqlx::query(SCHEMA).execute(&pool).await?;
    info!(%url, "document store ready");
    Ok(SqliteStore { pool })
}

impl SqliteStore {
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn parse(collection: &str, id: &str, text: &str) -> Result<Body, StoreError> {
        let value = serde_json::from_str(text).map_err(|source| StoreError::Malformed {
            collection: collection.to_string(),
            id: id.to_string(),
            source,
        })?;
        into_body(collection, id, value)
    }

    /// Read, overlay and write back holding the write lock taken by
    /// `BEGIN IMMEDIATE`.
    async fn overlay_existing(
        &self,
        collection: &str,
        id: &str,
        patch: Body,
        create: bool,
    ) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        let outcome = async {
            let current: Option<String> =
                sqlx::query_scalar("SELECT body FROM documents WHERE collection = ?1 AND id = ?2")
                    .bind(collection)
                    .bind(id)
                    .fetch_optional(&mut *conn)
                    .await?;
            let mut body = match current {
                Some(text) => Self::parse(collection, id, &text)?,
                None if create => Body::new(),
                None => return Err(StoreError::not_found(collection, id)),
            };
            overlay(&mut body, patch);
            sqlx::query(UPSERT)
                .bind(collection)
                .bind(id)
                .bind(serde_json::to_string(&body)?)
                .bind(Utc::now().to_rfc3339())
                .execute(&mut *conn)
                .await?;
            Ok::<(), StoreError>(())
        }
        .await;
        match outcome {
            Ok(()) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                debug!(collection, id, "merged document");
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                    warn!(collection, id, error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }
}

impl DocumentStore for SqliteStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Body>, StoreError> {
        let text: Option<String> =
            sqlx::query_scalar("SELECT body FROM documents WHERE collection = ?1 AND id = ?2")
                .bind(collection)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        text.map(|t| Self::parse(collection, id, &t)).transpose()
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Body)>, StoreError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT id, body FROM documents WHERE collection = ?1 ORDER BY id")
                .bind(collection)
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter()
            .map(|(id, text)| Self::parse(collection, &id, &text).map(|body| (id, body)))
            .collect()
    }

    async fn set(&self, collection: &str, id: &str, body: Body) -> Result<(), StoreError> {
        sqlx::query(UPSERT)
            .bind(collection)
            .bind(id)
            .bind(serde_json::to_string(&body)?)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        debug!(collection, id, "wrote document");
        Ok(())
    }

    async fn merge(&self, collection: &str, id: &str, patch: Body) -> Result<(), StoreError> {
        self.overlay_existing(collection, id, patch, true).await
    }

    async fn update(&self, collection: &str, id: &str, patch: Body) -> Result<(), StoreError> {
        self.overlay_existing(collection, id, patch, false).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM documents WHERE collection = ?1 AND id = ?2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        debug!(collection, id, "deleted document");
        Ok(())
    }
}
