#![deny(warnings)]

//! Persistence layer: a JSON document store keyed by (collection, id).
//!
//! [`DocumentStore`] is the seam between the console and whatever backs it.
//! [`SqliteStore`] keeps documents in a local SQLite file; [`MemoryStore`]
//! keeps them in process for tests and dry runs. [`Repository`] layers the
//! typed country, user and game-configuration operations on top.

mod memory;
mod repository;
mod sqlite;

pub use memory::MemoryStore;
pub use repository::Repository;
pub use sqlite::{ensure_parent_dir, init_db, SqliteStore};

use serde_json::{Map, Value};
use std::future::Future;
use thiserror::Error;

/// JSON object body of a document.
pub type Body = Map<String, Value>;

/// Errors produced at the store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("document {collection}/{id} is malformed: {source}")]
    Malformed {
        collection: String,
        id: String,
        source: serde_json::Error,
    },
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },
    #[error("document {collection}/{id} is not a JSON object")]
    NotAnObject { collection: String, id: String },
}

impl StoreError {
    pub(crate) fn not_found(collection: &str, id: &str) -> Self {
        StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub(crate) fn not_an_object(collection: &str, id: &str) -> Self {
        StoreError::NotAnObject {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

/// Document database holding JSON objects.
///
/// Writes are last-write-wins; [`merge`](DocumentStore::merge) and
/// [`update`](DocumentStore::update) overlay top-level keys atomically with
/// respect to other writes on the same store.
pub trait DocumentStore: Send + Sync {
    fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<Body>, StoreError>> + Send;

    /// All documents of a collection, ordered by id.
    fn list(
        &self,
        collection: &str,
    ) -> impl Future<Output = Result<Vec<(String, Body)>, StoreError>> + Send;

    /// Replace the whole document, creating it if needed.
    fn set(
        &self,
        collection: &str,
        id: &str,
        body: Body,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Overlay `patch` onto the document, creating it if needed.
    fn merge(
        &self,
        collection: &str,
        id: &str,
        patch: Body,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Overlay `patch` onto an existing document; fails with
    /// [`StoreError::NotFound`] otherwise.
    fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Body,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Remove a document. Deleting a missing document is not an error.
    fn delete(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Turn a serialized value into a document body.
pub fn into_body(collection: &str, id: &str, value: Value) -> Result<Body, StoreError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::not_an_object(collection, id)),
    }
}

pub(crate) fn overlay(target: &mut Body, patch: Body) {
    for (k, v) in patch {
        target.insert(k, v);
    }
}

/// Returns the default SQLite URL used for local saves.
pub fn default_sqlite_url() -> &'static str {
    "sqlite://./saves/main.db"
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn url_is_sqlite() {
        assert!(default_sqlite_url().starts_with("sqlite://"));
    }

    #[test]
    fn bodies_must_be_objects() {
        assert!(into_body("paises", "BR", json!({"a": 1})).is_ok());
        let err = into_body("paises", "BR", json!([1, 2])).unwrap_err();
        assert!(matches!(err, StoreError::NotAnObject { .. }));
    }

    #[test]
    fn overlay_replaces_top_level_keys() {
        let mut a = into_body("c", "i", json!({"x": 1, "y": {"z": 1}})).unwrap();
        let b = into_body("c", "i", json!({"y": 2, "w": 3})).unwrap();
        overlay(&mut a, b);
        assert_eq!(Value::Object(a), json!({"x": 1, "y": 2, "w": 3}));
    }
}
