//! In-process document store.

use crate::{overlay, Body, DocumentStore, StoreError};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

type Key = (String, String);

/// Documents kept in a sorted map behind an async lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<Key, Body>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(collection: &str, id: &str) -> Key {
        (collection.to_string(), id.to_string())
    }

    /// Number of documents in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        self.docs
            .read()
            .await
            .keys()
            .filter(|(c, _)| c == collection)
            .count()
    }
}

impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Body>, StoreError> {
        Ok(self.docs.read().await.get(&Self::key(collection, id)).cloned())
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Body)>, StoreError> {
        Ok(self
            .docs
            .read()
            .await
            .iter()
            .filter(|((c, _), _)| c == collection)
            .map(|((_, id), body)| (id.clone(), body.clone()))
            .collect())
    }

    async fn set(&self, collection: &str, id: &str, body: Body) -> Result<(), StoreError> {
        self.docs.write().await.insert(Self::key(collection, id), body);
        Ok(())
    }

    async fn merge(&self, collection: &str, id: &str, patch: Body) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        overlay(docs.entry(Self::key(collection, id)).or_default(), patch);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, patch: Body) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        match docs.get_mut(&Self::key(collection, id)) {
            Some(body) => {
                overlay(body, patch);
                Ok(())
            }
            None => Err(StoreError::not_found(collection, id)),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.docs.write().await.remove(&Self::key(collection, id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::into_body;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn collections_are_isolated() {
        let store = MemoryStore::new();
        let b = into_body("x", "y", json!({"v": 1})).unwrap();
        store.set("paises", "A", b.clone()).await.unwrap();
        store.set("usuarios", "A", b).await.unwrap();
        assert_eq!(store.count("paises").await, 1);
        store.delete("paises", "A").await.unwrap();
        assert_eq!(store.count("paises").await, 0);
        assert_eq!(store.count("usuarios").await, 1);
    }

    #[tokio::test]
    async fn merge_and_update() {
        let store = MemoryStore::new();
        let patch = into_body("x", "y", json!({"turnoAtual": 4})).unwrap();
        assert!(store.update("configuracoes", "jogo", patch.clone()).await.is_err());
        store.merge("configuracoes", "jogo", patch).await.unwrap();
        let doc = store.get("configuracoes", "jogo").await.unwrap().unwrap();
        assert_eq!(Value::Object(doc), json!({"turnoAtual": 4}));
    }
}
