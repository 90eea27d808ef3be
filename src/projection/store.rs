// Copyright (c) 2025 - Cowboy AI, Inc.
//! Read-model persistence
//!
//! Records are JSON objects stored under a key inside a named collection. The
//! key is embedded in every stored record as `_key`, so a listed or found
//! record still says which key it belongs to.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::ProjectionError;

/// Field holding the record key inside a stored record
pub const KEY_FIELD: &str = "_key";

/// Keyed record store for read models
#[async_trait]
pub trait ProjectionStore: Send + Sync {
    /// # Errors
    ///
    /// `DuplicateKey` if the key already exists.
    async fn insert(&self, collection: &str, key: &str, record: Value) -> Result<(), ProjectionError>;

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, ProjectionError>;

    /// Replace an existing record
    ///
    /// # Errors
    ///
    /// `MissingKey` if the key does not exist.
    async fn update(&self, collection: &str, key: &str, record: Value) -> Result<(), ProjectionError>;

    /// # Errors
    ///
    /// `MissingKey` if the key does not exist.
    async fn remove(&self, collection: &str, key: &str) -> Result<(), ProjectionError>;

    /// All records of a collection in key order
    async fn list(&self, collection: &str) -> Result<Vec<Value>, ProjectionError>;

    /// Records whose `field` equals `value`
    async fn find(&self, collection: &str, field: &str, value: &Value) -> Result<Vec<Value>, ProjectionError> {
        Ok(self
            .list(collection)
            .await?
            .into_iter()
            .filter(|record| record.get(field) == Some(value))
            .collect())
    }
}

fn with_key(key: &str, record: Value) -> Result<Value, ProjectionError> {
    match record {
        Value::Object(mut fields) => {
            fields.insert(KEY_FIELD.to_string(), Value::String(key.to_string()));
            Ok(Value::Object(fields))
        }
        other => Err(ProjectionError::InvalidRecord(format!(
            "record for {key} must be an object, got {other}"
        ))),
    }
}

/// In-memory [`ProjectionStore`]
#[derive(Default)]
pub struct MemoryProjectionStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Value>>>,
}

impl MemoryProjectionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectionStore for MemoryProjectionStore {
    async fn insert(&self, collection: &str, key: &str, record: Value) -> Result<(), ProjectionError> {
        let record = with_key(key, record)?;
        let mut collections = self.collections.write().await;
        let records = collections.entry(collection.to_string()).or_default();

        if records.contains_key(key) {
            return Err(ProjectionError::DuplicateKey {
                collection: collection.to_string(),
                key: key.to_string(),
            });
        }
        records.insert(key.to_string(), record);
        Ok(())
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, ProjectionError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|records| records.get(key))
            .cloned())
    }

    async fn update(&self, collection: &str, key: &str, record: Value) -> Result<(), ProjectionError> {
        let record = with_key(key, record)?;
        let mut collections = self.collections.write().await;

        match collections
            .get_mut(collection)
            .and_then(|records| records.get_mut(key))
        {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(ProjectionError::MissingKey {
                collection: collection.to_string(),
                key: key.to_string(),
            }),
        }
    }

    async fn remove(&self, collection: &str, key: &str) -> Result<(), ProjectionError> {
        let mut collections = self.collections.write().await;

        match collections
            .get_mut(collection)
            .and_then(|records| records.remove(key))
        {
            Some(_) => Ok(()),
            None => Err(ProjectionError::MissingKey {
                collection: collection.to_string(),
                key: key.to_string(),
            }),
        }
    }

    async fn list(&self, collection: &str) -> Result<Vec<Value>, ProjectionError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_embeds_key() {
        let store = MemoryProjectionStore::new();
        store.insert("customers", "C1", json!({ "name": "Test" })).await.unwrap();

        assert_eq!(
            store.get("customers", "C1").await.unwrap(),
            Some(json!({ "name": "Test", "_key": "C1" }))
        );
    }

    #[tokio::test]
    async fn test_insert_existing_key_fails() {
        let store = MemoryProjectionStore::new();
        store.insert("customers", "C1", json!({})).await.unwrap();

        assert_eq!(
            store.insert("customers", "C1", json!({})).await,
            Err(ProjectionError::DuplicateKey {
                collection: "customers".into(),
                key: "C1".into()
            })
        );
    }

    #[tokio::test]
    async fn test_update_and_remove_require_existing_key() {
        let store = MemoryProjectionStore::new();

        assert!(matches!(
            store.update("customers", "C1", json!({})).await,
            Err(ProjectionError::MissingKey { .. })
        ));
        assert!(matches!(
            store.remove("customers", "C1").await,
            Err(ProjectionError::MissingKey { .. })
        ));

        store.insert("customers", "C1", json!({ "name": "A" })).await.unwrap();
        store.update("customers", "C1", json!({ "name": "B" })).await.unwrap();
        assert_eq!(
            store.get("customers", "C1").await.unwrap(),
            Some(json!({ "name": "B", "_key": "C1" }))
        );

        store.remove("customers", "C1").await.unwrap();
        assert_eq!(store.get("customers", "C1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_matches_field() {
        let store = MemoryProjectionStore::new();
        store.insert("customers", "C1", json!({ "email": "a@test.com" })).await.unwrap();
        store.insert("customers", "C2", json!({ "email": "b@test.com" })).await.unwrap();

        let found = store
            .find("customers", "email", &json!("b@test.com"))
            .await
            .unwrap();
        assert_eq!(found, vec![json!({ "email": "b@test.com", "_key": "C2" })]);

        assert!(store.list("unknown").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_object_record_is_rejected() {
        let store = MemoryProjectionStore::new();
        assert!(matches!(
            store.insert("customers", "C1", json!("flat")).await,
            Err(ProjectionError::InvalidRecord(_))
        ));
    }
}
