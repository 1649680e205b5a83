//! In-memory storage implementation.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::instrument;

use crate::error::{StorageError, StorageResult};
use crate::traits::{
    validate_store_id, validate_store_name, ModelStore, Store, StoredAuthorizationModel,
};

/// In-memory implementation of ModelStore.
///
/// Uses DashMap for thread-safe concurrent access without locks.
#[derive(Debug, Default)]
pub struct MemoryModelStore {
    stores: DashMap<String, Store>,
    /// Authorization models keyed by store_id.
    /// Models are stored in insertion order (newest at the end), but list methods
    /// return them newest-first.
    authorization_models: DashMap<String, Vec<StoredAuthorizationModel>>,
}

impl MemoryModelStore {
    /// Creates a new in-memory model store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory model store wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn require_store(&self, store_id: &str) -> StorageResult<()> {
        validate_store_id(store_id)?;
        if !self.stores.contains_key(store_id) {
            return Err(StorageError::StoreNotFound {
                store_id: store_id.to_string(),
            });
        }
        Ok(())
    }

    /// Models of a store ordered by created_at DESC, id DESC.
    fn models_newest_first(&self, store_id: &str) -> Vec<StoredAuthorizationModel> {
        let mut models: Vec<StoredAuthorizationModel> = self
            .authorization_models
            .get(store_id)
            .map(|models| models.iter().cloned().collect())
            .unwrap_or_default();
        models.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        models
    }
}

#[async_trait]
impl ModelStore for MemoryModelStore {
    #[instrument(skip(self))]
    async fn create_store(&self, id: &str, name: &str) -> StorageResult<Store> {
        validate_store_id(id)?;
        validate_store_name(name)?;

        let now = chrono::Utc::now();
        let store = Store {
            id: id.to_string(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };

        // Atomic check-and-insert
        match self.stores.entry(id.to_string()) {
            Entry::Occupied(_) => Err(StorageError::StoreAlreadyExists {
                store_id: id.to_string(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(store.clone());
                Ok(store)
            }
        }
    }

    async fn get_store(&self, id: &str) -> StorageResult<Store> {
        self.stores
            .get(id)
            .map(|s| s.value().clone())
            .ok_or_else(|| StorageError::StoreNotFound {
                store_id: id.to_string(),
            })
    }

    #[instrument(skip(self, model), fields(store_id = %model.store_id, model_id = %model.id))]
    async fn write_authorization_model(
        &self,
        model: StoredAuthorizationModel,
    ) -> StorageResult<StoredAuthorizationModel> {
        self.require_store(&model.store_id)?;

        if model.id.is_empty() {
            return Err(StorageError::InvalidInput {
                message: "model id cannot be empty".to_string(),
            });
        }

        // IDs are ULIDs minted by the handler, so no duplicate check
        self.authorization_models
            .entry(model.store_id.clone())
            .or_default()
            .push(model.clone());

        Ok(model)
    }

    async fn get_authorization_model(
        &self,
        store_id: &str,
        model_id: &str,
    ) -> StorageResult<StoredAuthorizationModel> {
        self.require_store(store_id)?;

        self.authorization_models
            .get(store_id)
            .and_then(|models| models.iter().find(|m| m.id == model_id).cloned())
            .ok_or_else(|| StorageError::ModelNotFound {
                model_id: model_id.to_string(),
            })
    }

    async fn list_authorization_models(
        &self,
        store_id: &str,
    ) -> StorageResult<Vec<StoredAuthorizationModel>> {
        self.require_store(store_id)?;
        Ok(self.models_newest_first(store_id))
    }

    async fn get_latest_authorization_model(
        &self,
        store_id: &str,
    ) -> StorageResult<StoredAuthorizationModel> {
        self.require_store(store_id)?;

        self.models_newest_first(store_id)
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::ModelNotFound {
                model_id: format!("latest (no models exist for store {store_id})"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(id: &str, store_id: &str) -> StoredAuthorizationModel {
        StoredAuthorizationModel::new(id, store_id, "1.1", r#"{"type_definitions":[]}"#)
    }

    #[tokio::test]
    async fn test_create_and_get_store() {
        let store = MemoryModelStore::new();
        let created = store.create_store("store-1", "Test Store").await.unwrap();
        assert_eq!(created.id, "store-1");

        let fetched = store.get_store("store-1").await.unwrap();
        assert_eq!(fetched.name, "Test Store");
    }

    #[tokio::test]
    async fn test_create_store_twice_fails() {
        let store = MemoryModelStore::new();
        store.create_store("store-1", "Test").await.unwrap();
        let result = store.create_store("store-1", "Again").await;
        assert!(matches!(
            result,
            Err(StorageError::StoreAlreadyExists { store_id }) if store_id == "store-1"
        ));
    }

    #[tokio::test]
    async fn test_get_missing_store_fails() {
        let store = MemoryModelStore::new();
        assert!(matches!(
            store.get_store("nope").await,
            Err(StorageError::StoreNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_write_model_requires_store() {
        let store = MemoryModelStore::new();
        let result = store.write_authorization_model(model("m1", "missing")).await;
        assert!(matches!(result, Err(StorageError::StoreNotFound { .. })));
    }

    #[tokio::test]
    async fn test_write_model_rejects_empty_id() {
        let store = MemoryModelStore::new();
        store.create_store("store-1", "Test").await.unwrap();
        let result = store.write_authorization_model(model("", "store-1")).await;
        assert!(matches!(result, Err(StorageError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_write_then_get_model() {
        let store = MemoryModelStore::new();
        store.create_store("store-1", "Test").await.unwrap();
        store
            .write_authorization_model(model("m1", "store-1"))
            .await
            .unwrap();

        let fetched = store.get_authorization_model("store-1", "m1").await.unwrap();
        assert_eq!(fetched.schema_version, "1.1");
        assert!(matches!(
            store.get_authorization_model("store-1", "m2").await,
            Err(StorageError::ModelNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_and_latest_are_newest_first() {
        let store = MemoryModelStore::new();
        store.create_store("store-1", "Test").await.unwrap();

        let mut older = model("01A", "store-1");
        older.created_at = chrono::Utc::now() - chrono::Duration::seconds(10);
        store.write_authorization_model(older).await.unwrap();
        store
            .write_authorization_model(model("01B", "store-1"))
            .await
            .unwrap();

        let ids: Vec<String> = store
            .list_authorization_models("store-1")
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["01B", "01A"]);

        let latest = store.get_latest_authorization_model("store-1").await.unwrap();
        assert_eq!(latest.id, "01B");
    }

    #[tokio::test]
    async fn test_latest_of_empty_store_fails() {
        let store = MemoryModelStore::new();
        store.create_store("store-1", "Test").await.unwrap();
        assert!(matches!(
            store.get_latest_authorization_model("store-1").await,
            Err(StorageError::ModelNotFound { .. })
        ));
    }
}
