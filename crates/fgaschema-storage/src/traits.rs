//! ModelStore trait definition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{StorageError, StorageResult};

/// Maximum length of a store identifier.
pub const MAX_STORE_ID_LENGTH: usize = 255;

/// Maximum length of a store name.
pub const MAX_STORE_NAME_LENGTH: usize = 256;

/// Store metadata.
#[derive(Debug, Clone)]
pub struct Store {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An accepted authorization model as persisted.
///
/// The model body is kept as serialized JSON; the storage layer does not
/// interpret it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAuthorizationModel {
    /// Unique model identifier (ULID).
    pub id: String,
    /// The store this model belongs to.
    pub store_id: String,
    /// Schema version tag, e.g. "1.1".
    pub schema_version: String,
    /// Serialized model.
    pub model_json: String,
    pub created_at: DateTime<Utc>,
}

impl StoredAuthorizationModel {
    /// Creates a model record stamped with the current time.
    pub fn new(
        id: impl Into<String>,
        store_id: impl Into<String>,
        schema_version: impl Into<String>,
        model_json: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            store_id: store_id.into(),
            schema_version: schema_version.into(),
            model_json: model_json.into(),
            created_at: Utc::now(),
        }
    }
}

/// Validates a store identifier.
pub fn validate_store_id(id: &str) -> StorageResult<()> {
    if id.is_empty() {
        return Err(StorageError::InvalidInput {
            message: "store id cannot be empty".to_string(),
        });
    }
    if id.len() > MAX_STORE_ID_LENGTH {
        return Err(StorageError::InvalidInput {
            message: format!("store id exceeds {MAX_STORE_ID_LENGTH} characters"),
        });
    }
    Ok(())
}

/// Validates a store name.
pub fn validate_store_name(name: &str) -> StorageResult<()> {
    if name.is_empty() {
        return Err(StorageError::InvalidInput {
            message: "store name cannot be empty".to_string(),
        });
    }
    if name.len() > MAX_STORE_NAME_LENGTH {
        return Err(StorageError::InvalidInput {
            message: format!("store name exceeds {MAX_STORE_NAME_LENGTH} characters"),
        });
    }
    Ok(())
}

/// Abstract storage interface for accepted authorization models.
///
/// Implementations must be thread-safe (Send + Sync) and support
/// async operations. Callers only persist models that passed validation.
#[async_trait]
pub trait ModelStore: Send + Sync + 'static {
    // Store operations

    /// Creates a new store.
    async fn create_store(&self, id: &str, name: &str) -> StorageResult<Store>;

    /// Gets a store by ID.
    async fn get_store(&self, id: &str) -> StorageResult<Store>;

    // Authorization model operations

    /// Persists a model. The store must exist.
    async fn write_authorization_model(
        &self,
        model: StoredAuthorizationModel,
    ) -> StorageResult<StoredAuthorizationModel>;

    /// Gets a model by ID.
    async fn get_authorization_model(
        &self,
        store_id: &str,
        model_id: &str,
    ) -> StorageResult<StoredAuthorizationModel>;

    /// Lists a store's models, newest first.
    async fn list_authorization_models(
        &self,
        store_id: &str,
    ) -> StorageResult<Vec<StoredAuthorizationModel>>;

    /// Gets the newest model of a store.
    async fn get_latest_authorization_model(
        &self,
        store_id: &str,
    ) -> StorageResult<StoredAuthorizationModel>;
}
