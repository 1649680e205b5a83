//! Write-model handler implementation.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use fgaschema_domain::model::AuthorizationModel;
use fgaschema_domain::validate;
use fgaschema_storage::{ModelStore, StoredAuthorizationModel};

use crate::config::ModelSettings;
use crate::errors::{classify_storage_error, classify_validation_error, ApiError, ErrorConfig};

use super::types::{WriteAuthorizationModelRequest, WriteAuthorizationModelResponse};

/// Handler for authorization model writes.
pub struct WriteModelHandler<S: ModelStore> {
    storage: Arc<S>,
    error_config: ErrorConfig,
    max_model_size_bytes: usize,
}

impl<S: ModelStore> WriteModelHandler<S> {
    /// Creates a handler with default model settings.
    pub fn new(storage: Arc<S>) -> Self {
        Self::with_settings(storage, &ModelSettings::default())
    }

    /// Creates a handler from the `models` configuration section.
    pub fn with_settings(storage: Arc<S>, settings: &ModelSettings) -> Self {
        Self {
            storage,
            error_config: settings.error_config(),
            max_model_size_bytes: settings.max_model_size_bytes,
        }
    }

    /// Returns the underlying storage.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Validates and persists a model. Rejected models are never persisted.
    #[instrument(skip(self, request), fields(store_id = %request.store_id, types = request.type_definitions.len()))]
    pub async fn write_authorization_model(
        &self,
        request: WriteAuthorizationModelRequest,
    ) -> Result<WriteAuthorizationModelResponse, ApiError> {
        self.storage
            .get_store(&request.store_id)
            .await
            .map_err(|e| classify_storage_error(&e, &self.error_config))?;

        if request.type_definitions.is_empty() {
            return Err(ApiError::validation(
                "type_definitions requires at least 1 item",
            ));
        }

        let WriteAuthorizationModelRequest {
            store_id,
            schema_version,
            type_definitions,
        } = request;
        let mut model = AuthorizationModel::with_types(schema_version, type_definitions);

        // Bound the validator's input before running it.
        let submitted_size = serialized(&model)?.len();
        if submitted_size > self.max_model_size_bytes {
            return Err(self.oversized());
        }

        if let Err(err) = validate(&model) {
            warn!(kind = %err.kind(), error = %err, "authorization model rejected");
            return Err(classify_validation_error(&err, &self.error_config));
        }

        let model_id = ulid::Ulid::new().to_string();
        model.id = Some(model_id.clone());

        let model_json = serialized(&model)?;
        if model_json.len() > self.max_model_size_bytes {
            return Err(self.oversized());
        }

        let stored =
            StoredAuthorizationModel::new(&model_id, &store_id, &model.schema_version, model_json);
        self.storage
            .write_authorization_model(stored)
            .await
            .map_err(|e| classify_storage_error(&e, &self.error_config))?;

        info!(model_id = %model_id, "authorization model written");
        Ok(WriteAuthorizationModelResponse {
            authorization_model_id: model_id,
        })
    }

    fn oversized(&self) -> ApiError {
        ApiError::validation(format!(
            "authorization model exceeds maximum size of {} bytes",
            self.max_model_size_bytes
        ))
    }
}

fn serialized(model: &AuthorizationModel) -> Result<String, ApiError> {
    serde_json::to_string(model)
        .map_err(|e| ApiError::internal(format!("failed to serialize model: {e}")))
}
