//! Data types for write-model operations.

use serde::{Deserialize, Serialize};

use fgaschema_domain::model::{AuthorizationModel, TypeDefinition, SCHEMA_VERSION_1_1};

fn default_schema_version() -> String {
    SCHEMA_VERSION_1_1.to_string()
}

/// Request to write a new authorization model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WriteAuthorizationModelRequest {
    /// The store to write the model to.
    pub store_id: String,
    /// Schema version tag of the submitted model.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    /// Type definitions, in declaration order.
    #[serde(default)]
    pub type_definitions: Vec<TypeDefinition>,
}

impl WriteAuthorizationModelRequest {
    /// Creates a request from an already built model.
    pub fn new(store_id: impl Into<String>, model: AuthorizationModel) -> Self {
        Self {
            store_id: store_id.into(),
            schema_version: model.schema_version,
            type_definitions: model.type_definitions,
        }
    }
}

/// Response carrying the id of the persisted model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WriteAuthorizationModelResponse {
    pub authorization_model_id: String,
}
