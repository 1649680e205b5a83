//! Write-model handler.
//!
//! Validates a submitted authorization model and persists it only when the
//! validator accepts it:
//!
//! 1. The target store must exist (`store_id_not_found`)
//! 2. At least one type definition is required (`validation_error`)
//! 3. The serialized model must fit the configured size limit
//! 4. Any validator rejection is `invalid_authorization_model`
//! 5. The model gets a fresh ULID and is persisted

mod handler;
mod types;

pub use handler::WriteModelHandler;
pub use types::{WriteAuthorizationModelRequest, WriteAuthorizationModelResponse};
