//! Error codes returned by the write-model handler.
//!
//! Every validator rejection maps to the single
//! [`ErrorCode::InvalidAuthorizationModel`] code; the message carries the
//! details.
//!
//! # Error Detail Configuration
//!
//! The [`ErrorConfig`] struct controls how much detail is exposed in error messages.
//! In production, you may want to hide type and relation names to prevent
//! schema leakage.
//!
//! ```rust
//! use fgaschema_domain::ValidationError;
//! use fgaschema_server::errors::{classify_validation_error, ErrorCode, ErrorConfig};
//!
//! let err = ValidationError::DuplicateType { type_name: "secret_document".to_string() };
//!
//! let api = classify_validation_error(&err, &ErrorConfig::production());
//! assert_eq!(api.code, ErrorCode::InvalidAuthorizationModel);
//! assert!(!api.message.contains("secret_document"));
//!
//! let api = classify_validation_error(&err, &ErrorConfig::development());
//! assert!(api.message.contains("secret_document"));
//! ```

use std::fmt;

use serde::{Serialize, Serializer};

use fgaschema_domain::{ValidationError, ValidationErrorKind};
use fgaschema_storage::StorageError;

/// Configuration for error message detail level.
#[derive(Debug, Clone, Default)]
pub struct ErrorConfig {
    /// Whether to include detailed error messages in responses.
    ///
    /// When `true` (development mode) messages name the offending types and
    /// relations. When `false` (production mode) they only name the failed
    /// check.
    pub detailed_errors: bool,
}

impl ErrorConfig {
    /// Create a production configuration that hides error details.
    pub fn production() -> Self {
        Self {
            detailed_errors: false,
        }
    }

    /// Create a development configuration that shows full error details.
    pub fn development() -> Self {
        Self {
            detailed_errors: true,
        }
    }
}

/// Application error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Malformed request (2000).
    ValidationError,
    /// The submitted model was rejected by the validator (2056).
    InvalidAuthorizationModel,
    /// Unexpected server-side failure (4000).
    InternalError,
    /// The target store does not exist (5002).
    StoreIdNotFound,
}

impl ErrorCode {
    /// Numeric wire code.
    pub fn code(&self) -> u32 {
        match self {
            Self::ValidationError => 2000,
            Self::InvalidAuthorizationModel => 2056,
            Self::InternalError => 4000,
            Self::StoreIdNotFound => 5002,
        }
    }

    /// Symbolic wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "validation_error",
            Self::InvalidAuthorizationModel => "invalid_authorization_model",
            Self::InternalError => "internal_error",
            Self::StoreIdNotFound => "store_id_not_found",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.code())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// An error as returned to callers of the handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    /// Validator error kind, set for [`ErrorCode::InvalidAuthorizationModel`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ValidationErrorKind>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            kind: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

/// Maps a validator rejection to [`ErrorCode::InvalidAuthorizationModel`].
pub fn classify_validation_error(err: &ValidationError, config: &ErrorConfig) -> ApiError {
    let message = if config.detailed_errors {
        err.to_string()
    } else {
        format!("invalid authorization model: {} check failed", err.stage())
    };
    ApiError {
        kind: Some(err.kind()),
        ..ApiError::new(ErrorCode::InvalidAuthorizationModel, message)
    }
}

/// Maps storage failures. Internal details are hidden in production mode.
pub fn classify_storage_error(err: &StorageError, config: &ErrorConfig) -> ApiError {
    match err {
        StorageError::StoreNotFound { store_id } => ApiError::new(
            ErrorCode::StoreIdNotFound,
            if config.detailed_errors {
                format!("store not found: {store_id}")
            } else {
                "store not found".to_string()
            },
        ),
        StorageError::InvalidInput { message } => ApiError::validation(message.clone()),
        StorageError::StoreAlreadyExists { .. } | StorageError::ModelNotFound { .. } => {
            if config.detailed_errors {
                ApiError::internal(err.to_string())
            } else {
                ApiError::internal("internal error")
            }
        }
    }
}
