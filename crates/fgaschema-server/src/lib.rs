//! fgaschema-server: the write-model entry point
//!
//! This crate wires the validator to storage and to the outside world:
//! - Write-model handler (validate, assign id, persist)
//! - Error codes returned to callers
//! - Configuration management
//! - Structured logging
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              fgaschema-server               │
//! ├─────────────────────────────────────────────┤
//! │  config.rs        - Configuration           │
//! │  errors.rs        - Error codes             │
//! │  observability.rs - Logging setup           │
//! │  handlers/                                  │
//! │    write_model/   - Write authorization     │
//! │                     model                   │
//! └─────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod errors;
pub mod handlers;
pub mod observability;

// Re-exports for convenience
pub use config::{ConfigLoadError, ServerConfig};
pub use errors::{ApiError, ErrorCode, ErrorConfig};
pub use handlers::{
    WriteAuthorizationModelRequest, WriteAuthorizationModelResponse, WriteModelHandler,
};
