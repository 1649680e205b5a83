//! fgaschema-storage: Storage abstraction layer
//!
//! This crate provides the storage abstraction for accepted authorization
//! models:
//! - ModelStore trait for store and model operations
//! - In-memory implementation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │             fgaschema-storage               │
//! ├─────────────────────────────────────────────┤
//! │  traits.rs   - ModelStore trait definition  │
//! │  memory.rs   - In-memory implementation     │
//! └─────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use memory::MemoryModelStore;
pub use traits::{ModelStore, Store, StoredAuthorizationModel};
