//! fgaschema-domain: authorization model validation
//!
//! This crate decides whether a submitted authorization model is well formed
//! before it is stored:
//! - Schema model types and the DSL parser
//! - Validation passes run by a fail-fast orchestrator
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              fgaschema-domain               │
//! ├─────────────────────────────────────────────┤
//! │  model/      - Schema types, DSL parser     │
//! │  validation/ - Naming, references,          │
//! │                tuplesets, cycles,           │
//! │                entrypoints                  │
//! └─────────────────────────────────────────────┘
//! ```

pub mod model;
pub mod validation;

// Re-export commonly used types at the crate root
pub use model::{parse, AuthorizationModel, ParserError};
pub use validation::{
    validate, ModelValidator, ValidationError, ValidationErrorKind, ValidationResult,
    ValidationStage, ValidationState, Verdict,
};
