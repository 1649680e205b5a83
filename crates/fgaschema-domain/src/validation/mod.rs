//! Authorization model validation.
//!
//! A model is accepted only if it passes, in order:
//! - naming: supported schema version, unique type and relation names, no
//!   reserved identifiers, unions and intersections with at least two operands
//! - references: every computed userset, tupleset and type restriction
//!   resolves
//! - tuplesets: tupleset relations are plain direct assignments of concrete
//!   types, and every `computed from tupleset` resolves on at least one of them
//! - acyclicity: the relation reference graph has no cycle
//! - entrypoints: every relation can be reached from a direct assignment
//!
//! Validation stops at the first violation.

mod cycle;
mod entrypoint;
mod error;
mod index;
pub mod naming;
mod references;
mod tupleset;

use std::fmt;

use tracing::debug;

use crate::model::AuthorizationModel;

pub use error::{
    TuplesetViolation, ValidationError, ValidationErrorKind, ValidationResult, ValidationStage,
};
pub use naming::{is_reserved, RESERVED_KEYWORDS};

use index::ModelIndex;

/// Where a validation run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationState {
    Start,
    NamingChecked,
    ReferencesResolved,
    TuplesetsChecked,
    AcyclicityChecked,
    EntrypointsChecked,
    Accepted,
    Rejected(ValidationErrorKind),
}

impl ValidationState {
    /// Whether the run has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected(_))
    }
}

impl fmt::Display for ValidationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::NamingChecked => f.write_str("naming_checked"),
            Self::ReferencesResolved => f.write_str("references_resolved"),
            Self::TuplesetsChecked => f.write_str("tuplesets_checked"),
            Self::AcyclicityChecked => f.write_str("acyclicity_checked"),
            Self::EntrypointsChecked => f.write_str("entrypoints_checked"),
            Self::Accepted => f.write_str("accepted"),
            Self::Rejected(kind) => write!(f, "rejected({kind})"),
        }
    }
}

/// Fail-fast validator for a single model.
///
/// The model is borrowed and never modified. A validator runs once; calling
/// [`ModelValidator::validate`] again re-runs every pass from the start.
#[derive(Debug)]
pub struct ModelValidator<'m> {
    model: &'m AuthorizationModel,
    state: ValidationState,
}

impl<'m> ModelValidator<'m> {
    /// Create a new validator for the given model
    pub fn new(model: &'m AuthorizationModel) -> Self {
        Self {
            model,
            state: ValidationState::Start,
        }
    }

    /// The state reached by the last run.
    pub fn state(&self) -> ValidationState {
        self.state
    }

    /// Runs every pass and returns the first violation.
    pub fn validate(&mut self) -> ValidationResult<()> {
        self.state = ValidationState::Start;
        let result = self.run_passes();
        let terminal = match &result {
            Ok(()) => ValidationState::Accepted,
            Err(err) => {
                debug!(
                    stage = %err.stage(),
                    kind = %err.kind(),
                    error = %err,
                    "authorization model rejected"
                );
                ValidationState::Rejected(err.kind())
            }
        };
        self.advance(terminal);
        result
    }

    fn run_passes(&mut self) -> ValidationResult<()> {
        naming::check_schema_version(self.model)?;
        naming::check_names(self.model)?;
        naming::check_rewrite_shapes(self.model)?;
        self.advance(ValidationState::NamingChecked);

        let index = ModelIndex::build(self.model);

        references::resolve_references(&index)?;
        self.advance(ValidationState::ReferencesResolved);

        tupleset::check_tuplesets(&index)?;
        self.advance(ValidationState::TuplesetsChecked);

        cycle::detect_cycles(&index)?;
        self.advance(ValidationState::AcyclicityChecked);

        entrypoint::check_entrypoints(&index)?;
        self.advance(ValidationState::EntrypointsChecked);

        Ok(())
    }

    fn advance(&mut self, next: ValidationState) {
        debug!(from = %self.state, to = %next, "validation state transition");
        self.state = next;
    }
}

/// Outcome of validating a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(ValidationError),
}

impl Verdict {
    /// Validates `model` and wraps the outcome.
    pub fn of(model: &AuthorizationModel) -> Self {
        match validate(model) {
            Ok(()) => Self::Accepted,
            Err(err) => Self::Rejected(err),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// The rejection reason, if any.
    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            Self::Accepted => None,
            Self::Rejected(err) => Some(err),
        }
    }

    pub fn into_result(self) -> ValidationResult<()> {
        match self {
            Self::Accepted => Ok(()),
            Self::Rejected(err) => Err(err),
        }
    }
}

impl From<ValidationResult<()>> for Verdict {
    fn from(result: ValidationResult<()>) -> Self {
        match result {
            Ok(()) => Self::Accepted,
            Err(err) => Self::Rejected(err),
        }
    }
}

/// Validate an authorization model
pub fn validate(model: &AuthorizationModel) -> ValidationResult<()> {
    ModelValidator::new(model).validate()
}
