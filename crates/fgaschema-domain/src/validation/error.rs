//! Validation error taxonomy.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// The pass that was running when a model was rejected.
///
/// Passes run in declaration order; the stage of an error is the last state
/// the orchestrator reached before rejecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStage {
    /// Schema version, names and the shape of rewrite trees.
    Naming,
    /// Computed usersets, tuplesets and type restrictions resolve.
    References,
    /// Tuple-to-userset leaves are well formed and resolvable.
    Tuplesets,
    /// The relation reference graph has no cycle.
    Acyclicity,
    /// Every relation can be reached from a direct assignment.
    Entrypoints,
}

impl fmt::Display for ValidationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Naming => "naming",
            Self::References => "references",
            Self::Tuplesets => "tuplesets",
            Self::Acyclicity => "acyclicity",
            Self::Entrypoints => "entrypoints",
        };
        f.write_str(name)
    }
}

/// Error kinds, without context. All of them map to the same externally
/// visible "invalid authorization model" code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValidationErrorKind {
    UnsupportedSchemaVersion,
    DuplicateType,
    ReservedIdentifier,
    DuplicateRelation,
    MalformedRewrite,
    UndefinedRelation,
    UndefinedTypeOrRelation,
    MissingTypeRestrictions,
    UnexpectedTypeRestrictions,
    InvalidTupleset,
    UnresolvableTupleToUserset,
    CyclicRelationDefinition,
    NoEntrypoint,
}

impl ValidationErrorKind {
    /// The pass that produces this kind.
    pub fn stage(&self) -> ValidationStage {
        match self {
            Self::UnsupportedSchemaVersion
            | Self::DuplicateType
            | Self::ReservedIdentifier
            | Self::DuplicateRelation
            | Self::MalformedRewrite => ValidationStage::Naming,
            Self::UndefinedRelation
            | Self::UndefinedTypeOrRelation
            | Self::MissingTypeRestrictions
            | Self::UnexpectedTypeRestrictions => ValidationStage::References,
            Self::InvalidTupleset | Self::UnresolvableTupleToUserset => ValidationStage::Tuplesets,
            Self::CyclicRelationDefinition => ValidationStage::Acyclicity,
            Self::NoEntrypoint => ValidationStage::Entrypoints,
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Why a relation cannot serve as a tupleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TuplesetViolation {
    /// The tupleset rewrite is something other than direct assignment.
    NotDirectlyAssignable,
    /// A type restriction is `type#relation`.
    UsersetRestriction,
    /// A type restriction is `type:*`.
    WildcardRestriction,
}

impl fmt::Display for TuplesetViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::NotDirectlyAssignable => "it must be defined by direct assignment only",
            Self::UsersetRestriction => "it may not allow usersets (type#relation)",
            Self::WildcardRestriction => "it may not allow wildcards (type:*)",
        };
        f.write_str(reason)
    }
}

/// A rejected authorization model, with the offending identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unsupported schema version '{version}'")]
    UnsupportedSchemaVersion { version: String },

    #[error("type '{type_name}' is defined more than once")]
    DuplicateType { type_name: String },

    #[error("'{identifier}' is a reserved keyword and cannot name {}", describe_owner(.type_name, .relation_name.as_deref()))]
    ReservedIdentifier {
        identifier: String,
        type_name: String,
        relation_name: Option<String>,
    },

    #[error("relation '{relation_name}' is defined more than once on type '{type_name}'")]
    DuplicateRelation {
        type_name: String,
        relation_name: String,
    },

    #[error("{operator} in {type_name}#{relation_name} has {operands} operand(s), at least 2 are required")]
    MalformedRewrite {
        type_name: String,
        relation_name: String,
        operator: &'static str,
        operands: usize,
    },

    #[error("undefined relation '{referenced_relation}' referenced in {type_name}#{relation_name}")]
    UndefinedRelation {
        type_name: String,
        relation_name: String,
        referenced_relation: String,
    },

    #[error("type restriction '{restriction}' in {type_name}#{relation_name} references an undefined type or relation")]
    UndefinedTypeOrRelation {
        type_name: String,
        relation_name: String,
        restriction: String,
    },

    #[error("{type_name}#{relation_name} is directly assignable but declares no type restrictions")]
    MissingTypeRestrictions {
        type_name: String,
        relation_name: String,
    },

    #[error("{type_name}#{relation_name} declares type restrictions but is not directly assignable")]
    UnexpectedTypeRestrictions {
        type_name: String,
        relation_name: String,
    },

    #[error("'{tupleset}' cannot be used as a tupleset in {type_name}#{relation_name}: {violation}")]
    InvalidTupleset {
        type_name: String,
        relation_name: String,
        tupleset: String,
        violation: TuplesetViolation,
    },

    #[error("'{computed_relation} from {tupleset}' in {type_name}#{relation_name} resolves on none of [{}]", .candidate_types.join(", "))]
    UnresolvableTupleToUserset {
        type_name: String,
        relation_name: String,
        tupleset: String,
        computed_relation: String,
        candidate_types: Vec<String>,
    },

    #[error("cyclic relation definition in {type_name}#{relation_name}: {}", .cycle_path.join(" -> "))]
    CyclicRelationDefinition {
        type_name: String,
        relation_name: String,
        cycle_path: Vec<String>,
    },

    #[error("{type_name}#{relation_name} has no entrypoint: no subject can ever be assigned to it")]
    NoEntrypoint {
        type_name: String,
        relation_name: String,
    },
}

fn describe_owner(type_name: &str, relation_name: Option<&str>) -> String {
    match relation_name {
        Some(relation) => format!("relation '{relation}' on type '{type_name}'"),
        None => "a type".to_string(),
    }
}

impl ValidationError {
    /// The context-free kind of this error.
    pub fn kind(&self) -> ValidationErrorKind {
        match self {
            Self::UnsupportedSchemaVersion { .. } => ValidationErrorKind::UnsupportedSchemaVersion,
            Self::DuplicateType { .. } => ValidationErrorKind::DuplicateType,
            Self::ReservedIdentifier { .. } => ValidationErrorKind::ReservedIdentifier,
            Self::DuplicateRelation { .. } => ValidationErrorKind::DuplicateRelation,
            Self::MalformedRewrite { .. } => ValidationErrorKind::MalformedRewrite,
            Self::UndefinedRelation { .. } => ValidationErrorKind::UndefinedRelation,
            Self::UndefinedTypeOrRelation { .. } => ValidationErrorKind::UndefinedTypeOrRelation,
            Self::MissingTypeRestrictions { .. } => ValidationErrorKind::MissingTypeRestrictions,
            Self::UnexpectedTypeRestrictions { .. } => {
                ValidationErrorKind::UnexpectedTypeRestrictions
            }
            Self::InvalidTupleset { .. } => ValidationErrorKind::InvalidTupleset,
            Self::UnresolvableTupleToUserset { .. } => {
                ValidationErrorKind::UnresolvableTupleToUserset
            }
            Self::CyclicRelationDefinition { .. } => ValidationErrorKind::CyclicRelationDefinition,
            Self::NoEntrypoint { .. } => ValidationErrorKind::NoEntrypoint,
        }
    }

    /// The pass that rejected the model.
    pub fn stage(&self) -> ValidationStage {
        self.kind().stage()
    }

    /// The type the error is attributed to, if any.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::DuplicateType { type_name }
            | Self::ReservedIdentifier { type_name, .. }
            | Self::DuplicateRelation { type_name, .. }
            | Self::MalformedRewrite { type_name, .. }
            | Self::UndefinedRelation { type_name, .. }
            | Self::UndefinedTypeOrRelation { type_name, .. }
            | Self::MissingTypeRestrictions { type_name, .. }
            | Self::UnexpectedTypeRestrictions { type_name, .. }
            | Self::InvalidTupleset { type_name, .. }
            | Self::UnresolvableTupleToUserset { type_name, .. }
            | Self::CyclicRelationDefinition { type_name, .. }
            | Self::NoEntrypoint { type_name, .. } => Some(type_name),
        }
    }

    /// The relation the error is attributed to, if any.
    pub fn relation_name(&self) -> Option<&str> {
        match self {
            Self::UnsupportedSchemaVersion { .. } | Self::DuplicateType { .. } => None,
            Self::ReservedIdentifier { relation_name, .. } => relation_name.as_deref(),
            Self::DuplicateRelation { relation_name, .. }
            | Self::MalformedRewrite { relation_name, .. }
            | Self::UndefinedRelation { relation_name, .. }
            | Self::UndefinedTypeOrRelation { relation_name, .. }
            | Self::MissingTypeRestrictions { relation_name, .. }
            | Self::UnexpectedTypeRestrictions { relation_name, .. }
            | Self::InvalidTupleset { relation_name, .. }
            | Self::UnresolvableTupleToUserset { relation_name, .. }
            | Self::CyclicRelationDefinition { relation_name, .. }
            | Self::NoEntrypoint { relation_name, .. } => Some(relation_name),
        }
    }
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_map_to_stages_in_pass_order() {
        assert_eq!(
            ValidationErrorKind::UnsupportedSchemaVersion.stage(),
            ValidationStage::Naming
        );
        assert_eq!(
            ValidationErrorKind::UndefinedTypeOrRelation.stage(),
            ValidationStage::References
        );
        assert_eq!(
            ValidationErrorKind::UnresolvableTupleToUserset.stage(),
            ValidationStage::Tuplesets
        );
        assert!(ValidationStage::Naming < ValidationStage::Acyclicity);
        assert!(ValidationStage::Acyclicity < ValidationStage::Entrypoints);
    }

    #[test]
    fn test_error_messages_name_offenders() {
        let err = ValidationError::CyclicRelationDefinition {
            type_name: "document".to_string(),
            relation_name: "reader".to_string(),
            cycle_path: vec![
                "document#reader".to_string(),
                "document#writer".to_string(),
                "document#reader".to_string(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "cyclic relation definition in document#reader: document#reader -> document#writer -> document#reader"
        );
        assert_eq!(err.type_name(), Some("document"));
        assert_eq!(err.relation_name(), Some("reader"));

        let err = ValidationError::ReservedIdentifier {
            identifier: "self".to_string(),
            type_name: "self".to_string(),
            relation_name: None,
        };
        assert_eq!(
            err.to_string(),
            "'self' is a reserved keyword and cannot name a type"
        );
        assert_eq!(err.relation_name(), None);
    }
}
