//! Core type definitions for the authorization model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The only schema version this crate accepts.
pub const SCHEMA_VERSION_1_1: &str = "1.1";

/// Generation of the modeling language a model is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaVersion {
    /// Schema 1.1: directly assignable relations must declare type restrictions.
    #[serde(rename = "1.1")]
    V1_1,
}

impl SchemaVersion {
    /// Parses a schema version tag, returning `None` for unknown or unsupported tags.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            SCHEMA_VERSION_1_1 => Some(Self::V1_1),
            _ => None,
        }
    }

    /// Returns the wire tag for this version.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1_1 => SCHEMA_VERSION_1_1,
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authorization model defining types and their relations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationModel {
    /// Model ID, assigned when the model is persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Schema version (e.g., "1.1").
    pub schema_version: String,
    /// Type definitions in the model, in declaration order.
    pub type_definitions: Vec<TypeDefinition>,
}

impl AuthorizationModel {
    /// Creates an empty model with the given schema version.
    pub fn new(schema_version: impl Into<String>) -> Self {
        Self {
            id: None,
            schema_version: schema_version.into(),
            type_definitions: Vec::new(),
        }
    }

    /// Creates a model with the given schema version and type definitions.
    pub fn with_types(
        schema_version: impl Into<String>,
        type_definitions: Vec<TypeDefinition>,
    ) -> Self {
        Self {
            id: None,
            schema_version: schema_version.into(),
            type_definitions,
        }
    }

    /// Iterates over type definitions in declaration order.
    pub fn types(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.type_definitions.iter()
    }

    /// Returns the first type definition with the given name.
    pub fn get_type(&self, type_name: &str) -> Option<&TypeDefinition> {
        self.type_definitions
            .iter()
            .find(|td| td.type_name == type_name)
    }
}

/// A type definition within the authorization model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDefinition {
    /// The type name (e.g., "document", "folder").
    pub type_name: String,
    /// Relations defined on this type.
    #[serde(default)]
    pub relations: Vec<RelationDefinition>,
}

impl TypeDefinition {
    /// Creates a type with no relations.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            relations: Vec::new(),
        }
    }

    /// Adds a relation, builder style.
    pub fn with_relation(mut self, relation: RelationDefinition) -> Self {
        self.relations.push(relation);
        self
    }

    /// Returns the first relation with the given name.
    pub fn get_relation(&self, name: &str) -> Option<&RelationDefinition> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Checks if the type defines a relation with the given name.
    pub fn has_relation(&self, name: &str) -> bool {
        self.get_relation(name).is_some()
    }
}

/// A relation definition on a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDefinition {
    /// The relation name.
    pub name: String,
    /// Types that may be directly assigned (e.g., `[user, group#member]`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_constraints: Vec<TypeConstraint>,
    /// The userset rewrite for this relation.
    pub rewrite: Userset,
}

impl RelationDefinition {
    /// Creates a relation with the given rewrite and no type constraints.
    pub fn new(name: impl Into<String>, rewrite: Userset) -> Self {
        Self {
            name: name.into(),
            type_constraints: Vec::new(),
            rewrite,
        }
    }

    /// Creates a directly assignable relation (`define name: [types]`).
    pub fn direct<I, C>(name: impl Into<String>, constraints: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<TypeConstraint>,
    {
        Self {
            name: name.into(),
            type_constraints: constraints.into_iter().map(Into::into).collect(),
            rewrite: Userset::This,
        }
    }

    /// Replaces the type constraints, builder style.
    pub fn with_constraints<I, C>(mut self, constraints: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<TypeConstraint>,
    {
        self.type_constraints = constraints.into_iter().map(Into::into).collect();
        self
    }
}

/// A type restriction on a directly assignable relation.
///
/// Parsed from and displayed as the DSL notation: `user`, `user:*` or
/// `group#member`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeConstraint {
    /// Plain subjects of the type (`user`).
    Direct { type_name: String },
    /// Every subject of the type (`user:*`).
    Wildcard { type_name: String },
    /// Members of a relation on the type (`group#member`).
    Userset { type_name: String, relation: String },
}

impl TypeConstraint {
    /// The restricted type name.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Direct { type_name }
            | Self::Wildcard { type_name }
            | Self::Userset { type_name, .. } => type_name,
        }
    }

    /// The qualifying relation for `type#relation` restrictions.
    pub fn relation(&self) -> Option<&str> {
        match self {
            Self::Userset { relation, .. } => Some(relation),
            Self::Direct { .. } | Self::Wildcard { .. } => None,
        }
    }

    /// Returns true for a plain, unqualified type restriction.
    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Direct { .. })
    }
}

impl From<&str> for TypeConstraint {
    fn from(value: &str) -> Self {
        if let Some((type_name, relation)) = value.split_once('#') {
            Self::Userset {
                type_name: type_name.to_string(),
                relation: relation.to_string(),
            }
        } else if let Some(type_name) = value.strip_suffix(":*") {
            Self::Wildcard {
                type_name: type_name.to_string(),
            }
        } else {
            Self::Direct {
                type_name: value.to_string(),
            }
        }
    }
}

impl fmt::Display for TypeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct { type_name } => write!(f, "{type_name}"),
            Self::Wildcard { type_name } => write!(f, "{type_name}:*"),
            Self::Userset {
                type_name,
                relation,
            } => write!(f, "{type_name}#{relation}"),
        }
    }
}

/// A userset defines how a relation is computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Userset {
    /// Direct assignment (this).
    This,
    /// Computed userset from another relation on the same type.
    ComputedUserset { relation: String },
    /// Tuple to userset (relation from parent).
    TupleToUserset {
        tupleset: String,
        computed_userset: String,
    },
    /// Union of multiple usersets.
    Union { children: Vec<Userset> },
    /// Intersection of multiple usersets.
    Intersection { children: Vec<Userset> },
    /// Exclusion (base but not subtract).
    Exclusion {
        base: Box<Userset>,
        subtract: Box<Userset>,
    },
}

impl Userset {
    /// `relation` on the same object.
    pub fn computed(relation: impl Into<String>) -> Self {
        Self::ComputedUserset {
            relation: relation.into(),
        }
    }

    /// `computed_userset from tupleset`.
    pub fn tuple_to_userset(
        tupleset: impl Into<String>,
        computed_userset: impl Into<String>,
    ) -> Self {
        Self::TupleToUserset {
            tupleset: tupleset.into(),
            computed_userset: computed_userset.into(),
        }
    }

    pub fn union(children: Vec<Userset>) -> Self {
        Self::Union { children }
    }

    pub fn intersection(children: Vec<Userset>) -> Self {
        Self::Intersection { children }
    }

    pub fn exclusion(base: Userset, subtract: Userset) -> Self {
        Self::Exclusion {
            base: Box::new(base),
            subtract: Box::new(subtract),
        }
    }

    /// Returns true if direct assignment appears anywhere in the rewrite.
    pub fn contains_this(&self) -> bool {
        match self {
            Self::This => true,
            Self::ComputedUserset { .. } | Self::TupleToUserset { .. } => false,
            Self::Union { children } | Self::Intersection { children } => {
                children.iter().any(Userset::contains_this)
            }
            Self::Exclusion { base, subtract } => base.contains_this() || subtract.contains_this(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_version_parse() {
        assert_eq!(SchemaVersion::parse("1.1"), Some(SchemaVersion::V1_1));
        assert_eq!(SchemaVersion::parse("1.0"), None);
        assert_eq!(SchemaVersion::parse(""), None);
        assert_eq!(SchemaVersion::V1_1.to_string(), "1.1");
    }

    #[test]
    fn test_type_constraint_from_notation() {
        assert_eq!(
            TypeConstraint::from("user"),
            TypeConstraint::Direct {
                type_name: "user".to_string()
            }
        );
        assert_eq!(
            TypeConstraint::from("user:*"),
            TypeConstraint::Wildcard {
                type_name: "user".to_string()
            }
        );
        let userset = TypeConstraint::from("group#member");
        assert_eq!(userset.type_name(), "group");
        assert_eq!(userset.relation(), Some("member"));
        assert!(!userset.is_direct());
    }

    #[test]
    fn test_type_constraint_display_matches_notation() {
        for notation in ["user", "user:*", "group#member"] {
            assert_eq!(TypeConstraint::from(notation).to_string(), notation);
        }
    }

    #[test]
    fn test_contains_this() {
        assert!(Userset::This.contains_this());
        assert!(!Userset::computed("owner").contains_this());
        assert!(Userset::union(vec![Userset::computed("owner"), Userset::This]).contains_this());
        assert!(Userset::exclusion(Userset::computed("a"), Userset::This).contains_this());
        assert!(!Userset::intersection(vec![
            Userset::computed("a"),
            Userset::tuple_to_userset("parent", "viewer"),
        ])
        .contains_this());
    }

    #[test]
    fn test_model_traversal() {
        let model = AuthorizationModel::with_types(
            "1.1",
            vec![
                TypeDefinition::new("user"),
                TypeDefinition::new("document")
                    .with_relation(RelationDefinition::direct("owner", ["user"]))
                    .with_relation(RelationDefinition::new(
                        "viewer",
                        Userset::computed("owner"),
                    )),
            ],
        );

        assert_eq!(model.types().count(), 2);
        let document = model.get_type("document").unwrap();
        assert!(document.has_relation("owner"));
        assert!(!document.has_relation("editor"));
        assert_eq!(
            document.get_relation("viewer").unwrap().rewrite,
            Userset::computed("owner")
        );
        assert!(model.get_type("folder").is_none());
    }

    #[test]
    fn test_model_serde_roundtrip_preserves_order() {
        let model = AuthorizationModel::with_types(
            "1.1",
            vec![
                TypeDefinition::new("user"),
                TypeDefinition::new("group").with_relation(RelationDefinition::direct(
                    "member",
                    ["user", "group#member", "user:*"],
                )),
            ],
        );
        let json = serde_json::to_string(&model).unwrap();
        let decoded: AuthorizationModel = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, model);
    }
}
