//! Identifier legality and uniqueness, and the shape of rewrite trees.

use std::collections::HashSet;

use crate::model::{AuthorizationModel, SchemaVersion, Userset};

use super::error::{ValidationError, ValidationResult};

/// Keywords of the expression language that may not name a type or relation:
/// the self-reference keyword and the self-type keyword.
pub const RESERVED_KEYWORDS: &[&str] = &["self", "this"];

/// Fewest operands a union or intersection may have.
pub const MIN_SET_OPERANDS: usize = 2;

/// Checks if a name is reserved.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_KEYWORDS.contains(&name)
}

/// Rejects schema versions other than the supported generation.
pub(crate) fn check_schema_version(model: &AuthorizationModel) -> ValidationResult<SchemaVersion> {
    SchemaVersion::parse(&model.schema_version).ok_or_else(|| {
        ValidationError::UnsupportedSchemaVersion {
            version: model.schema_version.clone(),
        }
    })
}

/// Duplicate types, then reserved identifiers, then duplicate relations.
///
/// Each check covers the whole model before the next one starts, so a model
/// with a duplicate type and a reserved relation name reports the duplicate.
pub(crate) fn check_names(model: &AuthorizationModel) -> ValidationResult<()> {
    let mut seen_types = HashSet::with_capacity(model.type_definitions.len());
    for type_def in &model.type_definitions {
        if !seen_types.insert(type_def.type_name.as_str()) {
            return Err(ValidationError::DuplicateType {
                type_name: type_def.type_name.clone(),
            });
        }
    }

    for type_def in &model.type_definitions {
        if is_reserved(&type_def.type_name) {
            return Err(ValidationError::ReservedIdentifier {
                identifier: type_def.type_name.clone(),
                type_name: type_def.type_name.clone(),
                relation_name: None,
            });
        }
        if let Some(relation) = type_def.relations.iter().find(|r| is_reserved(&r.name)) {
            return Err(ValidationError::ReservedIdentifier {
                identifier: relation.name.clone(),
                type_name: type_def.type_name.clone(),
                relation_name: Some(relation.name.clone()),
            });
        }
    }

    for type_def in &model.type_definitions {
        let mut seen_relations = HashSet::with_capacity(type_def.relations.len());
        for relation in &type_def.relations {
            if !seen_relations.insert(relation.name.as_str()) {
                return Err(ValidationError::DuplicateRelation {
                    type_name: type_def.type_name.clone(),
                    relation_name: relation.name.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Rejects unions and intersections with fewer than [`MIN_SET_OPERANDS`]
/// operands, anywhere in a rewrite.
///
/// Models built by the parser always pass; models deserialized from a request
/// may not.
pub(crate) fn check_rewrite_shapes(model: &AuthorizationModel) -> ValidationResult<()> {
    for type_def in &model.type_definitions {
        for relation in &type_def.relations {
            check_shape(&type_def.type_name, &relation.name, &relation.rewrite)?;
        }
    }
    Ok(())
}

fn check_shape(type_name: &str, relation_name: &str, userset: &Userset) -> ValidationResult<()> {
    let (operator, children) = match userset {
        Userset::This | Userset::ComputedUserset { .. } | Userset::TupleToUserset { .. } => {
            return Ok(())
        }
        Userset::Exclusion { base, subtract } => {
            check_shape(type_name, relation_name, base)?;
            return check_shape(type_name, relation_name, subtract);
        }
        Userset::Union { children } => ("union", children),
        Userset::Intersection { children } => ("intersection", children),
    };

    if children.len() < MIN_SET_OPERANDS {
        return Err(ValidationError::MalformedRewrite {
            type_name: type_name.to_string(),
            relation_name: relation_name.to_string(),
            operator,
            operands: children.len(),
        });
    }
    children
        .iter()
        .try_for_each(|child| check_shape(type_name, relation_name, child))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{parse, RelationDefinition, TypeDefinition, Userset};
    use crate::validation::ValidationErrorKind;

    fn kind_of(model: &AuthorizationModel) -> Option<ValidationErrorKind> {
        check_names(model).err().map(|e| e.kind())
    }

    #[test]
    fn test_duplicate_type_is_rejected() {
        let model = parse("type user\ntype user\n").unwrap();
        assert_eq!(
            check_names(&model),
            Err(ValidationError::DuplicateType {
                type_name: "user".to_string()
            })
        );
    }

    #[test]
    fn test_reserved_type_names_are_rejected() {
        for reserved in RESERVED_KEYWORDS {
            let model = AuthorizationModel::with_types(
                "1.1",
                vec![
                    TypeDefinition::new("user"),
                    TypeDefinition::new(*reserved)
                        .with_relation(RelationDefinition::direct("member", ["user"])),
                ],
            );
            assert_eq!(
                kind_of(&model),
                Some(ValidationErrorKind::ReservedIdentifier),
                "type named '{reserved}' should be rejected"
            );
        }
    }

    #[test]
    fn test_reserved_relation_names_are_rejected() {
        for reserved in RESERVED_KEYWORDS {
            let model = AuthorizationModel::with_types(
                "1.1",
                vec![
                    TypeDefinition::new("user"),
                    TypeDefinition::new("group")
                        .with_relation(RelationDefinition::direct(*reserved, ["user"])),
                ],
            );
            let err = check_names(&model).unwrap_err();
            assert_eq!(err.kind(), ValidationErrorKind::ReservedIdentifier);
            assert_eq!(err.type_name(), Some("group"));
            assert_eq!(err.relation_name(), Some(*reserved));
        }
    }

    #[test]
    fn test_duplicate_type_reported_before_reserved_name() {
        let model = parse("type self\ntype user\ntype user\n").unwrap();
        assert_eq!(kind_of(&model), Some(ValidationErrorKind::DuplicateType));
    }

    #[test]
    fn test_duplicate_relation_is_rejected() {
        let model = parse(
            r#"
type user
type group
  relations
    define member: [user]
    define member: [user]
"#,
        )
        .unwrap();
        assert_eq!(
            check_names(&model),
            Err(ValidationError::DuplicateRelation {
                type_name: "group".to_string(),
                relation_name: "member".to_string(),
            })
        );
    }

    #[test]
    fn test_same_relation_name_on_different_types_is_fine() {
        let model = parse(
            r#"
type user
type group
  relations
    define member: [user]
type team
  relations
    define member: [user]
"#,
        )
        .unwrap();
        assert!(check_names(&model).is_ok());
    }

    #[test]
    fn test_schema_version() {
        let mut model = parse("type user").unwrap();
        assert_eq!(check_schema_version(&model), Ok(SchemaVersion::V1_1));

        model.schema_version = "1.0".to_string();
        assert_eq!(
            check_schema_version(&model),
            Err(ValidationError::UnsupportedSchemaVersion {
                version: "1.0".to_string()
            })
        );
    }

    fn with_viewer(rewrite: Userset) -> AuthorizationModel {
        AuthorizationModel::with_types(
            "1.1",
            vec![
                TypeDefinition::new("user"),
                TypeDefinition::new("document")
                    .with_relation(RelationDefinition::direct("editor", ["user"]))
                    .with_relation(RelationDefinition::new("viewer", rewrite)),
            ],
        )
    }

    #[test]
    fn test_set_operators_need_two_operands() {
        let editor = || Userset::computed("editor");
        let cases = [
            (Userset::union(vec![]), "union", 0),
            (Userset::union(vec![editor()]), "union", 1),
            (Userset::intersection(vec![]), "intersection", 0),
            (Userset::intersection(vec![editor()]), "intersection", 1),
        ];
        for (rewrite, operator, operands) in cases {
            assert_eq!(
                check_rewrite_shapes(&with_viewer(rewrite)),
                Err(ValidationError::MalformedRewrite {
                    type_name: "document".to_string(),
                    relation_name: "viewer".to_string(),
                    operator,
                    operands,
                })
            );
        }
    }

    #[test]
    fn test_nested_set_operators_are_checked() {
        let rewrite = Userset::exclusion(
            Userset::computed("editor"),
            Userset::union(vec![Userset::computed("editor"), Userset::intersection(vec![])]),
        );
        let err = check_rewrite_shapes(&with_viewer(rewrite)).unwrap_err();
        assert_eq!(err.kind(), ValidationErrorKind::MalformedRewrite);
        assert_eq!(
            err.to_string(),
            "intersection in document#viewer has 0 operand(s), at least 2 are required"
        );
    }

    #[test]
    fn test_parsed_rewrites_are_well_shaped() {
        let model = parse(
            r#"
type user
type document
  relations
    define editor: [user]
    define viewer: [user] or editor and (editor or editor) but not editor
"#,
        )
        .unwrap();
        assert!(check_rewrite_shapes(&model).is_ok());
    }
}
