//! Property-based tests for model types and validation.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::model::{AuthorizationModel, RelationDefinition, TypeConstraint, TypeDefinition, Userset};
    use crate::validation::{validate, ValidationErrorKind, RESERVED_KEYWORDS};

    /// Strategy to generate type names that never collide with keywords
    fn type_name_strategy() -> impl Strategy<Value = String> {
        "[a-z]{1,10}".prop_map(|s| format!("t_{s}"))
    }

    /// A chain `r0: [user]`, `r1 as r0`, ..., `rn as r(n-1)` on one type.
    fn chain_model(type_name: &str, length: usize) -> AuthorizationModel {
        let mut doc = TypeDefinition::new(type_name.to_string())
            .with_relation(RelationDefinition::direct("r0", ["user"]));
        for i in 1..length {
            doc = doc.with_relation(RelationDefinition::new(
                format!("r{i}"),
                Userset::computed(format!("r{}", i - 1)),
            ));
        }
        AuthorizationModel::with_types("1.1", vec![TypeDefinition::new("user"), doc])
    }

    proptest! {
        #[test]
        fn test_computed_chains_are_accepted(
            type_name in type_name_strategy(),
            length in 1usize..40
        ) {
            let model = chain_model(&type_name, length);
            prop_assert!(validate(&model).is_ok());
        }

        #[test]
        fn test_closing_a_chain_is_a_cycle(
            type_name in type_name_strategy(),
            length in 2usize..40
        ) {
            let mut model = chain_model(&type_name, length);
            // r0 now reads the last relation of the chain
            model.type_definitions[1].relations[0] = RelationDefinition::new(
                "r0",
                Userset::computed(format!("r{}", length - 1)),
            );
            let err = validate(&model).unwrap_err();
            prop_assert_eq!(err.kind(), ValidationErrorKind::CyclicRelationDefinition);
            prop_assert_eq!(err.relation_name(), Some("r0"));
        }

        #[test]
        fn test_validation_is_deterministic(
            type_name in type_name_strategy(),
            length in 1usize..20,
            break_it in any::<bool>()
        ) {
            let mut model = chain_model(&type_name, length);
            if break_it {
                model.type_definitions[1].relations.push(RelationDefinition::new(
                    "broken",
                    Userset::computed("missing"),
                ));
            }
            prop_assert_eq!(validate(&model), validate(&model));
            prop_assert_eq!(validate(&model).is_ok(), !break_it);
        }

        #[test]
        fn test_reserved_relation_name_is_always_rejected(
            type_name in type_name_strategy(),
            length in 1usize..10,
            keyword in prop::sample::select(RESERVED_KEYWORDS.to_vec())
        ) {
            let mut model = chain_model(&type_name, length);
            model.type_definitions[1]
                .relations
                .push(RelationDefinition::direct(keyword, ["user"]));
            let err = validate(&model).unwrap_err();
            prop_assert_eq!(err.kind(), ValidationErrorKind::ReservedIdentifier);
        }

        #[test]
        fn test_duplicate_type_is_always_rejected(
            type_name in type_name_strategy(),
            length in 1usize..10
        ) {
            let mut model = chain_model(&type_name, length);
            let copy = model.type_definitions[1].clone();
            model.type_definitions.push(copy);
            prop_assert_eq!(
                validate(&model).unwrap_err().kind(),
                ValidationErrorKind::DuplicateType
            );
        }

        #[test]
        fn test_type_constraint_notation_roundtrip(
            type_name in type_name_strategy(),
            relation in "[a-z]{1,10}",
            form in 0u8..3
        ) {
            let notation = match form {
                0 => type_name.clone(),
                1 => format!("{type_name}:*"),
                _ => format!("{type_name}#{relation}"),
            };
            let constraint = TypeConstraint::from(notation.as_str());
            prop_assert_eq!(constraint.type_name(), type_name.as_str());
            prop_assert_eq!(constraint.to_string(), notation);
        }
    }
}
