//! Tuple-to-userset checks.
//!
//! A tupleset must be a plain, directly assignable relation whose type
//! restrictions are all concrete types. The computed relation has to exist on
//! at least one of those types; the others are allowed to lack it.

use crate::model::{TypeConstraint, Userset};

use super::error::{TuplesetViolation, ValidationError, ValidationResult};
use super::index::{ModelIndex, RelationNode};

pub(crate) fn check_tuplesets(index: &ModelIndex<'_>) -> ValidationResult<()> {
    for (_, node) in index.nodes() {
        check_userset(index, node, &node.definition.rewrite)?;
    }
    Ok(())
}

fn check_userset(
    index: &ModelIndex<'_>,
    node: RelationNode<'_>,
    userset: &Userset,
) -> ValidationResult<()> {
    match userset {
        Userset::This | Userset::ComputedUserset { .. } => Ok(()),
        Userset::TupleToUserset {
            tupleset,
            computed_userset,
        } => check_tuple_to_userset(index, node, tupleset, computed_userset),
        Userset::Union { children } | Userset::Intersection { children } => children
            .iter()
            .try_for_each(|child| check_userset(index, node, child)),
        Userset::Exclusion { base, subtract } => {
            check_userset(index, node, base)?;
            check_userset(index, node, subtract)
        }
    }
}

fn check_tuple_to_userset(
    index: &ModelIndex<'_>,
    node: RelationNode<'_>,
    tupleset: &str,
    computed: &str,
) -> ValidationResult<()> {
    let invalid = |violation| ValidationError::InvalidTupleset {
        type_name: node.type_name.to_string(),
        relation_name: node.relation_name().to_string(),
        tupleset: tupleset.to_string(),
        violation,
    };

    let Some(tupleset_def) = index.relation(node.type_name, tupleset) else {
        return Err(ValidationError::UndefinedRelation {
            type_name: node.type_name.to_string(),
            relation_name: node.relation_name().to_string(),
            referenced_relation: tupleset.to_string(),
        });
    };

    if tupleset_def.rewrite != Userset::This {
        return Err(invalid(TuplesetViolation::NotDirectlyAssignable));
    }
    for constraint in &tupleset_def.type_constraints {
        match constraint {
            TypeConstraint::Direct { .. } => {}
            TypeConstraint::Wildcard { .. } => {
                return Err(invalid(TuplesetViolation::WildcardRestriction))
            }
            TypeConstraint::Userset { .. } => {
                return Err(invalid(TuplesetViolation::UsersetRestriction))
            }
        }
    }

    let resolved = index.tupleset_targets(node.type_name, tupleset, computed);
    if resolved.targets.is_empty() {
        return Err(ValidationError::UnresolvableTupleToUserset {
            type_name: node.type_name.to_string(),
            relation_name: node.relation_name().to_string(),
            tupleset: tupleset.to_string(),
            computed_relation: computed.to_string(),
            candidate_types: resolved
                .candidate_types
                .iter()
                .map(|candidate| candidate.to_string())
                .collect(),
        });
    }
    Ok(())
}
