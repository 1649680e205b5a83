//! Resolution of symbolic references in rewrites and type restrictions.

use crate::model::{TypeConstraint, Userset};

use super::error::{ValidationError, ValidationResult};
use super::index::{ModelIndex, RelationNode};

/// Resolves every reference of every relation, in declaration order.
///
/// The computed side of `computed from tupleset` is left to the tupleset pass,
/// since it resolves against the tupleset's type restrictions.
pub(crate) fn resolve_references(index: &ModelIndex<'_>) -> ValidationResult<()> {
    for (_, node) in index.nodes() {
        resolve_type_constraints(index, node)?;
        resolve_userset(index, node, &node.definition.rewrite)?;
    }
    Ok(())
}

fn resolve_type_constraints(index: &ModelIndex<'_>, node: RelationNode<'_>) -> ValidationResult<()> {
    let definition = node.definition;
    let assignable = definition.rewrite.contains_this();

    if assignable && definition.type_constraints.is_empty() {
        return Err(ValidationError::MissingTypeRestrictions {
            type_name: node.type_name.to_string(),
            relation_name: definition.name.clone(),
        });
    }
    if !assignable && !definition.type_constraints.is_empty() {
        return Err(ValidationError::UnexpectedTypeRestrictions {
            type_name: node.type_name.to_string(),
            relation_name: definition.name.clone(),
        });
    }

    for constraint in &definition.type_constraints {
        let resolved = match constraint {
            TypeConstraint::Direct { type_name } | TypeConstraint::Wildcard { type_name } => {
                index.has_type(type_name)
            }
            TypeConstraint::Userset {
                type_name,
                relation,
            } => index.lookup(type_name, relation).is_some(),
        };
        if !resolved {
            return Err(ValidationError::UndefinedTypeOrRelation {
                type_name: node.type_name.to_string(),
                relation_name: definition.name.clone(),
                restriction: constraint.to_string(),
            });
        }
    }
    Ok(())
}

/// Every operand must resolve; repeated references are fine.
fn resolve_userset(
    index: &ModelIndex<'_>,
    node: RelationNode<'_>,
    userset: &Userset,
) -> ValidationResult<()> {
    match userset {
        Userset::This => Ok(()),
        Userset::ComputedUserset { relation } => require_local_relation(index, node, relation),
        Userset::TupleToUserset { tupleset, .. } => require_local_relation(index, node, tupleset),
        Userset::Union { children } | Userset::Intersection { children } => children
            .iter()
            .try_for_each(|child| resolve_userset(index, node, child)),
        Userset::Exclusion { base, subtract } => {
            resolve_userset(index, node, base)?;
            resolve_userset(index, node, subtract)
        }
    }
}

fn require_local_relation(
    index: &ModelIndex<'_>,
    node: RelationNode<'_>,
    relation: &str,
) -> ValidationResult<()> {
    if index.lookup(node.type_name, relation).is_some() {
        Ok(())
    } else {
        Err(ValidationError::UndefinedRelation {
            type_name: node.type_name.to_string(),
            relation_name: node.relation_name().to_string(),
            referenced_relation: relation.to_string(),
        })
    }
}
