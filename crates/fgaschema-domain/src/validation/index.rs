//! Flat relation table over a model whose names are known to be unique.
//!
//! Every (type, relation) pair gets a dense [`NodeId`] in declaration order.
//! The later passes and the reference graph work on these indices rather than
//! on the expression trees.

use std::collections::HashMap;

use crate::model::{AuthorizationModel, RelationDefinition};

/// Index of a (type, relation) pair in the relation table.
pub(crate) type NodeId = usize;

/// One row of the relation table.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RelationNode<'m> {
    pub type_name: &'m str,
    pub definition: &'m RelationDefinition,
}

impl RelationNode<'_> {
    pub fn relation_name(&self) -> &str {
        &self.definition.name
    }
}

/// Candidate types and resolved targets of a `computed from tupleset` leaf.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct TuplesetTargets<'m> {
    /// Distinct types the tupleset relation may point at, in declaration order.
    pub candidate_types: Vec<&'m str>,
    /// Nodes of the candidates that define the computed relation.
    pub targets: Vec<NodeId>,
}

#[derive(Debug, Default)]
pub(crate) struct ModelIndex<'m> {
    nodes: Vec<RelationNode<'m>>,
    /// type name -> (relation name -> node)
    types: HashMap<&'m str, HashMap<&'m str, NodeId>>,
}

impl<'m> ModelIndex<'m> {
    /// Builds the table. On duplicate names the first definition wins, so
    /// callers run the naming checks first.
    pub fn build(model: &'m AuthorizationModel) -> Self {
        let mut index = Self::default();
        for type_def in &model.type_definitions {
            if index.types.contains_key(type_def.type_name.as_str()) {
                continue;
            }
            let mut relations = HashMap::with_capacity(type_def.relations.len());
            for definition in &type_def.relations {
                if relations.contains_key(definition.name.as_str()) {
                    continue;
                }
                relations.insert(definition.name.as_str(), index.nodes.len());
                index.nodes.push(RelationNode {
                    type_name: &type_def.type_name,
                    definition,
                });
            }
            index.types.insert(&type_def.type_name, relations);
        }
        index
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> RelationNode<'m> {
        self.nodes[id]
    }

    /// Iterates over the table in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, RelationNode<'m>)> + '_ {
        self.nodes.iter().copied().enumerate()
    }

    pub fn has_type(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    pub fn lookup(&self, type_name: &str, relation: &str) -> Option<NodeId> {
        self.types
            .get(type_name)
            .and_then(|relations| relations.get(relation))
            .copied()
    }

    pub fn relation(&self, type_name: &str, relation: &str) -> Option<&'m RelationDefinition> {
        self.lookup(type_name, relation)
            .map(|id| self.nodes[id].definition)
    }

    /// `type#relation` label used in error paths.
    pub fn label(&self, id: NodeId) -> String {
        let node = self.nodes[id];
        format!("{}#{}", node.type_name, node.definition.name)
    }

    /// Resolves `computed from tupleset` evaluated on `type_name`.
    ///
    /// Only plain type restrictions of the tupleset count as candidates. A
    /// missing tupleset yields no candidates.
    ///
    /// Wildcard and `type#relation` restrictions are skipped, not reported.
    /// Callers outside the tupleset pass rely on that pass having rejected
    /// them already, so the candidates seen here are all of them.
    pub fn tupleset_targets(
        &self,
        type_name: &str,
        tupleset: &str,
        computed: &str,
    ) -> TuplesetTargets<'m> {
        let mut result = TuplesetTargets::default();
        let Some(tupleset_def) = self.relation(type_name, tupleset) else {
            return result;
        };

        for constraint in &tupleset_def.type_constraints {
            if !constraint.is_direct() {
                continue;
            }
            let candidate = constraint.type_name();
            if result.candidate_types.contains(&candidate) {
                continue;
            }
            result.candidate_types.push(candidate);
            if let Some(target) = self.lookup(candidate, computed) {
                result.targets.push(target);
            }
        }
        result
    }
}
