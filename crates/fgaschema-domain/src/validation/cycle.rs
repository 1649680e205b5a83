//! Cycle detection over the relation reference graph.
//!
//! Nodes are (type, relation) pairs. A relation has an edge to every relation
//! its rewrite reads: computed usersets on the same type, and for
//! `computed from tupleset` the computed relation on every candidate type that
//! defines it. Direct assignment contributes no edge.

use tracing::trace;

use crate::model::Userset;

use super::error::{ValidationError, ValidationResult};
use super::index::{ModelIndex, NodeId};

/// Adjacency lists indexed by [`NodeId`].
#[derive(Debug)]
pub(crate) struct ReferenceGraph {
    edges: Vec<Vec<NodeId>>,
}

impl ReferenceGraph {
    pub fn build(index: &ModelIndex<'_>) -> Self {
        let edges = index
            .nodes()
            .map(|(_, node)| {
                let mut out = Vec::new();
                collect_edges(index, node.type_name, &node.definition.rewrite, &mut out);
                out
            })
            .collect();
        Self { edges }
    }

    pub fn successors(&self, id: NodeId) -> &[NodeId] {
        &self.edges[id]
    }
}

fn collect_edges(index: &ModelIndex<'_>, type_name: &str, userset: &Userset, out: &mut Vec<NodeId>) {
    match userset {
        Userset::This => {}
        Userset::ComputedUserset { relation } => {
            if let Some(target) = index.lookup(type_name, relation) {
                push_unique(out, target);
            }
        }
        Userset::TupleToUserset {
            tupleset,
            computed_userset,
        } => {
            // Tuplesets were checked to hold only plain type restrictions
            for target in index
                .tupleset_targets(type_name, tupleset, computed_userset)
                .targets
            {
                push_unique(out, target);
            }
        }
        Userset::Union { children } | Userset::Intersection { children } => {
            for child in children {
                collect_edges(index, type_name, child, out);
            }
        }
        Userset::Exclusion { base, subtract } => {
            collect_edges(index, type_name, base, out);
            collect_edges(index, type_name, subtract, out);
        }
    }
}

fn push_unique(out: &mut Vec<NodeId>, target: NodeId) {
    if !out.contains(&target) {
        out.push(target);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Rejects the first cycle found, visiting roots in declaration order.
///
/// The error is attributed to the relation where the cycle was entered and
/// carries the full path, closed on that relation.
pub(crate) fn detect_cycles(index: &ModelIndex<'_>) -> ValidationResult<()> {
    let graph = ReferenceGraph::build(index);
    let mut marks = vec![Mark::Unvisited; index.len()];

    for root in 0..index.len() {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        if let Some(cycle) = visit(root, &graph, &mut marks) {
            let entry = index.node(cycle[0]);
            let cycle_path: Vec<String> = cycle.iter().map(|&id| index.label(id)).collect();
            trace!(path = %cycle_path.join(" -> "), "cycle found");
            return Err(ValidationError::CyclicRelationDefinition {
                type_name: entry.type_name.to_string(),
                relation_name: entry.relation_name().to_string(),
                cycle_path,
            });
        }
    }
    Ok(())
}

/// Depth-first search from `root` with an explicit stack, so chain length is
/// bounded by memory rather than by the thread stack.
///
/// Each frame is a node on the current path and the index of its next
/// successor to explore.
fn visit(root: NodeId, graph: &ReferenceGraph, marks: &mut [Mark]) -> Option<Vec<NodeId>> {
    let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];
    marks[root] = Mark::OnStack;

    while let Some(frame) = stack.last_mut() {
        let (node, next_successor) = *frame;
        let Some(&next) = graph.successors(node).get(next_successor) else {
            marks[node] = Mark::Done;
            stack.pop();
            continue;
        };
        frame.1 += 1;

        match marks[next] {
            Mark::OnStack => {
                let start = stack.iter().position(|&(n, _)| n == next).unwrap_or(0);
                let mut cycle: Vec<NodeId> = stack[start..].iter().map(|&(n, _)| n).collect();
                cycle.push(next);
                return Some(cycle);
            }
            Mark::Unvisited => {
                marks[next] = Mark::OnStack;
                stack.push((next, 0));
            }
            Mark::Done => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse;

    fn detect(dsl: &str) -> ValidationResult<()> {
        let model = parse(dsl).unwrap();
        detect_cycles(&ModelIndex::build(&model))
    }

    fn cycle_path(dsl: &str) -> Vec<String> {
        match detect(dsl) {
            Err(ValidationError::CyclicRelationDefinition { cycle_path, .. }) => cycle_path,
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_mutual_computed_usersets_form_a_cycle() {
        let result = detect(
            r#"
type user
type document
  relations
    define reader as writer
    define writer as reader
"#,
        );
        assert_eq!(
            result,
            Err(ValidationError::CyclicRelationDefinition {
                type_name: "document".to_string(),
                relation_name: "reader".to_string(),
                cycle_path: vec![
                    "document#reader".to_string(),
                    "document#writer".to_string(),
                    "document#reader".to_string(),
                ],
            })
        );
    }

    #[test]
    fn test_self_reference_in_every_operator() {
        for rewrite in ["[user] but not viewer", "[user] or viewer", "[user] and viewer"] {
            let dsl = format!(
                "type user\ntype document\n  relations\n    define viewer: {rewrite}\n"
            );
            assert_eq!(
                cycle_path(&dsl),
                vec!["document#viewer".to_string(), "document#viewer".to_string()],
                "rewrite '{rewrite}'"
            );
        }
    }

    #[test]
    fn test_recursion_through_tupleset_is_a_cycle() {
        let path = cycle_path(
            r#"
type user
type group
  relations
    define parent: [group] as self
    define viewer as viewer from parent
"#,
        );
        assert_eq!(path, vec!["group#viewer", "group#viewer"]);
    }

    #[test]
    fn test_cycle_across_types_through_tupleset() {
        let path = cycle_path(
            r#"
type user
type folder
  relations
    define parent: [document]
    define viewer as viewer from parent
type document
  relations
    define parent: [folder]
    define viewer as viewer from parent
"#,
        );
        assert_eq!(
            path,
            vec!["folder#viewer", "document#viewer", "folder#viewer"]
        );
    }

    #[test]
    fn test_cycle_entered_from_acyclic_prefix_reports_only_the_loop() {
        let path = cycle_path(
            r#"
type user
type document
  relations
    define owner as editor
    define editor as writer
    define writer as editor
"#,
        );
        assert_eq!(
            path,
            vec!["document#editor", "document#writer", "document#editor"]
        );
    }

    #[test]
    fn test_direct_assignment_breaks_no_edge() {
        assert!(detect(
            r#"
type user
type group
  relations
    define member: [user, group#member]
"#
        )
        .is_ok());
    }

    #[test]
    fn test_shared_dependencies_are_not_cycles() {
        assert!(detect(
            r#"
type user
type document
  relations
    define owner: [user]
    define editor: [user] or owner
    define viewer as editor or owner and editor but not owner
"#
        )
        .is_ok());
    }

    fn chain_dsl(len: usize, closed: bool) -> String {
        let mut dsl = String::from("type user\ntype document\n  relations\n");
        for i in 0..len - 1 {
            dsl.push_str(&format!("    define r{i} as r{}\n", i + 1));
        }
        if closed {
            dsl.push_str(&format!("    define r{} as r0\n", len - 1));
        } else {
            dsl.push_str(&format!("    define r{}: [user]\n", len - 1));
        }
        dsl
    }

    #[test]
    fn test_deep_chain_does_not_exhaust_the_stack() {
        assert!(detect(&chain_dsl(100_000, false)).is_ok());

        let path = cycle_path(&chain_dsl(100_000, true));
        assert_eq!(path.len(), 100_001);
        assert_eq!(path.first().map(String::as_str), Some("document#r0"));
        assert_eq!(path.last().map(String::as_str), Some("document#r0"));
    }
}
