//! Entrypoint analysis.
//!
//! A relation has an entrypoint when some subject can be assigned to it
//! without first being assigned to the relation itself. This is the least
//! fixpoint of the rewrite rules, computed with a worklist:
//!
//! - every rewrite is compiled into a small tree of any/all gates
//! - leaves that read another relation wait on that relation
//! - direct and wildcard restrictions fire their gate immediately
//!
//! A gate fires at most once and each wait is released at most once, so the
//! work is linear in the size of the model.

use crate::model::{TypeConstraint, Userset};

use super::error::{ValidationError, ValidationResult};
use super::index::{ModelIndex, NodeId, RelationNode};

/// Rejects the first relation, in declaration order, without an entrypoint.
pub(crate) fn check_entrypoints(index: &ModelIndex<'_>) -> ValidationResult<()> {
    let reachable = reachable_relations(index);

    match index.nodes().find(|&(id, _)| !reachable[id]) {
        Some((_, node)) => Err(ValidationError::NoEntrypoint {
            type_name: node.type_name.to_string(),
            relation_name: node.relation_name().to_string(),
        }),
        None => Ok(()),
    }
}

type GateId = usize;

#[derive(Debug)]
enum GateKind {
    /// Fires on its first input.
    Any,
    /// Fires once every input has fired.
    All { pending: usize },
}

#[derive(Debug)]
struct Gate {
    kind: GateKind,
    parent: Option<GateId>,
    /// Relation whose rewrite this gate is the root of.
    root_of: Option<NodeId>,
    fired: bool,
}

#[derive(Debug, Default)]
struct Circuit {
    gates: Vec<Gate>,
    /// Gates to signal once a relation becomes reachable.
    waiting_on: Vec<Vec<GateId>>,
    /// Gates with an input that holds unconditionally.
    seeds: Vec<GateId>,
}

impl Circuit {
    fn build(index: &ModelIndex<'_>) -> Self {
        let mut circuit = Self {
            waiting_on: vec![Vec::new(); index.len()],
            ..Self::default()
        };
        for (id, node) in index.nodes() {
            let root = circuit.compile(index, node, &node.definition.rewrite, None);
            circuit.gates[root].root_of = Some(id);
        }
        circuit
    }

    fn add_gate(&mut self, kind: GateKind, parent: Option<GateId>) -> GateId {
        self.gates.push(Gate {
            kind,
            parent,
            root_of: None,
            fired: false,
        });
        self.gates.len() - 1
    }

    fn wait_on(&mut self, gate: GateId, target: Option<NodeId>) {
        if let Some(target) = target {
            self.waiting_on[target].push(gate);
        }
    }

    fn compile(
        &mut self,
        index: &ModelIndex<'_>,
        node: RelationNode<'_>,
        userset: &Userset,
        parent: Option<GateId>,
    ) -> GateId {
        match userset {
            Userset::This => {
                let gate = self.add_gate(GateKind::Any, parent);
                for constraint in &node.definition.type_constraints {
                    match constraint {
                        TypeConstraint::Direct { .. } | TypeConstraint::Wildcard { .. } => {
                            self.seeds.push(gate)
                        }
                        TypeConstraint::Userset {
                            type_name,
                            relation,
                        } => self.wait_on(gate, index.lookup(type_name, relation)),
                    }
                }
                gate
            }
            Userset::ComputedUserset { relation } => {
                let gate = self.add_gate(GateKind::Any, parent);
                self.wait_on(gate, index.lookup(node.type_name, relation));
                gate
            }
            Userset::TupleToUserset {
                tupleset,
                computed_userset,
            } => {
                let gate = self.add_gate(GateKind::Any, parent);
                // Tuplesets were checked to hold only plain type restrictions
                for target in index
                    .tupleset_targets(node.type_name, tupleset, computed_userset)
                    .targets
                {
                    self.wait_on(gate, Some(target));
                }
                gate
            }
            Userset::Union { children } => {
                let gate = self.add_gate(GateKind::Any, parent);
                for child in children {
                    self.compile(index, node, child, Some(gate));
                }
                gate
            }
            Userset::Intersection { children } => {
                let gate = self.add_gate(
                    GateKind::All {
                        pending: children.len(),
                    },
                    parent,
                );
                if children.is_empty() {
                    self.seeds.push(gate);
                }
                for child in children {
                    self.compile(index, node, child, Some(gate));
                }
                gate
            }
            // Only the base can grant access
            Userset::Exclusion { base, .. } => {
                let gate = self.add_gate(GateKind::Any, parent);
                self.compile(index, node, base, Some(gate));
                gate
            }
        }
    }
}

fn reachable_relations(index: &ModelIndex<'_>) -> Vec<bool> {
    let Circuit {
        mut gates,
        waiting_on,
        seeds,
    } = Circuit::build(index);
    let mut reachable = vec![false; index.len()];
    let mut signals = seeds;

    while let Some(id) = signals.pop() {
        let gate = &mut gates[id];
        if gate.fired {
            continue;
        }
        if let GateKind::All { pending } = &mut gate.kind {
            *pending = pending.saturating_sub(1);
            if *pending > 0 {
                continue;
            }
        }
        gate.fired = true;

        if let Some(parent) = gate.parent {
            signals.push(parent);
        }
        if let Some(node) = gate.root_of {
            reachable[node] = true;
            signals.extend_from_slice(&waiting_on[node]);
        }
    }
    reachable
}
