use crate::common::{AtomIndex, PredicateIndex};
use crate::search::applicable_action_generator::ApplicableActionGenerator;
use crate::formalism::{GroundAction, PredicateKind, ProblemRepository};
use crate::search::PackedState;
use std::collections::{HashMap, HashSet};

/// An atom as tested by the match tree: its kind (fluent or derived) and its
/// index within that kind's registry.
type ConditionAtom = (PredicateKind, AtomIndex);

/// Decision DAG over atom presence. Each selector routes actions that require
/// the atom positively, negatively, or not at all; generator leaves hold
/// actions whose atom conditions are fully decided on the path, so only
/// numeric conditions remain to be checked.
#[derive(Debug)]
enum MatchTreeNode {
    Generator(Vec<GroundAction>),
    Selector {
        atom: ConditionAtom,
        true_child: Box<MatchTreeNode>,
        false_child: Box<MatchTreeNode>,
        dontcare_child: Box<MatchTreeNode>,
    },
}

#[derive(Debug)]
pub struct MatchTree {
    root: MatchTreeNode,
    num_nodes: usize,
}

impl MatchTree {
    pub fn new(repository: &ProblemRepository, actions: Vec<GroundAction>) -> Self {
        let atoms = ordered_condition_atoms(repository, &actions);
        let mut num_nodes = 0;
        let root = build(actions, &atoms, &mut num_nodes);
        Self { root, num_nodes }
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Collect exactly the stored actions whose preconditions hold in the
    /// state, sorted by action index.
    pub fn generate_applicable_actions(&self, state: &PackedState) -> Vec<GroundAction> {
        let mut actions = Vec::new();
        visit(&self.root, state, &mut actions);
        actions.sort_unstable_by_key(|action| action.index);
        actions
    }
}

fn requires_positively(action: &GroundAction, atom: &ConditionAtom) -> bool {
    match atom.0 {
        PredicateKind::Fluent => action.precondition.positive_fluent.binary_search(&atom.1).is_ok(),
        PredicateKind::Derived => action
            .precondition
            .positive_derived
            .binary_search(&atom.1)
            .is_ok(),
        PredicateKind::Static => false,
    }
}

fn requires_negatively(action: &GroundAction, atom: &ConditionAtom) -> bool {
    match atom.0 {
        PredicateKind::Fluent => action.precondition.negative_fluent.binary_search(&atom.1).is_ok(),
        PredicateKind::Derived => action
            .precondition
            .negative_derived
            .binary_search(&atom.1)
            .is_ok(),
        PredicateKind::Static => false,
    }
}

fn build(
    actions: Vec<GroundAction>,
    atoms: &[ConditionAtom],
    num_nodes: &mut usize,
) -> MatchTreeNode {
    *num_nodes += 1;
    if actions.is_empty() {
        return MatchTreeNode::Generator(vec![]);
    }

    // Skip atoms no remaining action mentions.
    let selector = atoms.iter().position(|atom| {
        actions
            .iter()
            .any(|action| requires_positively(action, atom) || requires_negatively(action, atom))
    });
    let Some(position) = selector else {
        return MatchTreeNode::Generator(actions);
    };
    let atom = atoms[position];
    let rest = &atoms[position + 1..];

    let mut positive = Vec::new();
    let mut negative = Vec::new();
    let mut dontcare = Vec::new();
    for action in actions {
        if requires_positively(&action, &atom) {
            positive.push(action);
        } else if requires_negatively(&action, &atom) {
            negative.push(action);
        } else {
            dontcare.push(action);
        }
    }

    MatchTreeNode::Selector {
        atom,
        true_child: Box::new(build(positive, rest, num_nodes)),
        false_child: Box::new(build(negative, rest, num_nodes)),
        dontcare_child: Box::new(build(dontcare, rest, num_nodes)),
    }
}

fn visit(node: &MatchTreeNode, state: &PackedState, out: &mut Vec<GroundAction>) {
    match node {
        MatchTreeNode::Generator(actions) => {
            for action in actions {
                if action
                    .precondition
                    .numeric_conditions
                    .iter()
                    .all(|condition| condition.holds(state.numeric_values()))
                {
                    out.push(action.clone());
                }
            }
        }
        MatchTreeNode::Selector {
            atom,
            true_child,
            false_child,
            dontcare_child,
        } => {
            let present = match atom.0 {
                PredicateKind::Fluent => state.contains_fluent(atom.1),
                PredicateKind::Derived => state.contains_derived(atom.1),
                PredicateKind::Static => unreachable!("static atoms are resolved at grounding"),
            };
            if present {
                visit(true_child, state, out);
            } else {
                visit(false_child, state, out);
            }
            visit(dontcare_child, state, out);
        }
    }
}

/// The ordering heuristic for compact trees: same-predicate atoms grouped,
/// groups sorted by size descending with ties broken by predicate name,
/// atoms within a group sorted by name.
fn ordered_condition_atoms(
    repository: &ProblemRepository,
    actions: &[GroundAction],
) -> Vec<ConditionAtom> {
    let mut groups: HashMap<PredicateIndex, Vec<ConditionAtom>> = HashMap::new();
    let mut seen: HashSet<ConditionAtom> = HashSet::new();
    for action in actions {
        let condition = &action.precondition;
        for (kind, list) in [
            (PredicateKind::Fluent, &condition.positive_fluent),
            (PredicateKind::Fluent, &condition.negative_fluent),
            (PredicateKind::Derived, &condition.positive_derived),
            (PredicateKind::Derived, &condition.negative_derived),
        ] {
            for &index in list.iter() {
                let atom = (kind, index);
                if seen.insert(atom) {
                    let predicate = match kind {
                        PredicateKind::Fluent => repository.fluent_atom(index).predicate,
                        PredicateKind::Derived => repository.derived_atom(index).predicate,
                        PredicateKind::Static => unreachable!(),
                    };
                    groups.entry(predicate).or_default().push(atom);
                }
            }
        }
    }

    let problem = repository.problem();
    let atom_name = |atom: &ConditionAtom| match atom.0 {
        PredicateKind::Fluent => problem.atom_name(&repository.fluent_atom(atom.1)),
        PredicateKind::Derived => problem.atom_name(&repository.derived_atom(atom.1)),
        PredicateKind::Static => unreachable!(),
    };

    let mut ordered_groups: Vec<(PredicateIndex, Vec<ConditionAtom>)> =
        groups.into_iter().collect();
    ordered_groups.sort_by(|(lhs_predicate, lhs), (rhs_predicate, rhs)| {
        rhs.len()
            .cmp(&lhs.len())
            .then_with(|| {
                problem
                    .predicate(*lhs_predicate)
                    .name
                    .cmp(&problem.predicate(*rhs_predicate).name)
            })
    });

    let mut ordered = Vec::new();
    for (_, mut group) in ordered_groups {
        group.sort_by_key(|atom| atom_name(atom));
        ordered.extend(group);
    }
    ordered
}

/// Query-time facade over the match tree.
#[derive(Debug)]
pub struct GroundedApplicableActionGenerator {
    match_tree: MatchTree,
}

impl GroundedApplicableActionGenerator {
    pub fn new(match_tree: MatchTree) -> Self {
        Self { match_tree }
    }

    pub fn match_tree(&self) -> &MatchTree {
        &self.match_tree
    }
}

impl ApplicableActionGenerator for GroundedApplicableActionGenerator {
    fn applicable_actions(&mut self, state: &PackedState) -> Vec<GroundAction> {
        self.match_tree.generate_applicable_actions(state)
    }
}
