//! The canonical-form adapter: build a vertex-coloured directed graph from a
//! state. One vertex per object (coloured by its type set), one vertex per
//! relevant ground atom (coloured by predicate, polarity and goal
//! membership), and an edge from each atom to each of its arguments labelled
//! by argument position.

use crate::common::{AtomIndex, ObjectIndex};
use crate::formalism::{GroundAtom, ProblemRepository};
use crate::graphs::{CanonicalGraphOracle, Certificate, ColouredDigraph};
use crate::search::applicable_action_generator::DeleteRelaxedProblemExplorator;
use crate::search::PackedState;
use petgraph::graph::NodeIndex;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use strum::EnumCount;
use strum_macros::EnumCount as EnumCountMacro;

/// Goal role of an atom vertex. Combined with the predicate index into the
/// vertex colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumCountMacro)]
#[repr(i32)]
enum AtomVertexType {
    /// Present in the state, not mentioned by the goal.
    NonGoal,
    /// Positive goal literal, atom present.
    AchievedPositiveGoal,
    /// Positive goal literal, atom absent.
    UnachievedPositiveGoal,
    /// Negative goal literal, atom absent.
    AchievedNegativeGoal,
    /// Negative goal literal, atom present.
    UnachievedNegativeGoal,
}

#[inline(always)]
fn atom_colour(predicate: u32, vertex_type: AtomVertexType) -> i32 {
    predicate as i32 * AtomVertexType::COUNT as i32 + vertex_type as i32
}

/// Objects are coloured by their type-set bitmask, kept disjoint from atom
/// colours by the sign.
#[inline(always)]
fn object_colour(repository: &ProblemRepository, object: ObjectIndex) -> i32 {
    let mut mask: i32 = 0;
    for &type_index in &repository.problem().objects[object as usize].types {
        mask |= 1 << type_index;
    }
    -1 - mask
}

/// Decides which objects participate in the graph at all.
pub trait ObjectGraphPruningStrategy: Debug + Send + Sync {
    fn prune_object(&self, object: ObjectIndex) -> bool;
}

#[derive(Debug, Default)]
pub struct NoObjectGraphPruning;

impl ObjectGraphPruningStrategy for NoObjectGraphPruning {
    fn prune_object(&self, _object: ObjectIndex) -> bool {
        false
    }
}

/// Excludes objects that appear in no delete-relaxed reachable dynamic atom
/// and in no goal atom; such objects only occur in static structure and
/// cannot distinguish reachable states.
#[derive(Debug)]
pub struct StaticReachabilityPruning {
    keep: Vec<bool>,
}

impl StaticReachabilityPruning {
    pub fn new(explorator: &DeleteRelaxedProblemExplorator) -> Self {
        let repository = explorator.repository();
        let mut keep = vec![false; repository.problem().objects.len()];
        let mut mark = |atom: &GroundAtom| {
            for &object in &atom.arguments {
                keep[object as usize] = true;
            }
        };
        for &index in explorator.reachable_fluent_atoms() {
            mark(&repository.fluent_atom(index));
        }
        for &index in explorator.reachable_derived_atoms() {
            mark(&repository.derived_atom(index));
        }
        for literal in &repository.problem().goal {
            mark(&literal.atom);
        }
        Self { keep }
    }
}

impl ObjectGraphPruningStrategy for StaticReachabilityPruning {
    fn prune_object(&self, object: ObjectIndex) -> bool {
        !self.keep[object as usize]
    }
}

#[derive(Debug)]
pub struct ObjectGraphFactory {
    repository: Arc<ProblemRepository>,
    pruning_strategy: Box<dyn ObjectGraphPruningStrategy>,
}

impl ObjectGraphFactory {
    pub fn new(repository: Arc<ProblemRepository>) -> Self {
        Self {
            repository,
            pruning_strategy: Box::new(NoObjectGraphPruning),
        }
    }

    pub fn with_pruning(
        repository: Arc<ProblemRepository>,
        pruning_strategy: Box<dyn ObjectGraphPruningStrategy>,
    ) -> Self {
        Self {
            repository,
            pruning_strategy,
        }
    }

    /// The state's certificate: the oracle's bytes over the object graph,
    /// concatenated with the sorted vertex-colour sequence to disambiguate
    /// colour multisets.
    pub fn certificate(
        &self,
        oracle: &dyn CanonicalGraphOracle,
        state: &PackedState,
    ) -> Certificate {
        let graph = self.create(state);
        let mut bytes = oracle.certificate_bytes(&graph);
        let mut sorted_colours: Vec<i32> = graph.node_weights().copied().collect();
        sorted_colours.sort_unstable();
        for colour in sorted_colours {
            bytes.extend(colour.to_le_bytes());
        }
        Certificate::new(bytes)
    }

    pub fn create(&self, state: &PackedState) -> ColouredDigraph {
        let repository = &self.repository;
        let goal = repository.goal();
        let mut graph = ColouredDigraph::new();

        let mut object_vertices: HashMap<ObjectIndex, NodeIndex> = HashMap::new();
        for object in 0..repository.problem().objects.len() as ObjectIndex {
            if self.pruning_strategy.prune_object(object) {
                continue;
            }
            let vertex = graph.add_node(object_colour(repository, object));
            object_vertices.insert(object, vertex);
        }

        let add_atom_vertex = |graph: &mut ColouredDigraph,
                               atom: &GroundAtom,
                               vertex_type: AtomVertexType| {
            let vertex = graph.add_node(atom_colour(atom.predicate, vertex_type));
            for (position, object) in atom.arguments.iter().enumerate() {
                if let Some(&object_vertex) = object_vertices.get(object) {
                    graph.add_edge(vertex, object_vertex, position as i32);
                }
            }
        };

        let fluent_goal_role = |index: AtomIndex| {
            if goal.positive_fluent.contains(&index) {
                AtomVertexType::AchievedPositiveGoal
            } else if goal.negative_fluent.contains(&index) {
                AtomVertexType::UnachievedNegativeGoal
            } else {
                AtomVertexType::NonGoal
            }
        };
        for &index in state.fluent_atoms() {
            add_atom_vertex(
                &mut graph,
                &repository.fluent_atom(index),
                fluent_goal_role(index),
            );
        }

        let derived_goal_role = |index: AtomIndex| {
            if goal.positive_derived.contains(&index) {
                AtomVertexType::AchievedPositiveGoal
            } else if goal.negative_derived.contains(&index) {
                AtomVertexType::UnachievedNegativeGoal
            } else {
                AtomVertexType::NonGoal
            }
        };
        for &index in state.derived_atoms() {
            add_atom_vertex(
                &mut graph,
                &repository.derived_atom(index),
                derived_goal_role(index),
            );
        }

        for atom in repository.static_atoms() {
            add_atom_vertex(&mut graph, atom, AtomVertexType::NonGoal);
        }

        // Goal literals currently unsatisfied: absent positive atoms and
        // satisfied negative ones.
        for &index in &goal.positive_fluent {
            if !state.contains_fluent(index) {
                add_atom_vertex(
                    &mut graph,
                    &repository.fluent_atom(index),
                    AtomVertexType::UnachievedPositiveGoal,
                );
            }
        }
        for &index in &goal.negative_fluent {
            if !state.contains_fluent(index) {
                add_atom_vertex(
                    &mut graph,
                    &repository.fluent_atom(index),
                    AtomVertexType::AchievedNegativeGoal,
                );
            }
        }
        for &index in &goal.positive_derived {
            if !state.contains_derived(index) {
                add_atom_vertex(
                    &mut graph,
                    &repository.derived_atom(index),
                    AtomVertexType::UnachievedPositiveGoal,
                );
            }
        }
        for &index in &goal.negative_derived {
            if !state.contains_derived(index) {
                add_atom_vertex(
                    &mut graph,
                    &repository.derived_atom(index),
                    AtomVertexType::AchievedNegativeGoal,
                );
            }
        }

        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formalism::Object;
    use crate::graphs::ColourRefinementOracle;
    use crate::search::{SearchContext, SearchMode};
    use crate::test_utils::*;

    #[test]
    fn static_only_objects_can_be_pruned() {
        let mut problem = chain_problem(2);
        // An object mentioned only in static structure.
        problem.objects.push(Object::new("ghost", vec![0]));
        problem
            .initial_static_atoms
            .push(crate::formalism::GroundAtom::new(
                1,
                smallvec::smallvec![3, 3],
            ));
        let mut context = SearchContext::new(problem, SearchMode::Lifted);
        let repository = context.repository().clone();
        let explorator =
            crate::search::applicable_action_generator::DeleteRelaxedProblemExplorator::new(
                repository.clone(),
            );
        let pruning = StaticReachabilityPruning::new(&explorator);
        // Chain nodes participate in reachable at() atoms; the ghost does not.
        assert!(!pruning.prune_object(0));
        assert!(!pruning.prune_object(2));
        assert!(pruning.prune_object(3));

        let (initial, _) = context.state_repository_mut().get_or_create_initial_state();
        let packed = context.state_repository().packed(initial).clone();
        let full = ObjectGraphFactory::new(repository.clone());
        let reduced = ObjectGraphFactory::with_pruning(repository, Box::new(pruning));
        assert_eq!(
            reduced.create(&packed).node_count() + 1,
            full.create(&packed).node_count()
        );
    }

    #[test]
    fn certificates_separate_goal_progress() {
        let mut context = SearchContext::new(chain_problem(2), SearchMode::Lifted);
        let repository = context.repository().clone();
        let (initial, metric) = context.state_repository_mut().get_or_create_initial_state();
        let (generator, state_repository) = context.parts_mut();
        let actions = generator.applicable_actions(state_repository.packed(initial));
        let (successor, _) =
            state_repository.get_or_create_successor_state(initial, &actions[0], metric);

        let factory = ObjectGraphFactory::new(repository);
        let oracle = ColourRefinementOracle::new();
        let before = factory.certificate(&oracle, state_repository.packed(initial));
        let after = factory.certificate(&oracle, state_repository.packed(successor));
        assert_ne!(before, after);
        assert_eq!(
            before,
            factory.certificate(&oracle, state_repository.packed(initial))
        );
    }
}
