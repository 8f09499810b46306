use crate::common::{
    ActionIndex, ContinuousCost, DiscreteCost, StateIndex, StopWatch, UNDEFINED_DISCRETE_COST,
};
use crate::error::SearchError;
use crate::formalism::Problem;
use crate::graphs::{CanonicalGraphOracle, Certificate, ColourRefinementOracle, ObjectGraphFactory};
use crate::search::{SearchContext, SearchMode, State, StateRepository};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet, VecDeque};

/// An equivalence class of concrete states under "certificates equal",
/// represented by the first state that reached it.
#[derive(Debug, Clone)]
pub struct AbstractVertex {
    pub representative: State,
    pub goal_distance: DiscreteCost,
    pub is_initial: bool,
    pub is_goal: bool,
    pub is_deadend: bool,
}

/// Parallel arrows between the same pair of classes are grouped.
#[derive(Debug, Clone)]
pub struct AbstractEdge {
    pub actions: Vec<ActionIndex>,
    pub cost: ContinuousCost,
}

#[derive(Debug, Clone, Copy)]
pub struct FaithfulAbstractionOptions {
    pub max_num_states: u32,
    pub max_time_in_ms: u32,
    pub sort_ascending_by_num_states: bool,
}

impl Default for FaithfulAbstractionOptions {
    fn default() -> Self {
        Self {
            max_num_states: u32::MAX,
            max_time_in_ms: u32::MAX,
            sort_ascending_by_num_states: false,
        }
    }
}

/// The isomorphism-quotiented state space of one problem. Symmetry pruning
/// is always on: only class representatives are expanded.
#[derive(Debug)]
pub struct FaithfulAbstraction {
    context: SearchContext,
    graph: DiGraph<AbstractVertex, AbstractEdge, u32>,
    initial_vertex: NodeIndex,
    goal_vertices: HashSet<NodeIndex>,
    deadend_vertices: HashSet<NodeIndex>,
    states_by_certificate: HashMap<Certificate, NodeIndex>,
    concrete_to_abstract: HashMap<StateIndex, NodeIndex>,
}

impl FaithfulAbstraction {
    /// `None` when the problem is statically unsolvable, the state budget is
    /// exceeded or the timeout elapses.
    pub fn new(context: SearchContext, options: &FaithfulAbstractionOptions) -> Option<Self> {
        Self::new_with_oracle(context, &ColourRefinementOracle::new(), options)
    }

    pub fn new_with_oracle(
        mut context: SearchContext,
        oracle: &dyn CanonicalGraphOracle,
        options: &FaithfulAbstractionOptions,
    ) -> Option<Self> {
        let repository = context.repository().clone();
        if !repository.static_goal_holds() {
            return None;
        }

        let object_graph_factory = ObjectGraphFactory::new(repository.clone());
        let stopwatch = StopWatch::new(options.max_time_in_ms);

        let mut graph: DiGraph<State, AbstractEdge, u32> = DiGraph::new();
        let mut states_by_certificate: HashMap<Certificate, NodeIndex> = HashMap::new();
        let mut concrete_to_abstract: HashMap<StateIndex, NodeIndex> = HashMap::new();
        let mut edges: HashMap<(NodeIndex, NodeIndex), EdgeIndex> = HashMap::new();
        let mut goal_vertices: HashSet<NodeIndex> = HashSet::new();

        let (generator, state_repository) = context.parts_mut();
        let (initial_state, _) = state_repository.get_or_create_initial_state();

        let initial_vertex = graph.add_node(initial_state);
        let initial_certificate =
            object_graph_factory.certificate(oracle, state_repository.packed(initial_state));
        states_by_certificate.insert(initial_certificate, initial_vertex);
        concrete_to_abstract.insert(initial_state.index(), initial_vertex);

        let mut queue: VecDeque<(NodeIndex, State)> = VecDeque::new();
        queue.push_back((initial_vertex, initial_state));

        while let Some((vertex, state)) = queue.pop_front() {
            if stopwatch.has_finished() {
                return None;
            }

            if state_repository.packed(state).satisfies_goal(repository.goal()) {
                goal_vertices.insert(vertex);
            }

            for action in generator.applicable_actions(state_repository.packed(state)) {
                let (successor, _) =
                    state_repository.get_or_create_successor_state(state, &action, 0.0);

                let target = match concrete_to_abstract.get(&successor.index()) {
                    Some(&target) => target,
                    None => {
                        let certificate = object_graph_factory
                            .certificate(oracle, state_repository.packed(successor));
                        match states_by_certificate.get(&certificate) {
                            Some(&target) => {
                                // Symmetric to an existing class.
                                concrete_to_abstract.insert(successor.index(), target);
                                target
                            }
                            None => {
                                let target = graph.add_node(successor);
                                if graph.node_count() as u64 > options.max_num_states as u64 {
                                    return None;
                                }
                                states_by_certificate.insert(certificate, target);
                                concrete_to_abstract.insert(successor.index(), target);
                                queue.push_back((target, successor));
                                target
                            }
                        }
                    }
                };

                match edges.get(&(vertex, target)) {
                    Some(&edge) => {
                        let weight = graph.edge_weight_mut(edge).expect("edge exists");
                        if !weight.actions.contains(&action.index) {
                            weight.actions.push(action.index);
                        }
                    }
                    None => {
                        let edge = graph.add_edge(
                            vertex,
                            target,
                            AbstractEdge {
                                actions: vec![action.index],
                                cost: action.cost,
                            },
                        );
                        edges.insert((vertex, target), edge);
                    }
                }
            }
        }

        let goal_distances = backward_goal_distances(&graph, &goal_vertices);
        let mut deadend_vertices: HashSet<NodeIndex> = HashSet::new();
        for vertex in graph.node_indices() {
            if goal_distances[vertex.index()] == UNDEFINED_DISCRETE_COST {
                deadend_vertices.insert(vertex);
            }
        }

        let graph = graph.map(
            |vertex, &representative| AbstractVertex {
                representative,
                goal_distance: goal_distances[vertex.index()],
                is_initial: vertex == initial_vertex,
                is_goal: goal_vertices.contains(&vertex),
                is_deadend: deadend_vertices.contains(&vertex),
            },
            |_, edge| edge.clone(),
        );

        Some(Self {
            context,
            graph,
            initial_vertex,
            goal_vertices,
            deadend_vertices,
            states_by_certificate,
            concrete_to_abstract,
        })
    }

    /// Build one abstraction per problem on a thread pool; every task owns
    /// its state repository and nothing mutable is shared. Failures yield no
    /// abstraction; survivors keep input order unless sorted by state count.
    pub fn new_batch(
        problems: Vec<Problem>,
        mode: SearchMode,
        options: &FaithfulAbstractionOptions,
    ) -> Vec<Self> {
        let mut abstractions: Vec<Self> = problems
            .into_par_iter()
            .map(|problem| Self::new(SearchContext::new(problem, mode), options))
            .collect::<Vec<Option<Self>>>()
            .into_iter()
            .flatten()
            .collect();
        if options.sort_ascending_by_num_states {
            abstractions.sort_by_key(|abstraction| abstraction.graph.node_count());
        }
        abstractions
    }

    /// Deliberately unspecified in the source; kept as an explicit stub.
    pub fn compute_shortest_distances_from_states(
        &self,
        _vertices: &[NodeIndex],
    ) -> Result<Vec<DiscreteCost>, SearchError> {
        Err(SearchError::Unimplemented(
            "compute_shortest_distances_from_states",
        ))
    }

    #[inline(always)]
    pub fn graph(&self) -> &DiGraph<AbstractVertex, AbstractEdge, u32> {
        &self.graph
    }

    #[inline(always)]
    pub fn initial_vertex(&self) -> NodeIndex {
        self.initial_vertex
    }

    #[inline(always)]
    pub fn goal_vertices(&self) -> &HashSet<NodeIndex> {
        &self.goal_vertices
    }

    #[inline(always)]
    pub fn deadend_vertices(&self) -> &HashSet<NodeIndex> {
        &self.deadend_vertices
    }

    pub fn states_by_certificate(&self) -> &HashMap<Certificate, NodeIndex> {
        &self.states_by_certificate
    }

    /// Class of an already-explored concrete state.
    pub fn abstract_state_of(&self, state: State) -> Option<NodeIndex> {
        self.concrete_to_abstract.get(&state.index()).copied()
    }

    pub fn num_abstract_states(&self) -> usize {
        self.graph.node_count()
    }

    pub fn num_abstract_transitions(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn goal_distance(&self, vertex: NodeIndex) -> DiscreteCost {
        self.graph[vertex].goal_distance
    }

    pub fn context(&self) -> &SearchContext {
        &self.context
    }

    pub fn state_repository(&self) -> &StateRepository {
        self.context.state_repository()
    }
}


fn backward_goal_distances(
    graph: &DiGraph<State, AbstractEdge, u32>,
    sources: &HashSet<NodeIndex>,
) -> Vec<DiscreteCost> {
    let mut distances = vec![UNDEFINED_DISCRETE_COST; graph.node_count()];
    let mut queue: VecDeque<NodeIndex> = VecDeque::new();
    for &source in sources {
        distances[source.index()] = 0;
        queue.push_back(source);
    }
    while let Some(vertex) = queue.pop_front() {
        let distance = distances[vertex.index()];
        for edge in graph.edges_directed(vertex, Direction::Incoming) {
            let predecessor = edge.source();
            if distances[predecessor.index()] == UNDEFINED_DISCRETE_COST {
                distances[predecessor.index()] = distance + 1;
                queue.push_back(predecessor);
            }
        }
    }
    distances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formalism::{GoalLiteral, GroundAtom};
    use crate::test_utils::*;
    use smallvec::smallvec;

    #[test]
    fn gripper_one_ball_quotient() {
        let context = SearchContext::new(gripper_problem(1), SearchMode::Grounded);
        let abstraction =
            FaithfulAbstraction::new(context, &FaithfulAbstractionOptions::default()).unwrap();
        // Ball in {roomA, roomB, carried} times robby in {roomA, roomB}.
        assert_eq!(abstraction.num_abstract_states(), 6);
        // The ball sits in room B with robby in either room.
        assert_eq!(abstraction.goal_vertices().len(), 2);
        assert!(abstraction.deadend_vertices().is_empty());

        let initial = abstraction.initial_vertex();
        assert!(abstraction.graph()[initial].is_initial);
        assert_eq!(abstraction.goal_distance(initial), 3);
    }

    #[test]
    fn gripper_two_balls_quotient() {
        let context = SearchContext::new(gripper_problem(2), SearchMode::Grounded);
        let abstraction =
            FaithfulAbstraction::new(context, &FaithfulAbstractionOptions::default()).unwrap();
        // Ball multiset over {roomA, roomB, carried} times robby position.
        assert_eq!(abstraction.num_abstract_states(), 12);
    }

    #[test]
    fn concrete_states_map_to_their_class() {
        let context = SearchContext::new(gripper_problem(1), SearchMode::Grounded);
        let abstraction =
            FaithfulAbstraction::new(context, &FaithfulAbstractionOptions::default()).unwrap();
        for vertex in abstraction.graph().node_indices() {
            let representative = abstraction.graph()[vertex].representative;
            assert_eq!(abstraction.abstract_state_of(representative), Some(vertex));
        }
    }

    #[test]
    fn batch_runs_in_parallel_and_keeps_order() {
        let mut unsolvable = chain_problem(2);
        unsolvable
            .goal
            .push(GoalLiteral::positive(GroundAtom::new(1, smallvec![1, 0])));
        let problems = vec![gripper_problem(1), unsolvable, chain_problem(2)];
        let abstractions = FaithfulAbstraction::new_batch(
            problems,
            SearchMode::Grounded,
            &FaithfulAbstractionOptions::default(),
        );
        assert_eq!(abstractions.len(), 2);
        assert_eq!(abstractions[0].num_abstract_states(), 6);
        assert_eq!(abstractions[1].num_abstract_states(), 3);
    }

    #[test]
    fn distances_from_arbitrary_states_are_unimplemented() {
        let context = SearchContext::new(chain_problem(1), SearchMode::Grounded);
        let abstraction =
            FaithfulAbstraction::new(context, &FaithfulAbstractionOptions::default()).unwrap();
        assert!(matches!(
            abstraction.compute_shortest_distances_from_states(&[]),
            Err(SearchError::Unimplemented(_))
        ));
    }
}
