use crate::common::{
    ActionIndex, ContinuousCost, DiscreteCost, StateIndex, StopWatch, UNDEFINED_DISCRETE_COST,
};
use crate::graphs::{CanonicalGraphOracle, Certificate, ColourRefinementOracle, ObjectGraphFactory};
use crate::search::{PackedState, PriorityQueue, SearchContext, State, StateRepository};
use ordered_float::OrderedFloat;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};

/// Vertex attributes of the final problem graph.
#[derive(Debug, Clone)]
pub struct ProblemVertex {
    pub state: State,
    pub unit_goal_distance: DiscreteCost,
    pub action_goal_distance: ContinuousCost,
    pub is_initial: bool,
    pub is_goal: bool,
    pub is_unsolvable: bool,
    pub is_alive: bool,
}

#[derive(Debug, Clone)]
pub struct ProblemEdge {
    pub action: ActionIndex,
    pub action_cost: ContinuousCost,
}

pub type ProblemGraph = DiGraph<ProblemVertex, ProblemEdge, u32>;

#[derive(Debug, Clone, Copy)]
pub struct StateSpaceOptions {
    pub max_num_states: u32,
    pub max_time_in_ms: u32,
    pub remove_if_unsolvable: bool,
    pub symmetry_pruning: bool,
    pub sort_ascending_by_num_states: bool,
}

impl Default for StateSpaceOptions {
    fn default() -> Self {
        Self {
            max_num_states: u32::MAX,
            max_time_in_ms: u32::MAX,
            remove_if_unsolvable: true,
            symmetry_pruning: false,
            sort_ascending_by_num_states: false,
        }
    }
}

/// Certificates collected during a symmetry-reduced construction; consumed
/// by the generalized state space.
#[derive(Debug, Default)]
pub struct CertificateMaps {
    pub state_to_certificate: HashMap<StateIndex, Certificate>,
    pub certificate_to_vertex: HashMap<Certificate, NodeIndex>,
}

/// The exhaustively explored reachable state space of one problem: a
/// bidirectional graph with goal distances, plus the goal and unsolvable
/// vertex sets.
#[derive(Debug)]
pub struct StateSpace {
    context: SearchContext,
    graph: ProblemGraph,
    initial_vertex: NodeIndex,
    goal_vertices: HashSet<NodeIndex>,
    unsolvable_vertices: HashSet<NodeIndex>,
    state_to_vertex: HashMap<StateIndex, NodeIndex>,
    is_symmetry_reduced: bool,
}

impl StateSpace {
    /// Exhaustive forward breadth-first exploration followed by the
    /// reachability analysis. `None` when the exploration ran out of states
    /// or time, or when the problem is unsolvable and `remove_if_unsolvable`
    /// is set. With symmetry pruning the second component carries the
    /// certificate maps.
    pub fn new(
        context: SearchContext,
        options: &StateSpaceOptions,
    ) -> Option<(Self, Option<CertificateMaps>)> {
        Self::new_with_oracle(context, &ColourRefinementOracle::new(), options)
    }

    pub fn new_with_oracle(
        mut context: SearchContext,
        oracle: &dyn CanonicalGraphOracle,
        options: &StateSpaceOptions,
    ) -> Option<(Self, Option<CertificateMaps>)> {
        let repository = context.repository().clone();
        if !repository.static_goal_holds() {
            return None;
        }

        let object_graph_factory = ObjectGraphFactory::new(repository.clone());
        let stopwatch = StopWatch::new(options.max_time_in_ms);

        let mut graph: DiGraph<State, ProblemEdge, u32> = DiGraph::new();
        let mut state_to_vertex: HashMap<StateIndex, NodeIndex> = HashMap::new();
        let mut goal_vertices: HashSet<NodeIndex> = HashSet::new();
        let mut certificate_maps = options.symmetry_pruning.then(CertificateMaps::default);
        let mut known_edges: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();

        let (generator, state_repository) = context.parts_mut();
        let (initial_state, _) = state_repository.get_or_create_initial_state();

        let initial_vertex = graph.add_node(initial_state);
        state_to_vertex.insert(initial_state.index(), initial_vertex);
        if let Some(maps) = certificate_maps.as_mut() {
            let certificate =
                object_graph_factory.certificate(oracle, state_repository.packed(initial_state));
            maps.state_to_certificate
                .insert(initial_state.index(), certificate);
            maps.certificate_to_vertex
                .insert(certificate, initial_vertex);
        }

        let mut queue: VecDeque<State> = VecDeque::new();
        queue.push_back(initial_state);

        while let Some(state) = queue.pop_front() {
            if stopwatch.has_finished() {
                return None;
            }
            let vertex = state_to_vertex[&state.index()];
            if state_repository.packed(state).satisfies_goal(repository.goal()) {
                goal_vertices.insert(vertex);
            }

            for action in generator.applicable_actions(state_repository.packed(state)) {
                let (successor, _) =
                    state_repository.get_or_create_successor_state(state, &action, 0.0);
                if state_repository.state_count() as u64 > options.max_num_states as u64 {
                    return None;
                }

                let edge = ProblemEdge {
                    action: action.index,
                    action_cost: action.cost,
                };

                if let Some(&target) = state_to_vertex.get(&successor.index()) {
                    // Known concrete state (or a state already mapped to its
                    // symmetry representative).
                    match certificate_maps.as_ref() {
                        Some(_) => {
                            if known_edges.insert((vertex, target)) {
                                graph.add_edge(vertex, target, edge);
                            }
                        }
                        None => {
                            graph.add_edge(vertex, target, edge);
                        }
                    }
                    continue;
                }

                match certificate_maps.as_mut() {
                    Some(maps) => {
                        let certificate = object_graph_factory
                            .certificate(oracle, state_repository.packed(successor));
                        maps.state_to_certificate
                            .insert(successor.index(), certificate);
                        if let Some(&representative) =
                            maps.certificate_to_vertex.get(&certificate)
                        {
                            // Symmetric to an explored state: map and wire,
                            // but do not expand.
                            state_to_vertex.insert(successor.index(), representative);
                            if known_edges.insert((vertex, representative)) {
                                graph.add_edge(vertex, representative, edge);
                            }
                        } else {
                            let target = graph.add_node(successor);
                            state_to_vertex.insert(successor.index(), target);
                            maps.certificate_to_vertex.insert(certificate, target);
                            known_edges.insert((vertex, target));
                            graph.add_edge(vertex, target, edge);
                            queue.push_back(successor);
                        }
                    }
                    None => {
                        let target = graph.add_node(successor);
                        state_to_vertex.insert(successor.index(), target);
                        graph.add_edge(vertex, target, edge);
                        queue.push_back(successor);
                    }
                }
            }
        }

        let state_space = Self::perform_reachability_analysis(
            context,
            graph,
            initial_vertex,
            goal_vertices,
            state_to_vertex,
            options,
        )?;
        Some((state_space, certificate_maps))
    }

    /// Sequential batch construction. Failed problems yield nothing;
    /// survivors keep input order unless sorted by state count.
    pub fn new_batch(
        contexts: Vec<SearchContext>,
        options: &StateSpaceOptions,
    ) -> Vec<(Self, Option<CertificateMaps>)> {
        let mut state_spaces: Vec<(Self, Option<CertificateMaps>)> = contexts
            .into_iter()
            .filter_map(|context| Self::new(context, options))
            .collect();
        if options.sort_ascending_by_num_states {
            state_spaces.sort_by_key(|(space, _)| space.graph.node_count());
        }
        state_spaces
    }

    fn perform_reachability_analysis(
        context: SearchContext,
        exploration_graph: DiGraph<State, ProblemEdge, u32>,
        initial_vertex: NodeIndex,
        goal_vertices: HashSet<NodeIndex>,
        state_to_vertex: HashMap<StateIndex, NodeIndex>,
        options: &StateSpaceOptions,
    ) -> Option<Self> {
        if options.remove_if_unsolvable && goal_vertices.is_empty() {
            return None;
        }

        let unit_goal_distances = backward_unit_distances(&exploration_graph, &goal_vertices);
        if options.remove_if_unsolvable
            && unit_goal_distances[initial_vertex.index()] == UNDEFINED_DISCRETE_COST
        {
            return None;
        }
        let action_goal_distances = backward_action_distances(&exploration_graph, &goal_vertices);

        let mut unsolvable_vertices: HashSet<NodeIndex> = HashSet::new();
        for vertex in exploration_graph.node_indices() {
            if unit_goal_distances[vertex.index()] == UNDEFINED_DISCRETE_COST {
                unsolvable_vertices.insert(vertex);
            }
        }

        let graph = exploration_graph.map(
            |vertex, &state| {
                let is_initial = vertex == initial_vertex;
                let is_goal = goal_vertices.contains(&vertex);
                let is_unsolvable = unsolvable_vertices.contains(&vertex);
                ProblemVertex {
                    state,
                    unit_goal_distance: unit_goal_distances[vertex.index()],
                    action_goal_distance: action_goal_distances[vertex.index()],
                    is_initial,
                    is_goal,
                    is_unsolvable,
                    is_alive: !(is_goal || is_unsolvable),
                }
            },
            |_, edge| edge.clone(),
        );

        Some(Self {
            context,
            graph,
            initial_vertex,
            goal_vertices,
            unsolvable_vertices,
            state_to_vertex,
            is_symmetry_reduced: options.symmetry_pruning,
        })
    }

    #[inline(always)]
    pub fn graph(&self) -> &ProblemGraph {
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
    pub fn unsolvable_vertices(&self) -> &HashSet<NodeIndex> {
        &self.unsolvable_vertices
    }

    #[inline(always)]
    pub fn is_symmetry_reduced(&self) -> bool {
        self.is_symmetry_reduced
    }

    pub fn context(&self) -> &SearchContext {
        &self.context
    }

    pub fn state_repository(&self) -> &StateRepository {
        self.context.state_repository()
    }

    pub fn packed(&self, state: State) -> &PackedState {
        self.context.state_repository().packed(state)
    }

    pub fn vertex_of_state(&self, state: State) -> Option<NodeIndex> {
        self.state_to_vertex.get(&state.index()).copied()
    }

    pub fn state_of_vertex(&self, vertex: NodeIndex) -> State {
        self.graph[vertex].state
    }

    pub fn num_states(&self) -> usize {
        self.graph.node_count()
    }

    pub fn num_transitions(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn unit_goal_distance(&self, vertex: NodeIndex) -> DiscreteCost {
        self.graph[vertex].unit_goal_distance
    }

    pub fn action_goal_distance(&self, vertex: NodeIndex) -> ContinuousCost {
        self.graph[vertex].action_goal_distance
    }
}


/// Multi-source backward BFS; unreachable vertices keep the undefined cost.
fn backward_unit_distances<V, E>(
    graph: &DiGraph<V, E, u32>,
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

/// Multi-source backward Dijkstra over the per-edge action costs.
fn backward_action_distances(
    graph: &DiGraph<State, ProblemEdge, u32>,
    sources: &HashSet<NodeIndex>,
) -> Vec<ContinuousCost> {
    let mut distances = vec![f64::INFINITY; graph.node_count()];
    let mut queue: PriorityQueue<OrderedFloat<f64>, NodeIndex> = PriorityQueue::new();
    for &source in sources {
        distances[source.index()] = 0.0;
        queue.insert(OrderedFloat(0.0), source);
    }
    while let Some(vertex) = queue.pop() {
        let distance = distances[vertex.index()];
        for edge in graph.edges_directed(vertex, Direction::Incoming) {
            let predecessor = edge.source();
            let candidate = distance + edge.weight().action_cost;
            if candidate < distances[predecessor.index()] {
                distances[predecessor.index()] = candidate;
                queue.insert(OrderedFloat(candidate), predecessor);
            }
        }
    }
    distances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::UNDEFINED_DISCRETE_COST;
    use crate::formalism::GroundAtom;
    use crate::search::SearchMode;
    use crate::test_utils::*;
    use assert_approx_eq::assert_approx_eq;
    use smallvec::smallvec;

    #[test]
    fn chain_space_has_a_line_graph() {
        let context = SearchContext::new(chain_problem(3), SearchMode::Grounded);
        let (space, maps) = StateSpace::new(context, &StateSpaceOptions::default()).unwrap();
        assert!(maps.is_none());
        assert_eq!(space.num_states(), 4);
        assert_eq!(space.num_transitions(), 3);
        assert_eq!(space.goal_vertices().len(), 1);
        assert!(space.unsolvable_vertices().is_empty());

        let initial = space.initial_vertex();
        assert_eq!(space.unit_goal_distance(initial), 3);
        assert_approx_eq!(space.action_goal_distance(initial), 3.0);
        assert!(space.graph()[initial].is_initial);
        assert!(space.graph()[initial].is_alive);

        let goal = *space.goal_vertices().iter().next().unwrap();
        assert_eq!(space.unit_goal_distance(goal), 0);
        assert!(!space.graph()[goal].is_alive);
    }

    #[test]
    fn dead_branches_are_marked_unsolvable() {
        let mut problem = chain_problem(3);
        // A side node reachable from the start with no way onwards.
        problem.objects.push(crate::formalism::Object::new("n9", vec![0]));
        problem
            .initial_static_atoms
            .push(GroundAtom::new(1, smallvec![0, 4]));
        let context = SearchContext::new(problem, SearchMode::Grounded);
        let (space, _) = StateSpace::new(context, &StateSpaceOptions::default()).unwrap();
        assert_eq!(space.num_states(), 5);
        assert_eq!(space.unsolvable_vertices().len(), 1);
        let unsolvable = *space.unsolvable_vertices().iter().next().unwrap();
        assert_eq!(space.unit_goal_distance(unsolvable), UNDEFINED_DISCRETE_COST);
        assert!(space.graph()[unsolvable].is_unsolvable);
        assert!(!space.graph()[unsolvable].is_alive);
    }

    #[test]
    fn unsolvable_spaces_are_removed_when_requested() {
        let mut problem = chain_problem(2);
        problem.initial_fluent_atoms = vec![GroundAtom::new(0, smallvec![2])];
        problem.goal = vec![crate::formalism::GoalLiteral::positive(GroundAtom::new(
            0,
            smallvec![0],
        ))];
        let context = SearchContext::new(problem.clone(), SearchMode::Grounded);
        assert!(StateSpace::new(context, &StateSpaceOptions::default()).is_none());

        let context = SearchContext::new(problem, SearchMode::Grounded);
        let options = StateSpaceOptions {
            remove_if_unsolvable: false,
            ..Default::default()
        };
        let (space, _) = StateSpace::new(context, &options).unwrap();
        assert_eq!(space.num_states(), 1);
        assert!(space.goal_vertices().is_empty());
    }

    #[test]
    fn symmetry_pruning_merges_gripper_mirror_states() {
        let context = SearchContext::new(gripper_problem(1), SearchMode::Grounded);
        let (full, _) = StateSpace::new(context, &StateSpaceOptions::default()).unwrap();
        assert_eq!(full.num_states(), 8);

        let context = SearchContext::new(gripper_problem(1), SearchMode::Grounded);
        let options = StateSpaceOptions {
            symmetry_pruning: true,
            ..Default::default()
        };
        let (reduced, maps) = StateSpace::new(context, &options).unwrap();
        let maps = maps.unwrap();
        assert!(reduced.is_symmetry_reduced());
        // The two carry states (left and right gripper) collapse.
        assert_eq!(reduced.num_states(), 6);
        assert_eq!(maps.certificate_to_vertex.len(), 6);
        assert!(maps.state_to_certificate.len() >= 8);
    }

    #[test]
    fn batch_construction_keeps_input_order() {
        let contexts = vec![
            SearchContext::new(chain_problem(3), SearchMode::Grounded),
            SearchContext::new(chain_problem(1), SearchMode::Grounded),
        ];
        let spaces = StateSpace::new_batch(contexts, &StateSpaceOptions::default());
        assert_eq!(spaces.len(), 2);
        assert_eq!(spaces[0].0.num_states(), 4);
        assert_eq!(spaces[1].0.num_states(), 2);

        let contexts = vec![
            SearchContext::new(chain_problem(3), SearchMode::Grounded),
            SearchContext::new(chain_problem(1), SearchMode::Grounded),
        ];
        let options = StateSpaceOptions {
            sort_ascending_by_num_states: true,
            ..Default::default()
        };
        let spaces = StateSpace::new_batch(contexts, &options);
        assert_eq!(spaces[0].0.num_states(), 2);
    }
}
