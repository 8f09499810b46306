use crate::datasets::{CertificateMaps, StateSpace};
use crate::graphs::Certificate;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};

/// A class vertex remembers the problem and problem vertex of its first
/// representative.
#[derive(Debug, Clone, Copy)]
pub struct ClassVertex {
    pub problem_index: usize,
    pub problem_vertex: NodeIndex,
}

#[derive(Debug, Clone, Copy)]
pub struct ClassEdge {
    pub problem_index: usize,
    pub problem_edge: EdgeIndex,
}

pub type ClassGraph = DiGraph<ClassVertex, ClassEdge, u32>;

/// The union of several per-problem state spaces of one domain. With
/// certificates the union is quotiented at vertex granularity: the first
/// occurrence of a certificate becomes the class vertex, later occurrences
/// only map to it, and whole problems whose initial certificate is already
/// known are skipped.
#[derive(Debug)]
pub struct GeneralizedStateSpace {
    state_spaces: Vec<StateSpace>,
    graph: ClassGraph,
    initial_vertices: HashSet<NodeIndex>,
    goal_vertices: HashSet<NodeIndex>,
    unsolvable_vertices: HashSet<NodeIndex>,
    /// Per kept problem: local vertex index → class vertex.
    vertex_mappings: Vec<Vec<NodeIndex>>,
    /// Per kept problem: local edge index → class edge (shared class edges
    /// point at the first problem's arrow).
    edge_mappings: Vec<Vec<EdgeIndex>>,
}

impl GeneralizedStateSpace {
    pub fn new(state_spaces: Vec<(StateSpace, Option<CertificateMaps>)>) -> Self {
        let symmetry_reduced = state_spaces
            .iter()
            .all(|(_, certificate_maps)| certificate_maps.is_some());
        if symmetry_reduced && !state_spaces.is_empty() {
            Self::new_with_symmetry(
                state_spaces
                    .into_iter()
                    .map(|(space, maps)| (space, maps.expect("checked above")))
                    .collect(),
            )
        } else {
            Self::new_without_symmetry(
                state_spaces.into_iter().map(|(space, _)| space).collect(),
            )
        }
    }

    /// Disjoint union by index offsets; every problem vertex becomes its own
    /// class vertex.
    fn new_without_symmetry(state_spaces: Vec<StateSpace>) -> Self {
        let mut graph = ClassGraph::new();
        let mut initial_vertices = HashSet::new();
        let mut goal_vertices = HashSet::new();
        let mut unsolvable_vertices = HashSet::new();
        let mut vertex_mappings = Vec::with_capacity(state_spaces.len());
        let mut edge_mappings = Vec::with_capacity(state_spaces.len());

        for (problem_index, state_space) in state_spaces.iter().enumerate() {
            let problem_graph = state_space.graph();
            let mut vertex_mapping = Vec::with_capacity(problem_graph.node_count());
            for vertex in problem_graph.node_indices() {
                let class_vertex = graph.add_node(ClassVertex {
                    problem_index,
                    problem_vertex: vertex,
                });
                vertex_mapping.push(class_vertex);
                if problem_graph[vertex].is_initial {
                    initial_vertices.insert(class_vertex);
                }
                if problem_graph[vertex].is_goal {
                    goal_vertices.insert(class_vertex);
                } else if problem_graph[vertex].is_unsolvable {
                    unsolvable_vertices.insert(class_vertex);
                }
            }
            let mut edge_mapping = Vec::with_capacity(problem_graph.edge_count());
            for edge in problem_graph.edge_references() {
                let class_edge = graph.add_edge(
                    vertex_mapping[edge.source().index()],
                    vertex_mapping[edge.target().index()],
                    ClassEdge {
                        problem_index,
                        problem_edge: edge.id(),
                    },
                );
                edge_mapping.push(class_edge);
            }
            vertex_mappings.push(vertex_mapping);
            edge_mappings.push(edge_mapping);
        }

        Self {
            state_spaces,
            graph,
            initial_vertices,
            goal_vertices,
            unsolvable_vertices,
            vertex_mappings,
            edge_mappings,
        }
    }

    fn new_with_symmetry(spaces: Vec<(StateSpace, CertificateMaps)>) -> Self {
        let mut graph = ClassGraph::new();
        let mut initial_vertices = HashSet::new();
        let mut goal_vertices = HashSet::new();
        let mut unsolvable_vertices = HashSet::new();
        let mut vertex_mappings = Vec::new();
        let mut edge_mappings = Vec::new();

        let mut certificate_to_class_vertex: HashMap<Certificate, NodeIndex> = HashMap::new();
        let mut class_edges: HashMap<(NodeIndex, NodeIndex), EdgeIndex> = HashMap::new();

        let mut kept_spaces: Vec<StateSpace> = Vec::new();

        for (state_space, certificate_maps) in spaces {
            let problem_graph = state_space.graph();

            let initial_state = problem_graph[state_space.initial_vertex()].state;
            let initial_certificate = certificate_maps.state_to_certificate
                [&initial_state.index()];
            if certificate_to_class_vertex.contains_key(&initial_certificate) {
                // The whole state space is isomorphic to a previous one.
                continue;
            }

            let problem_index = kept_spaces.len();
            let mut vertex_mapping = Vec::with_capacity(problem_graph.node_count());
            for vertex in problem_graph.node_indices() {
                let state = problem_graph[vertex].state;
                let certificate = certificate_maps.state_to_certificate[&state.index()];
                let class_vertex = match certificate_to_class_vertex.get(&certificate) {
                    Some(&class_vertex) => class_vertex,
                    None => {
                        let class_vertex = graph.add_node(ClassVertex {
                            problem_index,
                            problem_vertex: vertex,
                        });
                        certificate_to_class_vertex.insert(certificate, class_vertex);
                        if problem_graph[vertex].is_initial {
                            initial_vertices.insert(class_vertex);
                        }
                        if problem_graph[vertex].is_goal {
                            goal_vertices.insert(class_vertex);
                        } else if problem_graph[vertex].is_unsolvable {
                            unsolvable_vertices.insert(class_vertex);
                        }
                        class_vertex
                    }
                };
                vertex_mapping.push(class_vertex);
            }

            let mut edge_mapping = Vec::with_capacity(problem_graph.edge_count());
            for edge in problem_graph.edge_references() {
                let class_source = vertex_mapping[edge.source().index()];
                let class_target = vertex_mapping[edge.target().index()];
                let class_edge = match class_edges.get(&(class_source, class_target)) {
                    Some(&class_edge) => class_edge,
                    None => {
                        let class_edge = graph.add_edge(
                            class_source,
                            class_target,
                            ClassEdge {
                                problem_index,
                                problem_edge: edge.id(),
                            },
                        );
                        class_edges.insert((class_source, class_target), class_edge);
                        class_edge
                    }
                };
                edge_mapping.push(class_edge);
            }

            vertex_mappings.push(vertex_mapping);
            edge_mappings.push(edge_mapping);
            kept_spaces.push(state_space);
        }

        Self {
            state_spaces: kept_spaces,
            graph,
            initial_vertices,
            goal_vertices,
            unsolvable_vertices,
            vertex_mappings,
            edge_mappings,
        }
    }

    #[inline(always)]
    pub fn graph(&self) -> &ClassGraph {
        &self.graph
    }

    pub fn state_spaces(&self) -> &[StateSpace] {
        &self.state_spaces
    }

    pub fn initial_vertices(&self) -> &HashSet<NodeIndex> {
        &self.initial_vertices
    }

    pub fn goal_vertices(&self) -> &HashSet<NodeIndex> {
        &self.goal_vertices
    }

    pub fn unsolvable_vertices(&self) -> &HashSet<NodeIndex> {
        &self.unsolvable_vertices
    }

    /// Class vertex of a local problem vertex.
    pub fn class_vertex_of(&self, problem_index: usize, vertex: NodeIndex) -> NodeIndex {
        self.vertex_mappings[problem_index][vertex.index()]
    }

    /// Class edge of a local problem edge.
    pub fn class_edge_of(&self, problem_index: usize, edge: EdgeIndex) -> EdgeIndex {
        self.edge_mappings[problem_index][edge.index()]
    }

    /// Subgraph induced by a set of class vertices: the selected vertices and
    /// every class edge with both endpoints selected.
    pub fn induced_subgraph_by_class_vertices(
        &self,
        class_vertices: &HashSet<NodeIndex>,
    ) -> ClassGraph {
        let mut subgraph = ClassGraph::new();
        let mut vertex_map: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        for vertex in self.graph.node_indices() {
            if class_vertices.contains(&vertex) {
                vertex_map.insert(vertex, subgraph.add_node(self.graph[vertex]));
            }
        }
        for edge in self.graph.edge_references() {
            if let (Some(&source), Some(&target)) =
                (vertex_map.get(&edge.source()), vertex_map.get(&edge.target()))
            {
                subgraph.add_edge(source, target, *edge.weight());
            }
        }
        subgraph
    }

    /// Subgraph induced by a set of problems: every class vertex one of the
    /// selected problems maps into.
    pub fn induced_subgraph_by_problems(&self, problem_indices: &[usize]) -> ClassGraph {
        let class_vertices: HashSet<NodeIndex> = problem_indices
            .iter()
            .flat_map(|&problem_index| self.vertex_mappings[problem_index].iter().copied())
            .collect();
        self.induced_subgraph_by_class_vertices(&class_vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::StateSpaceOptions;
    use crate::search::{SearchContext, SearchMode};
    use crate::test_utils::*;

    fn build_spaces(
        lengths: &[usize],
        symmetry_pruning: bool,
    ) -> Vec<(StateSpace, Option<CertificateMaps>)> {
        let options = StateSpaceOptions {
            symmetry_pruning,
            ..Default::default()
        };
        lengths
            .iter()
            .map(|&length| {
                let context = SearchContext::new(chain_problem(length), SearchMode::Grounded);
                StateSpace::new(context, &options).unwrap()
            })
            .collect()
    }

    #[test]
    fn union_without_symmetry_is_disjoint() {
        let generalized = GeneralizedStateSpace::new(build_spaces(&[2, 2], false));
        assert_eq!(generalized.state_spaces().len(), 2);
        assert_eq!(generalized.graph().node_count(), 6);
        assert_eq!(generalized.graph().edge_count(), 4);
        assert_eq!(generalized.initial_vertices().len(), 2);
        assert_eq!(generalized.goal_vertices().len(), 2);
    }

    #[test]
    fn duplicate_problems_are_skipped_under_symmetry() {
        let generalized = GeneralizedStateSpace::new(build_spaces(&[2, 2], true));
        assert_eq!(generalized.state_spaces().len(), 1);
        assert_eq!(generalized.graph().node_count(), 3);
        assert_eq!(generalized.initial_vertices().len(), 1);
    }

    #[test]
    fn distinct_problems_keep_their_classes() {
        let generalized = GeneralizedStateSpace::new(build_spaces(&[2, 3], true));
        assert_eq!(generalized.state_spaces().len(), 2);
        // Chains of different length share no isomorphic states: the object
        // counts differ.
        assert_eq!(generalized.graph().node_count(), 7);
        assert_eq!(generalized.initial_vertices().len(), 2);
        assert_eq!(generalized.goal_vertices().len(), 2);

        let first_only = generalized.induced_subgraph_by_problems(&[0]);
        assert_eq!(first_only.node_count(), 3);
        assert_eq!(first_only.edge_count(), 2);
    }

    #[test]
    fn vertex_and_edge_mappings_cover_the_local_graphs() {
        let generalized = GeneralizedStateSpace::new(build_spaces(&[2, 3], true));
        for (problem_index, state_space) in generalized.state_spaces().iter().enumerate() {
            for vertex in state_space.graph().node_indices() {
                let class_vertex = generalized.class_vertex_of(problem_index, vertex);
                assert!(generalized.graph().node_weight(class_vertex).is_some());
            }
            for edge in state_space.graph().edge_indices() {
                let class_edge = generalized.class_edge_of(problem_index, edge);
                assert!(generalized.graph().edge_weight(class_edge).is_some());
            }
        }
    }
}
