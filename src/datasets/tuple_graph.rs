use crate::common::AtomIndex;
use crate::datasets::StateSpace;
use crate::error::SearchError;
use crate::search::novelty::{DynamicNoveltyTable, TupleIndex, MAX_ARITY};
use crate::search::State;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// A tuple-graph vertex: one novel tuple together with the layer states that
/// witness it.
#[derive(Debug, Clone)]
pub struct TupleGraphVertex {
    pub index: usize,
    pub tuple_index: TupleIndex,
    pub states: Vec<State>,
}

#[derive(Debug, Clone, Copy)]
pub struct TupleGraphOptions {
    pub arity: usize,
    pub prune_dominated_tuples: bool,
}

impl Default for TupleGraphOptions {
    fn default() -> Self {
        Self {
            arity: 1,
            prune_dominated_tuples: false,
        }
    }
}

/// Novelty-preserving DAG over a state space, layered by distance from the
/// root state. A vertex at layer d is a tuple first witnessed at distance d
/// whose witnesses extend the optimal plans of some layer-(d-1) vertex.
#[derive(Debug)]
pub struct TupleGraph {
    state_space: Arc<StateSpace>,
    root_state: State,
    novelty_table: DynamicNoveltyTable,
    vertices: Vec<TupleGraphVertex>,
    forward_successors: Vec<Vec<usize>>,
    backward_successors: Vec<Vec<usize>>,
    vertex_indices_by_distance: Vec<Vec<usize>>,
    states_by_distance: Vec<Vec<State>>,
}

impl TupleGraph {
    #[inline(always)]
    pub fn state_space(&self) -> &Arc<StateSpace> {
        &self.state_space
    }

    #[inline(always)]
    pub fn root_state(&self) -> State {
        self.root_state
    }

    pub fn vertices(&self) -> &[TupleGraphVertex] {
        &self.vertices
    }

    pub fn forward_successors(&self) -> &[Vec<usize>] {
        &self.forward_successors
    }

    pub fn backward_successors(&self) -> &[Vec<usize>] {
        &self.backward_successors
    }

    pub fn vertex_indices_by_distance(&self) -> &[Vec<usize>] {
        &self.vertex_indices_by_distance
    }

    pub fn states_by_distance(&self) -> &[Vec<State>] {
        &self.states_by_distance
    }

    /// An admissible chain for a tuple of ground atoms: the root-to-vertex
    /// chain of the vertex carrying exactly that tuple, if present.
    pub fn compute_admissible_chain_for_atoms(
        &self,
        fluent_atoms: &[AtomIndex],
        derived_atoms: &[AtomIndex],
    ) -> Option<Vec<usize>> {
        let atom_mapper = self.novelty_table.atom_index_mapper();
        let tuple_mapper = self.novelty_table.tuple_index_mapper();

        let mut dense: Vec<usize> = Vec::with_capacity(tuple_mapper.arity());
        for &atom in fluent_atoms {
            dense.push(atom_mapper.find_fluent(atom)?);
        }
        for &atom in derived_atoms {
            dense.push(atom_mapper.find_derived(atom)?);
        }
        dense.sort_unstable();
        dense.dedup();
        if dense.len() > tuple_mapper.arity() {
            return None;
        }
        while dense.len() < tuple_mapper.arity() {
            dense.push(tuple_mapper.num_atoms());
        }
        let tuple_index = tuple_mapper.to_tuple_index(&dense);

        let vertex = self
            .vertices
            .iter()
            .find(|vertex| vertex.tuple_index == tuple_index)?;
        Some(self.chain_to(vertex.index))
    }

    /// An admissible chain for a set of states: the chain of a minimal-layer
    /// vertex all of whose witnesses belong to the set.
    pub fn compute_admissible_chain_for_states(&self, states: &[State]) -> Option<Vec<usize>> {
        let state_set: HashSet<State> = states.iter().copied().collect();
        for layer in &self.vertex_indices_by_distance {
            for &vertex_index in layer {
                let vertex = &self.vertices[vertex_index];
                if vertex.states.iter().all(|state| state_set.contains(state)) {
                    return Some(self.chain_to(vertex_index));
                }
            }
        }
        None
    }

    /// Root-to-vertex chain following any backward edge per layer.
    fn chain_to(&self, vertex_index: usize) -> Vec<usize> {
        let mut chain = vec![vertex_index];
        let mut current = vertex_index;
        while let Some(&predecessor) = self.backward_successors[current].first() {
            chain.push(predecessor);
            current = predecessor;
        }
        chain.reverse();
        chain
    }
}

#[derive(Debug)]
pub struct TupleGraphFactory {
    state_space: Arc<StateSpace>,
    arity: usize,
    prune_dominated_tuples: bool,
}

impl TupleGraphFactory {
    pub fn new(
        state_space: Arc<StateSpace>,
        options: &TupleGraphOptions,
    ) -> Result<Self, SearchError> {
        if options.arity > MAX_ARITY {
            return Err(SearchError::ArityOutOfRange {
                arity: options.arity,
                max: MAX_ARITY,
            });
        }
        Ok(Self {
            state_space,
            arity: options.arity,
            prune_dominated_tuples: options.prune_dominated_tuples,
        })
    }

    pub fn create(&self, root_state: State) -> Result<TupleGraph, SearchError> {
        if self.arity == 0 {
            self.create_for_arity_zero(root_state)
        } else {
            self.create_for_arity_k(root_state)
        }
    }

    fn successors_of(&self, state: State) -> Vec<State> {
        let graph = self.state_space.graph();
        let vertex = self
            .state_space
            .vertex_of_state(state)
            .expect("state belongs to the state space");
        let mut successors: Vec<State> = graph
            .neighbors(vertex)
            .map(|neighbor| graph[neighbor].state)
            .collect();
        successors.sort_unstable();
        successors.dedup();
        successors
    }

    /// Width zero: vertex 0 is the empty tuple at the root, vertex 1 groups
    /// all distance-1 successors.
    fn create_for_arity_zero(&self, root_state: State) -> Result<TupleGraph, SearchError> {
        let novelty_table = DynamicNoveltyTable::with_num_atoms(0, self.atom_universe_size())?;
        let empty_tuple_index = novelty_table.tuple_index_mapper().empty_tuple_index();

        let mut vertices = vec![TupleGraphVertex {
            index: 0,
            tuple_index: empty_tuple_index,
            states: vec![root_state],
        }];
        let mut forward_successors = vec![vec![]];
        let mut backward_successors = vec![vec![]];
        let mut vertex_indices_by_distance = vec![vec![0]];
        let mut states_by_distance = vec![vec![root_state]];

        let mut successors = self.successors_of(root_state);
        successors.retain(|&successor| successor != root_state);
        if !successors.is_empty() {
            vertices.push(TupleGraphVertex {
                index: 1,
                tuple_index: empty_tuple_index,
                states: successors.clone(),
            });
            forward_successors[0].push(1);
            forward_successors.push(vec![]);
            backward_successors.push(vec![0]);
            vertex_indices_by_distance.push(vec![1]);
            states_by_distance.push(successors);
        }

        Ok(TupleGraph {
            state_space: self.state_space.clone(),
            root_state,
            novelty_table,
            vertices,
            forward_successors,
            backward_successors,
            vertex_indices_by_distance,
            states_by_distance,
        })
    }

    /// Sized so the table never resizes mid-construction; stored vertex
    /// tuple indices must stay valid under the final mapper.
    fn atom_universe_size(&self) -> usize {
        let repository = self.state_space.context().repository();
        repository.num_fluent_atoms() + repository.num_derived_atoms() + 2
    }

    fn create_for_arity_k(&self, root_state: State) -> Result<TupleGraph, SearchError> {
        let mut novelty_table =
            DynamicNoveltyTable::with_num_atoms(self.arity, self.atom_universe_size())?;

        let mut vertices: Vec<TupleGraphVertex> = Vec::new();
        let mut forward_successors: Vec<Vec<usize>> = Vec::new();
        let mut backward_successors: Vec<Vec<usize>> = Vec::new();
        let mut vertex_indices_by_distance: Vec<Vec<usize>> = Vec::new();
        let mut states_by_distance: Vec<Vec<State>> = Vec::new();

        // Root layer: one vertex per tuple of the root state.
        let root_tuples =
            novelty_table.compute_novel_tuples(self.state_space.packed(root_state));
        novelty_table.insert_tuples(&root_tuples);
        let mut root_layer = Vec::with_capacity(root_tuples.len());
        for tuple_index in root_tuples {
            let index = vertices.len();
            vertices.push(TupleGraphVertex {
                index,
                tuple_index,
                states: vec![root_state],
            });
            forward_successors.push(vec![]);
            backward_successors.push(vec![]);
            root_layer.push(index);
        }
        vertex_indices_by_distance.push(root_layer);
        states_by_distance.push(vec![root_state]);

        let mut visited: HashSet<State> = HashSet::new();
        visited.insert(root_state);

        loop {
            // 1. Next layer of concrete states.
            let previous_states = states_by_distance.last().expect("at least the root layer");
            let mut current_states: BTreeSet<State> = BTreeSet::new();
            for &state in previous_states {
                for successor in self.successors_of(state) {
                    if !visited.contains(&successor) {
                        current_states.insert(successor);
                    }
                }
            }
            let current_states: Vec<State> = current_states.into_iter().collect();
            if current_states.is_empty() {
                break;
            }

            // 2. Novel tuples of the new layer.
            let mut novel_tuple_to_states: BTreeMap<TupleIndex, BTreeSet<State>> = BTreeMap::new();
            let mut state_to_novel_tuples: HashMap<State, Vec<TupleIndex>> = HashMap::new();
            for &state in &current_states {
                let novel = novelty_table.compute_novel_tuples(self.state_space.packed(state));
                for &tuple_index in &novel {
                    novel_tuple_to_states
                        .entry(tuple_index)
                        .or_default()
                        .insert(state);
                }
                state_to_novel_tuples.insert(state, novel);
            }

            // 3. Which previous-layer vertices extend into each novel tuple:
            // every witness of the vertex must have a successor witnessing
            // the tuple.
            let mut tuple_to_previous_vertices: BTreeMap<TupleIndex, BTreeSet<usize>> =
                BTreeMap::new();
            let previous_layer = vertex_indices_by_distance
                .last()
                .expect("at least the root layer")
                .clone();
            for &vertex_index in &previous_layer {
                let mut extended: HashMap<TupleIndex, HashSet<State>> = HashMap::new();
                for &state in &vertices[vertex_index].states {
                    for successor in self.successors_of(state) {
                        if let Some(novel) = state_to_novel_tuples.get(&successor) {
                            for &tuple_index in novel {
                                extended.entry(tuple_index).or_default().insert(state);
                            }
                        }
                    }
                }
                for (tuple_index, extending_states) in extended {
                    if extending_states.len() == vertices[vertex_index].states.len() {
                        tuple_to_previous_vertices
                            .entry(tuple_index)
                            .or_default()
                            .insert(vertex_index);
                    }
                }
            }

            // All novel tuples of this layer are witnessed from now on, even
            // the ones that do not become vertices.
            let all_novel: Vec<TupleIndex> = novel_tuple_to_states.keys().copied().collect();
            novelty_table.insert_tuples(&all_novel);

            if tuple_to_previous_vertices.is_empty() {
                break;
            }

            // 4. Dominance pruning among the candidates.
            let mut candidates: Vec<TupleIndex> =
                tuple_to_previous_vertices.keys().copied().collect();
            if self.prune_dominated_tuples {
                let dominated: HashSet<TupleIndex> = candidates
                    .iter()
                    .copied()
                    .filter(|&tuple| {
                        candidates.iter().any(|&other| {
                            other != tuple
                                && dominates(
                                    &tuple_to_previous_vertices[&other],
                                    &novel_tuple_to_states[&other],
                                    &tuple_to_previous_vertices[&tuple],
                                    &novel_tuple_to_states[&tuple],
                                )
                        })
                    })
                    .collect();
                candidates.retain(|tuple| !dominated.contains(tuple));
            }

            // 5. Instantiate the surviving tuples and wire the layer.
            let mut current_layer = Vec::with_capacity(candidates.len());
            for tuple_index in candidates {
                let index = vertices.len();
                vertices.push(TupleGraphVertex {
                    index,
                    tuple_index,
                    states: novel_tuple_to_states[&tuple_index].iter().copied().collect(),
                });
                forward_successors.push(vec![]);
                backward_successors.push(vec![]);
                for &previous_vertex in &tuple_to_previous_vertices[&tuple_index] {
                    forward_successors[previous_vertex].push(index);
                    backward_successors[index].push(previous_vertex);
                }
                current_layer.push(index);
            }
            vertex_indices_by_distance.push(current_layer);
            visited.extend(current_states.iter().copied());
            states_by_distance.push(current_states);
        }

        Ok(TupleGraph {
            state_space: self.state_space.clone(),
            root_state,
            novelty_table,
            vertices,
            forward_successors,
            backward_successors,
            vertex_indices_by_distance,
            states_by_distance,
        })
    }
}

/// The default dominance relation: `a` dominates `b` when `a` is extended by
/// a superset of the previous-layer vertices and witnessed by a subset of the
/// new states, strictly better on at least one side.
fn dominates(
    a_previous: &BTreeSet<usize>,
    a_states: &BTreeSet<State>,
    b_previous: &BTreeSet<usize>,
    b_states: &BTreeSet<State>,
) -> bool {
    let previous_superset = b_previous.is_subset(a_previous);
    let states_subset = a_states.is_subset(b_states);
    previous_superset
        && states_subset
        && (a_previous.len() > b_previous.len() || a_states.len() < b_states.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::StateSpaceOptions;
    use crate::formalism::GroundAtom;
    use crate::search::{SearchContext, SearchMode};
    use crate::test_utils::*;
    use smallvec::smallvec;

    fn chain_space(length: usize) -> Arc<StateSpace> {
        let context = SearchContext::new(chain_problem(length), SearchMode::Grounded);
        let (space, _) = StateSpace::new(context, &StateSpaceOptions::default()).unwrap();
        Arc::new(space)
    }

    #[test]
    fn arity_zero_groups_the_first_layer() {
        let space = chain_space(2);
        let root = space.state_of_vertex(space.initial_vertex());
        let factory = TupleGraphFactory::new(
            space,
            &TupleGraphOptions {
                arity: 0,
                prune_dominated_tuples: false,
            },
        )
        .unwrap();
        let tuple_graph = factory.create(root).unwrap();
        assert_eq!(tuple_graph.vertices().len(), 2);
        assert_eq!(tuple_graph.forward_successors()[0], vec![1]);
        assert_eq!(tuple_graph.backward_successors()[1], vec![0]);
        assert_eq!(tuple_graph.states_by_distance().len(), 2);
        assert_eq!(tuple_graph.states_by_distance()[1].len(), 1);
    }

    #[test]
    fn chain_layers_follow_the_distance() {
        let space = chain_space(2);
        let root = space.state_of_vertex(space.initial_vertex());
        let factory = TupleGraphFactory::new(
            space,
            &TupleGraphOptions {
                arity: 1,
                prune_dominated_tuples: false,
            },
        )
        .unwrap();
        let tuple_graph = factory.create(root).unwrap();

        // Root layer: the tuple (at n0) and the empty tuple; one vertex per
        // later layer for (at n1) and (at n2).
        assert_eq!(tuple_graph.vertices().len(), 4);
        assert_eq!(tuple_graph.vertex_indices_by_distance().len(), 3);
        assert_eq!(tuple_graph.states_by_distance().len(), 3);
        for layer in tuple_graph.states_by_distance() {
            assert_eq!(layer.len(), 1);
        }
    }

    #[test]
    fn admissible_chains_reach_queried_atoms() {
        let space = chain_space(2);
        let repository = space.context().repository().clone();
        let root = space.state_of_vertex(space.initial_vertex());
        let factory = TupleGraphFactory::new(
            space,
            &TupleGraphOptions {
                arity: 1,
                prune_dominated_tuples: true,
            },
        )
        .unwrap();
        let tuple_graph = factory.create(root).unwrap();

        let goal_atom = repository
            .find_fluent_atom_index(&GroundAtom::new(0, smallvec![2]))
            .unwrap();
        let chain = tuple_graph
            .compute_admissible_chain_for_atoms(&[goal_atom], &[])
            .unwrap();
        assert_eq!(chain.len(), 3);

        let unseen = tuple_graph.compute_admissible_chain_for_atoms(&[goal_atom, goal_atom], &[]);
        assert!(unseen.is_some());

        let middle_state = tuple_graph.states_by_distance()[1][0];
        let chain = tuple_graph
            .compute_admissible_chain_for_states(&[middle_state])
            .unwrap();
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn admissible_chain_for_unknown_atoms_is_none() {
        let space = chain_space(1);
        let root = space.state_of_vertex(space.initial_vertex());
        let factory = TupleGraphFactory::new(
            space.clone(),
            &TupleGraphOptions {
                arity: 1,
                prune_dominated_tuples: false,
            },
        )
        .unwrap();
        let tuple_graph = factory.create(root).unwrap();
        // Atom index 99 was never interned, let alone observed.
        assert!(tuple_graph
            .compute_admissible_chain_for_atoms(&[99], &[])
            .is_none());
    }
}
