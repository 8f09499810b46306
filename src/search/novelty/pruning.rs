use crate::common::StateIndex;
use crate::error::SearchError;
use crate::search::novelty::DynamicNoveltyTable;
use crate::search::{PackedState, PruningStrategy, State};
use std::collections::HashSet;

/// Width-zero pruning: every state except the initial state's direct
/// successors is pruned, so search degenerates to a single expansion.
#[derive(Debug)]
pub struct ArityZeroNoveltyPruning {
    initial_state: State,
}

impl ArityZeroNoveltyPruning {
    pub fn new(initial_state: State) -> Self {
        Self { initial_state }
    }
}

impl PruningStrategy for ArityZeroNoveltyPruning {
    fn test_prune_initial_state(&mut self, _state: State, _packed: &PackedState) -> bool {
        false
    }

    fn test_prune_successor_state(
        &mut self,
        state: State,
        _packed: &PackedState,
        _successor: State,
        _successor_packed: &PackedState,
        _is_new_successor: bool,
    ) -> bool {
        state != self.initial_state
    }
}

/// Width-k pruning: a state survives only if it passes the k-novelty test.
/// The initial state is tested on its own tuples, successors on the tuples
/// containing an atom their transition added.
#[derive(Debug)]
pub struct ArityKNoveltyPruning {
    novelty_table: DynamicNoveltyTable,
    generated_states: HashSet<StateIndex>,
}

impl ArityKNoveltyPruning {
    pub fn new(arity: usize, num_atoms: usize) -> Result<Self, SearchError> {
        Ok(Self {
            novelty_table: DynamicNoveltyTable::with_num_atoms(arity, num_atoms)?,
            generated_states: HashSet::new(),
        })
    }
}

impl PruningStrategy for ArityKNoveltyPruning {
    fn test_prune_initial_state(&mut self, state: State, packed: &PackedState) -> bool {
        if !self.generated_states.insert(state.index()) {
            return true;
        }
        !self.novelty_table.test_novelty_and_update_table(packed)
    }

    fn test_prune_successor_state(
        &mut self,
        _state: State,
        packed: &PackedState,
        successor: State,
        successor_packed: &PackedState,
        _is_new_successor: bool,
    ) -> bool {
        if !self.generated_states.insert(successor.index()) {
            return true;
        }
        !self
            .novelty_table
            .test_novelty_and_update_table_pair(packed, successor_packed)
    }
}
