//! Pluggable goal, pruning and exploration tests. Algorithms consult these at
//! fixed points of their loops; the novelty-based pruning strategies live in
//! [`crate::search::novelty`].

use crate::formalism::{GroundAction, ProblemRepository};
use crate::search::{PackedState, State};
use std::fmt::Debug;
use std::sync::Arc;

pub trait GoalStrategy: Debug {
    /// Whether the static portion of the goal can hold at all. A `false`
    /// short-circuits the search as unsolvable.
    fn test_static_goal(&self) -> bool;

    fn test_dynamic_goal(&self, state: &PackedState) -> bool;
}

/// The default goal test: the problem's goal literals.
#[derive(Debug)]
pub struct ProblemGoal {
    repository: Arc<ProblemRepository>,
}

impl ProblemGoal {
    pub fn new(repository: Arc<ProblemRepository>) -> Self {
        Self { repository }
    }
}

impl GoalStrategy for ProblemGoal {
    fn test_static_goal(&self) -> bool {
        self.repository.static_goal_holds()
    }

    fn test_dynamic_goal(&self, state: &PackedState) -> bool {
        state.satisfies_goal(self.repository.goal())
    }
}

/// Goal-counting test for serialized search: accepts any state with strictly
/// fewer unsatisfied top-level goal literals than the subproblem's start
/// state.
#[derive(Debug)]
pub struct GoalCountingGoal {
    repository: Arc<ProblemRepository>,
    initial_num_unsatisfied: usize,
}

impl GoalCountingGoal {
    pub fn new(repository: Arc<ProblemRepository>, start_state: &PackedState) -> Self {
        let initial_num_unsatisfied =
            start_state.count_unsatisfied_goal_literals(repository.goal());
        Self {
            repository,
            initial_num_unsatisfied,
        }
    }

    pub fn count_unsatisfied_goals(&self, state: &PackedState) -> usize {
        state.count_unsatisfied_goal_literals(self.repository.goal())
    }
}

impl GoalStrategy for GoalCountingGoal {
    fn test_static_goal(&self) -> bool {
        self.repository.static_goal_holds()
    }

    fn test_dynamic_goal(&self, state: &PackedState) -> bool {
        self.count_unsatisfied_goals(state) < self.initial_num_unsatisfied
    }
}

pub trait PruningStrategy: Debug {
    fn test_prune_initial_state(&mut self, state: State, packed: &PackedState) -> bool;

    fn test_prune_successor_state(
        &mut self,
        state: State,
        packed: &PackedState,
        successor: State,
        successor_packed: &PackedState,
        is_new_successor: bool,
    ) -> bool;
}

#[derive(Debug, Default)]
pub struct NoPruning;

impl PruningStrategy for NoPruning {
    fn test_prune_initial_state(&mut self, _state: State, _packed: &PackedState) -> bool {
        false
    }

    fn test_prune_successor_state(
        &mut self,
        _state: State,
        _packed: &PackedState,
        _successor: State,
        _successor_packed: &PackedState,
        _is_new_successor: bool,
    ) -> bool {
        false
    }
}

/// Prunes every successor whose packed state was interned before.
#[derive(Debug, Default)]
pub struct DuplicateStatePruning;

impl PruningStrategy for DuplicateStatePruning {
    fn test_prune_initial_state(&mut self, _state: State, _packed: &PackedState) -> bool {
        false
    }

    fn test_prune_successor_state(
        &mut self,
        _state: State,
        _packed: &PackedState,
        _successor: State,
        _successor_packed: &PackedState,
        is_new_successor: bool,
    ) -> bool {
        !is_new_successor
    }
}

/// Policy-compatibility hook consulted on every generated edge; used by the
/// lazy greedy search to route states into its alternating open lists.
pub trait ExplorationStrategy: Debug {
    fn on_generate_state(
        &mut self,
        state: &PackedState,
        action: &GroundAction,
        successor: &PackedState,
    ) -> bool;
}

/// Marks every edge as compatible.
#[derive(Debug, Default)]
pub struct FullExploration;

impl ExplorationStrategy for FullExploration {
    fn on_generate_state(
        &mut self,
        _state: &PackedState,
        _action: &GroundAction,
        _successor: &PackedState,
    ) -> bool {
        true
    }
}
