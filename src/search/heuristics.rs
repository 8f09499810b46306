use crate::common::{ActionIndex, ContinuousCost};
use crate::formalism::ProblemRepository;
use crate::search::PackedState;
use ordered_float::OrderedFloat;
use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Arc;

/// Heuristic values are ordered floats so they can key open lists directly.
pub type HeuristicValue = OrderedFloat<f64>;

/// The capability the search algorithms consume. Research heuristics live
/// outside the core; the two implementations below cover the blind and
/// goal-counting baselines.
pub trait Heuristic: Debug {
    fn evaluate(&mut self, state: &PackedState) -> ContinuousCost;

    /// Actions the heuristic recommends for the given state, if it computes
    /// any. The lazy greedy search routes these into dedicated open lists.
    fn preferred_actions(&mut self, _state: &PackedState) -> Option<HashSet<ActionIndex>> {
        None
    }
}

/// The zero heuristic. Turns A* into uniform-cost search.
#[derive(Debug, Default)]
pub struct BlindHeuristic;

impl BlindHeuristic {
    pub fn new() -> Self {
        Self
    }
}

impl Heuristic for BlindHeuristic {
    fn evaluate(&mut self, _state: &PackedState) -> ContinuousCost {
        0.0
    }
}

/// Number of unsatisfied top-level goal literals.
#[derive(Debug)]
pub struct GoalCountHeuristic {
    repository: Arc<ProblemRepository>,
}

impl GoalCountHeuristic {
    pub fn new(repository: Arc<ProblemRepository>) -> Self {
        Self { repository }
    }
}

impl Heuristic for GoalCountHeuristic {
    fn evaluate(&mut self, state: &PackedState) -> ContinuousCost {
        state.count_unsatisfied_goal_literals(self.repository.goal()) as ContinuousCost
    }
}
