use crate::common::{ActionIndex, ContinuousCost};
use crate::search::StateRepository;
use serde::{Deserialize, Serialize};

/// A totally ordered sequence of ground actions together with its summed
/// cost. Actions are stored by index into the problem repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    actions: Vec<ActionIndex>,
    cost: ContinuousCost,
}

impl Plan {
    pub fn new(actions: Vec<ActionIndex>, cost: ContinuousCost) -> Self {
        Self { actions, cost }
    }

    pub fn empty() -> Self {
        Self {
            actions: vec![],
            cost: 0.0,
        }
    }

    pub fn actions(&self) -> &[ActionIndex] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn cost(&self) -> ContinuousCost {
        self.cost
    }
}

/// Replay the plan from the initial state: every step must be applicable and
/// the final state must satisfy the goal.
pub fn validate_plan(plan: &Plan, state_repository: &mut StateRepository) -> bool {
    let repository = state_repository.problem_repository().clone();
    if !repository.static_goal_holds() {
        return false;
    }
    let (mut state, mut metric) = state_repository.get_or_create_initial_state();
    for &action_index in plan.actions() {
        let action = repository.action(action_index);
        if !state_repository.packed(state).satisfies(&action.precondition) {
            return false;
        }
        let (successor, successor_metric) =
            state_repository.get_or_create_successor_state(state, &action, metric);
        state = successor;
        metric = successor_metric;
    }
    state_repository
        .packed(state)
        .satisfies_goal(repository.goal())
}
