//! Breadth-first search.

use crate::common::DiscreteCost;
use crate::common::StopWatch;
use crate::search::algorithms::{extract_plan, SearchResult, SearchStatus};
use crate::search::{
    EventHandler, GoalStrategy, PruningStrategy, SearchContext, SearchNodeStatus, SearchNodeTable,
    State,
};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
struct BrfsPayload {
    g: DiscreteCost,
}

#[derive(Debug, Clone, Copy)]
pub struct BrfsOptions {
    pub start_state: Option<State>,
    pub max_num_states: u32,
    pub max_time_in_ms: u32,
}

impl Default for BrfsOptions {
    fn default() -> Self {
        Self {
            start_state: None,
            max_num_states: u32::MAX,
            max_time_in_ms: u32::MAX,
        }
    }
}

/// FIFO expansion with unit costs. Each dequeued state is goal-tested; each
/// generated successor is pruned-tested, assigned `g(parent) + 1` and
/// enqueued. With duplicate pruning the plan is shortest in action count.
pub fn find_solution(
    context: &mut SearchContext,
    goal_strategy: &dyn GoalStrategy,
    pruning_strategy: &mut dyn PruningStrategy,
    event_handler: &mut dyn EventHandler,
    options: &BrfsOptions,
) -> SearchResult {
    let mut result = SearchResult::new();
    let (generator, state_repository) = context.parts_mut();

    let start_state = options
        .start_state
        .unwrap_or_else(|| state_repository.get_or_create_initial_state().0);
    event_handler.on_start_search(start_state);

    let mut nodes = SearchNodeTable::new(BrfsPayload { g: 0 });
    {
        let start_node = nodes.get_or_create(start_state.index());
        start_node.status = SearchNodeStatus::Open;
        start_node.payload.g = 0;
    }

    if !goal_strategy.test_static_goal() {
        event_handler.on_unsolvable();
        result.status = SearchStatus::Unsolvable;
        return result;
    }

    if pruning_strategy.test_prune_initial_state(start_state, state_repository.packed(start_state))
    {
        result.status = SearchStatus::Failed;
        return result;
    }

    let mut queue: VecDeque<State> = VecDeque::new();
    queue.push_back(start_state);

    let mut g_value: DiscreteCost = 0;
    let mut stopwatch = StopWatch::new(options.max_time_in_ms);

    while let Some(state) = queue.pop_front() {
        stopwatch.log_if_needed();
        if stopwatch.has_finished() {
            result.status = SearchStatus::OutOfTime;
            return result;
        }

        let node_g = nodes.get_or_create(state.index()).payload.g;
        if node_g > g_value {
            g_value = node_g;
            event_handler.on_finish_g_layer(g_value);
        }

        if goal_strategy.test_dynamic_goal(state_repository.packed(state)) {
            let plan = extract_plan(&nodes, state.index(), f64::from(node_g));
            event_handler.on_expand_goal_state(state);
            event_handler.on_end_search(
                state_repository.state_count() as u64,
                nodes.len() as u64,
            );
            event_handler.on_solved(&plan);
            result.plan = Some(plan);
            result.goal_state = Some(state);
            result.status = SearchStatus::Solved;
            return result;
        }

        event_handler.on_expand_state(state);

        for action in generator.applicable_actions(state_repository.packed(state)) {
            let (successor, _) = state_repository.get_or_create_successor_state(state, &action, 0.0);
            let is_new_successor =
                nodes.get_or_create(successor.index()).status == SearchNodeStatus::New;

            event_handler.on_generate_state(state, &action, action.cost, successor);

            if is_new_successor && state_repository.state_count() as u64 >= options.max_num_states as u64
            {
                result.status = SearchStatus::OutOfStates;
                return result;
            }

            if pruning_strategy.test_prune_successor_state(
                state,
                state_repository.packed(state),
                successor,
                state_repository.packed(successor),
                is_new_successor,
            ) {
                event_handler.on_prune_state(successor);
                continue;
            }

            let successor_node = nodes.get_or_create(successor.index());
            successor_node.status = SearchNodeStatus::Open;
            successor_node.parent_state = state.index();
            successor_node.creating_action = action.index;
            successor_node.payload.g = node_g + 1;
            queue.push_back(successor);
        }

        nodes.get_or_create(state.index()).status = SearchNodeStatus::Closed;
    }

    event_handler.on_end_search(state_repository.state_count() as u64, nodes.len() as u64);
    event_handler.on_exhausted();
    result.status = SearchStatus::Exhausted;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formalism::{GoalLiteral, GroundAtom, Problem};
    use crate::search::{
        validate_plan, DefaultEventHandler, DuplicateStatePruning, ProblemGoal, SearchMode,
    };
    use crate::test_utils::*;
    use smallvec::smallvec;

    fn run(problem: Problem, mode: SearchMode) -> (SearchResult, SearchContext) {
        let mut context = SearchContext::new(problem, mode);
        let goal_strategy = ProblemGoal::new(context.repository().clone());
        let mut pruning_strategy = DuplicateStatePruning;
        let mut event_handler = DefaultEventHandler::new();
        let result = find_solution(
            &mut context,
            &goal_strategy,
            &mut pruning_strategy,
            &mut event_handler,
            &BrfsOptions::default(),
        );
        (result, context)
    }

    #[test]
    fn gripper_one_ball_in_both_modes() {
        for mode in [SearchMode::Grounded, SearchMode::Lifted] {
            let (result, mut context) = run(gripper_problem(1), mode);
            assert_eq!(result.status, SearchStatus::Solved);
            let plan = result.plan.unwrap();
            assert_eq!(plan.len(), 3);
            assert_eq!(plan.cost(), 3.0);
            assert!(validate_plan(&plan, context.state_repository_mut()));
        }
    }

    #[test]
    fn gripper_two_balls_needs_five_steps() {
        let (result, mut context) = run(gripper_problem(2), SearchMode::Grounded);
        assert_eq!(result.status, SearchStatus::Solved);
        let plan = result.plan.unwrap();
        assert_eq!(plan.len(), 5);
        assert!(validate_plan(&plan, context.state_repository_mut()));
    }

    #[test]
    fn chain_plan_length_equals_chain_length() {
        let (result, mut context) = run(chain_problem(4), SearchMode::Lifted);
        assert_eq!(result.status, SearchStatus::Solved);
        let plan = result.plan.unwrap();
        assert_eq!(plan.len(), 4);
        assert!(validate_plan(&plan, context.state_repository_mut()));
    }

    #[test]
    fn numeric_counter_reaches_its_target() {
        let (result, mut context) = run(counters_problem(3.0), SearchMode::Lifted);
        assert_eq!(result.status, SearchStatus::Solved);
        let plan = result.plan.unwrap();
        assert_eq!(plan.len(), 3);
        assert!(validate_plan(&plan, context.state_repository_mut()));
    }

    #[test]
    fn derived_goal_satisfied_initially_yields_empty_plan() {
        let (result, _) = run(tower_problem(), SearchMode::Lifted);
        assert_eq!(result.status, SearchStatus::Solved);
        assert!(result.plan.unwrap().is_empty());
    }

    #[test]
    fn unreachable_goal_exhausts() {
        let mut problem = chain_problem(3);
        // Only forward edges exist, so nothing can reach node 0 again after
        // leaving it; ask for a node with no incoming edge from the chain.
        problem.goal = vec![GoalLiteral::positive(GroundAtom::new(0, smallvec![0]))];
        problem.initial_fluent_atoms = vec![GroundAtom::new(0, smallvec![1])];
        let (result, _) = run(problem, SearchMode::Lifted);
        assert_eq!(result.status, SearchStatus::Exhausted);
    }

    #[test]
    fn violated_static_goal_is_unsolvable() {
        let mut problem = chain_problem(2);
        problem
            .goal
            .push(GoalLiteral::positive(GroundAtom::new(1, smallvec![1, 0])));
        let (result, _) = run(problem, SearchMode::Lifted);
        assert_eq!(result.status, SearchStatus::Unsolvable);
    }

    #[test]
    fn state_budget_is_respected() {
        let mut context = SearchContext::new(gripper_problem(2), SearchMode::Grounded);
        let goal_strategy = ProblemGoal::new(context.repository().clone());
        let mut pruning_strategy = DuplicateStatePruning;
        let mut event_handler = DefaultEventHandler::new();
        let result = find_solution(
            &mut context,
            &goal_strategy,
            &mut pruning_strategy,
            &mut event_handler,
            &BrfsOptions {
                max_num_states: 4,
                ..Default::default()
            },
        );
        assert_eq!(result.status, SearchStatus::OutOfStates);
    }
}
