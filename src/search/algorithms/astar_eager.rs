//! A* with eager heuristic evaluation: h is computed once when a state is
//! first generated.

use crate::common::{ContinuousCost, StopWatch};
use crate::error::SearchError;
use crate::search::algorithms::{extract_plan, BestFirstKey, SearchResult, SearchStatus};
use crate::search::{
    EventHandler, GoalStrategy, Heuristic, PriorityQueue, PruningStrategy, SearchContext,
    SearchNodeStatus, SearchNodeTable, State,
};

#[derive(Debug, Clone, Copy)]
struct AstarPayload {
    g: ContinuousCost,
    h: ContinuousCost,
}

#[derive(Debug, Clone, Copy)]
pub struct AstarOptions {
    pub start_state: Option<State>,
    pub max_num_states: u32,
    pub max_time_in_ms: u32,
}

impl Default for AstarOptions {
    fn default() -> Self {
        Self {
            start_state: None,
            max_num_states: u32::MAX,
            max_time_in_ms: u32::MAX,
        }
    }
}

/// Best-first loop keyed by `(f = g + h, g, insertion step)` with lazy
/// deletion of stale entries. A successor reopens whenever a strictly
/// smaller g is proven. With a consistent heuristic the returned plan cost
/// equals the true shortest-path cost.
pub fn find_solution(
    context: &mut SearchContext,
    heuristic: &mut dyn Heuristic,
    goal_strategy: &dyn GoalStrategy,
    pruning_strategy: &mut dyn PruningStrategy,
    event_handler: &mut dyn EventHandler,
    options: &AstarOptions,
) -> Result<SearchResult, SearchError> {
    let mut result = SearchResult::new();
    let repository = context.repository().clone();
    let (generator, state_repository) = context.parts_mut();

    let (start_state, start_g_value) = match options.start_state {
        Some(state) => {
            let metric = repository
                .evaluate_metric(state_repository.packed(state).numeric_values())
                .unwrap_or(0.0);
            (state, metric)
        }
        None => state_repository.get_or_create_initial_state(),
    };
    if start_g_value.is_nan() {
        return Err(SearchError::MetricIsNaN);
    }

    if !goal_strategy.test_static_goal() {
        event_handler.on_unsolvable();
        result.status = SearchStatus::Unsolvable;
        return Ok(result);
    }

    event_handler.on_start_search(start_state);

    let start_h_value = heuristic.evaluate(state_repository.packed(start_state));
    if start_h_value.is_infinite() {
        event_handler.on_unsolvable();
        result.status = SearchStatus::Unsolvable;
        return Ok(result);
    }

    if pruning_strategy.test_prune_initial_state(start_state, state_repository.packed(start_state))
    {
        result.status = SearchStatus::Failed;
        return Ok(result);
    }

    let mut nodes = SearchNodeTable::new(AstarPayload {
        g: f64::INFINITY,
        h: 0.0,
    });
    {
        let start_node = nodes.get_or_create(start_state.index());
        start_node.status = if goal_strategy.test_dynamic_goal(state_repository.packed(start_state))
        {
            SearchNodeStatus::Goal
        } else {
            SearchNodeStatus::Open
        };
        start_node.payload = AstarPayload {
            g: start_g_value,
            h: start_h_value,
        };
    }

    let mut open: PriorityQueue<BestFirstKey, State> = PriorityQueue::new();
    let mut step: u64 = 0;
    open.insert(
        BestFirstKey::new(start_g_value + start_h_value, start_g_value, step),
        start_state,
    );

    let mut f_value = start_g_value + start_h_value;
    let mut stopwatch = StopWatch::new(options.max_time_in_ms);

    while let Some(state) = open.pop() {
        stopwatch.log_if_needed();
        if stopwatch.has_finished() {
            result.status = SearchStatus::OutOfTime;
            return Ok(result);
        }

        let node = nodes.get_or_create(state.index()).clone();
        if node.status == SearchNodeStatus::Closed || node.status == SearchNodeStatus::DeadEnd {
            // Stale open-list entry.
            continue;
        }

        let node_f_value = node.payload.g + node.payload.h;
        if node_f_value > f_value {
            event_handler.on_finish_f_layer(f_value);
            f_value = node_f_value;
        }

        if node.status == SearchNodeStatus::Goal {
            event_handler.on_expand_goal_state(state);
            let plan = extract_plan(&nodes, state.index(), node.payload.g);
            event_handler
                .on_end_search(state_repository.state_count() as u64, nodes.len() as u64);
            event_handler.on_solved(&plan);
            result.plan = Some(plan);
            result.goal_state = Some(state);
            result.status = SearchStatus::Solved;
            return Ok(result);
        }

        event_handler.on_expand_state(state);
        nodes.get_or_create(state.index()).status = SearchNodeStatus::Closed;

        for action in generator.applicable_actions(state_repository.packed(state)) {
            let (successor, successor_g_value) =
                state_repository.get_or_create_successor_state(state, &action, node.payload.g);
            if successor_g_value.is_nan() {
                return Err(SearchError::MetricIsNaN);
            }
            let action_cost = successor_g_value - node.payload.g;
            let is_new_successor =
                nodes.get_or_create(successor.index()).status == SearchNodeStatus::New;

            event_handler.on_generate_state(state, &action, action_cost, successor);

            if is_new_successor
                && state_repository.state_count() as u64 >= options.max_num_states as u64
            {
                result.status = SearchStatus::OutOfStates;
                return Ok(result);
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
            if successor_node.status == SearchNodeStatus::DeadEnd {
                continue;
            }

            if successor_g_value < successor_node.payload.g {
                successor_node.status = SearchNodeStatus::Open;
                successor_node.parent_state = state.index();
                successor_node.creating_action = action.index;
                successor_node.payload.g = successor_g_value;

                if is_new_successor {
                    let successor_h_value =
                        heuristic.evaluate(state_repository.packed(successor));
                    let successor_node = nodes.get_or_create(successor.index());
                    successor_node.payload.h = successor_h_value;
                    if successor_h_value.is_infinite() {
                        successor_node.status = SearchNodeStatus::DeadEnd;
                        continue;
                    }
                    if goal_strategy.test_dynamic_goal(state_repository.packed(successor)) {
                        successor_node.status = SearchNodeStatus::Goal;
                    }
                }

                event_handler.on_generate_state_relaxed(state, &action, action_cost, successor);

                let successor_h_value = nodes.get(successor.index()).payload.h;
                step += 1;
                open.insert(
                    BestFirstKey::new(
                        successor_g_value + successor_h_value,
                        successor_g_value,
                        step,
                    ),
                    successor,
                );
            } else {
                event_handler.on_generate_state_not_relaxed(state, &action, action_cost, successor);
            }
        }
    }

    event_handler.on_end_search(state_repository.state_count() as u64, nodes.len() as u64);
    event_handler.on_exhausted();
    result.status = SearchStatus::Exhausted;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formalism::Problem;
    use crate::search::{
        validate_plan, BlindHeuristic, DefaultEventHandler, NoPruning, ProblemGoal, SearchMode,
    };
    use crate::test_utils::*;
    use assert_approx_eq::assert_approx_eq;

    fn run(problem: Problem, mode: SearchMode) -> (Result<SearchResult, SearchError>, SearchContext) {
        let mut context = SearchContext::new(problem, mode);
        let goal_strategy = ProblemGoal::new(context.repository().clone());
        let mut heuristic = BlindHeuristic::new();
        let mut pruning_strategy = NoPruning;
        let mut event_handler = DefaultEventHandler::new();
        let result = find_solution(
            &mut context,
            &mut heuristic,
            &goal_strategy,
            &mut pruning_strategy,
            &mut event_handler,
            &AstarOptions::default(),
        );
        (result, context)
    }

    #[test]
    fn blind_astar_finds_the_cheap_route() {
        let (result, mut context) = run(diamond_problem(), SearchMode::Grounded);
        let result = result.unwrap();
        assert_eq!(result.status, SearchStatus::Solved);
        let plan = result.plan.unwrap();
        assert_eq!(plan.len(), 2);
        assert_approx_eq!(plan.cost(), 2.0);
        assert!(validate_plan(&plan, context.state_repository_mut()));
    }

    #[test]
    fn blind_astar_matches_brfs_on_unit_costs() {
        let (result, mut context) = run(gripper_problem(2), SearchMode::Lifted);
        let result = result.unwrap();
        assert_eq!(result.status, SearchStatus::Solved);
        let plan = result.plan.unwrap();
        assert_eq!(plan.len(), 5);
        assert_approx_eq!(plan.cost(), 5.0);
        assert!(validate_plan(&plan, context.state_repository_mut()));
    }

    #[test]
    fn counter_cost_equals_target() {
        let (result, _) = run(counters_problem(3.0), SearchMode::Lifted);
        let result = result.unwrap();
        assert_eq!(result.status, SearchStatus::Solved);
        assert_approx_eq!(result.plan.unwrap().cost(), 3.0);
    }

    #[test]
    fn nan_metric_is_a_fatal_error() {
        let (result, _) = run(nan_metric_problem(), SearchMode::Lifted);
        assert_eq!(result.unwrap_err(), SearchError::MetricIsNaN);
    }
}
