//! Greedy best-first search with lazy heuristic evaluation and six
//! alternating open lists. Successors are routed by two orthogonal tags:
//! policy compatibility (from the exploration strategy) and preference (from
//! the heuristic). Compatible states additionally feed an exhaustive
//! (generation-ordered) list so alternation can trade greediness against
//! coverage.

use crate::common::{ContinuousCost, StopWatch};
use crate::error::SearchError;
use crate::search::algorithms::{extract_plan, SearchResult, SearchStatus};
use crate::search::{
    AlternatingOpenList, EventHandler, ExplorationStrategy, GoalStrategy, Heuristic,
    PruningStrategy, SearchContext, SearchNodeStatus, SearchNodeTable, State,
};
use ordered_float::OrderedFloat;

#[derive(Debug, Clone, Copy)]
struct GbfsPayload {
    g: ContinuousCost,
    h: ContinuousCost,
}

/// Bucket indices of the alternating open list.
const COMPATIBLE_GREEDY_PREFERRED: usize = 0;
const COMPATIBLE_GREEDY: usize = 1;
const COMPATIBLE_EXHAUSTIVE_PREFERRED: usize = 2;
const COMPATIBLE_EXHAUSTIVE: usize = 3;
const PREFERRED: usize = 4;
const STANDARD: usize = 5;

/// Greedy buckets order by `(h, step)`; exhaustive buckets zero out the h
/// component, which degrades the key to generation order.
type GbfsKey = (OrderedFloat<f64>, u64);

#[derive(Debug, Clone, Copy)]
pub struct GbfsLazyOptions {
    pub start_state: Option<State>,
    pub max_num_states: u32,
    pub max_time_in_ms: u32,
    pub openlist_weights: [u32; 6],
}

impl Default for GbfsLazyOptions {
    fn default() -> Self {
        Self {
            start_state: None,
            max_num_states: u32::MAX,
            max_time_in_ms: u32::MAX,
            openlist_weights: [1, 1, 1, 1, 1, 1],
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn find_solution(
    context: &mut SearchContext,
    heuristic: &mut dyn Heuristic,
    exploration_strategy: &mut dyn ExplorationStrategy,
    goal_strategy: &dyn GoalStrategy,
    pruning_strategy: &mut dyn PruningStrategy,
    event_handler: &mut dyn EventHandler,
    options: &GbfsLazyOptions,
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
    let mut best_h_value = start_h_value;
    event_handler.on_new_best_h_value(best_h_value);

    if pruning_strategy.test_prune_initial_state(start_state, state_repository.packed(start_state))
    {
        result.status = SearchStatus::Failed;
        return Ok(result);
    }

    let mut nodes = SearchNodeTable::new(GbfsPayload {
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
        start_node.payload = GbfsPayload {
            g: start_g_value,
            h: start_h_value,
        };
    }

    let mut open: AlternatingOpenList<GbfsKey, State, 6> =
        AlternatingOpenList::new(options.openlist_weights);
    let mut step: u64 = 0;
    open.insert(STANDARD, (OrderedFloat(start_h_value), step), start_state);

    let mut stopwatch = StopWatch::new(options.max_time_in_ms);

    while let Some(state) = open.pop() {
        stopwatch.log_if_needed();
        if stopwatch.has_finished() {
            result.status = SearchStatus::OutOfTime;
            return Ok(result);
        }

        let status = nodes.get_or_create(state.index()).status;
        if status == SearchNodeStatus::Closed || status == SearchNodeStatus::DeadEnd {
            continue;
        }

        let state_h_value = if status == SearchNodeStatus::Goal {
            0.0
        } else {
            heuristic.evaluate(state_repository.packed(state))
        };
        {
            let node = nodes.get_or_create(state.index());
            node.payload.h = state_h_value;
            if state_h_value.is_infinite() {
                node.status = SearchNodeStatus::DeadEnd;
                continue;
            }
        }
        let node = nodes.get(state.index()).clone();

        if state_h_value < best_h_value {
            best_h_value = state_h_value;
            event_handler.on_new_best_h_value(best_h_value);
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

        let preferred_actions = heuristic.preferred_actions(state_repository.packed(state));

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

            let is_compatible = exploration_strategy.on_generate_state(
                state_repository.packed(state),
                &action,
                state_repository.packed(successor),
            );
            let is_preferred = preferred_actions
                .as_ref()
                .is_some_and(|preferred| preferred.contains(&action.index));

            let successor_node = nodes.get_or_create(successor.index());
            if successor_node.status == SearchNodeStatus::DeadEnd {
                continue;
            }

            if successor_g_value < successor_node.payload.g {
                successor_node.status = SearchNodeStatus::Open;
                successor_node.parent_state = state.index();
                successor_node.creating_action = action.index;
                successor_node.payload.g = successor_g_value;
                successor_node.payload.h = state_h_value;

                if is_new_successor
                    && goal_strategy.test_dynamic_goal(state_repository.packed(successor))
                {
                    nodes.get_or_create(successor.index()).status = SearchNodeStatus::Goal;
                }

                event_handler.on_generate_state_relaxed(state, &action, action_cost, successor);

                step += 1;
                let greedy_key: GbfsKey = (OrderedFloat(state_h_value), step);
                let exhaustive_key: GbfsKey = (OrderedFloat(0.0), step);
                if is_compatible {
                    if is_preferred {
                        open.insert(COMPATIBLE_GREEDY_PREFERRED, greedy_key, successor);
                        open.insert(COMPATIBLE_EXHAUSTIVE_PREFERRED, exhaustive_key, successor);
                    } else {
                        open.insert(COMPATIBLE_GREEDY, greedy_key, successor);
                        open.insert(COMPATIBLE_EXHAUSTIVE, exhaustive_key, successor);
                    }
                }
                if is_preferred {
                    open.insert(PREFERRED, greedy_key, successor);
                }
                open.insert(STANDARD, greedy_key, successor);
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
