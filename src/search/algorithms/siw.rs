//! Serialized iterated width: repeatedly run IW towards a goal-counting
//! subgoal (any state satisfying strictly more top-level goal literals) and
//! concatenate the subplans.

use crate::error::SearchError;
use crate::search::algorithms::iw::{self, IwOptions};
use crate::search::algorithms::SearchStatus;
use crate::search::novelty::MAX_ARITY;
use crate::search::{EventHandler, GoalCountingGoal, Plan, SearchContext, State};
use tracing::info;

#[derive(Debug, Clone, Copy)]
pub struct SiwOptions {
    pub max_arity: usize,
    pub max_num_states: u32,
    pub max_time_in_ms: u32,
}

impl Default for SiwOptions {
    fn default() -> Self {
        Self {
            max_arity: MAX_ARITY,
            max_num_states: u32::MAX,
            max_time_in_ms: u32::MAX,
        }
    }
}

#[derive(Debug)]
pub struct SiwResult {
    pub status: SearchStatus,
    pub plan: Option<Plan>,
    pub goal_state: Option<State>,
    pub num_subproblems: usize,
    pub maximum_effective_width: Option<usize>,
    pub average_effective_width: Option<f64>,
}

pub fn find_solution(
    context: &mut SearchContext,
    event_handler: &mut dyn EventHandler,
    options: &SiwOptions,
) -> Result<SiwResult, SearchError> {
    let repository = context.repository().clone();

    let mut widths: Vec<usize> = Vec::new();
    let result_with_status = |status: SearchStatus, widths: &[usize]| SiwResult {
        status,
        plan: None,
        goal_state: None,
        num_subproblems: widths.len(),
        maximum_effective_width: widths.iter().copied().max(),
        average_effective_width: average(widths),
    };

    if !repository.static_goal_holds() {
        event_handler.on_unsolvable();
        return Ok(result_with_status(SearchStatus::Unsolvable, &widths));
    }

    let (mut current_state, _) = context.state_repository_mut().get_or_create_initial_state();
    let mut actions = Vec::new();
    let mut cost = 0.0;

    while !context
        .state_repository()
        .packed(current_state)
        .satisfies_goal(repository.goal())
    {
        let goal_strategy = GoalCountingGoal::new(
            repository.clone(),
            context.state_repository().packed(current_state),
        );

        let iw_options = IwOptions {
            start_state: Some(current_state),
            max_arity: options.max_arity,
            max_num_states: options.max_num_states,
            max_time_in_ms: options.max_time_in_ms,
        };
        let subproblem = iw::find_solution(context, &goal_strategy, event_handler, &iw_options)?;

        if subproblem.status != SearchStatus::Solved {
            return Ok(result_with_status(subproblem.status, &widths));
        }

        let width = subproblem
            .effective_width
            .expect("a solved iteration reports its width");
        widths.push(width);
        info!(
            subproblem = widths.len(),
            effective_width = width,
            "serialized subproblem solved"
        );

        let subplan = subproblem.plan.expect("a solved iteration carries a plan");
        actions.extend_from_slice(subplan.actions());
        cost += subplan.cost();
        current_state = subproblem
            .goal_state
            .expect("a solved iteration carries its goal state");
    }

    let plan = Plan::new(actions, cost);
    event_handler.on_solved(&plan);
    Ok(SiwResult {
        status: SearchStatus::Solved,
        plan: Some(plan),
        goal_state: Some(current_state),
        num_subproblems: widths.len(),
        maximum_effective_width: widths.iter().copied().max(),
        average_effective_width: average(&widths),
    })
}

fn average(widths: &[usize]) -> Option<f64> {
    if widths.is_empty() {
        None
    } else {
        Some(widths.iter().sum::<usize>() as f64 / widths.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{validate_plan, DefaultEventHandler, SearchMode};
    use crate::test_utils::*;

    #[test]
    fn gripper_serializes_into_two_subproblems() {
        let mut context = SearchContext::new(gripper_problem(2), SearchMode::Grounded);
        let mut event_handler = DefaultEventHandler::new();
        let result =
            find_solution(&mut context, &mut event_handler, &SiwOptions::default()).unwrap();
        assert_eq!(result.status, SearchStatus::Solved);
        assert_eq!(result.num_subproblems, 2);
        assert_eq!(result.maximum_effective_width, Some(2));
        let plan = result.plan.unwrap();
        assert_eq!(plan.len(), 7);
        assert!(validate_plan(&plan, context.state_repository_mut()));
    }

    #[test]
    fn solved_initial_state_needs_no_subproblems() {
        let mut context = SearchContext::new(tower_problem(), SearchMode::Lifted);
        let mut event_handler = DefaultEventHandler::new();
        let result =
            find_solution(&mut context, &mut event_handler, &SiwOptions::default()).unwrap();
        assert_eq!(result.status, SearchStatus::Solved);
        assert_eq!(result.num_subproblems, 0);
        assert!(result.plan.unwrap().is_empty());
    }
}
