//! Iterated width: breadth-first search under k-novelty pruning for
//! increasing arities, stopping at the first arity that solves.

use crate::error::SearchError;
use crate::search::algorithms::brfs::{self, BrfsOptions};
use crate::search::algorithms::SearchStatus;
use crate::search::novelty::{ArityKNoveltyPruning, ArityZeroNoveltyPruning, MAX_ARITY};
use crate::search::{EventHandler, GoalStrategy, Plan, PruningStrategy, SearchContext, State};
use tracing::info;

#[derive(Debug, Clone, Copy)]
pub struct IwOptions {
    pub start_state: Option<State>,
    pub max_arity: usize,
    pub max_num_states: u32,
    pub max_time_in_ms: u32,
}

impl Default for IwOptions {
    fn default() -> Self {
        Self {
            start_state: None,
            max_arity: MAX_ARITY,
            max_num_states: u32::MAX,
            max_time_in_ms: u32::MAX,
        }
    }
}

/// Outcome of an iterated-width run. The effective width is the arity of the
/// succeeding iteration.
#[derive(Debug)]
pub struct IwResult {
    pub status: SearchStatus,
    pub plan: Option<Plan>,
    pub goal_state: Option<State>,
    pub effective_width: Option<usize>,
}

pub fn find_solution(
    context: &mut SearchContext,
    goal_strategy: &dyn GoalStrategy,
    event_handler: &mut dyn EventHandler,
    options: &IwOptions,
) -> Result<IwResult, SearchError> {
    if options.max_arity > MAX_ARITY {
        return Err(SearchError::ArityOutOfRange {
            arity: options.max_arity,
            max: MAX_ARITY,
        });
    }

    let repository = context.repository().clone();
    let start_state = options
        .start_state
        .unwrap_or_else(|| context.state_repository_mut().get_or_create_initial_state().0);
    let num_atoms = repository.num_fluent_atoms() + repository.num_derived_atoms();

    let mut last_status = SearchStatus::Exhausted;
    for arity in 0..=options.max_arity {
        let mut pruning_strategy: Box<dyn PruningStrategy> = if arity == 0 {
            Box::new(ArityZeroNoveltyPruning::new(start_state))
        } else {
            Box::new(ArityKNoveltyPruning::new(arity, num_atoms)?)
        };

        info!(arity, "iterated width iteration");

        let brfs_options = BrfsOptions {
            start_state: Some(start_state),
            max_num_states: options.max_num_states,
            max_time_in_ms: options.max_time_in_ms,
        };
        let result = brfs::find_solution(
            context,
            goal_strategy,
            pruning_strategy.as_mut(),
            event_handler,
            &brfs_options,
        );

        match result.status {
            SearchStatus::Solved => {
                return Ok(IwResult {
                    status: SearchStatus::Solved,
                    plan: result.plan,
                    goal_state: result.goal_state,
                    effective_width: Some(arity),
                });
            }
            SearchStatus::OutOfTime | SearchStatus::OutOfStates | SearchStatus::Unsolvable => {
                return Ok(IwResult {
                    status: result.status,
                    plan: None,
                    goal_state: None,
                    effective_width: None,
                });
            }
            status => {
                // Exhausted or pruned away: try the next arity.
                last_status = status;
            }
        }
    }

    Ok(IwResult {
        status: last_status,
        plan: None,
        goal_state: None,
        effective_width: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{validate_plan, DefaultEventHandler, ProblemGoal, SearchMode};
    use crate::test_utils::*;

    fn run(problem: crate::formalism::Problem) -> (IwResult, SearchContext) {
        let mut context = SearchContext::new(problem, SearchMode::Grounded);
        let goal_strategy = ProblemGoal::new(context.repository().clone());
        let mut event_handler = DefaultEventHandler::new();
        let result = find_solution(
            &mut context,
            &goal_strategy,
            &mut event_handler,
            &IwOptions::default(),
        )
        .unwrap();
        (result, context)
    }

    #[test]
    fn chain_has_width_one() {
        let (result, mut context) = run(chain_problem(3));
        assert_eq!(result.status, SearchStatus::Solved);
        assert_eq!(result.effective_width, Some(1));
        let plan = result.plan.unwrap();
        assert_eq!(plan.len(), 3);
        assert!(validate_plan(&plan, context.state_repository_mut()));
    }

    #[test]
    fn gripper_has_width_two() {
        let (result, mut context) = run(gripper_problem(1));
        assert_eq!(result.status, SearchStatus::Solved);
        assert_eq!(result.effective_width, Some(2));
        let plan = result.plan.unwrap();
        assert_eq!(plan.len(), 3);
        assert!(validate_plan(&plan, context.state_repository_mut()));
    }

    #[test]
    fn oversized_arity_is_rejected() {
        let mut context = SearchContext::new(chain_problem(1), SearchMode::Lifted);
        let goal_strategy = ProblemGoal::new(context.repository().clone());
        let mut event_handler = DefaultEventHandler::new();
        let error = find_solution(
            &mut context,
            &goal_strategy,
            &mut event_handler,
            &IwOptions {
                max_arity: MAX_ARITY + 1,
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(error, SearchError::ArityOutOfRange { .. }));
    }
}
