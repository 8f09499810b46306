//! The search substrate: state repository, search-node table, open lists,
//! strategies, event handlers, the novelty machinery and the algorithm
//! loops.

pub mod algorithms;
pub mod applicable_action_generator;
mod axiom_evaluator;
mod event_handler;
mod heuristics;
pub mod novelty;
mod open_list;
mod plan;
mod search_context;
mod search_node;
mod state;
mod state_repository;
mod strategies;

pub use algorithms::{SearchResult, SearchStatus};
pub use applicable_action_generator::ApplicableActionGenerator;
pub use axiom_evaluator::{AxiomEvaluator, GroundedAxiomEvaluator, LiftedAxiomEvaluator};
pub use event_handler::{DebugEventHandler, DefaultEventHandler, EventHandler, Statistics};
pub use heuristics::{BlindHeuristic, GoalCountHeuristic, Heuristic, HeuristicValue};
pub use open_list::{AlternatingOpenList, PriorityQueue};
pub use plan::{validate_plan, Plan};
pub use search_context::{SearchContext, SearchMode};
pub use search_node::{SearchNode, SearchNodeStatus, SearchNodeTable};
pub use state::{PackedState, State, NO_STATE};
pub use state_repository::StateRepository;
pub use strategies::{
    DuplicateStatePruning, ExplorationStrategy, FullExploration, GoalCountingGoal, GoalStrategy,
    NoPruning, ProblemGoal, PruningStrategy,
};
