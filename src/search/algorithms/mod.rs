//! The search algorithm loops. Each module exposes a `find_solution` entry
//! point over a [`crate::search::SearchContext`] plus the strategies and an
//! event handler; outcomes are reported as [`SearchStatus`] variants on the
//! result, never as errors.

pub mod astar_eager;
pub mod astar_lazy;
pub mod brfs;
pub mod gbfs_lazy;
pub mod iw;
pub mod siw;

use crate::common::{ContinuousCost, StateIndex, MAX_INDEX};
use crate::search::{Plan, SearchNodeTable, State};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Exit codes shared by every search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchStatus {
    InProgress,
    OutOfTime,
    OutOfStates,
    Failed,
    Exhausted,
    Solved,
    Unsolvable,
}

#[derive(Debug)]
pub struct SearchResult {
    pub status: SearchStatus,
    pub plan: Option<Plan>,
    pub goal_state: Option<State>,
}

impl SearchResult {
    pub fn new() -> Self {
        Self {
            status: SearchStatus::InProgress,
            plan: None,
            goal_state: None,
        }
    }
}

impl Default for SearchResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Open-list key of the best-first searches: smaller f wins, ties prefer
/// larger g, then earlier insertion. The step counter makes expansion order
/// reproducible for deterministic inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct BestFirstKey {
    pub f: OrderedFloat<f64>,
    pub g: Reverse<OrderedFloat<f64>>,
    pub step: u64,
}

impl BestFirstKey {
    pub fn new(f: ContinuousCost, g: ContinuousCost, step: u64) -> Self {
        Self {
            f: OrderedFloat(f),
            g: Reverse(OrderedFloat(g)),
            step,
        }
    }
}

/// Walk the parent pointers from the goal node back to the root and return
/// the recorded creating actions in execution order.
pub(crate) fn extract_plan<P: Clone>(
    nodes: &SearchNodeTable<P>,
    goal_state_index: StateIndex,
    cost: ContinuousCost,
) -> Plan {
    let mut actions = Vec::new();
    let mut current = goal_state_index;
    loop {
        let node = nodes.get(current);
        if node.parent_state == MAX_INDEX {
            break;
        }
        actions.push(node.creating_action);
        current = node.parent_state;
    }
    actions.reverse();
    Plan::new(actions, cost)
}
