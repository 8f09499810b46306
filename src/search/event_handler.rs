//! Algorithm-agnostic search observers. Every algorithm reports expansion,
//! generation, pruning and layer events; handlers accumulate a [`Statistics`]
//! block and may log.

use crate::common::{ContinuousCost, DiscreteCost};
use crate::formalism::GroundAction;
use crate::search::{Plan, State};
use memory_stats::memory_stats;
use std::fmt::Debug;
use std::time::{Duration, Instant};
use tracing::debug;

/// Running counters of a search. Layer snapshots record the cumulative
/// expanded/generated counts at the end of each f- or g-layer.
#[derive(Debug, Default, Clone)]
pub struct Statistics {
    pub num_generated: u64,
    pub num_expanded: u64,
    pub num_pruned: u64,
    pub num_deadends: u64,
    pub num_expanded_until_layer: Vec<u64>,
    pub num_generated_until_layer: Vec<u64>,
    pub search_time: Duration,
    pub peak_memory_usage_mb: Option<usize>,
    start: Option<Instant>,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    fn start(&mut self) {
        self.start = Some(Instant::now());
    }

    fn finish_layer(&mut self) {
        self.num_expanded_until_layer.push(self.num_expanded);
        self.num_generated_until_layer.push(self.num_generated);
    }

    fn finish(&mut self) {
        if let Some(start) = self.start {
            self.search_time = start.elapsed();
        }
        let memory_usage = memory_stats().map(|usage| usage.physical_mem / 1024 / 1024);
        self.peak_memory_usage_mb = self.peak_memory_usage_mb.max(memory_usage);
    }
}

pub trait EventHandler: Debug {
    fn statistics(&self) -> &Statistics;
    fn statistics_mut(&mut self) -> &mut Statistics;

    fn on_start_search(&mut self, state: State);
    fn on_expand_state(&mut self, state: State);
    fn on_expand_goal_state(&mut self, state: State);
    fn on_generate_state(
        &mut self,
        state: State,
        action: &GroundAction,
        cost: ContinuousCost,
        successor: State,
    );
    /// A generated successor whose best-known g value improved.
    fn on_generate_state_relaxed(
        &mut self,
        state: State,
        action: &GroundAction,
        cost: ContinuousCost,
        successor: State,
    );
    fn on_generate_state_not_relaxed(
        &mut self,
        state: State,
        action: &GroundAction,
        cost: ContinuousCost,
        successor: State,
    );
    fn on_prune_state(&mut self, state: State);
    fn on_new_best_h_value(&mut self, h: ContinuousCost);
    fn on_finish_f_layer(&mut self, f: ContinuousCost);
    fn on_finish_g_layer(&mut self, g: DiscreteCost);
    fn on_solved(&mut self, plan: &Plan);
    fn on_unsolvable(&mut self);
    fn on_exhausted(&mut self);
    fn on_end_search(&mut self, num_states: u64, num_nodes: u64);
}

/// Quiet handler: maintains statistics, emits nothing.
#[derive(Debug, Default)]
pub struct DefaultEventHandler {
    statistics: Statistics,
}

impl DefaultEventHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventHandler for DefaultEventHandler {
    fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    fn statistics_mut(&mut self) -> &mut Statistics {
        &mut self.statistics
    }

    fn on_start_search(&mut self, _state: State) {
        self.statistics.start();
    }

    fn on_expand_state(&mut self, _state: State) {
        self.statistics.num_expanded += 1;
    }

    fn on_expand_goal_state(&mut self, _state: State) {}

    fn on_generate_state(
        &mut self,
        _state: State,
        _action: &GroundAction,
        _cost: ContinuousCost,
        _successor: State,
    ) {
        self.statistics.num_generated += 1;
    }

    fn on_generate_state_relaxed(
        &mut self,
        _state: State,
        _action: &GroundAction,
        _cost: ContinuousCost,
        _successor: State,
    ) {
    }

    fn on_generate_state_not_relaxed(
        &mut self,
        _state: State,
        _action: &GroundAction,
        _cost: ContinuousCost,
        _successor: State,
    ) {
    }

    fn on_prune_state(&mut self, _state: State) {
        self.statistics.num_pruned += 1;
    }

    fn on_new_best_h_value(&mut self, _h: ContinuousCost) {}

    fn on_finish_f_layer(&mut self, _f: ContinuousCost) {
        self.statistics.finish_layer();
    }

    fn on_finish_g_layer(&mut self, _g: DiscreteCost) {
        self.statistics.finish_layer();
    }

    fn on_solved(&mut self, _plan: &Plan) {}

    fn on_unsolvable(&mut self) {}

    fn on_exhausted(&mut self) {}

    fn on_end_search(&mut self, _num_states: u64, _num_nodes: u64) {
        self.statistics.finish();
    }
}

/// Verbose handler: statistics plus a `tracing` line per event class.
#[derive(Debug, Default)]
pub struct DebugEventHandler {
    statistics: Statistics,
}

impl DebugEventHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventHandler for DebugEventHandler {
    fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    fn statistics_mut(&mut self) -> &mut Statistics {
        &mut self.statistics
    }

    fn on_start_search(&mut self, state: State) {
        self.statistics.start();
        debug!(start_state = state.index(), "start search");
    }

    fn on_expand_state(&mut self, _state: State) {
        self.statistics.num_expanded += 1;
    }

    fn on_expand_goal_state(&mut self, state: State) {
        debug!(goal_state = state.index(), "expand goal state");
    }

    fn on_generate_state(
        &mut self,
        state: State,
        action: &GroundAction,
        cost: ContinuousCost,
        successor: State,
    ) {
        self.statistics.num_generated += 1;
        debug!(
            state = state.index(),
            action = action.index,
            cost,
            successor = successor.index(),
            "generate state"
        );
    }

    fn on_generate_state_relaxed(
        &mut self,
        _state: State,
        _action: &GroundAction,
        _cost: ContinuousCost,
        _successor: State,
    ) {
    }

    fn on_generate_state_not_relaxed(
        &mut self,
        _state: State,
        _action: &GroundAction,
        _cost: ContinuousCost,
        _successor: State,
    ) {
    }

    fn on_prune_state(&mut self, state: State) {
        self.statistics.num_pruned += 1;
        debug!(state = state.index(), "prune state");
    }

    fn on_new_best_h_value(&mut self, h: ContinuousCost) {
        debug!(best_h = h, "new best h value");
    }

    fn on_finish_f_layer(&mut self, f: ContinuousCost) {
        self.statistics.finish_layer();
        debug!(
            f,
            num_expanded = self.statistics.num_expanded,
            num_generated = self.statistics.num_generated,
            "finish f layer"
        );
    }

    fn on_finish_g_layer(&mut self, g: DiscreteCost) {
        self.statistics.finish_layer();
        debug!(
            g,
            num_expanded = self.statistics.num_expanded,
            num_generated = self.statistics.num_generated,
            "finish g layer"
        );
    }

    fn on_solved(&mut self, plan: &Plan) {
        debug!(plan_length = plan.len(), plan_cost = plan.cost(), "solved");
    }

    fn on_unsolvable(&mut self) {
        debug!("unsolvable");
    }

    fn on_exhausted(&mut self) {
        debug!("exhausted");
    }

    fn on_end_search(&mut self, num_states: u64, num_nodes: u64) {
        self.statistics.finish();
        debug!(
            num_states,
            num_nodes,
            num_expanded = self.statistics.num_expanded,
            num_generated = self.statistics.num_generated,
            search_time_ms = self.statistics.search_time.as_millis() as u64,
            "end search"
        );
    }
}
