use crate::common::{AtomIndex, ContinuousCost, StateIndex};
use crate::formalism::{GroundAction, ProblemRepository};
use crate::search::{AxiomEvaluator, PackedState, State};
use ordered_float::OrderedFloat;
use segvec::{Exponential, SegVec};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Segments start at 1024 entries and double, so growth never moves an
/// existing state.
type StateArena = SegVec<PackedState, Exponential<1024>>;

/// Produces, interns and owns all states of a search run. States are closed
/// under axioms before they become visible to any caller, and every distinct
/// packed state is stored exactly once ([`State`] handles are views).
#[derive(Debug)]
pub struct StateRepository {
    repository: Arc<ProblemRepository>,
    axiom_evaluator: Box<dyn AxiomEvaluator>,
    states: StateArena,
    index_of: HashMap<PackedState, StateIndex>,
    reached_fluent_atoms: Vec<bool>,
    reached_derived_atoms: Vec<bool>,
}

impl StateRepository {
    pub fn new(
        repository: Arc<ProblemRepository>,
        axiom_evaluator: Box<dyn AxiomEvaluator>,
    ) -> Self {
        Self {
            repository,
            axiom_evaluator,
            states: SegVec::new(),
            index_of: HashMap::new(),
            reached_fluent_atoms: Vec::new(),
            reached_derived_atoms: Vec::new(),
        }
    }

    #[inline(always)]
    pub fn problem_repository(&self) -> &Arc<ProblemRepository> {
        &self.repository
    }

    /// Apply the initial literals and numeric assignments, close under
    /// axioms, intern. The second component is the metric value of the
    /// initial state (zero without a metric).
    pub fn get_or_create_initial_state(&mut self) -> (State, ContinuousCost) {
        let fluent_atoms = self.repository.initial_fluent_atom_indices();
        let numeric_values = self.repository.initial_numeric_values();
        let derived_atoms = self.axiom_evaluator.evaluate(&fluent_atoms, &numeric_values);
        let packed = PackedState::new(fluent_atoms, derived_atoms, numeric_values);
        let metric_value = self
            .repository
            .evaluate_metric(packed.numeric_values())
            .unwrap_or(0.0);
        let (state, _) = self.intern(packed);
        (state, metric_value)
    }

    /// Apply the action's effects to a copy of the state, close under axioms,
    /// intern. Conditional effects are evaluated against the predecessor; an
    /// atom that is both added and deleted ends up true. The second component
    /// is the successor's metric value, or `parent_metric + action.cost`
    /// without a metric; it is NaN when metric evaluation produced NaN.
    pub fn get_or_create_successor_state(
        &mut self,
        state: State,
        action: &GroundAction,
        parent_metric: ContinuousCost,
    ) -> (State, ContinuousCost) {
        let parent = self.packed(state).clone();

        let mut adds: Vec<AtomIndex> = action.add_effects.clone();
        let mut deletes: Vec<AtomIndex> = action.delete_effects.clone();
        for effect in &action.conditional_effects {
            if parent.satisfies(&effect.condition) {
                adds.extend_from_slice(&effect.add_effects);
                deletes.extend_from_slice(&effect.delete_effects);
            }
        }

        let mut fluent_atoms: BTreeSet<AtomIndex> =
            parent.fluent_atoms().iter().copied().collect();
        for atom in &deletes {
            fluent_atoms.remove(atom);
        }
        for atom in &adds {
            fluent_atoms.insert(*atom);
        }
        let fluent_atoms: Vec<AtomIndex> = fluent_atoms.into_iter().collect();

        let mut numeric_values: Vec<OrderedFloat<f64>> = parent.numeric_values().to_vec();
        for effect in &action.numeric_effects {
            effect.apply(&mut numeric_values);
        }

        let derived_atoms = self.axiom_evaluator.evaluate(&fluent_atoms, &numeric_values);
        let packed = PackedState::new(fluent_atoms, derived_atoms, numeric_values);
        let metric_value = self
            .repository
            .evaluate_metric(packed.numeric_values())
            .unwrap_or(parent_metric + action.cost);
        let (successor, _) = self.intern(packed);
        (successor, metric_value)
    }

    /// Look up an already interned state.
    pub fn get_state(&self, packed: &PackedState) -> Option<State> {
        self.index_of.get(packed).copied().map(State::new)
    }

    #[inline(always)]
    pub fn packed(&self, state: State) -> &PackedState {
        self.states
            .get(state.index() as usize)
            .expect("Invalid state index")
    }

    #[inline(always)]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn num_reached_fluent_ground_atoms(&self) -> usize {
        self.reached_fluent_atoms.iter().filter(|&&bit| bit).count()
    }

    pub fn num_reached_derived_ground_atoms(&self) -> usize {
        self.reached_derived_atoms
            .iter()
            .filter(|&&bit| bit)
            .count()
    }

    pub fn reached_fluent_ground_atoms(&self) -> &[bool] {
        &self.reached_fluent_atoms
    }

    pub fn reached_derived_ground_atoms(&self) -> &[bool] {
        &self.reached_derived_atoms
    }

    fn intern(&mut self, packed: PackedState) -> (State, bool) {
        if let Some(&index) = self.index_of.get(&packed) {
            return (State::new(index), false);
        }
        for &atom in packed.fluent_atoms() {
            mark(&mut self.reached_fluent_atoms, atom);
        }
        for &atom in packed.derived_atoms() {
            mark(&mut self.reached_derived_atoms, atom);
        }
        let index = self.states.len() as StateIndex;
        self.index_of.insert(packed.clone(), index);
        self.states.push(packed);
        (State::new(index), true)
    }
}

fn mark(bits: &mut Vec<bool>, atom: AtomIndex) {
    let position = atom as usize;
    if position >= bits.len() {
        bits.resize(position + 1, false);
    }
    bits[position] = true;
}

#[cfg(test)]
mod tests {
    use crate::search::{SearchContext, SearchMode};
    use crate::test_utils::*;

    #[test]
    fn initial_state_is_closed_under_axioms() {
        for mode in [SearchMode::Lifted, SearchMode::Grounded] {
            let mut context = SearchContext::new(tower_problem(), mode);
            let (initial, _) = context.state_repository_mut().get_or_create_initial_state();
            let packed = context.state_repository().packed(initial);
            // on(a,b), on(b,c) entail above(a,b), above(b,c), above(a,c).
            assert_eq!(packed.fluent_atoms().len(), 2);
            assert_eq!(packed.derived_atoms().len(), 3);
        }
    }

    #[test]
    fn successor_states_are_reclosed() {
        let mut context = SearchContext::new(tower_problem(), SearchMode::Lifted);
        let (initial, metric) = context.state_repository_mut().get_or_create_initial_state();
        let (generator, state_repository) = context.parts_mut();
        let actions = generator.applicable_actions(state_repository.packed(initial));
        assert_eq!(actions.len(), 1);
        let (successor, _) =
            state_repository.get_or_create_successor_state(initial, &actions[0], metric);
        let packed = state_repository.packed(successor);
        // Only on(b,c) remains, so only above(b,c) is derivable.
        assert_eq!(packed.fluent_atoms().len(), 1);
        assert_eq!(packed.derived_atoms().len(), 1);
    }

    #[test]
    fn states_are_interned() {
        let mut context = SearchContext::new(gripper_problem(1), SearchMode::Lifted);
        let (initial, metric) = context.state_repository_mut().get_or_create_initial_state();
        let (generator, state_repository) = context.parts_mut();
        let actions = generator.applicable_actions(state_repository.packed(initial));
        // Some action leads back to the initial state (a self-move).
        let mut reached_initial_again = false;
        for action in &actions {
            let (successor, _) =
                state_repository.get_or_create_successor_state(initial, action, metric);
            if successor == initial {
                reached_initial_again = true;
            }
        }
        assert!(reached_initial_again);
        let packed = state_repository.packed(initial).clone();
        assert_eq!(state_repository.get_state(&packed), Some(initial));
    }
}
