use crate::common::{AtomIndex, StateIndex, MAX_INDEX};
use crate::formalism::{GroundConjunction, GroundGoal};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// The interning unit of the search: three sorted atom-index sets (the static
/// set is global and lives in the repository) plus the numeric variable
/// values. Equality and hashing are structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackedState {
    fluent_atoms: Vec<AtomIndex>,
    derived_atoms: Vec<AtomIndex>,
    numeric_values: Vec<OrderedFloat<f64>>,
}

impl PackedState {
    pub fn new(
        mut fluent_atoms: Vec<AtomIndex>,
        mut derived_atoms: Vec<AtomIndex>,
        numeric_values: Vec<OrderedFloat<f64>>,
    ) -> Self {
        fluent_atoms.sort_unstable();
        fluent_atoms.dedup();
        derived_atoms.sort_unstable();
        derived_atoms.dedup();
        Self {
            fluent_atoms,
            derived_atoms,
            numeric_values,
        }
    }

    #[inline(always)]
    pub fn fluent_atoms(&self) -> &[AtomIndex] {
        &self.fluent_atoms
    }

    #[inline(always)]
    pub fn derived_atoms(&self) -> &[AtomIndex] {
        &self.derived_atoms
    }

    #[inline(always)]
    pub fn numeric_values(&self) -> &[OrderedFloat<f64>] {
        &self.numeric_values
    }

    #[inline(always)]
    pub fn contains_fluent(&self, atom: AtomIndex) -> bool {
        self.fluent_atoms.binary_search(&atom).is_ok()
    }

    #[inline(always)]
    pub fn contains_derived(&self, atom: AtomIndex) -> bool {
        self.derived_atoms.binary_search(&atom).is_ok()
    }

    /// Whether the conjunction holds in this state. Static literals were
    /// resolved at grounding time and do not appear here.
    pub fn satisfies(&self, conjunction: &GroundConjunction) -> bool {
        conjunction
            .positive_fluent
            .iter()
            .all(|&atom| self.contains_fluent(atom))
            && conjunction
                .negative_fluent
                .iter()
                .all(|&atom| !self.contains_fluent(atom))
            && conjunction
                .positive_derived
                .iter()
                .all(|&atom| self.contains_derived(atom))
            && conjunction
                .negative_derived
                .iter()
                .all(|&atom| !self.contains_derived(atom))
            && conjunction
                .numeric_conditions
                .iter()
                .all(|condition| condition.holds(&self.numeric_values))
    }

    pub fn satisfies_goal(&self, goal: &GroundGoal) -> bool {
        self.count_unsatisfied_goal_literals(goal) == 0
    }

    /// Number of top-level goal literals that do not hold; drives the
    /// goal-counting strategy used by serialized search.
    pub fn count_unsatisfied_goal_literals(&self, goal: &GroundGoal) -> usize {
        let mut unsatisfied = 0;
        for &atom in &goal.positive_fluent {
            if !self.contains_fluent(atom) {
                unsatisfied += 1;
            }
        }
        for &atom in &goal.negative_fluent {
            if self.contains_fluent(atom) {
                unsatisfied += 1;
            }
        }
        for &atom in &goal.positive_derived {
            if !self.contains_derived(atom) {
                unsatisfied += 1;
            }
        }
        for &atom in &goal.negative_derived {
            if self.contains_derived(atom) {
                unsatisfied += 1;
            }
        }
        for condition in &goal.numeric {
            if !condition.holds(&self.numeric_values) {
                unsatisfied += 1;
            }
        }
        unsatisfied
    }
}

/// A cheap handle to an interned state. The owning
/// [`crate::search::StateRepository`] resolves it back to a [`PackedState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct State {
    index: StateIndex,
}

impl State {
    pub(crate) fn new(index: StateIndex) -> Self {
        Self { index }
    }

    #[inline(always)]
    pub fn index(&self) -> StateIndex {
        self.index
    }
}

/// Sentinel for "no state", e.g. the parent of a root search node.
pub const NO_STATE: State = State { index: MAX_INDEX };
