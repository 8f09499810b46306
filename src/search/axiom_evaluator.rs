//! Closure of a state under derived predicates. The grounded variant walks a
//! fixed set of pre-grounded axioms, the lifted variant instantiates axiom
//! schemas against the growing closure; both run to a fixed point, which
//! terminates because axioms only ever add derived atoms.

use crate::common::AtomIndex;
use crate::search::applicable_action_generator::{
    instantiate_bindings, precompile_condition, SchemaConditionData, StateAtomTables,
};
use crate::formalism::{GroundAxiom, GroundConjunction, ProblemRepository};
use ordered_float::OrderedFloat;
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::sync::Arc;

pub trait AxiomEvaluator: Debug + Send {
    /// The set of derived atoms entailed from the given fluent atoms and
    /// numeric values, sorted.
    fn evaluate(
        &self,
        fluent_atoms: &[AtomIndex],
        numeric_values: &[OrderedFloat<f64>],
    ) -> Vec<AtomIndex>;
}

fn body_holds(
    body: &GroundConjunction,
    fluent_atoms: &[AtomIndex],
    derived_atoms: &BTreeSet<AtomIndex>,
    numeric_values: &[OrderedFloat<f64>],
) -> bool {
    body.positive_fluent
        .iter()
        .all(|atom| fluent_atoms.binary_search(atom).is_ok())
        && body
            .negative_fluent
            .iter()
            .all(|atom| fluent_atoms.binary_search(atom).is_err())
        && body
            .positive_derived
            .iter()
            .all(|atom| derived_atoms.contains(atom))
        && body
            .negative_derived
            .iter()
            .all(|atom| !derived_atoms.contains(atom))
        && body
            .numeric_conditions
            .iter()
            .all(|condition| condition.holds(numeric_values))
}

/// Fixed-point evaluation over a pre-grounded axiom set.
#[derive(Debug)]
pub struct GroundedAxiomEvaluator {
    axioms: Vec<GroundAxiom>,
}

impl GroundedAxiomEvaluator {
    pub fn new(axioms: Vec<GroundAxiom>) -> Self {
        Self { axioms }
    }

    pub fn num_axioms(&self) -> usize {
        self.axioms.len()
    }
}

impl AxiomEvaluator for GroundedAxiomEvaluator {
    fn evaluate(
        &self,
        fluent_atoms: &[AtomIndex],
        numeric_values: &[OrderedFloat<f64>],
    ) -> Vec<AtomIndex> {
        let mut derived: BTreeSet<AtomIndex> = BTreeSet::new();
        loop {
            let mut changed = false;
            for axiom in &self.axioms {
                if derived.contains(&axiom.head) {
                    continue;
                }
                if body_holds(&axiom.body, fluent_atoms, &derived, numeric_values) {
                    derived.insert(axiom.head);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        derived.into_iter().collect()
    }
}

/// Instantiates axiom schemas against the current closure on every round.
#[derive(Debug)]
pub struct LiftedAxiomEvaluator {
    repository: Arc<ProblemRepository>,
    schema_data: Vec<SchemaConditionData>,
}

impl LiftedAxiomEvaluator {
    pub fn new(repository: Arc<ProblemRepository>) -> Self {
        let schema_data = repository
            .problem()
            .axiom_schemas
            .iter()
            .map(|schema| precompile_condition(&repository, &schema.parameters, &schema.body))
            .collect();
        Self {
            repository,
            schema_data,
        }
    }
}

impl AxiomEvaluator for LiftedAxiomEvaluator {
    fn evaluate(
        &self,
        fluent_atoms: &[AtomIndex],
        numeric_values: &[OrderedFloat<f64>],
    ) -> Vec<AtomIndex> {
        let mut derived: BTreeSet<AtomIndex> = BTreeSet::new();
        loop {
            let derived_list: Vec<AtomIndex> = derived.iter().copied().collect();
            let tables = StateAtomTables::new(&self.repository, fluent_atoms, &derived_list);

            let mut changed = false;
            for (schema_index, data) in self.schema_data.iter().enumerate() {
                for binding in instantiate_bindings(data, &tables) {
                    let Some(axiom) = self.repository.ground_axiom(schema_index, binding) else {
                        continue;
                    };
                    if derived.contains(&axiom.head) {
                        continue;
                    }
                    if body_holds(&axiom.body, fluent_atoms, &derived, numeric_values) {
                        derived.insert(axiom.head);
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
        derived.into_iter().collect()
    }
}
