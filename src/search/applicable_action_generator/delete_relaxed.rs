use crate::common::AtomIndex;
use crate::search::applicable_action_generator::{
    instantiate_bindings, precompile_condition, GroundedApplicableActionGenerator, MatchTree,
    SchemaConditionData, StateAtomTables,
};
use crate::formalism::{GroundAction, GroundAxiom, ProblemRepository};
use crate::search::GroundedAxiomEvaluator;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::debug;

/// One-time precomputation backing the grounded search path. Iterates the
/// lifted instantiation on the delete-free twin of the problem (negative and
/// numeric conditions dropped, delete effects ignored) until no new atoms,
/// actions or axioms appear. The surviving ground actions keep their full
/// unrelaxed preconditions, so the match tree built from them answers exact
/// applicability queries.
#[derive(Debug)]
pub struct DeleteRelaxedProblemExplorator {
    repository: Arc<ProblemRepository>,
    reachable_fluent_atoms: Vec<AtomIndex>,
    reachable_derived_atoms: Vec<AtomIndex>,
    ground_actions: Vec<GroundAction>,
    ground_axioms: Vec<GroundAxiom>,
}

impl DeleteRelaxedProblemExplorator {
    pub fn new(repository: Arc<ProblemRepository>) -> Self {
        let problem = repository.problem();
        let action_data: Vec<SchemaConditionData> = problem
            .action_schemas
            .iter()
            .map(|schema| {
                precompile_condition(&repository, &schema.parameters, &schema.precondition)
            })
            .collect();
        let axiom_data: Vec<SchemaConditionData> = problem
            .axiom_schemas
            .iter()
            .map(|schema| precompile_condition(&repository, &schema.parameters, &schema.body))
            .collect();

        let mut fluent_atoms: BTreeSet<AtomIndex> =
            repository.initial_fluent_atom_indices().into_iter().collect();
        let mut derived_atoms: BTreeSet<AtomIndex> = BTreeSet::new();

        let mut ground_actions: Vec<GroundAction> = Vec::new();
        let mut seen_actions: HashSet<u32> = HashSet::new();
        let mut ground_axioms: Vec<GroundAxiom> = Vec::new();
        let mut seen_axioms: HashSet<u32> = HashSet::new();

        loop {
            let fluent_list: Vec<AtomIndex> = fluent_atoms.iter().copied().collect();
            let derived_list: Vec<AtomIndex> = derived_atoms.iter().copied().collect();
            let tables = StateAtomTables::new(&repository, &fluent_list, &derived_list);

            let mut changed = false;

            for (schema_index, data) in action_data.iter().enumerate() {
                for binding in instantiate_bindings(data, &tables) {
                    let Some(action) = repository.ground_action(schema_index, binding) else {
                        continue;
                    };
                    if seen_actions.insert(action.index) {
                        for &atom in &action.add_effects {
                            changed |= fluent_atoms.insert(atom);
                        }
                        for effect in &action.conditional_effects {
                            for &atom in &effect.add_effects {
                                changed |= fluent_atoms.insert(atom);
                            }
                        }
                        ground_actions.push(action);
                        changed = true;
                    }
                }
            }

            for (schema_index, data) in axiom_data.iter().enumerate() {
                for binding in instantiate_bindings(data, &tables) {
                    let Some(axiom) = repository.ground_axiom(schema_index, binding) else {
                        continue;
                    };
                    if seen_axioms.insert(axiom.index) {
                        changed |= derived_atoms.insert(axiom.head);
                        ground_axioms.push(axiom);
                        changed = true;
                    }
                }
            }

            if !changed {
                break;
            }
        }

        debug!(
            num_reachable_fluent_atoms = fluent_atoms.len(),
            num_reachable_derived_atoms = derived_atoms.len(),
            num_ground_actions = ground_actions.len(),
            num_ground_axioms = ground_axioms.len(),
            "delete-relaxed exploration finished"
        );

        Self {
            repository,
            reachable_fluent_atoms: fluent_atoms.into_iter().collect(),
            reachable_derived_atoms: derived_atoms.into_iter().collect(),
            ground_actions,
            ground_axioms,
        }
    }

    #[inline(always)]
    pub fn repository(&self) -> &Arc<ProblemRepository> {
        &self.repository
    }

    /// Fluent atoms reachable in the delete relaxation, sorted.
    pub fn reachable_fluent_atoms(&self) -> &[AtomIndex] {
        &self.reachable_fluent_atoms
    }

    pub fn reachable_derived_atoms(&self) -> &[AtomIndex] {
        &self.reachable_derived_atoms
    }

    pub fn ground_actions(&self) -> &[GroundAction] {
        &self.ground_actions
    }

    pub fn ground_axioms(&self) -> &[GroundAxiom] {
        &self.ground_axioms
    }

    pub fn create_grounded_applicable_action_generator(
        &self,
    ) -> GroundedApplicableActionGenerator {
        GroundedApplicableActionGenerator::new(MatchTree::new(
            &self.repository,
            self.ground_actions.clone(),
        ))
    }

    pub fn create_grounded_axiom_evaluator(&self) -> GroundedAxiomEvaluator {
        GroundedAxiomEvaluator::new(self.ground_axioms.clone())
    }
}
