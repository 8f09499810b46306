use crate::search::applicable_action_generator::{
    instantiate_bindings, precompile_condition, ApplicableActionGenerator, SchemaConditionData,
    StateAtomTables,
};
use crate::formalism::{GroundAction, ProblemRepository};
use crate::search::PackedState;
use std::sync::Arc;

/// Instantiates action schemas against the queried state with an iterative
/// hash join over the positive precondition atoms, then filters by negative
/// preconditions and numeric conditions on the ground action.
#[derive(Debug)]
pub struct LiftedApplicableActionGenerator {
    repository: Arc<ProblemRepository>,
    schema_data: Vec<SchemaConditionData>,
}

impl LiftedApplicableActionGenerator {
    pub fn new(repository: Arc<ProblemRepository>) -> Self {
        let schema_data = repository
            .problem()
            .action_schemas
            .iter()
            .map(|schema| {
                precompile_condition(&repository, &schema.parameters, &schema.precondition)
            })
            .collect();
        Self {
            repository,
            schema_data,
        }
    }
}

impl ApplicableActionGenerator for LiftedApplicableActionGenerator {
    fn applicable_actions(&mut self, state: &PackedState) -> Vec<GroundAction> {
        let tables = StateAtomTables::new(
            &self.repository,
            state.fluent_atoms(),
            state.derived_atoms(),
        );

        let mut actions = Vec::new();
        for (schema_index, data) in self.schema_data.iter().enumerate() {
            for binding in instantiate_bindings(data, &tables) {
                // Statically unsatisfiable bindings never yield an action.
                let Some(action) = self.repository.ground_action(schema_index, binding) else {
                    continue;
                };
                // The join guarantees the positive atoms; this re-check adds
                // the negative and numeric conditions.
                if state.satisfies(&action.precondition) {
                    actions.push(action);
                }
            }
        }
        actions
    }
}
