use crate::formalism::{Problem, ProblemRepository};
use crate::search::applicable_action_generator::{
    ApplicableActionGenerator, DeleteRelaxedProblemExplorator, LiftedApplicableActionGenerator,
};
use crate::search::{LiftedAxiomEvaluator, StateRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Chooses the applicable-action generator and axiom evaluator variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchMode {
    /// Precompute the delete-relaxed reachable actions and answer queries
    /// through a match tree.
    Grounded,
    /// Instantiate schemas lazily against each queried state.
    Lifted,
}

/// Everything one search run operates on: the shared problem repository, the
/// generator variant and the state repository.
#[derive(Debug)]
pub struct SearchContext {
    repository: Arc<ProblemRepository>,
    applicable_action_generator: Box<dyn ApplicableActionGenerator>,
    state_repository: StateRepository,
}

impl SearchContext {
    pub fn new(problem: Problem, mode: SearchMode) -> Self {
        Self::with_repository(ProblemRepository::new(problem), mode)
    }

    pub fn with_repository(repository: Arc<ProblemRepository>, mode: SearchMode) -> Self {
        match mode {
            SearchMode::Lifted => {
                let generator = Box::new(LiftedApplicableActionGenerator::new(repository.clone()));
                let evaluator = Box::new(LiftedAxiomEvaluator::new(repository.clone()));
                Self {
                    repository: repository.clone(),
                    applicable_action_generator: generator,
                    state_repository: StateRepository::new(repository, evaluator),
                }
            }
            SearchMode::Grounded => {
                let explorator = DeleteRelaxedProblemExplorator::new(repository.clone());
                let generator = Box::new(explorator.create_grounded_applicable_action_generator());
                let evaluator = Box::new(explorator.create_grounded_axiom_evaluator());
                Self {
                    repository: repository.clone(),
                    applicable_action_generator: generator,
                    state_repository: StateRepository::new(repository, evaluator),
                }
            }
        }
    }

    #[inline(always)]
    pub fn repository(&self) -> &Arc<ProblemRepository> {
        &self.repository
    }

    #[inline(always)]
    pub fn state_repository(&self) -> &StateRepository {
        &self.state_repository
    }

    #[inline(always)]
    pub fn state_repository_mut(&mut self) -> &mut StateRepository {
        &mut self.state_repository
    }

    /// Split borrow for the algorithm loops, which interleave generator
    /// queries with successor creation.
    pub fn parts_mut(&mut self) -> (&mut dyn ApplicableActionGenerator, &mut StateRepository) {
        (
            self.applicable_action_generator.as_mut(),
            &mut self.state_repository,
        )
    }
}
