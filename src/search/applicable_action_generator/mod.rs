//! Enumeration of ground actions applicable in a state. Two variants share
//! the same contract: the lifted generator instantiates schemas against the
//! state with an iterative hash join, the grounded generator precomputes the
//! delete-relaxed reachable actions once and answers queries through a match
//! tree.

mod database;
mod delete_relaxed;
mod grounded;
mod lifted;

pub(crate) use database::{
    instantiate_bindings, precompile_condition, SchemaConditionData, StateAtomTables,
};
pub use delete_relaxed::DeleteRelaxedProblemExplorator;
pub use grounded::{GroundedApplicableActionGenerator, MatchTree};
pub use lifted::LiftedApplicableActionGenerator;

use crate::formalism::GroundAction;
use crate::search::PackedState;
use std::fmt::Debug;

/// Contract shared by both generator variants: every action applicable in the
/// state, each at most once, in a deterministic order.
pub trait ApplicableActionGenerator: Debug + Send {
    fn applicable_actions(&mut self, state: &PackedState) -> Vec<GroundAction>;
}
