use crate::common::{AtomIndex, AxiomIndex};
use crate::formalism::{AtomSchema, GroundConjunction, Negatable, ObjectTuple, SchemaParameter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A derivation rule: the head is an atom of a derived predicate, the body a
/// conjunction over fluent, derived and static atoms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxiomSchema {
    pub parameters: Vec<SchemaParameter>,
    pub head: AtomSchema,
    pub body: Vec<Negatable<AtomSchema>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroundAxiomData {
    pub index: AxiomIndex,
    pub schema_index: usize,
    pub binding: ObjectTuple,
    /// Derived atom produced when the body holds.
    pub head: AtomIndex,
    pub body: GroundConjunction,
}

pub type GroundAxiom = Arc<GroundAxiomData>;
