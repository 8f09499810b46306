use crate::common::TypeIndex;
use serde::{Deserialize, Serialize};

/// Whether a predicate's extension can change during search, is derived by
/// axioms, or is fixed from the initial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredicateKind {
    Fluent,
    Derived,
    Static,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub name: String,
    pub parameter_types: Vec<TypeIndex>,
    pub kind: PredicateKind,
}

impl Predicate {
    pub fn new(name: impl Into<String>, parameter_types: Vec<TypeIndex>, kind: PredicateKind) -> Self {
        Self {
            name: name.into(),
            parameter_types,
            kind,
        }
    }

    #[inline(always)]
    pub fn arity(&self) -> usize {
        self.parameter_types.len()
    }
}
