use serde::{Deserialize, Serialize};

/// A literal: a value together with its polarity. Used for schema atoms in
/// preconditions and axiom bodies, where positive and negative occurrences
/// flow through the same lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Negatable<T> {
    Positive(T),
    Negative(T),
}

impl<T> Negatable<T> {
    pub fn new(negated: bool, value: T) -> Self {
        if negated {
            Self::Negative(value)
        } else {
            Self::Positive(value)
        }
    }

    #[inline(always)]
    pub fn is_negated(&self) -> bool {
        matches!(self, Self::Negative(_))
    }

    #[inline(always)]
    pub fn underlying(&self) -> &T {
        match self {
            Self::Positive(value) | Self::Negative(value) => value,
        }
    }

    /// Map the wrapped value, keeping the polarity.
    pub fn map<U>(&self, f: impl FnOnce(&T) -> U) -> Negatable<U> {
        match self {
            Self::Positive(value) => Negatable::Positive(f(value)),
            Self::Negative(value) => Negatable::Negative(f(value)),
        }
    }
}

impl<T> From<T> for Negatable<T> {
    fn from(value: T) -> Self {
        Self::Positive(value)
    }
}
