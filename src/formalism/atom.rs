use crate::common::{AtomIndex, ObjectIndex, PredicateIndex};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Most atoms and bindings have few arguments; tuples up to this length are
/// stored inline.
pub const TYPICAL_NUM_ARGUMENTS: usize = 5;

/// A tuple of object indices, e.g. the arguments of a ground atom or the
/// binding of an action schema.
pub type ObjectTuple = SmallVec<[ObjectIndex; TYPICAL_NUM_ARGUMENTS]>;

/// A fully instantiated predicate application. The kind (fluent, derived,
/// static) is a property of the predicate and determines which registry the
/// atom is interned in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroundAtom {
    pub predicate: PredicateIndex,
    pub arguments: ObjectTuple,
}

impl GroundAtom {
    pub fn new(predicate: PredicateIndex, arguments: ObjectTuple) -> Self {
        Self {
            predicate,
            arguments,
        }
    }
}

/// Dense interning registry for ground atoms of a single kind. Indices are
/// assigned in first-seen order and never change.
#[derive(Debug, Default)]
pub struct AtomRegistry {
    atoms: Vec<GroundAtom>,
    index_of: HashMap<GroundAtom, AtomIndex>,
}

impl AtomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, atom: GroundAtom) -> AtomIndex {
        if let Some(&index) = self.index_of.get(&atom) {
            return index;
        }
        let index = self.atoms.len() as AtomIndex;
        self.index_of.insert(atom.clone(), index);
        self.atoms.push(atom);
        index
    }

    pub fn position(&self, atom: &GroundAtom) -> Option<AtomIndex> {
        self.index_of.get(atom).copied()
    }

    pub fn get(&self, index: AtomIndex) -> &GroundAtom {
        &self.atoms[index as usize]
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GroundAtom> {
        self.atoms.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn interning_is_idempotent() {
        let mut registry = AtomRegistry::new();
        let a = GroundAtom::new(0, smallvec![1, 2]);
        let b = GroundAtom::new(0, smallvec![2, 1]);
        assert_eq!(registry.intern(a.clone()), 0);
        assert_eq!(registry.intern(b.clone()), 1);
        assert_eq!(registry.intern(a.clone()), 0);
        assert_eq!(registry.position(&b), Some(1));
        assert_eq!(registry.get(0), &a);
        assert_eq!(registry.len(), 2);
    }
}
