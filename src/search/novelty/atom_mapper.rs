use crate::common::AtomIndex;
use crate::search::PackedState;

/// Marker for an atom index that has not been remapped yet.
pub const UNDEFINED_REMAP: usize = usize::MAX;

/// Assigns a dense id `0,1,...` to each fluent or derived atom index the
/// first time it is observed, so that both universes share one indexing
/// scheme for the novelty tests. Keeps the inverse mapping and a tag telling
/// which universe each dense id came from.
#[derive(Debug, Default)]
pub struct FluentAndDerivedMapper {
    fluent_remap: Vec<usize>,
    derived_remap: Vec<usize>,
    is_remapped_fluent: Vec<bool>,
    inverse_remap: Vec<usize>,
    num_atoms: usize,
}

impl FluentAndDerivedMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of dense ids handed out so far.
    #[inline(always)]
    pub fn num_atoms(&self) -> usize {
        self.num_atoms
    }

    fn remap_fluent(&mut self, atom: AtomIndex) -> usize {
        let position = atom as usize;
        if position >= self.fluent_remap.len() {
            self.fluent_remap.resize(position + 1, UNDEFINED_REMAP);
        }
        if self.fluent_remap[position] == UNDEFINED_REMAP {
            let dense = self.num_atoms;
            self.num_atoms += 1;
            self.fluent_remap[position] = dense;
            self.is_remapped_fluent.resize(self.num_atoms, false);
            self.is_remapped_fluent[dense] = true;
            self.inverse_remap.resize(self.num_atoms, UNDEFINED_REMAP);
            self.inverse_remap[dense] = position;
        }
        self.fluent_remap[position]
    }

    fn remap_derived(&mut self, atom: AtomIndex) -> usize {
        let position = atom as usize;
        if position >= self.derived_remap.len() {
            self.derived_remap.resize(position + 1, UNDEFINED_REMAP);
        }
        if self.derived_remap[position] == UNDEFINED_REMAP {
            let dense = self.num_atoms;
            self.num_atoms += 1;
            self.derived_remap[position] = dense;
            self.is_remapped_fluent.resize(self.num_atoms, false);
            self.inverse_remap.resize(self.num_atoms, UNDEFINED_REMAP);
            self.inverse_remap[dense] = position;
        }
        self.derived_remap[position]
    }

    /// Remap all atoms of the state into one combined, sorted vector of
    /// dense ids.
    pub fn remap_and_combine_and_sort(&mut self, state: &PackedState, out_atoms: &mut Vec<usize>) {
        out_atoms.clear();
        for &atom in state.fluent_atoms() {
            out_atoms.push(self.remap_fluent(atom));
        }
        for &atom in state.derived_atoms() {
            out_atoms.push(self.remap_derived(atom));
        }
        out_atoms.sort_unstable();
        debug_assert_eq!(
            out_atoms.len(),
            state.fluent_atoms().len() + state.derived_atoms().len()
        );
    }

    /// For a transition, split the successor's atoms into `(previously true,
    /// newly added)`, both sorted.
    pub fn remap_and_combine_and_sort_pair(
        &mut self,
        state: &PackedState,
        successor: &PackedState,
        out_atoms: &mut Vec<usize>,
        out_add_atoms: &mut Vec<usize>,
    ) {
        out_atoms.clear();
        out_add_atoms.clear();
        for &atom in successor.fluent_atoms() {
            let dense = self.remap_fluent(atom);
            if state.contains_fluent(atom) {
                out_atoms.push(dense);
            } else {
                out_add_atoms.push(dense);
            }
        }
        for &atom in successor.derived_atoms() {
            let dense = self.remap_derived(atom);
            if state.contains_derived(atom) {
                out_atoms.push(dense);
            } else {
                out_add_atoms.push(dense);
            }
        }
        out_atoms.sort_unstable();
        out_add_atoms.sort_unstable();
    }

    /// Dense id of a fluent atom, if it has been observed.
    pub fn find_fluent(&self, atom: AtomIndex) -> Option<usize> {
        match self.fluent_remap.get(atom as usize) {
            Some(&dense) if dense != UNDEFINED_REMAP => Some(dense),
            _ => None,
        }
    }

    /// Dense id of a derived atom, if it has been observed.
    pub fn find_derived(&self, atom: AtomIndex) -> Option<usize> {
        match self.derived_remap.get(atom as usize) {
            Some(&dense) if dense != UNDEFINED_REMAP => Some(dense),
            _ => None,
        }
    }

    /// Translate dense ids back into per-universe atom indices. Used by the
    /// tuple-graph reporting only.
    pub fn inverse_remap_and_separate(
        &self,
        combined_atoms: &[usize],
        out_fluent_atoms: &mut Vec<AtomIndex>,
        out_derived_atoms: &mut Vec<AtomIndex>,
    ) {
        out_fluent_atoms.clear();
        out_derived_atoms.clear();
        for &dense in combined_atoms {
            let original = self.inverse_remap[dense];
            debug_assert_ne!(original, UNDEFINED_REMAP);
            if self.is_remapped_fluent[dense] {
                out_fluent_atoms.push(original as AtomIndex);
            } else {
                out_derived_atoms.push(original as AtomIndex);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(fluent: Vec<AtomIndex>, derived: Vec<AtomIndex>) -> PackedState {
        PackedState::new(fluent, derived, vec![])
    }

    #[test]
    fn dense_ids_are_first_seen_order() {
        let mut mapper = FluentAndDerivedMapper::new();
        let mut atoms = Vec::new();
        mapper.remap_and_combine_and_sort(&state(vec![7, 3], vec![1]), &mut atoms);
        // 3 -> 0, 7 -> 1 (state atoms are sorted), derived 1 -> 2
        assert_eq!(atoms, vec![0, 1, 2]);
        assert_eq!(mapper.num_atoms(), 3);

        // Fluent 1 is distinct from derived 1.
        mapper.remap_and_combine_and_sort(&state(vec![1], vec![1]), &mut atoms);
        assert_eq!(atoms, vec![2, 3]);
        assert_eq!(mapper.num_atoms(), 4);
    }

    #[test]
    fn pair_split_separates_added_atoms() {
        let mut mapper = FluentAndDerivedMapper::new();
        let before = state(vec![0, 1], vec![]);
        let after = state(vec![1, 2], vec![0]);
        let mut atoms = Vec::new();
        let mut added = Vec::new();
        mapper.remap_and_combine_and_sort_pair(&before, &after, &mut atoms, &mut added);
        // kept: fluent 1; added: fluent 2 and derived 0
        assert_eq!(atoms.len(), 1);
        assert_eq!(added.len(), 2);

        let mut fluent = Vec::new();
        let mut derived = Vec::new();
        mapper.inverse_remap_and_separate(&added, &mut fluent, &mut derived);
        assert_eq!(fluent, vec![2]);
        assert_eq!(derived, vec![0]);
    }
}
