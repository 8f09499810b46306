use crate::error::SearchError;
use crate::search::novelty::{
    FluentAndDerivedMapper, StatePairTupleIndexIterator, StateTupleIndexIterator, TupleIndex,
    TupleIndexMapper,
};
use crate::search::PackedState;

/// Initial atom universe; doubles on demand.
const INITIAL_NUM_ATOMS: usize = 64;

/// Bit table over tuple indices recording which tuples of size at most the
/// arity have been witnessed. When an unseen atom index no longer fits the
/// encoding, the atom universe doubles and every witnessed tuple is
/// re-encoded under the larger mapper with placeholders rewritten.
#[derive(Debug)]
pub struct DynamicNoveltyTable {
    atom_index_mapper: FluentAndDerivedMapper,
    tuple_index_mapper: TupleIndexMapper,
    table: Vec<bool>,
    atoms_scratch: Vec<usize>,
    add_atoms_scratch: Vec<usize>,
}

impl DynamicNoveltyTable {
    pub fn new(arity: usize) -> Result<Self, SearchError> {
        Self::with_num_atoms(arity, INITIAL_NUM_ATOMS)
    }

    pub fn with_num_atoms(arity: usize, num_atoms: usize) -> Result<Self, SearchError> {
        let num_atoms = num_atoms.max(2);
        let tuple_index_mapper = TupleIndexMapper::new(arity, num_atoms)?;
        let table = vec![false; tuple_index_mapper.max_tuple_index() + 1];
        Ok(Self {
            atom_index_mapper: FluentAndDerivedMapper::new(),
            tuple_index_mapper,
            table,
            atoms_scratch: Vec::new(),
            add_atoms_scratch: Vec::new(),
        })
    }

    #[inline(always)]
    pub fn arity(&self) -> usize {
        self.tuple_index_mapper.arity()
    }

    pub fn tuple_index_mapper(&self) -> &TupleIndexMapper {
        &self.tuple_index_mapper
    }

    pub fn atom_index_mapper(&self) -> &FluentAndDerivedMapper {
        &self.atom_index_mapper
    }

    /// Grow the atom universe until `atom_index` fits below the placeholder,
    /// translating all witnessed tuples into the new encoding.
    fn resize_to_fit(&mut self, atom_index: usize) {
        let mut new_num_atoms = self.tuple_index_mapper.num_atoms();
        while new_num_atoms < atom_index + 2 {
            // Doubling keeps the amortized resize cost linear.
            new_num_atoms *= 2;
        }
        if new_num_atoms == self.tuple_index_mapper.num_atoms() {
            return;
        }

        let old_placeholder = self.tuple_index_mapper.num_atoms();
        let new_mapper = TupleIndexMapper::new(self.tuple_index_mapper.arity(), new_num_atoms)
            .expect("arity was validated at construction");
        let mut new_table = vec![false; new_mapper.max_tuple_index() + 1];

        for tuple_index in 0..self.table.len() {
            if !self.table[tuple_index] {
                continue;
            }
            let mut digits = self.tuple_index_mapper.to_digits(tuple_index);
            for digit in digits.iter_mut() {
                if *digit == old_placeholder {
                    *digit = new_num_atoms;
                }
            }
            new_table[new_mapper.to_tuple_index(&digits)] = true;
        }

        self.tuple_index_mapper = new_mapper;
        self.table = new_table;
    }

    fn prepare_single(&mut self, state: &PackedState) {
        let mut scratch = std::mem::take(&mut self.atoms_scratch);
        self.atom_index_mapper
            .remap_and_combine_and_sort(state, &mut scratch);
        if let Some(&max_atom) = scratch.last() {
            self.resize_to_fit(max_atom);
        }
        scratch.push(self.tuple_index_mapper.num_atoms());
        self.atoms_scratch = scratch;
    }

    fn prepare_pair(&mut self, state: &PackedState, successor: &PackedState) {
        let mut scratch = std::mem::take(&mut self.atoms_scratch);
        let mut add_scratch = std::mem::take(&mut self.add_atoms_scratch);
        self.atom_index_mapper
            .remap_and_combine_and_sort_pair(state, successor, &mut scratch, &mut add_scratch);
        let max_atom = scratch
            .last()
            .copied()
            .into_iter()
            .chain(add_scratch.last().copied())
            .max();
        if let Some(max_atom) = max_atom {
            self.resize_to_fit(max_atom);
        }
        scratch.push(self.tuple_index_mapper.num_atoms());
        self.atoms_scratch = scratch;
        self.add_atoms_scratch = add_scratch;
    }

    /// The state's tuple indices not yet witnessed. Does not update the table.
    pub fn compute_novel_tuples(&mut self, state: &PackedState) -> Vec<TupleIndex> {
        self.prepare_single(state);
        let iterator = StateTupleIndexIterator::new(&self.tuple_index_mapper, &self.atoms_scratch);
        let table = &self.table;
        iterator
            .filter(|&tuple_index| !table[tuple_index])
            .collect()
    }

    pub fn insert_tuples(&mut self, tuple_indices: &[TupleIndex]) {
        for &tuple_index in tuple_indices {
            self.table[tuple_index] = true;
        }
    }

    /// True iff the state witnesses at least one unseen tuple; all its tuples
    /// are marked witnessed afterwards.
    pub fn test_novelty_and_update_table(&mut self, state: &PackedState) -> bool {
        self.prepare_single(state);
        let mut is_novel = false;
        for tuple_index in
            StateTupleIndexIterator::new(&self.tuple_index_mapper, &self.atoms_scratch)
        {
            if !self.table[tuple_index] {
                is_novel = true;
                self.table[tuple_index] = true;
            }
        }
        is_novel
    }

    /// Transition overload: only tuples containing an atom added by the
    /// transition are considered.
    pub fn test_novelty_and_update_table_pair(
        &mut self,
        state: &PackedState,
        successor: &PackedState,
    ) -> bool {
        self.prepare_pair(state, successor);
        if self.add_atoms_scratch.is_empty() {
            return false;
        }
        let mut is_novel = false;
        for tuple_index in StatePairTupleIndexIterator::new(
            &self.tuple_index_mapper,
            &self.atoms_scratch,
            &self.add_atoms_scratch,
        ) {
            if !self.table[tuple_index] {
                is_novel = true;
                self.table[tuple_index] = true;
            }
        }
        is_novel
    }

    pub fn reset(&mut self) {
        self.table.fill(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(fluent: Vec<u32>) -> PackedState {
        PackedState::new(fluent, vec![], vec![])
    }

    #[test]
    fn novelty_is_idempotent_per_state() {
        let mut table = DynamicNoveltyTable::new(2).unwrap();
        let s = state(vec![0, 1]);
        assert!(table.test_novelty_and_update_table(&s));
        assert!(!table.test_novelty_and_update_table(&s));
    }

    #[test]
    fn subset_states_are_not_novel() {
        let mut table = DynamicNoveltyTable::new(2).unwrap();
        assert!(table.test_novelty_and_update_table(&state(vec![0, 1, 2])));
        // Every pair over {0, 1} was already witnessed.
        assert!(!table.test_novelty_and_update_table(&state(vec![0, 1])));
        assert!(table.test_novelty_and_update_table(&state(vec![0, 3])));
    }

    #[test]
    fn pair_test_requires_added_atoms() {
        let mut table = DynamicNoveltyTable::new(2).unwrap();
        let before = state(vec![0, 1]);
        assert!(table.test_novelty_and_update_table(&before));
        let after = state(vec![0, 1, 2]);
        assert!(table.test_novelty_and_update_table_pair(&before, &after));
        // Re-generating the same transition is no longer novel.
        assert!(!table.test_novelty_and_update_table_pair(&before, &after));
        // A transition adding nothing is never novel.
        assert!(!table.test_novelty_and_update_table_pair(&after, &after));
    }

    #[test]
    fn resize_preserves_witnessed_tuples() {
        let mut table = DynamicNoveltyTable::with_num_atoms(2, 2).unwrap();
        assert!(table.test_novelty_and_update_table(&state(vec![0, 1])));
        // Atom 200 forces several doublings.
        assert!(table.test_novelty_and_update_table(&state(vec![200])));
        assert!(!table.test_novelty_and_update_table(&state(vec![0, 1])));
    }

    #[test]
    fn arity_zero_is_novel_exactly_once() {
        let mut table = DynamicNoveltyTable::new(0).unwrap();
        assert!(table.test_novelty_and_update_table(&state(vec![0])));
        assert!(!table.test_novelty_and_update_table(&state(vec![5])));
        table.reset();
        assert!(table.test_novelty_and_update_table(&state(vec![7])));
    }

    #[test]
    fn compute_novel_tuples_does_not_update() {
        let mut table = DynamicNoveltyTable::new(1).unwrap();
        let s = state(vec![0, 1]);
        let novel = table.compute_novel_tuples(&s);
        // Tuples (0), (1) and the empty tuple.
        assert_eq!(novel.len(), 3);
        let again = table.compute_novel_tuples(&s);
        assert_eq!(novel, again);
        table.insert_tuples(&novel);
        assert!(table.compute_novel_tuples(&s).is_empty());
    }
}
