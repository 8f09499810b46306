//! The two stateful tuple enumerators. Both adapt the classic
//! next-permutation scheme: keep one position index per tuple slot, advance
//! the rightmost index that can still grow, reset everything to its right,
//! and maintain the encoded tuple index by difference instead of recomputing.

use crate::search::novelty::{TupleIndex, TupleIndexMapper, MAX_ARITY};
use smallvec::SmallVec;

const UNDEFINED: usize = usize::MAX;

/// Enumerates every size-≤-arity tuple over one sorted atom vector. The
/// vector must already carry the placeholder sentinel (`num_atoms`) at its
/// end; tuples shorter than the arity are padded with it.
#[derive(Debug)]
pub(crate) struct StateTupleIndexIterator<'a> {
    mapper: &'a TupleIndexMapper,
    atoms: &'a [usize],
    indices: SmallVec<[usize; MAX_ARITY]>,
    current: TupleIndex,
    started: bool,
    finished: bool,
}

impl<'a> StateTupleIndexIterator<'a> {
    pub fn new(mapper: &'a TupleIndexMapper, atoms: &'a [usize]) -> Self {
        debug_assert!(!atoms.is_empty());
        debug_assert!(atoms.windows(2).all(|pair| pair[0] < pair[1]));

        let arity = mapper.arity();
        let factors = mapper.factors();
        let mut indices = SmallVec::new();
        let mut current = 0;
        for i in 0..arity {
            // Capped so short atom vectors start on the placeholder.
            let position = i.min(atoms.len() - 1);
            indices.push(position);
            current += atoms[position] * factors[i];
        }
        Self {
            mapper,
            atoms,
            indices,
            current,
            started: false,
            finished: false,
        }
    }

    fn advance(&mut self) -> bool {
        let arity = self.mapper.arity();
        if arity == 0 {
            return false;
        }
        let factors = self.mapper.factors();
        let last = self.atoms.len() - 1;

        // Rightmost position that is not yet on the final (placeholder) slot.
        let mut i = arity;
        while i > 0 && self.indices[i - 1] == last {
            i -= 1;
        }
        if i == 0 {
            return false;
        }
        let i = i - 1;

        let old = self.indices[i];
        self.indices[i] += 1;
        self.current -= factors[i] * self.atoms[old];
        self.current += factors[i] * self.atoms[self.indices[i]];

        for j in i + 1..arity {
            let old = self.indices[j];
            let new = (self.indices[j - 1] + 1).min(last);
            self.indices[j] = new;
            self.current -= factors[j] * self.atoms[old];
            self.current += factors[j] * self.atoms[new];
        }
        true
    }
}

impl Iterator for StateTupleIndexIterator<'_> {
    type Item = TupleIndex;

    fn next(&mut self) -> Option<TupleIndex> {
        if self.finished {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.current);
        }
        if self.advance() {
            Some(self.current)
        } else {
            self.finished = true;
            None
        }
    }
}

/// Enumerates, for a transition, every size-≤-arity tuple over the
/// successor's atoms that contains at least one newly added atom. The outer
/// iteration walks the non-zero binary masks deciding which tuple slots draw
/// from the added vector; the inner iteration enumerates the strictly
/// increasing index assignments for one mask, using per-side jumper arrays
/// ("next larger element in the other vector") for O(1) side switches.
#[derive(Debug)]
pub(crate) struct StatePairTupleIndexIterator<'a> {
    mapper: &'a TupleIndexMapper,
    /// `atoms[0]` = atoms also true in the predecessor, placeholder appended;
    /// `atoms[1]` = newly added atoms, no placeholder.
    atoms: [&'a [usize]; 2],
    jumpers: [Vec<usize>; 2],
    indices: SmallVec<[usize; MAX_ARITY]>,
    side: SmallVec<[bool; MAX_ARITY]>,
    mask: usize,
    current: TupleIndex,
    started: bool,
    finished: bool,
}

impl<'a> StatePairTupleIndexIterator<'a> {
    pub fn new(
        mapper: &'a TupleIndexMapper,
        atom_indices: &'a [usize],
        add_atom_indices: &'a [usize],
    ) -> Self {
        debug_assert!(!atom_indices.is_empty());
        debug_assert!(!add_atom_indices.is_empty());
        debug_assert!(atom_indices.windows(2).all(|pair| pair[0] < pair[1]));
        debug_assert!(add_atom_indices.windows(2).all(|pair| pair[0] < pair[1]));

        let mut iterator = Self {
            mapper,
            atoms: [atom_indices, add_atom_indices],
            jumpers: [
                vec![UNDEFINED; atom_indices.len()],
                vec![UNDEFINED; add_atom_indices.len()],
            ],
            indices: SmallVec::from_elem(0, mapper.arity()),
            side: SmallVec::from_elem(false, mapper.arity()),
            mask: 0,
            current: 0,
            started: false,
            finished: false,
        };
        iterator.initialize_jumpers();
        if !iterator.advance_mask() {
            iterator.finished = true;
        }
        iterator
    }

    /// `jumpers[s][i]` is the position of the first element in the opposite
    /// vector strictly larger than `atoms[s][i]`.
    fn initialize_jumpers(&mut self) {
        let mut j = 0;
        let mut i = 0;
        while j < self.atoms[0].len() && i < self.atoms[1].len() {
            if self.atoms[0][j] < self.atoms[1][i] {
                self.jumpers[0][j] = i;
                j += 1;
            } else if self.atoms[0][j] > self.atoms[1][i] {
                self.jumpers[1][i] = j;
                i += 1;
            } else {
                self.jumpers[0][j] = i;
                self.jumpers[1][i] = j;
                j += 1;
                i += 1;
            }
        }
    }

    #[inline(always)]
    fn side_atoms(&self, slot: usize) -> &[usize] {
        self.atoms[usize::from(self.side[slot])]
    }

    /// Position for slot `i` given slot `i - 1`, or `UNDEFINED` when no
    /// strictly larger (or equal-placeholder) element exists.
    fn find_next_index(&self, i: usize) -> usize {
        let previous_side = self.side[i - 1];
        let side = self.side[i];
        if previous_side == side {
            if !side {
                // Cap at the placeholder slot.
                (self.indices[i - 1] + 1).min(self.side_atoms(i).len() - 1)
            } else if self.indices[i - 1] == self.side_atoms(i).len() - 1 {
                UNDEFINED
            } else {
                self.indices[i - 1] + 1
            }
        } else {
            let jumper = self.jumpers[usize::from(previous_side)][self.indices[i - 1]];
            if !side {
                if jumper == UNDEFINED {
                    self.side_atoms(i).len() - 1
                } else {
                    jumper.min(self.side_atoms(i).len() - 1)
                }
            } else {
                jumper
            }
        }
    }

    /// Move to the next mask that admits a first tuple; initializes
    /// `indices` and `current` for it.
    fn advance_mask(&mut self) -> bool {
        let arity = self.mapper.arity();
        let factors = self.mapper.factors();

        self.mask += 1;
        'masks: while self.mask < (1 << arity) {
            for slot in 0..arity {
                self.side[slot] = (self.mask & (1 << slot)) != 0;
            }

            self.indices[0] = 0;
            self.current = self.side_atoms(0)[0] * factors[0];
            for j in 1..arity {
                let next = self.find_next_index(j);
                if next == UNDEFINED {
                    self.mask += 1;
                    continue 'masks;
                }
                self.indices[j] = next;
                self.current += factors[j] * self.side_atoms(j)[next];
            }
            return true;
        }
        false
    }

    /// Rightmost slot whose position can grow while keeping the tuple
    /// strictly increasing; `UNDEFINED` when none can.
    fn find_rightmost_incrementable(&self) -> usize {
        let arity = self.mapper.arity();
        let mut i = arity - 1;
        if self.indices[i] < self.side_atoms(i).len() - 1 {
            return i;
        }
        loop {
            if i == 0 {
                return UNDEFINED;
            }
            i -= 1;
            if self.indices[i] == self.side_atoms(i).len() - 1 {
                continue;
            }
            if self.side_atoms(i)[self.indices[i] + 1] >= self.side_atoms(i + 1)[self.indices[i + 1]]
            {
                continue;
            }
            return i;
        }
    }

    fn advance(&mut self) -> bool {
        let arity = self.mapper.arity();
        if arity == 0 {
            return false;
        }
        let factors = self.mapper.factors();
        loop {
            let i = self.find_rightmost_incrementable();
            if i == UNDEFINED {
                if self.advance_mask() {
                    return true;
                }
                return false;
            }

            let old = self.indices[i];
            self.indices[i] += 1;
            self.current -= factors[i] * self.side_atoms(i)[old];
            self.current += factors[i] * self.side_atoms(i)[self.indices[i]];

            let mut failed = false;
            for j in i + 1..arity {
                let old = self.indices[j];
                let new = self.find_next_index(j);
                if new == UNDEFINED {
                    failed = true;
                    break;
                }
                self.indices[j] = new;
                self.current -= factors[j] * self.side_atoms(j)[old];
                self.current += factors[j] * self.side_atoms(j)[new];
            }
            if failed {
                if self.advance_mask() {
                    return true;
                }
                return false;
            }
            return true;
        }
    }
}

impl Iterator for StatePairTupleIndexIterator<'_> {
    type Item = TupleIndex;

    fn next(&mut self) -> Option<TupleIndex> {
        if self.finished {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.current);
        }
        if self.advance() {
            Some(self.current)
        } else {
            self.finished = true;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn collect_state_tuples(arity: usize, num_atoms: usize, atoms: &[usize]) -> Vec<Vec<usize>> {
        let mapper = TupleIndexMapper::new(arity, num_atoms).unwrap();
        let mut with_placeholder = atoms.to_vec();
        with_placeholder.push(num_atoms);
        StateTupleIndexIterator::new(&mapper, &with_placeholder)
            .map(|index| mapper.to_atom_indices(index))
            .collect()
    }

    #[test]
    fn state_tuples_arity_zero() {
        let tuples = collect_state_tuples(0, 8, &[0, 3]);
        assert_eq!(tuples, vec![Vec::<usize>::new()]);
    }

    #[test]
    fn state_tuples_arity_one_enumerates_atoms_and_empty() {
        let tuples = collect_state_tuples(1, 8, &[0, 3, 5]);
        assert_eq!(tuples, vec![vec![0], vec![3], vec![5], vec![]]);
    }

    #[test]
    fn state_tuples_arity_two_enumerates_all_subsets() {
        let tuples = collect_state_tuples(2, 8, &[1, 4]);
        // All sorted subsets of {1, 4} of size at most two, the smaller
        // position moving slowest.
        assert_eq!(
            tuples,
            vec![vec![1, 4], vec![1], vec![4], vec![]]
        );
    }

    #[test]
    fn state_tuples_are_unique(){
        let mapper = TupleIndexMapper::new(3, 8).unwrap();
        let atoms = vec![0, 2, 3, 6, 8];
        let indices: Vec<_> = StateTupleIndexIterator::new(&mapper, &atoms).collect();
        let unique: HashSet<_> = indices.iter().copied().collect();
        assert_eq!(indices.len(), unique.len());
        // C(4,3) + C(4,2) + C(4,1) + C(4,0) subsets of the four proper atoms.
        assert_eq!(indices.len(), 4 + 6 + 4 + 1);
    }

    fn collect_pair_tuples(
        arity: usize,
        num_atoms: usize,
        atoms: &[usize],
        added: &[usize],
    ) -> HashSet<Vec<usize>> {
        let mapper = TupleIndexMapper::new(arity, num_atoms).unwrap();
        let mut with_placeholder = atoms.to_vec();
        with_placeholder.push(num_atoms);
        StatePairTupleIndexIterator::new(&mapper, &with_placeholder, added)
            .map(|index| mapper.to_atom_indices(index))
            .collect()
    }

    /// Reference enumeration: all sorted subsets of size <= arity over the
    /// union that contain at least one added atom.
    fn reference_pair_tuples(
        arity: usize,
        atoms: &[usize],
        added: &[usize],
    ) -> HashSet<Vec<usize>> {
        let union: Vec<usize> = {
            let mut all: Vec<usize> = atoms.iter().chain(added).copied().collect();
            all.sort_unstable();
            all.dedup();
            all
        };
        let mut result = HashSet::new();
        let n = union.len();
        for mask in 1u32..(1 << n) {
            if mask.count_ones() as usize > arity {
                continue;
            }
            let subset: Vec<usize> = (0..n)
                .filter(|&bit| mask & (1 << bit) != 0)
                .map(|bit| union[bit])
                .collect();
            if subset.iter().any(|value| added.contains(value)) {
                result.insert(subset);
            }
        }
        result
    }

    #[test]
    fn pair_tuples_match_reference_enumeration() {
        for (arity, atoms, added) in [
            (1, vec![0, 2], vec![1]),
            (2, vec![0, 2], vec![1]),
            (2, vec![1, 3, 5], vec![0, 4]),
            (3, vec![1, 3, 5], vec![0, 4]),
            (2, vec![], vec![0, 1]),
            (3, vec![0, 1, 2, 3], vec![4]),
        ] {
            let produced = collect_pair_tuples(arity, 8, &atoms, &added);
            let expected = reference_pair_tuples(arity, &atoms, &added);
            assert_eq!(produced, expected, "arity {arity}, {atoms:?} + {added:?}");
        }
    }

    #[test]
    fn pair_tuples_yield_each_tuple_once() {
        let mapper = TupleIndexMapper::new(2, 8).unwrap();
        let atoms = vec![1, 3, 8];
        let added = vec![0, 4];
        let indices: Vec<_> =
            StatePairTupleIndexIterator::new(&mapper, &atoms, &added).collect();
        let unique: HashSet<_> = indices.iter().copied().collect();
        assert_eq!(indices.len(), unique.len());
    }
}
