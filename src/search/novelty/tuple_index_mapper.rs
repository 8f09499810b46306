use crate::error::SearchError;
use itertools::Itertools;
use smallvec::SmallVec;

/// Largest supported tuple arity.
pub const MAX_ARITY: usize = 5;

/// Mixed-radix encoding of a sorted atom-index tuple.
pub type TupleIndex = usize;

/// Perfect hash for sorted tuples of (remapped) atom indices. Position `i`
/// carries weight `num_atoms^i`; the reserved placeholder value `num_atoms`
/// pads tuples shorter than the arity, so the all-placeholder encoding is
/// both the empty tuple and the largest encodable index.
#[derive(Debug, Clone)]
pub struct TupleIndexMapper {
    arity: usize,
    num_atoms: usize,
    factors: SmallVec<[usize; MAX_ARITY]>,
    empty_tuple_index: TupleIndex,
}

impl TupleIndexMapper {
    pub fn new(arity: usize, num_atoms: usize) -> Result<Self, SearchError> {
        if arity > MAX_ARITY {
            return Err(SearchError::ArityOutOfRange {
                arity,
                max: MAX_ARITY,
            });
        }
        let mut factors = SmallVec::new();
        let mut factor = 1usize;
        for _ in 0..arity {
            factors.push(factor);
            factor *= num_atoms;
        }
        let empty_tuple_index = factors.iter().map(|factor| num_atoms * factor).sum();
        Ok(Self {
            arity,
            num_atoms,
            factors,
            empty_tuple_index,
        })
    }

    /// Encode a sorted tuple of exactly `arity` entries, each in
    /// `[0, num_atoms]` (the value `num_atoms` being the placeholder).
    pub fn to_tuple_index(&self, atom_indices: &[usize]) -> TupleIndex {
        debug_assert_eq!(atom_indices.len(), self.arity);
        debug_assert!(atom_indices.windows(2).all(|pair| pair[0] <= pair[1]));
        atom_indices
            .iter()
            .zip(&self.factors)
            .map(|(&atom, &factor)| atom * factor)
            .sum()
    }

    /// Decode into the non-placeholder atom indices, sorted.
    pub fn to_atom_indices(&self, tuple_index: TupleIndex) -> Vec<usize> {
        let mut remainder = tuple_index;
        let mut atom_indices = Vec::with_capacity(self.arity);
        for i in (0..self.arity).rev() {
            // min is needed to decode the placeholder digit correctly
            let atom = (remainder / self.factors[i]).min(self.num_atoms);
            if atom != self.num_atoms {
                atom_indices.push(atom);
            }
            remainder -= atom * self.factors[i];
        }
        atom_indices.reverse();
        atom_indices
    }

    /// Decode into all `arity` digits, placeholders included. Used when a
    /// table resize re-encodes witnessed tuples.
    pub(crate) fn to_digits(&self, tuple_index: TupleIndex) -> SmallVec<[usize; MAX_ARITY]> {
        let mut remainder = tuple_index;
        let mut digits = SmallVec::new();
        for i in (0..self.arity).rev() {
            let digit = (remainder / self.factors[i]).min(self.num_atoms);
            digits.push(digit);
            remainder -= digit * self.factors[i];
        }
        digits.reverse();
        digits
    }

    pub fn tuple_index_to_string(&self, tuple_index: TupleIndex) -> String {
        format!("({})", self.to_atom_indices(tuple_index).iter().join(","))
    }

    #[inline(always)]
    pub fn num_atoms(&self) -> usize {
        self.num_atoms
    }

    #[inline(always)]
    pub fn arity(&self) -> usize {
        self.arity
    }

    #[inline(always)]
    pub fn factors(&self) -> &[usize] {
        &self.factors
    }

    /// The all-placeholder encoding; no tuple encodes to a larger value.
    #[inline(always)]
    pub fn max_tuple_index(&self) -> TupleIndex {
        self.empty_tuple_index
    }

    #[inline(always)]
    pub fn empty_tuple_index(&self) -> TupleIndex {
        self.empty_tuple_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_oversized_arity() {
        assert!(matches!(
            TupleIndexMapper::new(MAX_ARITY + 1, 10),
            Err(SearchError::ArityOutOfRange { .. })
        ));
    }

    #[test]
    fn arity_zero_maps_everything_to_the_empty_tuple() {
        let mapper = TupleIndexMapper::new(0, 10).unwrap();
        assert_eq!(mapper.to_tuple_index(&[]), 0);
        assert_eq!(mapper.empty_tuple_index(), 0);
        assert!(mapper.to_atom_indices(0).is_empty());
    }

    #[test]
    fn round_trip_over_all_sorted_pairs() {
        let num_atoms = 4;
        let mapper = TupleIndexMapper::new(2, num_atoms).unwrap();
        let mut seen = std::collections::HashSet::new();
        for first in 0..=num_atoms {
            for second in first..=num_atoms {
                // Placeholders may repeat, proper atoms may not.
                if first == second && first != num_atoms {
                    continue;
                }
                let index = mapper.to_tuple_index(&[first, second]);
                assert!(seen.insert(index), "collision for ({first},{second})");
                let decoded = mapper.to_atom_indices(index);
                let expected: Vec<usize> = [first, second]
                    .into_iter()
                    .filter(|&atom| atom != num_atoms)
                    .collect();
                assert_eq!(decoded, expected);
            }
        }
    }

    #[test]
    fn empty_tuple_index_is_maximal() {
        let mapper = TupleIndexMapper::new(3, 5).unwrap();
        assert_eq!(mapper.empty_tuple_index(), 5 * 1 + 5 * 5 + 5 * 25);
        let empty = mapper.to_tuple_index(&[5, 5, 5]);
        assert_eq!(empty, mapper.empty_tuple_index());
        assert!(mapper.to_atom_indices(empty).is_empty());
    }
}
