//! The novelty machinery behind the iterated-width algorithms: the perfect
//! tuple hash ([`TupleIndexMapper`]), the dense remapping of fluent and
//! derived atom indices ([`FluentAndDerivedMapper`]), the two tuple
//! enumeration iterators, the auto-growing novelty table and the
//! novelty-based pruning strategies.

mod atom_mapper;
mod novelty_table;
mod pruning;
mod tuple_index_mapper;
mod tuple_iterators;

pub use atom_mapper::{FluentAndDerivedMapper, UNDEFINED_REMAP};
pub use novelty_table::DynamicNoveltyTable;
pub use pruning::{ArityKNoveltyPruning, ArityZeroNoveltyPruning};
pub use tuple_index_mapper::{TupleIndex, TupleIndexMapper, MAX_ARITY};
pub(crate) use tuple_iterators::{StatePairTupleIndexIterator, StateTupleIndexIterator};
