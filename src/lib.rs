//! Mimir is a research planner for classical planning problems expressed in
//! a lifted first-order action language. This crate is its state-space
//! exploration engine: a unified search substrate that grounds or lazily
//! instantiates actions and axioms against states, enumerates reachable
//! states with deduplication and symmetry reduction, explores them with
//! pluggable algorithms (breadth-first, A*, iterated-width variants) and
//! materializes the resulting reachability artifacts — state spaces,
//! faithful abstractions and tuple graphs.

#![warn(missing_debug_implementations)]
#![deny(non_ascii_idents)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![deny(unit_bindings)]
#![warn(unused_crate_dependencies)]
#![warn(unused_qualifications)]

// Dev-dependency only used for optional log inspection while testing.
#[cfg(test)]
use tracing_subscriber as _;

pub mod common;
pub mod datasets;
mod error;
pub mod formalism;
pub mod graphs;
pub mod search;

pub use error::SearchError;

#[cfg(test)]
mod test_utils;
