//! Index types shared across the crate. All index spaces are dense and start
//! at zero; the all-ones value is reserved as the "none" sentinel.

/// Index of a ground atom within its kind-specific registry (fluent, derived
/// and static atoms each have their own index space).
pub type AtomIndex = u32;

/// Index of a ground action in the action registry.
pub type ActionIndex = u32;

/// Index of a ground axiom in the axiom registry.
pub type AxiomIndex = u32;

/// Index of an object in the problem.
pub type ObjectIndex = u32;

/// Index of a predicate in the domain.
pub type PredicateIndex = u32;

/// Index of an object type in the domain.
pub type TypeIndex = u32;

/// Index of a numeric state variable.
pub type FunctionIndex = u32;

/// Index of an interned state in the [`crate::search::StateRepository`].
pub type StateIndex = u32;

/// Sentinel encoding "no index".
pub const MAX_INDEX: u32 = u32::MAX;

/// Discrete cost, used for unit-cost distances.
pub type DiscreteCost = u32;

/// Continuous cost, used for action costs, metric values and heuristics.
pub type ContinuousCost = f64;

/// Sentinel for an undefined discrete cost (e.g. unreachable vertices).
pub const UNDEFINED_DISCRETE_COST: DiscreteCost = u32::MAX;

/// Sentinel for an undefined continuous cost. Since NaN compares unequal to
/// everything, always test with [`f64::is_nan`].
pub const UNDEFINED_CONTINUOUS_COST: ContinuousCost = f64::NAN;
