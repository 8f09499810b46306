mod indices;
mod stopwatch;

pub use indices::{
    ActionIndex, AtomIndex, AxiomIndex, ContinuousCost, DiscreteCost, FunctionIndex, ObjectIndex,
    PredicateIndex, StateIndex, TypeIndex, MAX_INDEX, UNDEFINED_CONTINUOUS_COST,
    UNDEFINED_DISCRETE_COST,
};
pub use stopwatch::StopWatch;
