//! Reachability artifacts built on top of the search substrate: exhaustive
//! state spaces, isomorphism-quotiented faithful abstractions, the
//! cross-problem generalized state space and novelty-preserving tuple
//! graphs.

mod faithful_abstraction;
mod generalized_state_space;
mod state_space;
mod tuple_graph;

pub use faithful_abstraction::{
    AbstractEdge, AbstractVertex, FaithfulAbstraction, FaithfulAbstractionOptions,
};
pub use generalized_state_space::{ClassEdge, ClassGraph, ClassVertex, GeneralizedStateSpace};
pub use state_space::{
    CertificateMaps, ProblemEdge, ProblemGraph, ProblemVertex, StateSpace, StateSpaceOptions,
};
pub use tuple_graph::{TupleGraph, TupleGraphFactory, TupleGraphOptions, TupleGraphVertex};
