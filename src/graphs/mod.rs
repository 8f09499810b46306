//! Coloured-graph support for symmetry detection: the object-graph adapter
//! turning a state into a canonical certificate, and the oracle boundary
//! behind which a real canonical-labelling kernel can sit.

mod certificate;
mod object_graph;

pub use certificate::{
    CanonicalForm, CanonicalGraphOracle, Certificate, ColourRefinementOracle, ColouredDigraph,
};
pub use object_graph::{
    NoObjectGraphPruning, ObjectGraphFactory, ObjectGraphPruningStrategy,
    StaticReachabilityPruning,
};
