//! The problem-facing data model consumed by the search core: predicates,
//! objects, ground atoms, ground actions with conditional effects, ground
//! axioms, numeric expressions and the metric. The core never parses anything;
//! problems are built programmatically and handed to a [`ProblemRepository`],
//! which owns the dense index spaces for atoms, actions and axioms.

mod action;
mod atom;
mod axiom;
mod negatable;
mod numeric;
mod object;
mod predicate;
mod problem;
mod repository;

pub use action::{
    ActionSchema, AtomSchema, ConditionalEffectSchema, GroundAction, GroundActionData,
    GroundConditionalEffect, GroundConjunction, SchemaArgument, SchemaParameter,
};
pub use atom::{AtomRegistry, GroundAtom, ObjectTuple, TYPICAL_NUM_ARGUMENTS};
pub use axiom::{AxiomSchema, GroundAxiom, GroundAxiomData};
pub use negatable::Negatable;
pub use numeric::{
    BinaryOperator, Comparator, FunctionExpression, NumericCondition, NumericEffect,
    NumericEffectKind,
};
pub use object::Object;
pub use predicate::{Predicate, PredicateKind};
pub use problem::{GoalLiteral, Problem};
pub use repository::{GroundGoal, ProblemRepository};
