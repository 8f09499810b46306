use crate::common::{ActionIndex, AtomIndex, ContinuousCost, ObjectIndex};
use crate::formalism::{
    GroundAtom, Negatable, NumericCondition, NumericEffect, ObjectTuple, TYPICAL_NUM_ARGUMENTS,
};
use crate::common::{PredicateIndex, TypeIndex};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;

/// An argument position of a schema atom: either bound to a constant object
/// or referring to a schema parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaArgument {
    Constant(ObjectIndex),
    Parameter(usize),
}

/// A predicate application over schema parameters and constants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AtomSchema {
    pub predicate: PredicateIndex,
    pub arguments: SmallVec<[SchemaArgument; TYPICAL_NUM_ARGUMENTS]>,
}

impl AtomSchema {
    pub fn new(
        predicate: PredicateIndex,
        arguments: SmallVec<[SchemaArgument; TYPICAL_NUM_ARGUMENTS]>,
    ) -> Self {
        Self {
            predicate,
            arguments,
        }
    }

    /// Shorthand: every argument refers to a parameter, in the given order.
    pub fn over_parameters(predicate: PredicateIndex, parameters: &[usize]) -> Self {
        Self::new(
            predicate,
            parameters
                .iter()
                .map(|&parameter| SchemaArgument::Parameter(parameter))
                .collect(),
        )
    }

    /// Substitute the binding into every parameter position.
    pub fn ground(&self, binding: &[ObjectIndex]) -> GroundAtom {
        GroundAtom::new(
            self.predicate,
            self.arguments
                .iter()
                .map(|argument| match argument {
                    SchemaArgument::Constant(object) => *object,
                    SchemaArgument::Parameter(parameter) => binding[*parameter],
                })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaParameter {
    pub name: String,
    pub parameter_type: TypeIndex,
}

impl SchemaParameter {
    pub fn new(name: impl Into<String>, parameter_type: TypeIndex) -> Self {
        Self {
            name: name.into(),
            parameter_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalEffectSchema {
    pub condition: Vec<Negatable<AtomSchema>>,
    pub add_effects: Vec<AtomSchema>,
    pub delete_effects: Vec<AtomSchema>,
}

/// A lifted action. Preconditions mix fluent, derived and static atoms; the
/// predicate kind decides how each is handled at grounding time. Numeric
/// conditions and effects are ground already (they refer to global numeric
/// variables).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSchema {
    pub name: String,
    pub parameters: Vec<SchemaParameter>,
    pub precondition: Vec<Negatable<AtomSchema>>,
    pub numeric_conditions: Vec<NumericCondition>,
    pub add_effects: Vec<AtomSchema>,
    pub delete_effects: Vec<AtomSchema>,
    pub conditional_effects: Vec<ConditionalEffectSchema>,
    pub numeric_effects: Vec<NumericEffect>,
    pub cost: ContinuousCost,
}

/// Conjunctive condition over interned atoms. Static atoms never appear here:
/// they are resolved when the condition is ground, and a statically
/// unsatisfiable condition never produces a ground action or axiom.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundConjunction {
    pub positive_fluent: Vec<AtomIndex>,
    pub negative_fluent: Vec<AtomIndex>,
    pub positive_derived: Vec<AtomIndex>,
    pub negative_derived: Vec<AtomIndex>,
    pub numeric_conditions: Vec<NumericCondition>,
}

impl GroundConjunction {
    pub fn is_empty(&self) -> bool {
        self.positive_fluent.is_empty()
            && self.negative_fluent.is_empty()
            && self.positive_derived.is_empty()
            && self.negative_derived.is_empty()
            && self.numeric_conditions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroundConditionalEffect {
    pub condition: GroundConjunction,
    pub add_effects: Vec<AtomIndex>,
    pub delete_effects: Vec<AtomIndex>,
}

/// A fully instantiated action. Owned by the [`crate::formalism::ProblemRepository`];
/// everything else holds [`GroundAction`] handles.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundActionData {
    pub index: ActionIndex,
    pub schema_index: usize,
    pub binding: ObjectTuple,
    pub precondition: GroundConjunction,
    pub add_effects: Vec<AtomIndex>,
    pub delete_effects: Vec<AtomIndex>,
    pub conditional_effects: Vec<GroundConditionalEffect>,
    pub numeric_effects: Vec<NumericEffect>,
    pub cost: ContinuousCost,
}

pub type GroundAction = Arc<GroundActionData>;
