use crate::common::{ObjectIndex, PredicateIndex, TypeIndex};
use crate::formalism::{
    ActionSchema, AxiomSchema, FunctionExpression, GroundAtom, NumericCondition, Object, Predicate,
    PredicateKind,
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A top-level goal literal. The predicate kind is looked up on demand, so a
/// literal over a static predicate is checked once against the initial state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalLiteral {
    pub negated: bool,
    pub atom: GroundAtom,
}

impl GoalLiteral {
    pub fn positive(atom: GroundAtom) -> Self {
        Self {
            negated: false,
            atom,
        }
    }

    pub fn negative(atom: GroundAtom) -> Self {
        Self {
            negated: true,
            atom,
        }
    }
}

/// A complete planning problem: domain structure plus instance data. Built
/// programmatically; the core contains no parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub name: String,
    /// Type names; indices are [`TypeIndex`] values.
    pub types: Vec<String>,
    pub objects: Vec<Object>,
    pub predicates: Vec<Predicate>,
    /// Names of the global numeric state variables.
    pub functions: Vec<String>,
    pub action_schemas: Vec<ActionSchema>,
    pub axiom_schemas: Vec<AxiomSchema>,
    pub initial_fluent_atoms: Vec<GroundAtom>,
    pub initial_static_atoms: Vec<GroundAtom>,
    /// Initial values of the numeric variables, indexed by function index.
    pub initial_numeric_values: Vec<f64>,
    pub goal: Vec<GoalLiteral>,
    /// Numeric conditions that must hold in a goal state.
    pub numeric_goal: Vec<NumericCondition>,
    /// Expression minimised over goal states. When absent, the summed action
    /// costs act as the metric.
    pub metric: Option<FunctionExpression>,
}

impl Problem {
    #[inline(always)]
    pub fn predicate(&self, index: PredicateIndex) -> &Predicate {
        &self.predicates[index as usize]
    }

    #[inline(always)]
    pub fn predicate_kind(&self, index: PredicateIndex) -> PredicateKind {
        self.predicates[index as usize].kind
    }

    pub fn objects_of_type(&self, type_index: TypeIndex) -> Vec<ObjectIndex> {
        self.objects
            .iter()
            .enumerate()
            .filter(|(_, object)| object.is_of_type(type_index))
            .map(|(index, _)| index as ObjectIndex)
            .collect()
    }

    pub fn objects_per_type(&self) -> Vec<Vec<ObjectIndex>> {
        (0..self.types.len() as TypeIndex)
            .map(|type_index| self.objects_of_type(type_index))
            .collect()
    }

    /// Human-readable atom name, used by the match-tree ordering heuristic
    /// and for diagnostics.
    pub fn atom_name(&self, atom: &GroundAtom) -> String {
        let arguments = atom
            .arguments
            .iter()
            .map(|&object| self.objects[object as usize].name.as_str())
            .join(" ");
        if arguments.is_empty() {
            format!("({})", self.predicate(atom.predicate).name)
        } else {
            format!("({} {})", self.predicate(atom.predicate).name, arguments)
        }
    }
}
