use crate::common::{ActionIndex, AtomIndex, AxiomIndex, ObjectIndex, TypeIndex};
use crate::formalism::{
    AtomRegistry, AtomSchema, GroundAction, GroundActionData, GroundAtom, GroundAxiom,
    GroundAxiomData, GroundConditionalEffect, GroundConjunction, Negatable, NumericCondition,
    ObjectTuple, PredicateKind, Problem,
};
use ordered_float::OrderedFloat;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// The problem goal with all literals resolved to atom indices. Static goal
/// literals are evaluated once at construction and folded into
/// [`ProblemRepository::static_goal_holds`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundGoal {
    pub positive_fluent: Vec<AtomIndex>,
    pub negative_fluent: Vec<AtomIndex>,
    pub positive_derived: Vec<AtomIndex>,
    pub negative_derived: Vec<AtomIndex>,
    pub numeric: Vec<NumericCondition>,
}

impl GroundGoal {
    pub fn num_literals(&self) -> usize {
        self.positive_fluent.len()
            + self.negative_fluent.len()
            + self.positive_derived.len()
            + self.negative_derived.len()
            + self.numeric.len()
    }
}

#[derive(Debug, Default)]
struct ActionRegistry {
    actions: Vec<GroundAction>,
    index_of: HashMap<(usize, ObjectTuple), ActionIndex>,
}

#[derive(Debug, Default)]
struct AxiomRegistry {
    axioms: Vec<GroundAxiom>,
    index_of: HashMap<(usize, ObjectTuple), AxiomIndex>,
}

/// Owns the problem description and the dense index spaces for ground atoms,
/// ground actions and ground axioms. Registries sit behind mutexes so a
/// repository can be shared across builder threads; within a single search
/// run access is effectively uncontended.
#[derive(Debug)]
pub struct ProblemRepository {
    problem: Problem,
    fluent_atoms: Mutex<AtomRegistry>,
    derived_atoms: Mutex<AtomRegistry>,
    static_atoms: AtomRegistry,
    actions: Mutex<ActionRegistry>,
    axioms: Mutex<AxiomRegistry>,
    goal: GroundGoal,
    static_goal_holds: bool,
    objects_per_type: Vec<Vec<ObjectIndex>>,
}

impl ProblemRepository {
    pub fn new(problem: Problem) -> Arc<Self> {
        let mut static_atoms = AtomRegistry::new();
        for atom in &problem.initial_static_atoms {
            debug_assert_eq!(problem.predicate_kind(atom.predicate), PredicateKind::Static);
            static_atoms.intern(atom.clone());
        }

        let mut fluent_atoms = AtomRegistry::new();
        let mut derived_atoms = AtomRegistry::new();
        for atom in &problem.initial_fluent_atoms {
            debug_assert_eq!(problem.predicate_kind(atom.predicate), PredicateKind::Fluent);
            fluent_atoms.intern(atom.clone());
        }

        let mut goal = GroundGoal::default();
        let mut static_goal_holds = true;
        for literal in &problem.goal {
            match problem.predicate_kind(literal.atom.predicate) {
                PredicateKind::Fluent => {
                    let index = fluent_atoms.intern(literal.atom.clone());
                    if literal.negated {
                        goal.negative_fluent.push(index);
                    } else {
                        goal.positive_fluent.push(index);
                    }
                }
                PredicateKind::Derived => {
                    let index = derived_atoms.intern(literal.atom.clone());
                    if literal.negated {
                        goal.negative_derived.push(index);
                    } else {
                        goal.positive_derived.push(index);
                    }
                }
                PredicateKind::Static => {
                    let holds = static_atoms.position(&literal.atom).is_some() != literal.negated;
                    static_goal_holds &= holds;
                }
            }
        }
        goal.numeric = problem.numeric_goal.clone();

        let objects_per_type = problem.objects_per_type();

        Arc::new(Self {
            problem,
            fluent_atoms: Mutex::new(fluent_atoms),
            derived_atoms: Mutex::new(derived_atoms),
            static_atoms,
            actions: Mutex::new(ActionRegistry::default()),
            axioms: Mutex::new(AxiomRegistry::default()),
            goal,
            static_goal_holds,
            objects_per_type,
        })
    }

    #[inline(always)]
    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    #[inline(always)]
    pub fn goal(&self) -> &GroundGoal {
        &self.goal
    }

    /// Whether the static portion of the goal is satisfied. When false the
    /// problem is trivially unsolvable.
    #[inline(always)]
    pub fn static_goal_holds(&self) -> bool {
        self.static_goal_holds
    }

    #[inline(always)]
    pub fn objects_of_type(&self, type_index: TypeIndex) -> &[ObjectIndex] {
        &self.objects_per_type[type_index as usize]
    }

    /* Fluent atoms */

    pub fn fluent_atom_index(&self, atom: GroundAtom) -> AtomIndex {
        debug_assert_eq!(
            self.problem.predicate_kind(atom.predicate),
            PredicateKind::Fluent
        );
        self.fluent_atoms.lock().unwrap().intern(atom)
    }

    pub fn find_fluent_atom_index(&self, atom: &GroundAtom) -> Option<AtomIndex> {
        self.fluent_atoms.lock().unwrap().position(atom)
    }

    pub fn fluent_atom(&self, index: AtomIndex) -> GroundAtom {
        self.fluent_atoms.lock().unwrap().get(index).clone()
    }

    pub fn num_fluent_atoms(&self) -> usize {
        self.fluent_atoms.lock().unwrap().len()
    }

    /* Derived atoms */

    pub fn derived_atom_index(&self, atom: GroundAtom) -> AtomIndex {
        debug_assert_eq!(
            self.problem.predicate_kind(atom.predicate),
            PredicateKind::Derived
        );
        self.derived_atoms.lock().unwrap().intern(atom)
    }

    pub fn find_derived_atom_index(&self, atom: &GroundAtom) -> Option<AtomIndex> {
        self.derived_atoms.lock().unwrap().position(atom)
    }

    pub fn derived_atom(&self, index: AtomIndex) -> GroundAtom {
        self.derived_atoms.lock().unwrap().get(index).clone()
    }

    pub fn num_derived_atoms(&self) -> usize {
        self.derived_atoms.lock().unwrap().len()
    }

    /* Static atoms (frozen at construction) */

    pub fn static_atom_index(&self, atom: &GroundAtom) -> Option<AtomIndex> {
        self.static_atoms.position(atom)
    }

    pub fn static_atom(&self, index: AtomIndex) -> &GroundAtom {
        self.static_atoms.get(index)
    }

    pub fn num_static_atoms(&self) -> usize {
        self.static_atoms.len()
    }

    pub fn static_atoms(&self) -> impl Iterator<Item = &GroundAtom> {
        self.static_atoms.iter()
    }

    pub fn is_static_atom_true(&self, atom: &GroundAtom) -> bool {
        self.static_atoms.position(atom).is_some()
    }

    /// Atom indices of the initial fluent literals, sorted.
    pub fn initial_fluent_atom_indices(&self) -> Vec<AtomIndex> {
        let mut registry = self.fluent_atoms.lock().unwrap();
        let mut indices: Vec<AtomIndex> = self
            .problem
            .initial_fluent_atoms
            .iter()
            .map(|atom| registry.intern(atom.clone()))
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    pub fn initial_numeric_values(&self) -> Vec<OrderedFloat<f64>> {
        self.problem
            .initial_numeric_values
            .iter()
            .copied()
            .map(OrderedFloat)
            .collect()
    }

    /* Grounding */

    /// Ground a conjunctive condition. Returns `None` when a static literal
    /// is unsatisfiable; satisfied static literals are dropped.
    pub fn ground_conjunction(
        &self,
        literals: &[Negatable<AtomSchema>],
        binding: &[ObjectIndex],
    ) -> Option<GroundConjunction> {
        let mut conjunction = GroundConjunction::default();
        for literal in literals {
            let atom = literal.underlying().ground(binding);
            match self.problem.predicate_kind(atom.predicate) {
                PredicateKind::Fluent => {
                    let index = self.fluent_atom_index(atom);
                    if literal.is_negated() {
                        conjunction.negative_fluent.push(index);
                    } else {
                        conjunction.positive_fluent.push(index);
                    }
                }
                PredicateKind::Derived => {
                    let index = self.derived_atom_index(atom);
                    if literal.is_negated() {
                        conjunction.negative_derived.push(index);
                    } else {
                        conjunction.positive_derived.push(index);
                    }
                }
                PredicateKind::Static => {
                    if self.is_static_atom_true(&atom) == literal.is_negated() {
                        return None;
                    }
                }
            }
        }
        for list in [
            &mut conjunction.positive_fluent,
            &mut conjunction.negative_fluent,
            &mut conjunction.positive_derived,
            &mut conjunction.negative_derived,
        ] {
            list.sort_unstable();
            list.dedup();
        }
        Some(conjunction)
    }

    fn ground_effect_atoms(&self, atoms: &[AtomSchema], binding: &[ObjectIndex]) -> Vec<AtomIndex> {
        let mut indices: Vec<AtomIndex> = atoms
            .iter()
            .map(|schema| self.fluent_atom_index(schema.ground(binding)))
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// Instantiate an action schema. Returns `None` when the precondition is
    /// statically unsatisfiable. Repeated calls with the same binding return
    /// the same interned [`GroundAction`].
    pub fn ground_action(&self, schema_index: usize, binding: ObjectTuple) -> Option<GroundAction> {
        let existing = self
            .actions
            .lock()
            .unwrap()
            .index_of
            .get(&(schema_index, binding.clone()))
            .copied();
        if let Some(index) = existing {
            return Some(self.action(index));
        }

        let schema = &self.problem.action_schemas[schema_index];
        debug_assert_eq!(binding.len(), schema.parameters.len());

        let mut precondition = self.ground_conjunction(&schema.precondition, &binding)?;
        precondition
            .numeric_conditions
            .extend(schema.numeric_conditions.iter().cloned());

        let add_effects = self.ground_effect_atoms(&schema.add_effects, &binding);
        let delete_effects = self.ground_effect_atoms(&schema.delete_effects, &binding);

        let mut conditional_effects = Vec::new();
        for effect in &schema.conditional_effects {
            // A statically false condition can never fire.
            if let Some(condition) = self.ground_conjunction(&effect.condition, &binding) {
                conditional_effects.push(GroundConditionalEffect {
                    condition,
                    add_effects: self.ground_effect_atoms(&effect.add_effects, &binding),
                    delete_effects: self.ground_effect_atoms(&effect.delete_effects, &binding),
                });
            }
        }

        let mut registry = self.actions.lock().unwrap();
        if let Some(&index) = registry.index_of.get(&(schema_index, binding.clone())) {
            return Some(registry.actions[index as usize].clone());
        }
        let index = registry.actions.len() as ActionIndex;
        let action: GroundAction = Arc::new(GroundActionData {
            index,
            schema_index,
            binding: binding.clone(),
            precondition,
            add_effects,
            delete_effects,
            conditional_effects,
            numeric_effects: schema.numeric_effects.clone(),
            cost: schema.cost,
        });
        registry.index_of.insert((schema_index, binding), index);
        registry.actions.push(action.clone());
        Some(action)
    }

    pub fn action(&self, index: ActionIndex) -> GroundAction {
        self.actions.lock().unwrap().actions[index as usize].clone()
    }

    pub fn num_ground_actions(&self) -> usize {
        self.actions.lock().unwrap().actions.len()
    }

    pub fn all_ground_actions(&self) -> Vec<GroundAction> {
        self.actions.lock().unwrap().actions.clone()
    }

    /// Instantiate an axiom schema; `None` when statically unsatisfiable.
    pub fn ground_axiom(&self, schema_index: usize, binding: ObjectTuple) -> Option<GroundAxiom> {
        let existing = self
            .axioms
            .lock()
            .unwrap()
            .index_of
            .get(&(schema_index, binding.clone()))
            .copied();
        if let Some(index) = existing {
            return Some(self.axiom(index));
        }

        let schema = &self.problem.axiom_schemas[schema_index];
        debug_assert_eq!(binding.len(), schema.parameters.len());

        let body = self.ground_conjunction(&schema.body, &binding)?;
        let head = self.derived_atom_index(schema.head.ground(&binding));

        let mut registry = self.axioms.lock().unwrap();
        if let Some(&index) = registry.index_of.get(&(schema_index, binding.clone())) {
            return Some(registry.axioms[index as usize].clone());
        }
        let index = registry.axioms.len() as AxiomIndex;
        let axiom: GroundAxiom = Arc::new(GroundAxiomData {
            index,
            schema_index,
            binding: binding.clone(),
            head,
            body,
        });
        registry.index_of.insert((schema_index, binding), index);
        registry.axioms.push(axiom.clone());
        Some(axiom)
    }

    pub fn axiom(&self, index: AxiomIndex) -> GroundAxiom {
        self.axioms.lock().unwrap().axioms[index as usize].clone()
    }

    pub fn num_ground_axioms(&self) -> usize {
        self.axioms.lock().unwrap().axioms.len()
    }

    pub fn all_ground_axioms(&self) -> Vec<GroundAxiom> {
        self.axioms.lock().unwrap().axioms.clone()
    }

    /* Metric */

    #[inline(always)]
    pub fn has_metric(&self) -> bool {
        self.problem.metric.is_some()
    }

    /// Evaluate the metric expression on a numeric-variable vector. `None`
    /// when the problem declares no metric.
    pub fn evaluate_metric(&self, variables: &[OrderedFloat<f64>]) -> Option<f64> {
        self.problem
            .metric
            .as_ref()
            .map(|metric| metric.evaluate(variables))
    }
}
