//! Shared fixture problems for the test suite, built programmatically since
//! the core contains no parser.

use crate::formalism::{
    ActionSchema, AtomSchema, AxiomSchema, Comparator, FunctionExpression, GoalLiteral, GroundAtom,
    Negatable, NumericCondition, NumericEffect, NumericEffectKind, Object, Predicate,
    PredicateKind, Problem, SchemaArgument, SchemaParameter,
};
use smallvec::smallvec;

/// Classic gripper: a robot with two grippers moves balls from room A to
/// room B. Types: 0 = room, 1 = ball, 2 = gripper. Objects: 0 = roomA,
/// 1 = roomB, 2 = left, 3 = right, 4.. = balls. Predicates: 0 = at-robby(r),
/// 1 = at(b, r), 2 = free(g), 3 = carry(b, g).
pub fn gripper_problem(num_balls: usize) -> Problem {
    let types = vec!["room".to_string(), "ball".to_string(), "gripper".to_string()];
    let mut objects = vec![
        Object::new("roomA", vec![0]),
        Object::new("roomB", vec![0]),
        Object::new("left", vec![2]),
        Object::new("right", vec![2]),
    ];
    for ball in 0..num_balls {
        objects.push(Object::new(format!("ball{ball}"), vec![1]));
    }

    let predicates = vec![
        Predicate::new("at-robby", vec![0], PredicateKind::Fluent),
        Predicate::new("at", vec![1, 0], PredicateKind::Fluent),
        Predicate::new("free", vec![2], PredicateKind::Fluent),
        Predicate::new("carry", vec![1, 2], PredicateKind::Fluent),
    ];

    let move_schema = ActionSchema {
        name: "move".to_string(),
        parameters: vec![
            SchemaParameter::new("from", 0),
            SchemaParameter::new("to", 0),
        ],
        precondition: vec![Negatable::Positive(AtomSchema::over_parameters(0, &[0]))],
        numeric_conditions: vec![],
        add_effects: vec![AtomSchema::over_parameters(0, &[1])],
        delete_effects: vec![AtomSchema::over_parameters(0, &[0])],
        conditional_effects: vec![],
        numeric_effects: vec![],
        cost: 1.0,
    };
    let pick_schema = ActionSchema {
        name: "pick".to_string(),
        parameters: vec![
            SchemaParameter::new("ball", 1),
            SchemaParameter::new("room", 0),
            SchemaParameter::new("gripper", 2),
        ],
        precondition: vec![
            Negatable::Positive(AtomSchema::over_parameters(1, &[0, 1])),
            Negatable::Positive(AtomSchema::over_parameters(0, &[1])),
            Negatable::Positive(AtomSchema::over_parameters(2, &[2])),
        ],
        numeric_conditions: vec![],
        add_effects: vec![AtomSchema::over_parameters(3, &[0, 2])],
        delete_effects: vec![
            AtomSchema::over_parameters(1, &[0, 1]),
            AtomSchema::over_parameters(2, &[2]),
        ],
        conditional_effects: vec![],
        numeric_effects: vec![],
        cost: 1.0,
    };
    let drop_schema = ActionSchema {
        name: "drop".to_string(),
        parameters: vec![
            SchemaParameter::new("ball", 1),
            SchemaParameter::new("room", 0),
            SchemaParameter::new("gripper", 2),
        ],
        precondition: vec![
            Negatable::Positive(AtomSchema::over_parameters(3, &[0, 2])),
            Negatable::Positive(AtomSchema::over_parameters(0, &[1])),
        ],
        numeric_conditions: vec![],
        add_effects: vec![
            AtomSchema::over_parameters(1, &[0, 1]),
            AtomSchema::over_parameters(2, &[2]),
        ],
        delete_effects: vec![AtomSchema::over_parameters(3, &[0, 2])],
        conditional_effects: vec![],
        numeric_effects: vec![],
        cost: 1.0,
    };

    let mut initial_fluent_atoms = vec![
        GroundAtom::new(0, smallvec![0]),
        GroundAtom::new(2, smallvec![2]),
        GroundAtom::new(2, smallvec![3]),
    ];
    let mut goal = vec![];
    for ball in 0..num_balls {
        let ball_object = (4 + ball) as u32;
        initial_fluent_atoms.push(GroundAtom::new(1, smallvec![ball_object, 0]));
        goal.push(GoalLiteral::positive(GroundAtom::new(
            1,
            smallvec![ball_object, 1],
        )));
    }

    Problem {
        name: format!("gripper-{num_balls}"),
        types,
        objects,
        predicates,
        functions: vec![],
        action_schemas: vec![move_schema, pick_schema, drop_schema],
        axiom_schemas: vec![],
        initial_fluent_atoms,
        initial_static_atoms: vec![],
        initial_numeric_values: vec![],
        goal,
        numeric_goal: vec![],
        metric: None,
    }
}

/// A directed line of `length + 1` nodes with static adjacency; one token
/// walks from node 0 to the last node. The optimal plan has `length` steps.
/// Predicates: 0 = at(n) fluent, 1 = connected(n, n') static.
pub fn chain_problem(length: usize) -> Problem {
    let types = vec!["node".to_string()];
    let objects = (0..=length)
        .map(|node| Object::new(format!("n{node}"), vec![0]))
        .collect();
    let predicates = vec![
        Predicate::new("at", vec![0], PredicateKind::Fluent),
        Predicate::new("connected", vec![0, 0], PredicateKind::Static),
    ];

    let step_schema = ActionSchema {
        name: "step".to_string(),
        parameters: vec![
            SchemaParameter::new("from", 0),
            SchemaParameter::new("to", 0),
        ],
        precondition: vec![
            Negatable::Positive(AtomSchema::over_parameters(0, &[0])),
            Negatable::Positive(AtomSchema::over_parameters(1, &[0, 1])),
        ],
        numeric_conditions: vec![],
        add_effects: vec![AtomSchema::over_parameters(0, &[1])],
        delete_effects: vec![AtomSchema::over_parameters(0, &[0])],
        conditional_effects: vec![],
        numeric_effects: vec![],
        cost: 1.0,
    };

    let initial_static_atoms = (0..length)
        .map(|node| GroundAtom::new(1, smallvec![node as u32, node as u32 + 1]))
        .collect();

    Problem {
        name: format!("chain-{length}"),
        types,
        objects,
        predicates,
        functions: vec![],
        action_schemas: vec![step_schema],
        axiom_schemas: vec![],
        initial_fluent_atoms: vec![GroundAtom::new(0, smallvec![0])],
        initial_static_atoms,
        initial_numeric_values: vec![],
        goal: vec![GoalLiteral::positive(GroundAtom::new(
            0,
            smallvec![length as u32],
        ))],
        numeric_goal: vec![],
        metric: None,
    }
}

/// A diamond with one cheap and one expensive route: s → b → g costs 2,
/// s → a → g costs 10. Predicates: 0 = at(n) fluent, 1 = cheap(n, n')
/// static, 2 = expensive(n, n') static. Objects: 0 = s, 1 = a, 2 = b, 3 = g.
pub fn diamond_problem() -> Problem {
    let types = vec!["node".to_string()];
    let objects = ["s", "a", "b", "g"]
        .iter()
        .map(|name| Object::new(*name, vec![0]))
        .collect();
    let predicates = vec![
        Predicate::new("at", vec![0], PredicateKind::Fluent),
        Predicate::new("cheap", vec![0, 0], PredicateKind::Static),
        Predicate::new("expensive", vec![0, 0], PredicateKind::Static),
    ];

    let walk = |name: &str, edge_predicate: u32, cost: f64| ActionSchema {
        name: name.to_string(),
        parameters: vec![
            SchemaParameter::new("from", 0),
            SchemaParameter::new("to", 0),
        ],
        precondition: vec![
            Negatable::Positive(AtomSchema::over_parameters(0, &[0])),
            Negatable::Positive(AtomSchema::over_parameters(edge_predicate, &[0, 1])),
        ],
        numeric_conditions: vec![],
        add_effects: vec![AtomSchema::over_parameters(0, &[1])],
        delete_effects: vec![AtomSchema::over_parameters(0, &[0])],
        conditional_effects: vec![],
        numeric_effects: vec![],
        cost,
    };

    Problem {
        name: "diamond".to_string(),
        types,
        objects,
        predicates,
        functions: vec![],
        action_schemas: vec![walk("walk", 1, 1.0), walk("trudge", 2, 5.0)],
        axiom_schemas: vec![],
        initial_fluent_atoms: vec![GroundAtom::new(0, smallvec![0])],
        initial_static_atoms: vec![
            GroundAtom::new(1, smallvec![0, 2]),
            GroundAtom::new(1, smallvec![2, 3]),
            GroundAtom::new(2, smallvec![0, 1]),
            GroundAtom::new(2, smallvec![1, 3]),
        ],
        initial_numeric_values: vec![],
        goal: vec![GoalLiteral::positive(GroundAtom::new(0, smallvec![3]))],
        numeric_goal: vec![],
        metric: None,
    }
}

/// One numeric counter incremented towards a target value. The nullary
/// `tick` predicate keeps the lifted machinery exercised.
pub fn counters_problem(target: f64) -> Problem {
    let increment = ActionSchema {
        name: "increment".to_string(),
        parameters: vec![],
        precondition: vec![Negatable::Positive(AtomSchema::new(0, smallvec![]))],
        numeric_conditions: vec![NumericCondition::new(
            FunctionExpression::Variable(0),
            Comparator::Less,
            FunctionExpression::Constant(target),
        )],
        add_effects: vec![],
        delete_effects: vec![],
        conditional_effects: vec![],
        numeric_effects: vec![NumericEffect::new(
            NumericEffectKind::Increase,
            0,
            FunctionExpression::Constant(1.0),
        )],
        cost: 1.0,
    };

    Problem {
        name: "counters".to_string(),
        types: vec![],
        objects: vec![],
        predicates: vec![Predicate::new("ready", vec![], PredicateKind::Fluent)],
        functions: vec!["counter".to_string()],
        action_schemas: vec![increment],
        axiom_schemas: vec![],
        initial_fluent_atoms: vec![GroundAtom::new(0, smallvec![])],
        initial_static_atoms: vec![],
        initial_numeric_values: vec![0.0],
        goal: vec![],
        numeric_goal: vec![NumericCondition::new(
            FunctionExpression::Variable(0),
            Comparator::GreaterEqual,
            FunctionExpression::Constant(target),
        )],
        metric: None,
    }
}

/// A counter whose single action divides the metric variable by zero, so the
/// metric of every successor evaluates to NaN.
pub fn nan_metric_problem() -> Problem {
    let mut problem = counters_problem(3.0);
    problem.name = "nan-metric".to_string();
    problem.metric = Some(FunctionExpression::Variable(0));
    problem.action_schemas[0].numeric_effects = vec![NumericEffect::new(
        NumericEffectKind::ScaleDown,
        0,
        FunctionExpression::Constant(0.0),
    )];
    problem
}

/// Blocks with a derived transitive `above` relation. Predicates:
/// 0 = on(x, y) fluent, 1 = above(x, y) derived. Objects: 0 = a, 1 = b,
/// 2 = c. Initially on(a, b) and on(b, c); `unstack` removes on(a, b).
pub fn tower_problem() -> Problem {
    let types = vec!["block".to_string()];
    let objects = ["a", "b", "c"]
        .iter()
        .map(|name| Object::new(*name, vec![0]))
        .collect();
    let predicates = vec![
        Predicate::new("on", vec![0, 0], PredicateKind::Fluent),
        Predicate::new("above", vec![0, 0], PredicateKind::Derived),
    ];

    let direct = AxiomSchema {
        parameters: vec![
            SchemaParameter::new("x", 0),
            SchemaParameter::new("y", 0),
        ],
        head: AtomSchema::over_parameters(1, &[0, 1]),
        body: vec![Negatable::Positive(AtomSchema::over_parameters(0, &[0, 1]))],
    };
    let transitive = AxiomSchema {
        parameters: vec![
            SchemaParameter::new("x", 0),
            SchemaParameter::new("y", 0),
            SchemaParameter::new("z", 0),
        ],
        head: AtomSchema::over_parameters(1, &[0, 1]),
        body: vec![
            Negatable::Positive(AtomSchema::over_parameters(0, &[0, 2])),
            Negatable::Positive(AtomSchema::over_parameters(1, &[2, 1])),
        ],
    };

    let unstack = ActionSchema {
        name: "unstack".to_string(),
        parameters: vec![],
        precondition: vec![Negatable::Positive(AtomSchema::new(
            0,
            smallvec![SchemaArgument::Constant(0), SchemaArgument::Constant(1)],
        ))],
        numeric_conditions: vec![],
        add_effects: vec![],
        delete_effects: vec![AtomSchema::new(
            0,
            smallvec![SchemaArgument::Constant(0), SchemaArgument::Constant(1)],
        )],
        conditional_effects: vec![],
        numeric_effects: vec![],
        cost: 1.0,
    };

    Problem {
        name: "tower".to_string(),
        types,
        objects,
        predicates,
        functions: vec![],
        action_schemas: vec![unstack],
        axiom_schemas: vec![direct, transitive],
        initial_fluent_atoms: vec![
            GroundAtom::new(0, smallvec![0, 1]),
            GroundAtom::new(0, smallvec![1, 2]),
        ],
        initial_static_atoms: vec![],
        initial_numeric_values: vec![],
        goal: vec![GoalLiteral::positive(GroundAtom::new(1, smallvec![0, 2]))],
        numeric_goal: vec![],
        metric: None,
    }
}
