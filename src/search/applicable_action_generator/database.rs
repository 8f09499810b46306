//! Minimal relational machinery for schema instantiation: per-predicate
//! tuple tables extracted from a state, selection against a schema atom, and
//! a hash join over shared parameters.

use crate::common::{AtomIndex, ObjectIndex, PredicateIndex};
use crate::formalism::{
    AtomSchema, Negatable, ObjectTuple, ProblemRepository, SchemaArgument, SchemaParameter,
};
use std::collections::{HashMap, HashSet, VecDeque};

/// A set of tuples together with the schema-parameter index each column binds.
#[derive(Debug, Clone)]
pub(crate) struct Table {
    pub tuples: Vec<ObjectTuple>,
    pub columns: Vec<usize>,
}

impl Table {
    /// The neutral element of the join: one empty tuple, no columns.
    fn unit() -> Self {
        Self {
            tuples: vec![ObjectTuple::new()],
            columns: vec![],
        }
    }
}

/// Join `t2` into `t1` on all shared parameter columns. Without shared
/// columns this degenerates to the cartesian product.
pub(crate) fn hash_join(t1: &mut Table, t2: &Table) {
    let matches: Vec<(usize, usize)> = t1
        .columns
        .iter()
        .enumerate()
        .filter_map(|(i, parameter)| {
            t2.columns
                .iter()
                .position(|other| other == parameter)
                .map(|j| (i, j))
        })
        .collect();

    if matches.is_empty() {
        t1.columns.extend(t2.columns.iter().copied());
        let mut product = Vec::new();
        for tuple1 in &t1.tuples {
            for tuple2 in &t2.tuples {
                let mut combined = tuple1.clone();
                combined.extend(tuple2.iter().copied());
                product.push(combined);
            }
        }
        t1.tuples = product;
        return;
    }

    let mut join_map: HashMap<Vec<ObjectIndex>, Vec<&ObjectTuple>> = HashMap::new();
    for tuple2 in &t2.tuples {
        let key: Vec<ObjectIndex> = matches.iter().map(|&(_, j)| tuple2[j]).collect();
        join_map.entry(key).or_default().push(tuple2);
    }

    let dropped: HashSet<usize> = matches.iter().map(|&(_, j)| j).collect();
    let kept_columns: Vec<usize> = t2
        .columns
        .iter()
        .enumerate()
        .filter(|(j, _)| !dropped.contains(j))
        .map(|(_, &column)| column)
        .collect();

    let mut joined = Vec::new();
    for tuple1 in &t1.tuples {
        let key: Vec<ObjectIndex> = matches.iter().map(|&(i, _)| tuple1[i]).collect();
        if let Some(partners) = join_map.get(&key) {
            for tuple2 in partners {
                let mut combined = tuple1.clone();
                combined.extend(
                    tuple2
                        .iter()
                        .enumerate()
                        .filter(|(j, _)| !dropped.contains(j))
                        .map(|(_, &value)| value),
                );
                joined.push(combined);
            }
        }
    }
    t1.columns.extend(kept_columns);
    t1.tuples = joined;
}

/// The ground tuples of every predicate true in a state, plus the static
/// atoms. Built once per instantiation query.
#[derive(Debug)]
pub(crate) struct StateAtomTables {
    by_predicate: HashMap<PredicateIndex, Vec<ObjectTuple>>,
}

impl StateAtomTables {
    pub fn new(
        repository: &ProblemRepository,
        fluent_atoms: &[AtomIndex],
        derived_atoms: &[AtomIndex],
    ) -> Self {
        let mut by_predicate: HashMap<PredicateIndex, Vec<ObjectTuple>> = HashMap::new();
        for &index in fluent_atoms {
            let atom = repository.fluent_atom(index);
            by_predicate
                .entry(atom.predicate)
                .or_default()
                .push(atom.arguments);
        }
        for &index in derived_atoms {
            let atom = repository.derived_atom(index);
            by_predicate
                .entry(atom.predicate)
                .or_default()
                .push(atom.arguments);
        }
        for atom in repository.static_atoms() {
            by_predicate
                .entry(atom.predicate)
                .or_default()
                .push(atom.arguments.clone());
        }
        Self { by_predicate }
    }

    fn tuples_of(&self, predicate: PredicateIndex) -> &[ObjectTuple] {
        self.by_predicate
            .get(&predicate)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Precompiled join program of one conjunctive condition.
#[derive(Debug)]
pub(crate) struct SchemaConditionData {
    pub num_parameters: usize,
    /// Positive condition atoms that mention at least one parameter; these
    /// drive the join. Parameter-free and negative literals are checked after
    /// grounding.
    pub join_atoms: Vec<AtomSchema>,
    /// Type-consistent objects per parameter, sorted for determinism.
    pub objects_per_parameter: Vec<Vec<ObjectIndex>>,
}

pub(crate) fn precompile_condition(
    repository: &ProblemRepository,
    parameters: &[SchemaParameter],
    literals: &[Negatable<AtomSchema>],
) -> SchemaConditionData {
    let join_atoms = literals
        .iter()
        .filter(|literal| {
            !literal.is_negated()
                && literal
                    .underlying()
                    .arguments
                    .iter()
                    .any(|argument| matches!(argument, SchemaArgument::Parameter(_)))
        })
        .map(|literal| literal.underlying().clone())
        .collect();

    let objects_per_parameter = parameters
        .iter()
        .map(|parameter| repository.objects_of_type(parameter.parameter_type).to_vec())
        .collect();

    SchemaConditionData {
        num_parameters: parameters.len(),
        join_atoms,
        objects_per_parameter,
    }
}

/// Tuples of the state matching the schema atom, projected onto its distinct
/// parameters (first-occurrence order).
fn select_tuples(
    atom: &AtomSchema,
    tables: &StateAtomTables,
    objects_per_parameter: &[Vec<ObjectIndex>],
) -> Table {
    let mut columns: Vec<usize> = Vec::new();
    for argument in &atom.arguments {
        if let SchemaArgument::Parameter(parameter) = argument {
            if !columns.contains(parameter) {
                columns.push(*parameter);
            }
        }
    }

    let mut tuples = Vec::new();
    'tuples: for tuple in tables.tuples_of(atom.predicate) {
        debug_assert_eq!(tuple.len(), atom.arguments.len());
        let mut bound: HashMap<usize, ObjectIndex> = HashMap::new();
        for (position, argument) in atom.arguments.iter().enumerate() {
            let value = tuple[position];
            match argument {
                SchemaArgument::Constant(object) => {
                    if value != *object {
                        continue 'tuples;
                    }
                }
                SchemaArgument::Parameter(parameter) => {
                    if let Some(&previous) = bound.get(parameter) {
                        if previous != value {
                            continue 'tuples;
                        }
                    } else {
                        if objects_per_parameter[*parameter].binary_search(&value).is_err() {
                            continue 'tuples;
                        }
                        bound.insert(*parameter, value);
                    }
                }
            }
        }
        tuples.push(columns.iter().map(|parameter| bound[parameter]).collect());
    }

    Table { tuples, columns }
}

/// Enumerate every parameter binding consistent with the positive condition
/// atoms. Parameters not constrained by any join atom range over all objects
/// of their type. The result is a list of complete bindings in parameter
/// order.
pub(crate) fn instantiate_bindings(
    data: &SchemaConditionData,
    tables: &StateAtomTables,
) -> Vec<ObjectTuple> {
    if data.num_parameters == 0 {
        return vec![ObjectTuple::new()];
    }

    let mut join_tables: VecDeque<Table> = VecDeque::new();
    for atom in &data.join_atoms {
        let table = select_tuples(atom, tables, &data.objects_per_parameter);
        if table.tuples.is_empty() {
            return vec![];
        }
        join_tables.push_back(table);
    }

    let mut working = join_tables.pop_front().unwrap_or_else(Table::unit);
    while let Some(table) = join_tables.pop_front() {
        hash_join(&mut working, &table);
        if working.tuples.is_empty() {
            return vec![];
        }
    }

    // Unconstrained parameters range over all type-consistent objects.
    for parameter in 0..data.num_parameters {
        if working.columns.contains(&parameter) {
            continue;
        }
        let objects = &data.objects_per_parameter[parameter];
        if objects.is_empty() {
            return vec![];
        }
        working.columns.push(parameter);
        let mut extended = Vec::with_capacity(working.tuples.len() * objects.len());
        for tuple in &working.tuples {
            for &object in objects {
                let mut combined = tuple.clone();
                combined.push(object);
                extended.push(combined);
            }
        }
        working.tuples = extended;
    }

    let column_of: Vec<usize> = (0..data.num_parameters)
        .map(|parameter| {
            working
                .columns
                .iter()
                .position(|&bound| bound == parameter)
                .expect("every parameter is bound after extension")
        })
        .collect();

    let mut bindings: Vec<ObjectTuple> = working
        .tuples
        .iter()
        .map(|tuple| column_of.iter().map(|&column| tuple[column]).collect())
        .collect();
    // A join whose overlap covers a whole table can replicate rows.
    bindings.sort_unstable();
    bindings.dedup();
    bindings
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn hash_join_on_shared_column() {
        let mut t1 = Table {
            tuples: vec![
                smallvec![1, 2],
                smallvec![1, 4],
                smallvec![3, 2],
            ],
            columns: vec![0, 1],
        };
        let t2 = Table {
            tuples: vec![smallvec![2, 5], smallvec![2, 7], smallvec![9, 9]],
            columns: vec![1, 2],
        };
        hash_join(&mut t1, &t2);
        assert_eq!(t1.columns, vec![0, 1, 2]);
        let expected: Vec<ObjectTuple> = vec![
            smallvec![1, 2, 5],
            smallvec![1, 2, 7],
            smallvec![3, 2, 5],
            smallvec![3, 2, 7],
        ];
        assert_eq!(t1.tuples, expected);
    }

    #[test]
    fn hash_join_without_shared_columns_is_cartesian() {
        let mut t1 = Table {
            tuples: vec![smallvec![1], smallvec![2]],
            columns: vec![0],
        };
        let t2 = Table {
            tuples: vec![smallvec![7], smallvec![8]],
            columns: vec![1],
        };
        hash_join(&mut t1, &t2);
        assert_eq!(t1.columns, vec![0, 1]);
        assert_eq!(t1.tuples.len(), 4);
    }
}
