use crate::error::SearchError;
use internment::Intern;
use petgraph::graph::DiGraph;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};

/// A directed graph with `i32` vertex colours and `i32` edge labels, the
/// shape every canonicalization consumer works on.
pub type ColouredDigraph = DiGraph<i32, i32, u32>;

/// Opaque byte sequence identifying the isomorphism class of a labelled
/// graph. Interned: certificates are hashed and compared constantly across
/// the symmetry maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Certificate(Intern<Vec<u8>>);

impl Certificate {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Intern::new(bytes))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

/// The sole contract: isomorphic labelled digraphs receive equal
/// certificates. (The converse may not hold for every implementation; a
/// Nauty-style kernel provides it, the colour-refinement fallback does not in
/// full generality.)
pub trait CanonicalGraphOracle: Debug + Send + Sync {
    fn certificate_bytes(&self, graph: &ColouredDigraph) -> Vec<u8>;
}

fn hash_one<T: Hash>(value: &T) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Iterated colour refinement (1-WL on directed labelled graphs). Every
/// round rehashes each vertex with the sorted multisets of its in- and
/// out-neighbour colours; the certificate serializes the stable colour
/// partition together with the colour-typed edge profile, both
/// order-invariant.
#[derive(Debug, Default, Clone, Copy)]
pub struct ColourRefinementOracle;

impl ColourRefinementOracle {
    pub fn new() -> Self {
        Self
    }

    fn refine(&self, graph: &ColouredDigraph) -> Vec<u64> {
        let mut colours: Vec<u64> = graph
            .node_indices()
            .map(|vertex| hash_one(&(0u8, graph[vertex])))
            .collect();

        let num_vertices = graph.node_count();
        let mut num_classes = count_classes(&colours);
        for _ in 0..num_vertices {
            let next: Vec<u64> = graph
                .node_indices()
                .map(|vertex| {
                    let mut outgoing: Vec<(i32, u64)> = graph
                        .edges_directed(vertex, Direction::Outgoing)
                        .map(|edge| (*edge.weight(), colours[edge.target().index()]))
                        .collect();
                    outgoing.sort_unstable();
                    let mut incoming: Vec<(i32, u64)> = graph
                        .edges_directed(vertex, Direction::Incoming)
                        .map(|edge| (*edge.weight(), colours[edge.source().index()]))
                        .collect();
                    incoming.sort_unstable();
                    hash_one(&(colours[vertex.index()], outgoing, incoming))
                })
                .collect();
            colours = next;

            let next_num_classes = count_classes(&colours);
            if next_num_classes == num_classes {
                break;
            }
            num_classes = next_num_classes;
        }
        colours
    }
}

fn count_classes(colours: &[u64]) -> usize {
    let mut sorted = colours.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}

impl CanonicalGraphOracle for ColourRefinementOracle {
    fn certificate_bytes(&self, graph: &ColouredDigraph) -> Vec<u8> {
        let colours = self.refine(graph);

        let mut vertex_profile = colours.clone();
        vertex_profile.sort_unstable();

        let mut edge_profile: Vec<(u64, i32, u64)> = graph
            .edge_references()
            .map(|edge| {
                (
                    colours[edge.source().index()],
                    *edge.weight(),
                    colours[edge.target().index()],
                )
            })
            .collect();
        edge_profile.sort_unstable();

        let mut bytes = Vec::with_capacity(16 + vertex_profile.len() * 8 + edge_profile.len() * 20);
        bytes.extend((graph.node_count() as u64).to_le_bytes());
        bytes.extend((graph.edge_count() as u64).to_le_bytes());
        for colour in vertex_profile {
            bytes.extend(colour.to_le_bytes());
        }
        for (source, label, target) in edge_profile {
            bytes.extend(source.to_le_bytes());
            bytes.extend(label.to_le_bytes());
            bytes.extend(target.to_le_bytes());
        }
        bytes
    }
}

/// One graph paired with its canonicalization state. Permutation queries
/// before [`CanonicalForm::canonize`] are programmer errors.
#[derive(Debug)]
pub struct CanonicalForm {
    graph: ColouredDigraph,
    certificate: Option<Certificate>,
    canonical_ordering: Option<Vec<usize>>,
}

impl CanonicalForm {
    pub fn new(graph: ColouredDigraph) -> Self {
        Self {
            graph,
            certificate: None,
            canonical_ordering: None,
        }
    }

    pub fn graph(&self) -> &ColouredDigraph {
        &self.graph
    }

    /// Compute the certificate, appending the sorted vertex-colour sequence
    /// to the oracle's bytes to disambiguate colour multisets.
    pub fn canonize(&mut self, oracle: &dyn CanonicalGraphOracle) -> Certificate {
        if let Some(certificate) = self.certificate {
            return certificate;
        }
        let mut bytes = oracle.certificate_bytes(&self.graph);
        let mut sorted_colours: Vec<i32> = self.graph.node_weights().copied().collect();
        sorted_colours.sort_unstable();
        for colour in &sorted_colours {
            bytes.extend(colour.to_le_bytes());
        }

        // Order vertices by input colour; ties keep the input order.
        let mut ordering: Vec<usize> = (0..self.graph.node_count()).collect();
        ordering.sort_by_key(|&vertex| self.graph[petgraph::graph::NodeIndex::new(vertex)]);

        let certificate = Certificate::new(bytes);
        self.certificate = Some(certificate);
        self.canonical_ordering = Some(ordering);
        certificate
    }

    /// The vertex ordering chosen at canonization time.
    pub fn canonical_ordering(&self) -> Result<&[usize], SearchError> {
        self.canonical_ordering
            .as_deref()
            .ok_or(SearchError::CanonizeBeforeQuery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_graph(colours: &[i32]) -> ColouredDigraph {
        let mut graph = ColouredDigraph::new();
        let nodes: Vec<_> = colours.iter().map(|&colour| graph.add_node(colour)).collect();
        for pair in nodes.windows(2) {
            graph.add_edge(pair[0], pair[1], 0);
        }
        graph
    }

    #[test]
    fn isomorphic_graphs_share_certificates() {
        let oracle = ColourRefinementOracle::new();
        // Same path, vertices inserted in reverse with reversed edges.
        let forward = path_graph(&[1, 2, 3]);
        let mut backward = ColouredDigraph::new();
        let c = backward.add_node(3);
        let b = backward.add_node(2);
        let a = backward.add_node(1);
        backward.add_edge(a, b, 0);
        backward.add_edge(b, c, 0);
        assert_eq!(
            oracle.certificate_bytes(&forward),
            oracle.certificate_bytes(&backward)
        );
    }

    #[test]
    fn colour_changes_the_certificate() {
        let oracle = ColourRefinementOracle::new();
        assert_ne!(
            oracle.certificate_bytes(&path_graph(&[1, 2, 3])),
            oracle.certificate_bytes(&path_graph(&[1, 2, 4]))
        );
    }

    #[test]
    fn edge_direction_changes_the_certificate() {
        let oracle = ColourRefinementOracle::new();
        let mut forward = ColouredDigraph::new();
        let a = forward.add_node(1);
        let b = forward.add_node(1);
        forward.add_edge(a, b, 7);
        let mut labelled = ColouredDigraph::new();
        let a = labelled.add_node(1);
        let b = labelled.add_node(1);
        labelled.add_edge(a, b, 8);
        assert_ne!(
            oracle.certificate_bytes(&forward),
            oracle.certificate_bytes(&labelled)
        );
    }

    #[test]
    fn ordering_requires_canonization() {
        let mut form = CanonicalForm::new(path_graph(&[2, 1]));
        assert_eq!(
            form.canonical_ordering().unwrap_err(),
            SearchError::CanonizeBeforeQuery
        );
        form.canonize(&ColourRefinementOracle::new());
        assert_eq!(form.canonical_ordering().unwrap(), &[1, 0]);
    }
}
