//! Species cloning.
//!
//! Highly connected metabolites (water, ATP, protons) glue otherwise
//! unrelated reactions together. Cloning splits such a species into one
//! working copy per incident edge so that component- and attribute-based
//! decompositions are not dominated by them.
//!
//! Cloning never mutates its input: it returns a new [`MetabolicGraph`] in
//! which all pre-existing node indices are preserved and clones are appended.

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::{
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};
use tracing::{debug, instrument};

use crate::error::ModelError;
use crate::model::graph::{MetabolicGraph, ModelEdge, ModelNode};

/// Preprocessing collaborator that splits species into working copies.
///
/// Implementations are injected into the session; strategies that need
/// cloning fail when none is installed.
pub trait SpeciesCloner {
    /// Produce a cloned copy of `graph`.
    ///
    /// # Errors
    ///
    /// Implementation-specific; the built-in cloner never fails.
    fn clone_species(&self, graph: &MetabolicGraph) -> Result<MetabolicGraph, ModelError>;
}

/// Clones species whose degree reaches a threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegreeThresholdCloner {
    /// Species identifiers eligible for cloning. Empty means every species.
    pub clonable: BTreeSet<String>,
    /// Minimum number of incident edges for a species to be cloned.
    pub threshold: usize,
}

impl Default for DegreeThresholdCloner {
    fn default() -> Self {
        Self {
            clonable: BTreeSet::new(),
            threshold: 8,
        }
    }
}

impl DegreeThresholdCloner {
    #[must_use]
    pub fn new(clonable: impl IntoIterator<Item = String>, threshold: usize) -> Self {
        Self {
            clonable: clonable.into_iter().collect(),
            threshold,
        }
    }

    fn qualifies(&self, graph: &MetabolicGraph, idx: NodeIndex) -> bool {
        graph.is_species(idx)
            && (self.clonable.is_empty() || self.clonable.contains(graph.id_of(idx)))
            && graph.degree(idx) >= self.threshold.max(2)
    }
}

impl SpeciesCloner for DegreeThresholdCloner {
    #[instrument(skip_all, fields(threshold = self.threshold))]
    fn clone_species(&self, graph: &MetabolicGraph) -> Result<MetabolicGraph, ModelError> {
        let targets: HashSet<NodeIndex> = graph
            .species_nodes()
            .filter(|&idx| self.qualifies(graph, idx))
            .collect();

        let mut out: DiGraph<ModelNode, ModelEdge> =
            DiGraph::with_capacity(graph.node_count(), graph.edge_count());
        for idx in graph.graph.node_indices() {
            out.add_node(graph.graph[idx].clone());
        }

        let mut original_of: HashMap<NodeIndex, NodeIndex> = graph
            .graph
            .node_indices()
            .filter(|&idx| graph.is_clone(idx))
            .map(|idx| (idx, graph.original_of(idx)))
            .collect();

        // The first incident edge keeps the species itself; later ones get a copy.
        let mut attached: HashSet<NodeIndex> = HashSet::new();
        for edge in graph.graph.edge_references() {
            let (mut source, mut target) = (edge.source(), edge.target());
            let species = if graph.is_species(source) { source } else { target };

            if targets.contains(&species) && !attached.insert(species) {
                let copy = out.add_node(graph.graph[species].clone());
                original_of.insert(copy, graph.original_of(species));
                if species == source {
                    source = copy;
                } else {
                    target = copy;
                }
            }
            out.add_edge(source, target, edge.weight().clone());
        }

        let cloned = MetabolicGraph::from_parts(out, original_of);
        debug!(
            species = targets.len(),
            clones = cloned.clone_count() - graph.clone_count(),
            "species cloned"
        );
        Ok(cloned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::graph::GraphBuilder;

    /// `atp` is consumed by R1, R2 and R3; `x` only by R1.
    fn hub_model() -> MetabolicGraph {
        let mut b = GraphBuilder::new();
        b.add_species("atp", Some("c")).expect("atp");
        b.add_species("x", Some("c")).expect("x");
        for r in ["R1", "R2", "R3"] {
            b.add_reaction(r).expect("reaction");
            b.add_substrate("atp", r).expect("edge");
        }
        b.add_substrate("x", "R1").expect("edge");
        b.build()
    }

    #[test]
    fn hub_species_is_split_per_edge() {
        let graph = hub_model();
        let cloner = DegreeThresholdCloner::new(Vec::new(), 3);
        let cloned = cloner.clone_species(&graph).expect("clone");

        let atp = graph.node_by_id("atp").expect("atp");
        assert_eq!(cloned.node_count(), graph.node_count() + 2);
        assert_eq!(cloned.edge_count(), graph.edge_count());
        assert_eq!(cloned.clone_count(), 2);
        assert_eq!(cloned.degree(atp), 1);

        let copies: Vec<NodeIndex> = cloned
            .species_nodes()
            .filter(|&idx| cloned.is_clone(idx))
            .collect();
        assert_eq!(copies.len(), 2);
        for copy in copies {
            assert_eq!(cloned.original_of(copy), atp);
            assert_eq!(cloned.id_of(copy), "atp");
            assert_eq!(cloned.degree(copy), 1);
            assert_eq!(cloned.compartment(copy), Some("c"));
        }
        // Lookup by id still resolves to the original node.
        assert_eq!(cloned.node_by_id("atp"), Some(atp));
        assert_eq!(cloned.original_species_nodes().count(), 2);
    }

    #[test]
    fn species_below_threshold_untouched() {
        let graph = hub_model();
        let cloner = DegreeThresholdCloner::new(Vec::new(), 4);
        let cloned = cloner.clone_species(&graph).expect("clone");
        assert_eq!(cloned.node_count(), graph.node_count());
        assert_eq!(cloned.clone_count(), 0);
        assert_eq!(cloned.content_hash, graph.content_hash);
    }

    #[test]
    fn clonable_list_restricts_candidates() {
        let graph = hub_model();
        let cloner = DegreeThresholdCloner::new(vec!["x".to_string()], 1);
        let cloned = cloner.clone_species(&graph).expect("clone");
        // `x` has a single edge so there is nothing to split; `atp` is not listed.
        assert_eq!(cloned.clone_count(), 0);
    }

    #[test]
    fn existing_indices_preserved() {
        let graph = hub_model();
        let cloned = DegreeThresholdCloner::new(Vec::new(), 2)
            .clone_species(&graph)
            .expect("clone");
        for idx in graph.graph.node_indices() {
            assert_eq!(graph.graph[idx], cloned.graph[idx]);
        }
    }
}
