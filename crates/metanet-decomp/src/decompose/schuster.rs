//! Connected-component decomposition after removing currency metabolites.
//!
//! Species such as ATP or water connect almost every reaction. Dropping every
//! species whose degree exceeds a threshold and taking the undirected
//! connected components of what remains yields pathway-like modules
//! (Schuster et al., 2002).

use std::collections::BTreeMap;

use metanet_core::model::MetabolicGraph;
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use tracing::debug;

use super::DecompositionStrategy;
use crate::subsystem::Subsystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchusterDecomposition {
    /// Species with more incident edges than this are treated as currency.
    pub degree_threshold: usize,
    /// Components with fewer reactions stay unclassified and fall through
    /// to the transporter and default subsystems.
    pub min_reactions: usize,
}

impl Default for SchusterDecomposition {
    fn default() -> Self {
        Self::new(8)
    }
}

impl SchusterDecomposition {
    /// Lone reactions are not reported as components.
    pub const DEFAULT_MIN_REACTIONS: usize = 2;

    #[must_use]
    pub const fn new(degree_threshold: usize) -> Self {
        Self {
            degree_threshold,
            min_reactions: Self::DEFAULT_MIN_REACTIONS,
        }
    }

    #[must_use]
    pub const fn with_min_reactions(mut self, min_reactions: usize) -> Self {
        self.min_reactions = min_reactions;
        self
    }
}

impl DecompositionStrategy for SchusterDecomposition {
    fn name(&self) -> &'static str {
        "schuster"
    }

    fn run_specific(&self, graph: &MetabolicGraph) -> Vec<Subsystem> {
        let is_currency =
            |idx| graph.is_species(idx) && graph.degree(idx) > self.degree_threshold;

        let mut components = UnionFind::<usize>::new(graph.node_count());
        for edge in graph.graph.edge_references() {
            if is_currency(edge.source()) || is_currency(edge.target()) {
                continue;
            }
            components.union(edge.source().index(), edge.target().index());
        }

        // Keyed by the smallest reaction index in the component.
        let mut groups: BTreeMap<usize, Vec<_>> = BTreeMap::new();
        let mut first_of_root: BTreeMap<usize, usize> = BTreeMap::new();
        for reaction in graph.reaction_nodes() {
            let root = components.find(reaction.index());
            let key = *first_of_root.entry(root).or_insert(reaction.index());
            groups.entry(key).or_default().push(reaction);
        }

        let subsystems: Vec<Subsystem> = groups
            .into_values()
            .filter(|reactions| reactions.len() >= self.min_reactions)
            .enumerate()
            .map(|(i, reactions)| {
                let mut subsystem = Subsystem::new(format!("Subsystem {}", i + 1));
                for reaction in reactions {
                    subsystem.add_reaction(reaction);
                    let incident = graph.in_edges(reaction).into_iter();
                    for edge in incident.chain(graph.out_edges(reaction)) {
                        let keep = graph
                            .edge_endpoints(edge)
                            .is_some_and(|(s, t)| !is_currency(s) && !is_currency(t));
                        if keep {
                            subsystem.add_edge_with_endpoints(graph, edge);
                        }
                    }
                }
                subsystem
            })
            .collect();

        debug!(
            threshold = self.degree_threshold,
            subsystems = subsystems.len(),
            "schuster decomposition"
        );
        subsystems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metanet_core::model::GraphBuilder;

    /// Two chains `a → R1 → b → R2 → c` and `x → R3 → y → R4 → z`, joined by
    /// `atp` consumed by all four reactions, plus an isolated `R5`.
    fn model() -> MetabolicGraph {
        let mut b = GraphBuilder::new();
        for s in ["a", "b", "c", "x", "y", "z", "atp", "q"] {
            b.add_species(s, None).expect("species");
        }
        for r in ["R1", "R2", "R3", "R4", "R5"] {
            b.add_reaction(r).expect("reaction");
        }
        for (s, r, p) in [("a", "R1", "b"), ("b", "R2", "c"), ("x", "R3", "y"), ("y", "R4", "z")] {
            b.add_substrate(s, r).expect("edge");
            b.add_product(r, p).expect("edge");
            b.add_substrate("atp", r).expect("edge");
        }
        b.add_substrate("q", "R5").expect("edge");
        b.build()
    }

    fn ids(graph: &MetabolicGraph, subsystem: &Subsystem) -> Vec<String> {
        subsystem
            .reactions()
            .iter()
            .map(|&r| graph.id_of(r).to_string())
            .collect()
    }

    #[test]
    fn currency_removal_separates_chains() {
        let graph = model();
        let subsystems = SchusterDecomposition::new(3).run_specific(&graph);
        assert_eq!(subsystems.len(), 2);
        assert_eq!(subsystems[0].name(), "Subsystem 1");
        assert_eq!(ids(&graph, &subsystems[0]), vec!["R1", "R2"]);
        assert_eq!(ids(&graph, &subsystems[1]), vec!["R3", "R4"]);

        let atp = graph.node_by_id("atp").expect("atp");
        for subsystem in &subsystems {
            assert!(!subsystem.species().contains(&atp));
            assert!(subsystem.is_closed(&graph));
        }
    }

    #[test]
    fn high_threshold_keeps_hub() {
        let graph = model();
        let subsystems = SchusterDecomposition::new(10).run_specific(&graph);
        assert_eq!(subsystems.len(), 1);
        assert_eq!(ids(&graph, &subsystems[0]), vec!["R1", "R2", "R3", "R4"]);
    }

    #[test]
    fn singleton_components_are_left_unclassified() {
        let graph = model();
        let r5 = graph.node_by_id("R5").expect("R5");
        let subsystems = SchusterDecomposition::default().run_specific(&graph);
        assert!(subsystems.iter().all(|s| !s.reactions().contains(&r5)));
    }

    #[test]
    fn lone_reactions_kept_when_minimum_is_one() {
        let graph = model();
        let r5 = graph.node_by_id("R5").expect("R5");
        let default = SchusterDecomposition::default().run_specific(&graph);
        let subsystems = SchusterDecomposition::default()
            .with_min_reactions(1)
            .run_specific(&graph);
        assert_eq!(subsystems.len(), default.len() + 1);
        let lone: Vec<_> = subsystems
            .iter()
            .filter(|s| s.reactions().contains(&r5))
            .collect();
        assert_eq!(lone.len(), 1);
        assert_eq!(lone[0].reaction_count(), 1);
    }
}
