//! Subsystem-level overview graph.
//!
//! # Overview
//!
//! One node per subsystem; one undirected edge per pair of subsystems that
//! exchange at least one metabolite.
//!
//! ## Interfaces
//!
//! ```text
//! R_a (in S1) ──▶ m ──▶ R_b (in S2)      m ∈ interfaces(S1 → S2)
//! ```
//!
//! For every species `m` of the working graph, the subsystems of its
//! producing reactions form `in`, those of its consuming reactions form
//! `out`. Every `(a, b) ∈ in × out` with `a ≠ b` records `m` as an interface
//! from `a` to `b`. The edge between `S1` and `S2` carries
//! `interfaces(S1 → S2)` followed by `interfaces(S2 → S1)`, so a species that
//! bridges in both directions appears twice.

use std::collections::{BTreeSet, HashMap};

use metanet_core::model::MetabolicGraph;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::subsystem::{Decomposition, SubsystemId};

/// Interface metabolites shared by the two subsystems of an edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceEdge {
    /// Lower-numbered endpoint.
    pub a: SubsystemId,
    /// Higher-numbered endpoint.
    pub b: SubsystemId,
    /// `interfaces(a → b)` then `interfaces(b → a)`; not de-duplicated.
    pub interface_species: Vec<NodeIndex>,
}

/// Name and size of one overview node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubsystemSummary {
    pub id: SubsystemId,
    pub name: String,
    pub species: usize,
    pub reactions: usize,
}

/// The overview graph together with the decomposition it was built from.
#[derive(Debug, Clone)]
pub struct OverviewGraph {
    decomposition: Decomposition,
    graph: UnGraph<SubsystemId, InterfaceEdge>,
    node_of: Vec<NodeIndex>,
    interfaces: HashMap<(SubsystemId, SubsystemId), Vec<NodeIndex>>,
}

impl OverviewGraph {
    /// Compute interfaces of `decomposition` over `graph` and build the
    /// overview graph.
    #[instrument(skip_all, fields(subsystems = decomposition.len()))]
    #[must_use]
    pub fn build(decomposition: Decomposition, graph: &MetabolicGraph) -> Self {
        let interfaces = directed_interfaces(&decomposition, graph);

        let mut overview: UnGraph<SubsystemId, InterfaceEdge> =
            UnGraph::with_capacity(decomposition.len(), 0);
        let node_of: Vec<NodeIndex> = decomposition.ids().map(|id| overview.add_node(id)).collect();

        let empty: &[NodeIndex] = &[];
        let ids: Vec<SubsystemId> = decomposition.ids().collect();
        for (i, &s1) in ids.iter().enumerate() {
            for &s2 in &ids[i + 1..] {
                let forward = interfaces.get(&(s1, s2)).map_or(empty, Vec::as_slice);
                let backward = interfaces.get(&(s2, s1)).map_or(empty, Vec::as_slice);
                if forward.is_empty() && backward.is_empty() {
                    continue;
                }
                let interface_species = forward.iter().chain(backward).copied().collect();
                overview.add_edge(
                    node_of[s1.0],
                    node_of[s2.0],
                    InterfaceEdge {
                        a: s1,
                        b: s2,
                        interface_species,
                    },
                );
            }
        }

        debug!(
            nodes = overview.node_count(),
            edges = overview.edge_count(),
            "overview graph built"
        );
        Self {
            decomposition,
            graph: overview,
            node_of,
            interfaces,
        }
    }

    #[must_use]
    pub const fn decomposition(&self) -> &Decomposition {
        &self.decomposition
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Overview node of a subsystem.
    #[must_use]
    pub fn node_of(&self, subsystem: SubsystemId) -> Option<NodeIndex> {
        self.node_of.get(subsystem.0).copied()
    }

    /// Subsystem shown by an overview node.
    #[must_use]
    pub fn subsystem_of(&self, node: NodeIndex) -> Option<SubsystemId> {
        self.graph.node_weight(node).copied()
    }

    /// Species produced in `from` and consumed in `to`.
    #[must_use]
    pub fn interface_nodes(&self, from: SubsystemId, to: SubsystemId) -> &[NodeIndex] {
        self.interfaces
            .get(&(from, to))
            .map_or(&[][..], Vec::as_slice)
    }

    /// Subsystems behind a selection of overview nodes, in selection order.
    /// Nodes that are not part of this graph are skipped.
    #[must_use]
    pub fn selected_subsystems(&self, selection: &[NodeIndex]) -> Vec<SubsystemId> {
        selection
            .iter()
            .filter_map(|&node| self.subsystem_of(node))
            .collect()
    }

    /// The edge joining two subsystems, in either orientation.
    #[must_use]
    pub fn edge_between(&self, s1: SubsystemId, s2: SubsystemId) -> Option<EdgeIndex> {
        self.graph.find_edge(self.node_of(s1)?, self.node_of(s2)?)
    }

    #[must_use]
    pub fn interface_edge(&self, edge: EdgeIndex) -> Option<&InterfaceEdge> {
        self.graph.edge_weight(edge)
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeIndex, &InterfaceEdge)> {
        self.graph.edge_references().map(|e| (e.id(), e.weight()))
    }

    /// Raw interface count of an edge (0 for unknown edges).
    #[must_use]
    pub fn weight(&self, edge: EdgeIndex) -> usize {
        self.interface_edge(edge)
            .map_or(0, |e| e.interface_species.len())
    }

    /// Edge thickness for drawing: the interface count capped at `max`.
    #[must_use]
    pub fn display_thickness(&self, edge: EdgeIndex, max: usize) -> usize {
        self.weight(edge).min(max)
    }

    #[must_use]
    pub fn subsystem_summary(&self, node: NodeIndex) -> Option<SubsystemSummary> {
        let id = self.subsystem_of(node)?;
        let subsystem = self.decomposition.subsystem(id)?;
        Some(SubsystemSummary {
            id,
            name: subsystem.name().to_string(),
            species: subsystem.species_count(),
            reactions: subsystem.reaction_count(),
        })
    }
}

fn directed_interfaces(
    decomposition: &Decomposition,
    graph: &MetabolicGraph,
) -> HashMap<(SubsystemId, SubsystemId), Vec<NodeIndex>> {
    let mut interfaces: HashMap<(SubsystemId, SubsystemId), Vec<NodeIndex>> = HashMap::new();
    for species in graph.species_nodes() {
        let producers: BTreeSet<SubsystemId> = graph
            .in_neighbors(species)
            .flat_map(|r| decomposition.subsystems_for_reaction(r).iter().copied())
            .collect();
        if producers.is_empty() {
            continue;
        }
        let consumers: BTreeSet<SubsystemId> = graph
            .out_neighbors(species)
            .flat_map(|r| decomposition.subsystems_for_reaction(r).iter().copied())
            .collect();
        for &a in &producers {
            for &b in consumers.iter().filter(|&&b| b != a) {
                interfaces.entry((a, b)).or_default().push(species);
            }
        }
    }
    interfaces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subsystem::Subsystem;
    use metanet_core::model::GraphBuilder;

    /// `R1 → m → R2`, `R2 → n → R1`, `R3` isolated; R1 in S0, R2 in S1, R3 in S2.
    fn fixture() -> (MetabolicGraph, Decomposition) {
        let mut b = GraphBuilder::new();
        for s in ["m", "n", "z"] {
            b.add_species(s, None).expect("species");
        }
        for r in ["R1", "R2", "R3"] {
            b.add_reaction(r).expect("reaction");
        }
        b.add_product("R1", "m").expect("edge");
        b.add_substrate("m", "R2").expect("edge");
        b.add_product("R2", "n").expect("edge");
        b.add_substrate("n", "R1").expect("edge");
        b.add_substrate("z", "R3").expect("edge");
        let graph = b.build();

        let subsystems = ["R1", "R2", "R3"]
            .iter()
            .map(|r| {
                let mut s = Subsystem::new(format!("S{r}"));
                s.add_reaction_with_neighborhood(&graph, graph.node_by_id(r).expect("reaction"));
                s
            })
            .collect();
        (graph, Decomposition::new(subsystems))
    }

    #[test]
    fn directed_interfaces_are_recorded() {
        let (graph, decomposition) = fixture();
        let overview = OverviewGraph::build(decomposition, &graph);
        let m = graph.node_by_id("m").expect("m");
        let n = graph.node_by_id("n").expect("n");

        assert_eq!(overview.interface_nodes(SubsystemId(0), SubsystemId(1)), &[m]);
        assert_eq!(overview.interface_nodes(SubsystemId(1), SubsystemId(0)), &[n]);
        assert!(overview.interface_nodes(SubsystemId(0), SubsystemId(2)).is_empty());
    }

    #[test]
    fn one_edge_per_connected_pair() {
        let (graph, decomposition) = fixture();
        let overview = OverviewGraph::build(decomposition, &graph);
        assert_eq!(overview.node_count(), 3);
        assert_eq!(overview.edge_count(), 1);

        let edge = overview
            .edge_between(SubsystemId(1), SubsystemId(0))
            .expect("edge");
        assert_eq!(overview.weight(edge), 2);
        assert_eq!(overview.display_thickness(edge, 1), 1);
        assert!(overview.edge_between(SubsystemId(0), SubsystemId(2)).is_none());

        let (_, interface) = overview.edges().next().expect("edge");
        assert_eq!((interface.a, interface.b), (SubsystemId(0), SubsystemId(1)));
    }

    #[test]
    fn selection_maps_to_subsystems() {
        let (graph, decomposition) = fixture();
        let overview = OverviewGraph::build(decomposition, &graph);
        let n2 = overview.node_of(SubsystemId(2)).expect("node");
        let n0 = overview.node_of(SubsystemId(0)).expect("node");
        assert_eq!(
            overview.selected_subsystems(&[n2, n0, NodeIndex::new(99)]),
            vec![SubsystemId(2), SubsystemId(0)]
        );

        let summary = overview.subsystem_summary(n2).expect("summary");
        assert_eq!(summary.name, "SR3");
        assert_eq!((summary.species, summary.reactions), (1, 1));
    }

    #[test]
    fn shared_subsystem_is_not_an_interface() {
        let (graph, _) = fixture();
        let mut both = Subsystem::new("both");
        for r in ["R1", "R2"] {
            both.add_reaction_with_neighborhood(&graph, graph.node_by_id(r).expect("reaction"));
        }
        let overview = OverviewGraph::build(Decomposition::new(vec![both]), &graph);
        assert_eq!(overview.edge_count(), 0);
    }
}
