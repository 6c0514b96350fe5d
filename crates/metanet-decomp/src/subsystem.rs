//! Subsystems and decompositions.
//!
//! A [`Subsystem`] is a named set of species, reactions and edges of the
//! working [`MetabolicGraph`]. A [`Decomposition`] owns an ordered list of
//! subsystems and indexes which subsystems each reaction belongs to.
//!
//! Subsystem identity is positional: [`SubsystemId`] is the index of the
//! subsystem in its decomposition, so two subsystems with identical content
//! are still distinct entities.

use std::collections::{BTreeSet, HashMap};

use metanet_core::model::{MetabolicGraph, NodeRole};
use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::Serialize;

/// Name of the synthetic subsystem collecting transport reactions.
pub const TRANSPORTER_SUBSYSTEM: &str = "TRANSPORTER";
/// Name of the synthetic subsystem collecting unclassified reactions.
pub const DEFAULT_SUBSYSTEM: &str = "DEFAULT";

/// Position of a subsystem within its [`Decomposition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SubsystemId(pub usize);

impl std::fmt::Display for SubsystemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Subsystem
// ---------------------------------------------------------------------------

/// A named group of species, reactions and the edges between them.
#[derive(Debug, Clone, Default)]
pub struct Subsystem {
    name: String,
    species: BTreeSet<NodeIndex>,
    reactions: BTreeSet<NodeIndex>,
    edges: BTreeSet<EdgeIndex>,
}

impl Subsystem {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub const fn species(&self) -> &BTreeSet<NodeIndex> {
        &self.species
    }

    #[must_use]
    pub const fn reactions(&self) -> &BTreeSet<NodeIndex> {
        &self.reactions
    }

    #[must_use]
    pub const fn edges(&self) -> &BTreeSet<EdgeIndex> {
        &self.edges
    }

    #[must_use]
    pub fn species_count(&self) -> usize {
        self.species.len()
    }

    #[must_use]
    pub fn reaction_count(&self) -> usize {
        self.reactions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.species.is_empty() && self.reactions.is_empty()
    }

    pub fn add_species(&mut self, species: NodeIndex) {
        self.species.insert(species);
    }

    pub fn add_reaction(&mut self, reaction: NodeIndex) {
        self.reactions.insert(reaction);
    }

    /// Insert an edge. Callers are responsible for adding its endpoints.
    pub fn add_edge(&mut self, edge: EdgeIndex) {
        self.edges.insert(edge);
    }

    /// Insert an edge together with both of its endpoints.
    pub fn add_edge_with_endpoints(&mut self, graph: &MetabolicGraph, edge: EdgeIndex) {
        let Some((source, target)) = graph.edge_endpoints(edge) else {
            return;
        };
        self.add_node(graph, source);
        self.add_node(graph, target);
        self.edges.insert(edge);
    }

    /// Insert a node into the species or reaction set according to its role.
    pub fn add_node(&mut self, graph: &MetabolicGraph, node: NodeIndex) {
        match graph.role(node) {
            Some(NodeRole::Species) => {
                self.species.insert(node);
            }
            Some(NodeRole::Reaction) => {
                self.reactions.insert(node);
            }
            None => {}
        }
    }

    /// Insert a reaction with all its incident edges and neighbouring species.
    pub fn add_reaction_with_neighborhood(&mut self, graph: &MetabolicGraph, reaction: NodeIndex) {
        self.reactions.insert(reaction);
        for edge in graph
            .in_edges(reaction)
            .into_iter()
            .chain(graph.out_edges(reaction))
        {
            self.add_edge_with_endpoints(graph, edge);
        }
    }

    /// Every edge has both endpoints among the subsystem's nodes.
    #[must_use]
    pub fn is_closed(&self, graph: &MetabolicGraph) -> bool {
        self.edges.iter().all(|&edge| {
            graph.edge_endpoints(edge).is_some_and(|(s, t)| {
                self.contains_node(s) && self.contains_node(t)
            })
        })
    }

    #[must_use]
    pub fn contains_node(&self, node: NodeIndex) -> bool {
        self.species.contains(&node) || self.reactions.contains(&node)
    }
}

// ---------------------------------------------------------------------------
// Decomposition
// ---------------------------------------------------------------------------

/// An ordered collection of subsystems with a reaction → subsystems index.
#[derive(Debug, Clone, Default)]
pub struct Decomposition {
    subsystems: Vec<Subsystem>,
    reaction_index: HashMap<NodeIndex, Vec<SubsystemId>>,
}

impl Decomposition {
    #[must_use]
    pub fn new(subsystems: Vec<Subsystem>) -> Self {
        let mut decomposition = Self::default();
        for subsystem in subsystems {
            decomposition.add_subsystem(subsystem);
        }
        decomposition
    }

    /// Append a subsystem and index its reactions.
    pub fn add_subsystem(&mut self, subsystem: Subsystem) -> SubsystemId {
        let id = SubsystemId(self.subsystems.len());
        for &reaction in subsystem.reactions() {
            self.reaction_index.entry(reaction).or_default().push(id);
        }
        self.subsystems.push(subsystem);
        id
    }

    #[must_use]
    pub fn subsystems(&self) -> &[Subsystem] {
        &self.subsystems
    }

    #[must_use]
    pub fn subsystem(&self, id: SubsystemId) -> Option<&Subsystem> {
        self.subsystems.get(id.0)
    }

    /// Subsystems paired with their ids, in decomposition order.
    pub fn iter(&self) -> impl Iterator<Item = (SubsystemId, &Subsystem)> {
        self.subsystems
            .iter()
            .enumerate()
            .map(|(i, s)| (SubsystemId(i), s))
    }

    pub fn ids(&self) -> impl Iterator<Item = SubsystemId> {
        (0..self.subsystems.len()).map(SubsystemId)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subsystems.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subsystems.is_empty()
    }

    /// Whether `reaction` belongs to at least one subsystem.
    #[must_use]
    pub fn has_reaction_been_classified(&self, reaction: NodeIndex) -> bool {
        self.reaction_index.contains_key(&reaction)
    }

    /// Subsystems containing `reaction`, in decomposition order.
    #[must_use]
    pub fn subsystems_for_reaction(&self, reaction: NodeIndex) -> &[SubsystemId] {
        self.reaction_index
            .get(&reaction)
            .map_or(&[][..], Vec::as_slice)
    }

    /// First subsystem with the given name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<SubsystemId> {
        self.iter().find(|(_, s)| s.name() == name).map(|(id, _)| id)
    }

    /// Number of distinct reactions covered by the decomposition.
    #[must_use]
    pub fn classified_reaction_count(&self) -> usize {
        self.reaction_index.len()
    }
}
