//! Arena-backed bipartite metabolic network.
//!
//! # Overview
//!
//! Species and reaction nodes live in a single petgraph [`DiGraph`]. The
//! [`NodeIndex`] assigned at ingestion is the node's identity everywhere in
//! the analysis crates; no map is ever keyed by the node payload itself.
//!
//! ## Edge Direction
//!
//! ```text
//! substrate species → reaction → product species
//! ```
//!
//! ## Clones
//!
//! A species may be split into several working copies (see
//! [`crate::model::clone`]). Copies share the identifier of their original,
//! and [`MetabolicGraph::original_of`] maps every node back to the node it
//! was cloned from (identity for originals).

use std::collections::{BTreeMap, HashMap};

use petgraph::{
    Direction,
    graph::{DiGraph, EdgeIndex, NodeIndex},
    visit::EdgeRef,
};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Attribute namespace used for SBML-derived values.
pub const SBML_NAMESPACE: &str = "sbml";
/// Attribute key holding a node's compartment.
pub const COMPARTMENT_KEY: &str = "compartment";
/// Attribute key holding a reaction's predefined subsystem label.
pub const SUBSYSTEM_KEY: &str = "subsystem";

// ---------------------------------------------------------------------------
// Node payloads
// ---------------------------------------------------------------------------

/// Role tag of a node in the bipartite network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Species,
    Reaction,
}

/// String attributes addressed by `(namespace, key)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, BTreeMap<String, String>>);

impl Attributes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value by namespace and key.
    #[must_use]
    pub fn get(&self, namespace: &str, key: &str) -> Option<&str> {
        self.0
            .get(namespace)
            .and_then(|entries| entries.get(key))
            .map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, namespace: &str, key: &str) -> bool {
        self.get(namespace, key).is_some()
    }

    /// Insert or overwrite a value.
    pub fn set(
        &mut self,
        namespace: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.0
            .entry(namespace.into())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Merge `other` into `self`; values in `other` win.
    pub fn merge(&mut self, other: Self) {
        for (namespace, entries) in other.0 {
            self.0.entry(namespace).or_default().extend(entries);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeMap::is_empty)
    }
}

/// A species or reaction node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelNode {
    /// Model identifier (e.g. an SBML species id). Clones share it.
    pub id: String,
    /// Optional display name.
    pub label: Option<String>,
    pub role: NodeRole,
    pub attributes: Attributes,
}

impl ModelNode {
    #[must_use]
    pub fn species(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            role: NodeRole::Species,
            attributes: Attributes::new(),
        }
    }

    #[must_use]
    pub fn reaction(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            role: NodeRole::Reaction,
            attributes: Attributes::new(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_attribute(
        mut self,
        namespace: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.attributes.set(namespace, key, value);
        self
    }

    /// Label if present, identifier otherwise.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

/// Directed edge payload; edges carry attributes like nodes do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelEdge {
    pub attributes: Attributes,
}

// ---------------------------------------------------------------------------
// MetabolicGraph
// ---------------------------------------------------------------------------

/// The metabolic network consumed by the decomposition and analysis code.
#[derive(Debug, Clone)]
pub struct MetabolicGraph {
    /// Directed bipartite graph: species ↔ reactions.
    pub graph: DiGraph<ModelNode, ModelEdge>,
    /// Identifier → original node.
    id_map: HashMap<String, NodeIndex>,
    /// Clone → original node. Originals are absent (identity).
    original_of: HashMap<NodeIndex, NodeIndex>,
    /// BLAKE3 hash of the edge set, used to detect model changes.
    pub content_hash: String,
}

impl MetabolicGraph {
    /// Assemble a graph from a petgraph arena and a clone mapping.
    pub(crate) fn from_parts(
        graph: DiGraph<ModelNode, ModelEdge>,
        original_of: HashMap<NodeIndex, NodeIndex>,
    ) -> Self {
        let id_map = graph
            .node_indices()
            .filter(|idx| !original_of.contains_key(idx))
            .map(|idx| (graph[idx].id.clone(), idx))
            .collect();
        let content_hash = compute_edge_hash(&graph);
        Self {
            graph,
            id_map,
            original_of,
            content_hash,
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn node(&self, idx: NodeIndex) -> Option<&ModelNode> {
        self.graph.node_weight(idx)
    }

    /// Original node carrying `id`.
    #[must_use]
    pub fn node_by_id(&self, id: &str) -> Option<NodeIndex> {
        self.id_map.get(id).copied()
    }

    #[must_use]
    pub fn role(&self, idx: NodeIndex) -> Option<NodeRole> {
        self.node(idx).map(|n| n.role)
    }

    #[must_use]
    pub fn is_species(&self, idx: NodeIndex) -> bool {
        self.role(idx) == Some(NodeRole::Species)
    }

    #[must_use]
    pub fn is_reaction(&self, idx: NodeIndex) -> bool {
        self.role(idx) == Some(NodeRole::Reaction)
    }

    /// All species nodes, clones included, in index order.
    pub fn species_nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes_with_role(NodeRole::Species)
    }

    /// All reaction nodes in index order.
    pub fn reaction_nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes_with_role(NodeRole::Reaction)
    }

    /// Species nodes that are not clones.
    pub fn original_species_nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.species_nodes()
            .filter(|idx| !self.original_of.contains_key(idx))
    }

    fn nodes_with_role(&self, role: NodeRole) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .node_indices()
            .filter(move |&idx| self.graph[idx].role == role)
    }

    /// Edges entering `idx`, in ascending edge index order.
    #[must_use]
    pub fn in_edges(&self, idx: NodeIndex) -> Vec<EdgeIndex> {
        self.incident_edges(idx, Direction::Incoming)
    }

    /// Edges leaving `idx`, in ascending edge index order.
    #[must_use]
    pub fn out_edges(&self, idx: NodeIndex) -> Vec<EdgeIndex> {
        self.incident_edges(idx, Direction::Outgoing)
    }

    fn incident_edges(&self, idx: NodeIndex, dir: Direction) -> Vec<EdgeIndex> {
        let mut edges: Vec<EdgeIndex> = self
            .graph
            .edges_directed(idx, dir)
            .map(|e| e.id())
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Producers of a species / substrates of a reaction.
    pub fn in_neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(idx, Direction::Incoming)
    }

    /// Consumers of a species / products of a reaction.
    pub fn out_neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(idx, Direction::Outgoing)
    }

    /// Number of incident edges regardless of direction.
    #[must_use]
    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges_directed(idx, Direction::Incoming).count()
            + self.graph.edges_directed(idx, Direction::Outgoing).count()
    }

    #[must_use]
    pub fn edge_endpoints(&self, edge: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(edge)
    }

    #[must_use]
    pub fn attribute(&self, idx: NodeIndex, namespace: &str, key: &str) -> Option<&str> {
        self.node(idx).and_then(|n| n.attributes.get(namespace, key))
    }

    /// The `sbml/compartment` attribute of a node.
    #[must_use]
    pub fn compartment(&self, idx: NodeIndex) -> Option<&str> {
        self.attribute(idx, SBML_NAMESPACE, COMPARTMENT_KEY)
    }

    /// The node `idx` was cloned from, or `idx` itself.
    #[must_use]
    pub fn original_of(&self, idx: NodeIndex) -> NodeIndex {
        self.original_of.get(&idx).copied().unwrap_or(idx)
    }

    #[must_use]
    pub fn is_clone(&self, idx: NodeIndex) -> bool {
        self.original_of.contains_key(&idx)
    }

    #[must_use]
    pub fn clone_count(&self) -> usize {
        self.original_of.len()
    }

    /// Model identifier of a node, or `""` for an out-of-range index.
    #[must_use]
    pub fn id_of(&self, idx: NodeIndex) -> &str {
        self.node(idx).map_or("", |n| n.id.as_str())
    }
}

// ---------------------------------------------------------------------------
// GraphBuilder
// ---------------------------------------------------------------------------

/// Incremental constructor for [`MetabolicGraph`].
///
/// Rejects duplicate identifiers and edges that do not join a species to a
/// reaction.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: DiGraph<ModelNode, ModelEdge>,
    id_map: HashMap<String, NodeIndex>,
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateId`] if the identifier is taken.
    pub fn add_node(&mut self, node: ModelNode) -> Result<NodeIndex, ModelError> {
        if self.id_map.contains_key(&node.id) {
            return Err(ModelError::DuplicateId(node.id));
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.id_map.insert(id, idx);
        Ok(idx)
    }

    /// Add a species, optionally placed in a compartment.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateId`] if the identifier is taken.
    pub fn add_species(
        &mut self,
        id: &str,
        compartment: Option<&str>,
    ) -> Result<NodeIndex, ModelError> {
        let mut node = ModelNode::species(id);
        if let Some(compartment) = compartment {
            node.attributes
                .set(SBML_NAMESPACE, COMPARTMENT_KEY, compartment);
        }
        self.add_node(node)
    }

    /// Add a reaction.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateId`] if the identifier is taken.
    pub fn add_reaction(&mut self, id: &str) -> Result<NodeIndex, ModelError> {
        self.add_node(ModelNode::reaction(id))
    }

    /// Set an attribute on an already declared node.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownNode`] if `id` was never declared.
    pub fn set_attribute(
        &mut self,
        id: &str,
        namespace: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ModelError> {
        let idx = self.lookup(id)?;
        self.graph[idx].attributes.set(namespace, key, value);
        Ok(())
    }

    /// Add `species → reaction`.
    ///
    /// # Errors
    ///
    /// Fails on unknown ids or when the roles are wrong.
    pub fn add_substrate(
        &mut self,
        species_id: &str,
        reaction_id: &str,
    ) -> Result<EdgeIndex, ModelError> {
        self.add_edge(species_id, reaction_id)
    }

    /// Add `reaction → species`.
    ///
    /// # Errors
    ///
    /// Fails on unknown ids or when the roles are wrong.
    pub fn add_product(
        &mut self,
        reaction_id: &str,
        species_id: &str,
    ) -> Result<EdgeIndex, ModelError> {
        self.add_edge(reaction_id, species_id)
    }

    fn add_edge(&mut self, source_id: &str, target_id: &str) -> Result<EdgeIndex, ModelError> {
        let source = self.lookup(source_id)?;
        let target = self.lookup(target_id)?;
        if self.graph[source].role == self.graph[target].role {
            return Err(ModelError::InvalidEdge {
                source_id: source_id.to_string(),
                target_id: target_id.to_string(),
            });
        }
        Ok(self.graph.add_edge(source, target, ModelEdge::default()))
    }

    fn lookup(&self, id: &str) -> Result<NodeIndex, ModelError> {
        self.id_map
            .get(id)
            .copied()
            .ok_or_else(|| ModelError::UnknownNode(id.to_string()))
    }

    #[must_use]
    pub fn build(self) -> MetabolicGraph {
        MetabolicGraph::from_parts(self.graph, HashMap::new())
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// BLAKE3 hash of the sorted `(source id, target id)` edge list.
fn compute_edge_hash(graph: &DiGraph<ModelNode, ModelEdge>) -> String {
    let mut edges: Vec<(&str, &str)> = graph
        .edge_references()
        .map(|e| (graph[e.source()].id.as_str(), graph[e.target()].id.as_str()))
        .collect();
    edges.sort_unstable();

    let mut hasher = blake3::Hasher::new();
    for (source, target) in edges {
        hasher.update(source.as_bytes());
        hasher.update(b"\x00");
        hasher.update(target.as_bytes());
        hasher.update(b"\x00");
    }
    format!("blake3:{}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn small_model() -> MetabolicGraph {
        let mut b = GraphBuilder::new();
        b.add_species("glc", Some("c")).expect("glc");
        b.add_species("g6p", Some("c")).expect("g6p");
        b.add_reaction("HEX1").expect("HEX1");
        b.add_substrate("glc", "HEX1").expect("substrate");
        b.add_product("HEX1", "g6p").expect("product");
        b.build()
    }

    #[test]
    fn empty_builder_produces_empty_graph() {
        let graph = GraphBuilder::new().build();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.content_hash.starts_with("blake3:"));
    }

    #[test]
    fn roles_and_lookup() {
        let graph = small_model();
        let glc = graph.node_by_id("glc").expect("glc");
        let hex = graph.node_by_id("HEX1").expect("HEX1");
        assert!(graph.is_species(glc));
        assert!(graph.is_reaction(hex));
        assert_eq!(graph.species_nodes().count(), 2);
        assert_eq!(graph.reaction_nodes().count(), 1);
        assert_eq!(graph.compartment(glc), Some("c"));
        assert_eq!(graph.compartment(hex), None);
    }

    #[test]
    fn edge_direction_substrate_to_product() {
        let graph = small_model();
        let glc = graph.node_by_id("glc").expect("glc");
        let g6p = graph.node_by_id("g6p").expect("g6p");
        let hex = graph.node_by_id("HEX1").expect("HEX1");
        assert!(graph.graph.contains_edge(glc, hex));
        assert!(graph.graph.contains_edge(hex, g6p));
        assert!(!graph.graph.contains_edge(hex, glc));
        assert_eq!(graph.in_edges(hex).len(), 1);
        assert_eq!(graph.out_edges(hex).len(), 1);
        assert_eq!(graph.degree(hex), 2);
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut b = GraphBuilder::new();
        b.add_species("atp", None).expect("first");
        let err = b.add_reaction("atp").expect_err("duplicate");
        assert!(matches!(err, ModelError::DuplicateId(id) if id == "atp"));
    }

    #[test]
    fn species_to_species_edge_rejected() {
        let mut b = GraphBuilder::new();
        b.add_species("a", None).expect("a");
        b.add_species("b", None).expect("b");
        let err = b.add_substrate("a", "b").expect_err("invalid edge");
        assert!(matches!(err, ModelError::InvalidEdge { .. }));
    }

    #[test]
    fn unknown_endpoint_rejected() {
        let mut b = GraphBuilder::new();
        b.add_reaction("R").expect("R");
        let err = b.add_product("R", "missing").expect_err("unknown");
        assert!(matches!(err, ModelError::UnknownNode(id) if id == "missing"));
    }

    #[test]
    fn original_of_is_identity_without_clones() {
        let graph = small_model();
        for idx in graph.graph.node_indices() {
            assert_eq!(graph.original_of(idx), idx);
            assert!(!graph.is_clone(idx));
        }
        assert_eq!(graph.original_species_nodes().count(), 2);
    }

    #[test]
    fn content_hash_changes_with_edges() {
        let mut b = GraphBuilder::new();
        b.add_species("a", None).expect("a");
        b.add_reaction("R").expect("R");
        let before = GraphBuilder::new().build().content_hash;
        b.add_substrate("a", "R").expect("edge");
        let after = b.build().content_hash;
        assert_ne!(before, after);
    }

    #[test]
    fn attributes_merge_and_lookup() {
        let mut attrs = Attributes::new();
        assert!(attrs.is_empty());
        attrs.set("sbml", "compartment", "c");
        let mut other = Attributes::new();
        other.set("sbml", "compartment", "m");
        other.set("notes", "EC", "1.1.1.1");
        attrs.merge(other);
        assert_eq!(attrs.get("sbml", "compartment"), Some("m"));
        assert_eq!(attrs.get("notes", "EC"), Some("1.1.1.1"));
        assert!(!attrs.contains("notes", "missing"));
    }

    #[test]
    fn display_name_prefers_label() {
        let node = ModelNode::species("glc__D_c").with_label("D-Glucose");
        assert_eq!(node.display_name(), "D-Glucose");
        assert_eq!(ModelNode::reaction("PGI").display_name(), "PGI");
    }
}
