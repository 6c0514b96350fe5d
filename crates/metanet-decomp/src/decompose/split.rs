//! Splitting the default subsystem into connected components.
//!
//! The default subsystem is copied into an isolated undirected working graph
//! whose node and edge weights are the original indices, so every component
//! maps back to the model without any lookup table.

use std::collections::HashMap;

use metanet_core::model::MetabolicGraph;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::{Bfs, EdgeRef};
use tracing::debug;

use crate::subsystem::{DEFAULT_SUBSYSTEM, Subsystem};

/// Components of `default` with at least `minimum_size` nodes, as
/// `DEFAULT 1`, `DEFAULT 2`, … in order of their smallest original node.
#[must_use]
pub fn split_default_subsystem(
    graph: &MetabolicGraph,
    default: &Subsystem,
    minimum_size: usize,
) -> Vec<Subsystem> {
    let working = working_copy(default, graph);

    let mut component_of: Vec<Option<usize>> = vec![None; working.node_count()];
    let mut components: Vec<Vec<NodeIndex>> = Vec::new();
    for start in working.node_indices() {
        if component_of[start.index()].is_some() {
            continue;
        }
        let id = components.len();
        let mut members = Vec::new();
        let mut bfs = Bfs::new(&working, start);
        while let Some(node) = bfs.next(&working) {
            component_of[node.index()] = Some(id);
            members.push(node);
        }
        components.push(members);
    }

    let mut kept: Vec<(NodeIndex, Subsystem)> = components
        .iter()
        .enumerate()
        .filter(|(_, members)| members.len() >= minimum_size)
        .filter_map(|(id, members)| {
            let mut subsystem = Subsystem::new(DEFAULT_SUBSYSTEM);
            for &node in members {
                subsystem.add_node(graph, working[node]);
            }
            for edge in working.edge_references() {
                if component_of[edge.source().index()] == Some(id) {
                    subsystem.add_edge(*edge.weight());
                }
            }
            let smallest = members.iter().map(|&n| working[n]).min()?;
            Some((smallest, subsystem))
        })
        .collect();

    kept.sort_by_key(|(smallest, _)| *smallest);
    debug!(
        components = components.len(),
        kept = kept.len(),
        minimum_size,
        "default subsystem split"
    );

    kept.into_iter()
        .enumerate()
        .map(|(i, (_, mut subsystem))| {
            subsystem.set_name(format!("{DEFAULT_SUBSYSTEM} {}", i + 1));
            subsystem
        })
        .collect()
}

/// Induced subgraph of `subsystem`, undirected, weights = original indices.
fn working_copy(subsystem: &Subsystem, graph: &MetabolicGraph) -> UnGraph<NodeIndex, EdgeIndex> {
    let mut working = UnGraph::with_capacity(
        subsystem.species_count() + subsystem.reaction_count(),
        subsystem.edges().len(),
    );
    let mut copy_of: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    for &node in subsystem.species().iter().chain(subsystem.reactions()) {
        copy_of.insert(node, working.add_node(node));
    }
    for &edge in subsystem.edges() {
        let Some((source, target)) = graph.edge_endpoints(edge) else {
            continue;
        };
        if let (Some(&s), Some(&t)) = (copy_of.get(&source), copy_of.get(&target)) {
            working.add_edge(s, t, edge);
        }
    }
    working
}
