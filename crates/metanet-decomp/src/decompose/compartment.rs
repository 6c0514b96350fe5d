//! Compartment-based decomposition.

use std::collections::{BTreeSet, HashMap};

use metanet_core::model::MetabolicGraph;
use petgraph::graph::NodeIndex;

use super::DecompositionStrategy;
use crate::subsystem::Subsystem;

/// Groups reactions by the compartment they take place in.
///
/// A reaction's own `sbml/compartment` wins; otherwise all of its neighbour
/// species must agree on one compartment. Reactions spanning compartments
/// stay unclassified, which is what lets the transporter step see them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompartmentDecomposition;

impl CompartmentDecomposition {
    fn compartment_of<'g>(graph: &'g MetabolicGraph, reaction: NodeIndex) -> Option<&'g str> {
        if let Some(own) = graph.compartment(reaction) {
            return Some(own);
        }
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for neighbor in graph.in_neighbors(reaction).chain(graph.out_neighbors(reaction)) {
            seen.insert(graph.compartment(neighbor)?);
        }
        let mut iter = seen.into_iter();
        match (iter.next(), iter.next()) {
            (Some(single), None) => Some(single),
            _ => None,
        }
    }
}

impl DecompositionStrategy for CompartmentDecomposition {
    fn name(&self) -> &'static str {
        "compartment"
    }

    fn run_specific(&self, graph: &MetabolicGraph) -> Vec<Subsystem> {
        let mut subsystems: Vec<Subsystem> = Vec::new();
        let mut by_compartment: HashMap<&str, usize> = HashMap::new();

        for reaction in graph.reaction_nodes() {
            let Some(compartment) = Self::compartment_of(graph, reaction) else {
                continue;
            };
            let slot = *by_compartment.entry(compartment).or_insert_with(|| {
                subsystems.push(Subsystem::new(compartment));
                subsystems.len() - 1
            });
            subsystems[slot].add_reaction_with_neighborhood(graph, reaction);
        }
        subsystems
    }
}
