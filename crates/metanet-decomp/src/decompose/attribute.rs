//! Attribute-driven decomposition.
//!
//! Each reaction names its subsystem(s) in a `(namespace, key)` attribute.
//! With a separator, one attribute value may list several subsystems.

use std::collections::HashMap;

use metanet_core::model::{MetabolicGraph, SBML_NAMESPACE, SUBSYSTEM_KEY};
use tracing::debug;

use super::DecompositionStrategy;
use crate::subsystem::Subsystem;

/// Namespace of annotations written by the disease-map merger.
pub const DISEASE_MAP_NAMESPACE: &str = "lmme";
/// Key holding the pathway a disease-map reaction came from.
pub const PATHWAY_KEY: &str = "pathway";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDecomposition {
    name: String,
    namespace: String,
    key: String,
    separator: Option<String>,
    requires_cloning: bool,
}

impl AttributeDecomposition {
    #[must_use]
    pub fn new(namespace: &str, key: &str, separator: Option<&str>) -> Self {
        Self {
            name: format!("attribute {namespace}/{key}"),
            namespace: namespace.to_string(),
            key: key.to_string(),
            separator: separator.filter(|s| !s.is_empty()).map(str::to_string),
            requires_cloning: false,
        }
    }

    /// Subsystem labels shipped with the model (`sbml/subsystem`, `;`-separated).
    #[must_use]
    pub fn predefined() -> Self {
        Self {
            name: "predefined".to_string(),
            ..Self::new(SBML_NAMESPACE, SUBSYSTEM_KEY, Some(";"))
        }
    }

    /// Pathway of origin in a merged disease map.
    ///
    /// Merged maps share species between pathways, so species are cloned
    /// first to keep pathways from bleeding into each other.
    #[must_use]
    pub fn disease_map_pathway() -> Self {
        Self {
            name: "disease-map".to_string(),
            requires_cloning: true,
            ..Self::new(DISEASE_MAP_NAMESPACE, PATHWAY_KEY, None)
        }
    }

    /// Subsystem names listed in a raw attribute value.
    fn names<'v>(&self, value: &'v str) -> Vec<&'v str> {
        let parts: Vec<&str> = match &self.separator {
            Some(sep) => value.split(sep.as_str()).collect(),
            None => vec![value],
        };
        parts
            .into_iter()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect()
    }
}

impl DecompositionStrategy for AttributeDecomposition {
    fn name(&self) -> &str {
        &self.name
    }

    fn requires_cloning(&self) -> bool {
        self.requires_cloning
    }

    fn run_specific(&self, graph: &MetabolicGraph) -> Vec<Subsystem> {
        let mut subsystems: Vec<Subsystem> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();

        for reaction in graph.reaction_nodes() {
            let Some(value) = graph.attribute(reaction, &self.namespace, &self.key) else {
                continue;
            };
            for name in self.names(value) {
                let slot = *by_name.entry(name.to_string()).or_insert_with(|| {
                    subsystems.push(Subsystem::new(name));
                    subsystems.len() - 1
                });
                subsystems[slot].add_reaction_with_neighborhood(graph, reaction);
            }
        }

        debug!(
            namespace = %self.namespace,
            key = %self.key,
            subsystems = subsystems.len(),
            "attribute decomposition"
        );
        subsystems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metanet_core::model::GraphBuilder;

    fn model(labels: &[(&str, Option<&str>)]) -> MetabolicGraph {
        let mut b = GraphBuilder::new();
        for (i, (reaction, label)) in labels.iter().enumerate() {
            let s = format!("s{i}");
            b.add_species(&s, None).expect("species");
            b.add_reaction(reaction).expect("reaction");
            b.add_substrate(&s, reaction).expect("edge");
            if let Some(label) = label {
                b.set_attribute(reaction, SBML_NAMESPACE, SUBSYSTEM_KEY, label)
                    .expect("attribute");
            }
        }
        b.build()
    }

    fn summary(graph: &MetabolicGraph, subsystems: &[Subsystem]) -> Vec<(String, Vec<String>)> {
        subsystems
            .iter()
            .map(|s| {
                (
                    s.name().to_string(),
                    s.reactions().iter().map(|&r| graph.id_of(r).to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn groups_by_label_in_first_appearance_order() {
        let graph = model(&[
            ("R1", Some("TCA")),
            ("R2", Some("Glycolysis")),
            ("R3", Some("TCA")),
        ]);
        let subsystems = AttributeDecomposition::predefined().run_specific(&graph);
        assert_eq!(
            summary(&graph, &subsystems),
            vec![
                ("TCA".to_string(), vec!["R1".to_string(), "R3".to_string()]),
                ("Glycolysis".to_string(), vec!["R2".to_string()]),
            ]
        );
        assert!(subsystems.iter().all(|s| s.is_closed(&graph)));
    }

    #[test]
    fn multi_valued_labels_give_multi_membership() {
        let graph = model(&[("R1", Some("A; B")), ("R2", Some("B"))]);
        let subsystems = AttributeDecomposition::predefined().run_specific(&graph);
        assert_eq!(
            summary(&graph, &subsystems),
            vec![
                ("A".to_string(), vec!["R1".to_string()]),
                ("B".to_string(), vec!["R1".to_string(), "R2".to_string()]),
            ]
        );
    }

    #[test]
    fn empty_values_and_fragments_are_unassigned() {
        let graph = model(&[("R1", Some("")), ("R2", Some(" ; ;X")), ("R3", None)]);
        let subsystems = AttributeDecomposition::predefined().run_specific(&graph);
        assert_eq!(
            summary(&graph, &subsystems),
            vec![("X".to_string(), vec!["R2".to_string()])]
        );
    }

    #[test]
    fn without_separator_value_is_taken_whole() {
        let graph = model(&[("R1", Some("A;B"))]);
        let strategy = AttributeDecomposition::new(SBML_NAMESPACE, SUBSYSTEM_KEY, None);
        let subsystems = strategy.run_specific(&graph);
        assert_eq!(subsystems.len(), 1);
        assert_eq!(subsystems[0].name(), "A;B");
        assert!(!strategy.requires_cloning());
    }

    #[test]
    fn disease_map_reads_pathway_and_needs_cloning() {
        let mut b = GraphBuilder::new();
        b.add_reaction("R1").expect("R1");
        b.set_attribute("R1", DISEASE_MAP_NAMESPACE, PATHWAY_KEY, "Apoptosis")
            .expect("attribute");
        let graph = b.build();

        let strategy = AttributeDecomposition::disease_map_pathway();
        assert!(strategy.requires_cloning());
        assert_eq!(strategy.name(), "disease-map");
        let subsystems = strategy.run_specific(&graph);
        assert_eq!(subsystems[0].name(), "Apoptosis");
    }
}
