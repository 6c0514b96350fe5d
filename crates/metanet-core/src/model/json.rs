//! COBRA-style JSON model ingestion.
//!
//! The document layout is the one used by BiGG/cobrapy JSON exports:
//!
//! ```json
//! {
//!   "id": "e_coli_core",
//!   "metabolites": [{ "id": "glc__D_e", "name": "D-Glucose", "compartment": "e" }],
//!   "reactions": [{
//!     "id": "GLCpts",
//!     "metabolites": { "glc__D_e": -1.0, "g6p_c": 1.0 },
//!     "subsystem": "Transport"
//!   }]
//! }
//! ```
//!
//! Negative stoichiometric coefficients become substrate edges, positive ones
//! product edges. Fields irrelevant to decomposition (bounds, genes) are
//! accepted and ignored.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::ModelError;
use crate::model::graph::{
    Attributes, COMPARTMENT_KEY, GraphBuilder, MetabolicGraph, ModelNode, SBML_NAMESPACE,
    SUBSYSTEM_KEY,
};

/// Namespace for string-valued `notes` entries.
pub const NOTES_NAMESPACE: &str = "notes";

#[derive(Debug, Deserialize)]
struct JsonModel {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    metabolites: Vec<JsonMetabolite>,
    #[serde(default)]
    reactions: Vec<JsonReaction>,
}

#[derive(Debug, Deserialize)]
struct JsonMetabolite {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    compartment: Option<String>,
    #[serde(default)]
    notes: Option<Value>,
    #[serde(default)]
    attributes: Attributes,
}

#[derive(Debug, Deserialize)]
struct JsonReaction {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    metabolites: BTreeMap<String, f64>,
    #[serde(default)]
    subsystem: Option<String>,
    #[serde(default)]
    notes: Option<Value>,
    #[serde(default)]
    attributes: Attributes,
}

/// Parse a model document.
///
/// # Errors
///
/// Returns [`ModelError::Parse`] for malformed JSON, and the builder errors
/// for duplicate or undeclared identifiers.
#[instrument(skip(text), fields(bytes = text.len()))]
pub fn parse_model(text: &str) -> Result<MetabolicGraph, ModelError> {
    let doc: JsonModel = serde_json::from_str(text)?;
    let mut builder = GraphBuilder::new();

    for met in &doc.metabolites {
        let mut node = ModelNode::species(&met.id);
        node.label.clone_from(&met.name);
        if let Some(compartment) = met.compartment.as_deref().filter(|c| !c.is_empty()) {
            node.attributes
                .set(SBML_NAMESPACE, COMPARTMENT_KEY, compartment);
        }
        apply_notes(&mut node.attributes, met.notes.as_ref());
        node.attributes.merge(met.attributes.clone());
        builder.add_node(node)?;
    }

    for rxn in &doc.reactions {
        let mut node = ModelNode::reaction(&rxn.id);
        node.label.clone_from(&rxn.name);
        if let Some(subsystem) = rxn.subsystem.as_deref() {
            node.attributes.set(SBML_NAMESPACE, SUBSYSTEM_KEY, subsystem);
        }
        apply_notes(&mut node.attributes, rxn.notes.as_ref());
        node.attributes.merge(rxn.attributes.clone());
        builder.add_node(node)?;

        for (species, coefficient) in &rxn.metabolites {
            if *coefficient < 0.0 {
                builder.add_substrate(species, &rxn.id)?;
            } else if *coefficient > 0.0 {
                builder.add_product(&rxn.id, species)?;
            }
        }
    }

    let graph = builder.build();
    debug!(
        model = doc.id.as_deref().unwrap_or("<unnamed>"),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "model parsed"
    );
    Ok(graph)
}

/// Read and parse a model document from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_model(path: &Path) -> anyhow::Result<MetabolicGraph> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read model {}", path.display()))?;
    parse_model(&text).with_context(|| format!("Failed to load model {}", path.display()))
}

/// Copy scalar `notes` entries into the `notes` namespace.
///
/// COBRA notes are free-form; lists are joined with `;` so that they can be
/// used as multi-valued decomposition attributes.
fn apply_notes(attributes: &mut Attributes, notes: Option<&Value>) {
    let Some(Value::Object(entries)) = notes else {
        return;
    };
    for (key, value) in entries {
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(";"),
            Value::Null | Value::Object(_) => continue,
        };
        attributes.set(NOTES_NAMESPACE, key.as_str(), text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "id": "toy",
        "metabolites": [
            {"id": "glc_e", "name": "Glucose", "compartment": "e"},
            {"id": "glc_c", "compartment": "c"},
            {"id": "g6p_c", "compartment": "c", "notes": {"original_bigg_ids": ["g6p_c", "g6p"]}}
        ],
        "reactions": [
            {"id": "GLCt", "metabolites": {"glc_e": -1, "glc_c": 1}, "lower_bound": -1000, "upper_bound": 1000},
            {"id": "HEX1", "metabolites": {"glc_c": -1.0, "g6p_c": 1.0, "ignored": 0.0},
             "subsystem": "Glycolysis", "attributes": {"lmme": {"pathway": "central"}}}
        ],
        "genes": []
    }"#;

    #[test]
    fn parses_nodes_edges_and_attributes() {
        let graph = parse_model(DOC).expect("parse");
        assert_eq!(graph.species_nodes().count(), 3);
        assert_eq!(graph.reaction_nodes().count(), 2);
        assert_eq!(graph.edge_count(), 4);

        let glc_e = graph.node_by_id("glc_e").expect("glc_e");
        let hex = graph.node_by_id("HEX1").expect("HEX1");
        let g6p = graph.node_by_id("g6p_c").expect("g6p_c");
        assert_eq!(graph.compartment(glc_e), Some("e"));
        assert_eq!(graph.node(glc_e).map(ModelNode::display_name), Some("Glucose"));
        assert_eq!(
            graph.attribute(hex, SBML_NAMESPACE, SUBSYSTEM_KEY),
            Some("Glycolysis")
        );
        assert_eq!(graph.attribute(hex, "lmme", "pathway"), Some("central"));
        assert_eq!(
            graph.attribute(g6p, NOTES_NAMESPACE, "original_bigg_ids"),
            Some("g6p_c;g6p")
        );
        assert!(graph.graph.contains_edge(hex, g6p));
    }

    #[test]
    fn undeclared_metabolite_is_an_error() {
        let doc = r#"{"metabolites": [], "reactions": [{"id": "R", "metabolites": {"a": -1}}]}"#;
        let err = parse_model(doc).expect_err("unknown species");
        assert!(matches!(err, ModelError::UnknownNode(id) if id == "a"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = parse_model("{ not json").expect_err("parse error");
        assert!(matches!(err, ModelError::Parse(_)));
    }

    #[test]
    fn load_model_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_model(&dir.path().join("missing.json")).expect_err("missing");
        assert!(err.to_string().contains("missing.json"));
    }
}
