//! Metabolic network model.
//!
//! # Pipeline
//!
//! ```text
//! COBRA JSON document
//!        ↓  json::parse_model()
//! MetabolicGraph (species/reaction arena, original ids)
//!        ↓  clone::SpeciesCloner::clone_species()   (optional)
//! MetabolicGraph (working copy, clones mapped back via original_of)
//! ```

pub mod clone;
pub mod graph;
pub mod json;

pub use clone::{DegreeThresholdCloner, SpeciesCloner};
pub use graph::{
    Attributes, COMPARTMENT_KEY, GraphBuilder, MetabolicGraph, ModelEdge, ModelNode, NodeRole,
    SBML_NAMESPACE, SUBSYSTEM_KEY,
};
pub use json::{load_model, parse_model};
