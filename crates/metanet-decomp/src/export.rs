//! Optional subsystem export capability.
//!
//! The session holds at most one [`SubsystemExporter`]; hosts install the
//! formats they support. Without one, export requests fail with a
//! capability error instead of probing for plugins at runtime.

use std::collections::BTreeSet;
use std::io::{self, Write};

use metanet_core::model::MetabolicGraph;
use serde::Serialize;

use crate::subsystem::Subsystem;

/// Writes selected subsystems in some interchange format.
pub trait SubsystemExporter {
    /// Short format name, e.g. `json`.
    fn format(&self) -> &str;

    /// Serialize `subsystems` of `graph` into `sink`.
    ///
    /// # Errors
    ///
    /// Returns any I/O or encoding failure of the sink.
    fn export(
        &self,
        graph: &MetabolicGraph,
        subsystems: &[&Subsystem],
        sink: &mut dyn Write,
    ) -> io::Result<()>;
}

/// Identifier-level view of one subsystem.
///
/// Cloned species share their original's id, so species are listed once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedSubsystem {
    pub name: String,
    pub species: Vec<String>,
    pub reactions: Vec<String>,
    /// `(source id, target id)` in edge order.
    pub edges: Vec<(String, String)>,
}

impl ExportedSubsystem {
    #[must_use]
    pub fn from_subsystem(graph: &MetabolicGraph, subsystem: &Subsystem) -> Self {
        let species: BTreeSet<&str> = subsystem
            .species()
            .iter()
            .map(|&n| graph.id_of(n))
            .collect();
        let reactions = subsystem
            .reactions()
            .iter()
            .map(|&n| graph.id_of(n).to_string())
            .collect();
        let edges = subsystem
            .edges()
            .iter()
            .filter_map(|&e| graph.edge_endpoints(e))
            .map(|(s, t)| (graph.id_of(s).to_string(), graph.id_of(t).to_string()))
            .collect();
        Self {
            name: subsystem.name().to_string(),
            species: species.into_iter().map(str::to_string).collect(),
            reactions,
            edges,
        }
    }
}

/// Exports a JSON array of [`ExportedSubsystem`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonSubsystemExporter {
    pub pretty: bool,
}

impl SubsystemExporter for JsonSubsystemExporter {
    fn format(&self) -> &'static str {
        "json"
    }

    fn export(
        &self,
        graph: &MetabolicGraph,
        subsystems: &[&Subsystem],
        sink: &mut dyn Write,
    ) -> io::Result<()> {
        let payload: Vec<ExportedSubsystem> = subsystems
            .iter()
            .map(|s| ExportedSubsystem::from_subsystem(graph, s))
            .collect();
        if self.pretty {
            serde_json::to_writer_pretty(&mut *sink, &payload)?;
        } else {
            serde_json::to_writer(&mut *sink, &payload)?;
        }
        writeln!(sink)
    }
}
