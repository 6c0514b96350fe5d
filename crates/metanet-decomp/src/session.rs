//! Explicit analysis session.
//!
//! A [`Session`] owns the active model and everything derived from it: the
//! working (possibly cloned) graph, the overview graph with its
//! decomposition, and the last ORA report. Optional collaborators (species
//! cloning, subsystem export) are injected by the host.
//!
//! Every operation checks its preconditions before touching state, so a
//! failed call leaves the session exactly as it was.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use metanet_core::error::ErrorCode;
use metanet_core::io::read_identifier_list;
use metanet_core::model::{MetabolicGraph, SpeciesCloner};
use tracing::{debug, info, instrument};

use crate::decompose::{
    DecomposedModel, DecompositionEngine, DecompositionError, DecompositionOptions,
    DecompositionStrategy,
};
use crate::export::SubsystemExporter;
use crate::ora::{OraReport, OverRepresentationAnalysis, resolve_identifiers};
use crate::overview::OverviewGraph;
use crate::subsystem::{Decomposition, Subsystem, SubsystemId};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no model is loaded")]
    NoModel,

    #[error("no overview graph has been constructed")]
    NoOverview,

    #[error(transparent)]
    Decomposition(#[from] DecompositionError),

    #[error("failed to read identifier list {path}: {source}")]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not available: no exporter is installed")]
    CapabilityUnavailable(&'static str),

    #[error("unknown subsystem {0}")]
    UnknownSubsystem(SubsystemId),

    #[error("subsystem export failed: {0}")]
    Export(#[source] std::io::Error),
}

impl SessionError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NoModel => ErrorCode::NoModel,
            Self::NoOverview => ErrorCode::NoOverview,
            Self::Decomposition(err) => err.code(),
            Self::InputUnreadable { .. } => ErrorCode::InputFileUnreadable,
            Self::CapabilityUnavailable(_) => ErrorCode::CapabilityUnavailable,
            Self::UnknownSubsystem(_) => ErrorCode::UnknownSubsystem,
            Self::Export(_) => ErrorCode::ExportFailed,
        }
    }
}

#[derive(Default)]
pub struct Session {
    model: Option<MetabolicGraph>,
    /// Cloned copy of `model`, present only when the last decomposition
    /// required cloning.
    working: Option<MetabolicGraph>,
    overview: Option<OverviewGraph>,
    last_ora: Option<OraReport>,
    cloner: Option<Box<dyn SpeciesCloner>>,
    exporter: Option<Box<dyn SubsystemExporter>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("model", &self.model.as_ref().map(|m| m.content_hash.as_str()))
            .field("cloned", &self.working.is_some())
            .field("overview", &self.overview.as_ref().map(OverviewGraph::node_count))
            .field("ora", &self.last_ora.is_some())
            .field("cloner", &self.cloner.is_some())
            .field(
                "exporter",
                &self.exporter.as_ref().map(|e| e.format().to_string()),
            )
            .finish()
    }
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cloner(mut self, cloner: Box<dyn SpeciesCloner>) -> Self {
        self.cloner = Some(cloner);
        self
    }

    #[must_use]
    pub fn with_exporter(mut self, exporter: Box<dyn SubsystemExporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Make `graph` the active model, discarding everything derived from
    /// the previous one.
    pub fn set_model(&mut self, graph: MetabolicGraph) {
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            hash = %graph.content_hash,
            "model activated"
        );
        self.partial_reset();
        self.model = Some(graph);
    }

    #[must_use]
    pub const fn model(&self) -> Option<&MetabolicGraph> {
        self.model.as_ref()
    }

    /// Graph the current decomposition refers to: the cloned copy if one
    /// exists, else the model.
    #[must_use]
    pub fn working_graph(&self) -> Option<&MetabolicGraph> {
        self.working.as_ref().or(self.model.as_ref())
    }

    #[must_use]
    pub const fn overview(&self) -> Option<&OverviewGraph> {
        self.overview.as_ref()
    }

    #[must_use]
    pub fn decomposition(&self) -> Option<&Decomposition> {
        self.overview.as_ref().map(OverviewGraph::decomposition)
    }

    #[must_use]
    pub const fn last_ora(&self) -> Option<&OraReport> {
        self.last_ora.as_ref()
    }

    /// Significant subsystems of the last ORA run.
    #[must_use]
    pub fn significant_subsystems(&self) -> Option<&[SubsystemId]> {
        self.last_ora.as_ref().map(|r| r.significant.as_slice())
    }

    /// Decompose the active model and build its overview graph.
    ///
    /// Replaces any previous overview; the previous one survives if this
    /// call fails.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoModel`] without a model, or the decomposition error
    /// (missing or failing cloner).
    #[instrument(skip_all, fields(method = strategy.name()))]
    pub fn build_overview(
        &mut self,
        strategy: &dyn DecompositionStrategy,
        options: &DecompositionOptions,
    ) -> Result<&OverviewGraph, SessionError> {
        let model = self.model.as_ref().ok_or(SessionError::NoModel)?;

        let mut engine = DecompositionEngine::new(strategy);
        if let Some(cloner) = self.cloner.as_deref() {
            engine = engine.with_cloner(cloner);
        }
        let DecomposedModel {
            graph,
            decomposition,
        } = engine.run(model, options)?;

        let working = match graph {
            Cow::Owned(cloned) => Some(cloned),
            Cow::Borrowed(_) => None,
        };
        let overview = OverviewGraph::build(decomposition, working.as_ref().unwrap_or(model));

        if self.overview.is_some() {
            debug!("replacing previous overview");
        }
        self.last_ora = None;
        self.working = working;
        Ok(&*self.overview.insert(overview))
    }

    /// Read identifier lists and run ORA on the current decomposition.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoModel`], [`SessionError::NoOverview`], or
    /// [`SessionError::InputUnreadable`] when a list cannot be read.
    #[instrument(skip(self, analysis))]
    pub fn run_ora(
        &mut self,
        differential_path: &Path,
        reference_path: Option<&Path>,
        analysis: &OverRepresentationAnalysis,
    ) -> Result<&OraReport, SessionError> {
        let graph = self.working_graph().ok_or(SessionError::NoModel)?;
        let overview = self.overview.as_ref().ok_or(SessionError::NoOverview)?;

        let differential_ids = read_list(differential_path)?;
        let reference_ids = match reference_path {
            Some(path) => read_list(path)?,
            None => BTreeSet::new(),
        };

        let input = resolve_identifiers(graph, &differential_ids, &reference_ids);
        if !input.unmatched.is_empty() {
            debug!(
                unmatched = input.unmatched.len(),
                "differential identifiers without a species"
            );
        }
        let report = analysis.analyze(
            &input.differential,
            &input.reference,
            overview.decomposition(),
            graph,
        );
        Ok(&*self.last_ora.insert(report))
    }

    /// Drop the model and everything derived from it.
    pub fn reset(&mut self) {
        self.partial_reset();
        self.model = None;
    }

    /// Drop clones, decomposition, overview and ORA results; keep the model.
    pub fn partial_reset(&mut self) {
        self.working = None;
        self.overview = None;
        self.last_ora = None;
    }

    /// Export the selected subsystems through the installed exporter.
    ///
    /// Returns the number of subsystems written.
    ///
    /// # Errors
    ///
    /// Precondition errors, [`SessionError::CapabilityUnavailable`] without
    /// an exporter, [`SessionError::UnknownSubsystem`] for a bad selection,
    /// or [`SessionError::Export`] when writing fails.
    pub fn export_subsystems(
        &self,
        selection: &[SubsystemId],
        sink: &mut dyn Write,
    ) -> Result<usize, SessionError> {
        let graph = self.working_graph().ok_or(SessionError::NoModel)?;
        let decomposition = self.decomposition().ok_or(SessionError::NoOverview)?;
        let exporter = self
            .exporter
            .as_deref()
            .ok_or(SessionError::CapabilityUnavailable("subsystem export"))?;

        let subsystems: Vec<&Subsystem> = selection
            .iter()
            .map(|&id| {
                decomposition
                    .subsystem(id)
                    .ok_or(SessionError::UnknownSubsystem(id))
            })
            .collect::<Result<_, _>>()?;

        exporter
            .export(graph, &subsystems, sink)
            .map_err(SessionError::Export)?;
        info!(
            format = exporter.format(),
            subsystems = subsystems.len(),
            "subsystems exported"
        );
        Ok(subsystems.len())
    }
}

fn read_list(path: &Path) -> Result<BTreeSet<String>, SessionError> {
    read_identifier_list(path).map_err(|source| SessionError::InputUnreadable {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decompose::AttributeDecomposition;
    use crate::export::JsonSubsystemExporter;
    use metanet_core::model::{DegreeThresholdCloner, GraphBuilder, SBML_NAMESPACE, SUBSYSTEM_KEY};

    fn model() -> MetabolicGraph {
        let mut b = GraphBuilder::new();
        for s in ["a", "b", "c"] {
            b.add_species(s, Some("c")).expect("species");
        }
        b.add_reaction("R1").expect("R1");
        b.add_reaction("R2").expect("R2");
        b.add_substrate("a", "R1").expect("edge");
        b.add_product("R1", "b").expect("edge");
        b.add_substrate("b", "R2").expect("edge");
        b.add_product("R2", "c").expect("edge");
        b.set_attribute("R1", SBML_NAMESPACE, SUBSYSTEM_KEY, "Upper")
            .expect("attr");
        b.set_attribute("R2", SBML_NAMESPACE, SUBSYSTEM_KEY, "Lower")
            .expect("attr");
        b.set_attribute("R1", "lmme", "pathway", "P").expect("attr");
        b.build()
    }

    #[test]
    fn operations_need_a_model() {
        let mut session = Session::new();
        let err = session
            .build_overview(&AttributeDecomposition::predefined(), &DecompositionOptions::default())
            .expect_err("no model");
        assert_eq!(err.code(), ErrorCode::NoModel);
        assert!(session.overview().is_none());
    }

    #[test]
    fn ora_needs_an_overview() {
        let mut session = Session::new();
        session.set_model(model());
        let dir = tempfile::tempdir().expect("tempdir");
        let diff = dir.path().join("diff.txt");
        std::fs::write(&diff, "a\n").expect("write");
        let err = session
            .run_ora(&diff, None, &OverRepresentationAnalysis::default())
            .expect_err("no overview");
        assert!(matches!(err, SessionError::NoOverview));
    }

    #[test]
    fn build_then_ora_then_partial_reset() {
        let mut session = Session::new();
        session.set_model(model());
        let overview = session
            .build_overview(&AttributeDecomposition::predefined(), &DecompositionOptions::default())
            .expect("overview");
        // Upper, Lower, TRANSPORTER (empty), DEFAULT (empty).
        assert_eq!(overview.node_count(), 4);
        assert_eq!(overview.edge_count(), 1);

        let dir = tempfile::tempdir().expect("tempdir");
        let diff = dir.path().join("diff.txt");
        std::fs::write(&diff, "a\n").expect("write");
        let report = session
            .run_ora(&diff, None, &OverRepresentationAnalysis::default())
            .expect("ora");
        assert_eq!(report.tests.len(), 4);
        assert!(session.significant_subsystems().is_some());

        session.partial_reset();
        assert!(session.model().is_some());
        assert!(session.overview().is_none());
        assert!(session.last_ora().is_none());

        session.reset();
        assert!(session.model().is_none());
    }

    #[test]
    fn missing_list_is_reported_and_state_kept() {
        let mut session = Session::new();
        session.set_model(model());
        session
            .build_overview(&AttributeDecomposition::predefined(), &DecompositionOptions::default())
            .expect("overview");
        let err = session
            .run_ora(
                Path::new("/nonexistent/diff.txt"),
                None,
                &OverRepresentationAnalysis::default(),
            )
            .expect_err("missing file");
        assert_eq!(err.code(), ErrorCode::InputFileUnreadable);
        assert!(session.overview().is_some());
        assert!(session.last_ora().is_none());
    }

    #[test]
    fn cloning_strategy_needs_cloner() {
        let mut session = Session::new();
        session.set_model(model());
        session
            .build_overview(&AttributeDecomposition::predefined(), &DecompositionOptions::default())
            .expect("overview");

        let err = session
            .build_overview(
                &AttributeDecomposition::disease_map_pathway(),
                &DecompositionOptions::default(),
            )
            .expect_err("no cloner");
        assert_eq!(err.code(), ErrorCode::CloningUnavailable);
        // The earlier overview survives the failed rebuild.
        assert_eq!(session.overview().map(OverviewGraph::node_count), Some(4));
    }

    #[test]
    fn cloning_strategy_uses_installed_cloner() {
        let mut session =
            Session::new().with_cloner(Box::new(DegreeThresholdCloner::new(Vec::new(), 2)));
        session.set_model(model());
        session
            .build_overview(
                &AttributeDecomposition::disease_map_pathway(),
                &DecompositionOptions::default(),
            )
            .expect("overview");
        let working = session.working_graph().expect("working");
        assert_eq!(working.clone_count(), 1);
        assert_eq!(session.model().map(MetabolicGraph::clone_count), Some(0));
    }

    #[test]
    fn export_requires_capability() {
        let mut session = Session::new();
        session.set_model(model());
        session
            .build_overview(&AttributeDecomposition::predefined(), &DecompositionOptions::default())
            .expect("overview");
        let mut sink = Vec::new();
        let err = session
            .export_subsystems(&[SubsystemId(0)], &mut sink)
            .expect_err("no exporter");
        assert_eq!(err.code(), ErrorCode::CapabilityUnavailable);
        assert!(sink.is_empty());
    }

    #[test]
    fn export_writes_selection() {
        let mut session = Session::new().with_exporter(Box::new(JsonSubsystemExporter::default()));
        session.set_model(model());
        session
            .build_overview(&AttributeDecomposition::predefined(), &DecompositionOptions::default())
            .expect("overview");

        let mut sink = Vec::new();
        let written = session
            .export_subsystems(&[SubsystemId(1)], &mut sink)
            .expect("export");
        assert_eq!(written, 1);
        let value: serde_json::Value = serde_json::from_slice(&sink).expect("json");
        assert_eq!(value[0]["name"], "Lower");

        let err = session
            .export_subsystems(&[SubsystemId(9)], &mut Vec::new())
            .expect_err("unknown");
        assert!(matches!(err, SessionError::UnknownSubsystem(SubsystemId(9))));
    }
}
