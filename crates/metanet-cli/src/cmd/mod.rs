//! Subcommand handlers and the argument groups they share.

pub mod completions;
pub mod config;
pub mod decompose;
pub mod export;
pub mod interfaces;
pub mod ora;
pub mod overview;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use metanet_core::ErrorCode;
use metanet_core::config::{DecompositionConfig, DecompositionMethod};
use metanet_core::model::{DegreeThresholdCloner, MetabolicGraph, load_model};
use metanet_core::timing::PhaseTimer;
use metanet_decomp::{
    Decomposition, DecompositionOptions, JsonSubsystemExporter, OverviewGraph, Session,
    SessionError, SubsystemId, strategy_for,
};
use tracing::debug;

use crate::output::CodedError;

/// Model input plus decomposition overrides.
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// COBRA-style JSON model file.
    #[arg(value_name = "MODEL")]
    pub model: PathBuf,

    #[command(flatten)]
    pub decomposition: DecompositionArgs,
}

/// Command-line overrides for `[decomposition]` in `.metanet/config.toml`.
#[derive(Args, Debug, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct DecompositionArgs {
    /// Decomposition method: predefined, attribute, compartment, schuster, disease-map.
    #[arg(short, long, value_parser = parse_method, help_heading = "Decomposition")]
    pub method: Option<DecompositionMethod>,

    /// Attribute namespace read by `--method attribute`.
    #[arg(long, value_name = "NS", help_heading = "Decomposition")]
    pub attribute_namespace: Option<String>,

    /// Attribute key read by `--method attribute`.
    #[arg(long, value_name = "KEY", help_heading = "Decomposition")]
    pub attribute_key: Option<String>,

    /// Separator for multi-valued attribute labels.
    #[arg(long, value_name = "SEP", help_heading = "Decomposition")]
    pub separator: Option<String>,

    /// Do not collect transport reactions into TRANSPORTER.
    #[arg(long, help_heading = "Decomposition")]
    pub no_transporter: bool,

    /// Leave unclassified reactions out of the decomposition.
    #[arg(long, conflicts_with = "split_default", help_heading = "Decomposition")]
    pub no_default: bool,

    /// Split DEFAULT into its connected components.
    #[arg(long, help_heading = "Decomposition")]
    pub split_default: bool,

    /// Minimum node count for a split DEFAULT component.
    #[arg(long, value_name = "N", help_heading = "Decomposition")]
    pub min_size: Option<usize>,

    /// Degree above which a species counts as a currency metabolite (schuster).
    #[arg(long, value_name = "N", help_heading = "Decomposition")]
    pub degree_threshold: Option<usize>,

    /// Species id eligible for cloning (repeatable; none means any species).
    #[arg(long = "clonable", value_name = "ID", help_heading = "Decomposition")]
    pub clonable: Vec<String>,

    /// Minimum degree before a species is cloned.
    #[arg(long, value_name = "N", help_heading = "Decomposition")]
    pub clone_threshold: Option<usize>,
}

impl DecompositionArgs {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut DecompositionConfig) {
        if let Some(method) = self.method {
            config.method = method;
        }
        if let Some(ns) = &self.attribute_namespace {
            config.attribute_namespace.clone_from(ns);
        }
        if let Some(key) = &self.attribute_key {
            config.attribute_key.clone_from(key);
        }
        if self.separator.is_some() {
            config.attribute_separator.clone_from(&self.separator);
        }
        if self.no_transporter {
            config.add_transporter = false;
        }
        if self.no_default {
            config.add_default = false;
        }
        if self.split_default {
            config.split_default = true;
            config.add_default = true;
        }
        if let Some(size) = self.min_size {
            config.min_subsystem_size = size;
        }
        if let Some(threshold) = self.degree_threshold {
            config.schuster_degree_threshold = threshold;
        }
        if !self.clonable.is_empty() {
            config.clonable_species.clone_from(&self.clonable);
        }
        if let Some(threshold) = self.clone_threshold {
            config.clone_threshold = threshold;
        }
    }
}

fn parse_method(raw: &str) -> Result<DecompositionMethod, String> {
    DecompositionMethod::from_name(raw).ok_or_else(|| {
        let names: Vec<&str> = DecompositionMethod::ALL
            .into_iter()
            .map(DecompositionMethod::as_str)
            .collect();
        format!("unknown method '{raw}' (expected one of: {})", names.join(", "))
    })
}

impl ModelArgs {
    /// Project `[decomposition]` settings with this command's flags applied.
    pub fn settings(&self, defaults: &DecompositionConfig) -> DecompositionConfig {
        let mut settings = defaults.clone();
        self.decomposition.apply(&mut settings);
        debug!(method = settings.method.as_str(), "decomposition settings resolved");
        settings
    }
}

/// Load the model, decompose it and build the overview graph.
///
/// The returned session carries a degree-threshold cloner and a JSON
/// exporter, so every built-in method and `export` work.
pub fn open_session(
    model: &Path,
    settings: &DecompositionConfig,
    timer: &mut PhaseTimer,
) -> Result<Session> {
    let graph = timer.time("load", || load_model(model))?;
    let strategy = strategy_for(settings);
    let options = DecompositionOptions::from(settings);

    let mut session = Session::new()
        .with_cloner(Box::new(DegreeThresholdCloner::new(
            settings.clonable_species.clone(),
            settings.clone_threshold,
        )))
        .with_exporter(Box::new(JsonSubsystemExporter { pretty: true }));
    session.set_model(graph);

    timer.time("decompose", || {
        session
            .build_overview(strategy.as_ref(), &options)
            .map(|_| ())
    })?;
    Ok(session)
}

/// The working graph and overview of a session built by [`open_session`].
pub fn built(session: &Session) -> Result<(&MetabolicGraph, &OverviewGraph), SessionError> {
    let graph = session.working_graph().ok_or(SessionError::NoModel)?;
    let overview = session.overview().ok_or(SessionError::NoOverview)?;
    Ok((graph, overview))
}

/// Look a subsystem up by its exact name.
pub fn subsystem_by_name(decomposition: &Decomposition, name: &str) -> Result<SubsystemId> {
    decomposition.find_by_name(name).ok_or_else(|| {
        CodedError::new(
            ErrorCode::UnknownSubsystem,
            format!("no subsystem named '{name}'"),
        )
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names_parse_case_insensitively() {
        assert_eq!(parse_method("Schuster"), Ok(DecompositionMethod::Schuster));
        assert_eq!(
            parse_method("disease-map"),
            Ok(DecompositionMethod::DiseaseMap)
        );
        let err = parse_method("louvain").expect_err("unknown");
        assert!(err.contains("predefined, attribute"));
    }

    #[test]
    fn only_given_flags_override_config() {
        let mut config = DecompositionConfig {
            min_subsystem_size: 7,
            ..DecompositionConfig::default()
        };
        let args = DecompositionArgs {
            method: Some(DecompositionMethod::Compartment),
            no_transporter: true,
            ..DecompositionArgs::default()
        };
        args.apply(&mut config);
        assert_eq!(config.method, DecompositionMethod::Compartment);
        assert!(!config.add_transporter);
        assert!(config.add_default);
        assert_eq!(config.min_subsystem_size, 7);
    }

    #[test]
    fn split_default_implies_default() {
        let mut config = DecompositionConfig {
            add_default: false,
            ..DecompositionConfig::default()
        };
        let args = DecompositionArgs {
            split_default: true,
            min_size: Some(2),
            ..DecompositionArgs::default()
        };
        args.apply(&mut config);
        assert!(config.add_default && config.split_default);
        assert_eq!(config.min_subsystem_size, 2);
    }
}
