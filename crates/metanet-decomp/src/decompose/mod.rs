//! Decomposition engine.
//!
//! # Overview
//!
//! A decomposition partitions (or covers) the reactions of a metabolic
//! network into named subsystems. The engine is strategy-polymorphic: a
//! [`DecompositionStrategy`] supplies the subsystems it recognises, and the
//! engine then classifies what is left over.
//!
//! ## Pipeline
//!
//! ```text
//! MetabolicGraph
//!        ↓  SpeciesCloner::clone_species()        (only if the strategy requires it)
//! working graph
//!        ↓  DecompositionStrategy::run_specific()
//! Vec<Subsystem>  →  Decomposition
//!        ↓  transporter_subsystem()               (add_transporter_subsystem)
//!        ↓  default_subsystem()                   (add_default_subsystem)
//!        ↓  split::split_default_subsystem()      (split_default_subsystem)
//! Decomposition
//! ```
//!
//! ## Leftover classification
//!
//! - **Transporter**: an unclassified reaction with exactly one incoming and
//!   one outgoing edge whose two neighbouring species both carry a
//!   compartment attribute, and the two compartments differ.
//! - **Default**: every reaction still unclassified, with all incident edges
//!   and species.
//! - **Split default**: connected components of the default subsystem with at
//!   least `minimum_subsystem_size` nodes become `DEFAULT 1`, `DEFAULT 2`, …;
//!   the rest is recomputed as `DEFAULT 0`.

pub mod attribute;
pub mod compartment;
pub mod schuster;
pub mod split;

use std::borrow::Cow;

use metanet_core::config::{DecompositionConfig, DecompositionMethod};
use metanet_core::error::{ErrorCode, ModelError};
use metanet_core::model::{MetabolicGraph, SpeciesCloner};
use tracing::{debug, info, instrument};

use crate::subsystem::{DEFAULT_SUBSYSTEM, Decomposition, Subsystem, TRANSPORTER_SUBSYSTEM};

pub use attribute::AttributeDecomposition;
pub use compartment::CompartmentDecomposition;
pub use schuster::SchusterDecomposition;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by a decomposition run.
#[derive(Debug, thiserror::Error)]
pub enum DecompositionError {
    /// The strategy needs cloned species but no cloner was supplied.
    #[error("decomposition method '{0}' requires species cloning, but no cloner is installed")]
    CloningUnavailable(String),

    /// The cloning collaborator failed.
    #[error("species cloning failed: {0}")]
    CloningFailed(#[source] ModelError),
}

impl DecompositionError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::CloningUnavailable(_) => ErrorCode::CloningUnavailable,
            Self::CloningFailed(_) => ErrorCode::CloningFailed,
        }
    }
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// A way of recognising subsystems in a metabolic network.
///
/// `run_specific` sees only the graph: it must not depend on which reactions
/// the engine later treats as unclassified.
pub trait DecompositionStrategy {
    /// Human-readable method name.
    fn name(&self) -> &str;

    /// Whether species must be cloned before `run_specific`.
    fn requires_cloning(&self) -> bool {
        false
    }

    /// Produce the strategy's own subsystems.
    fn run_specific(&self, graph: &MetabolicGraph) -> Vec<Subsystem>;
}

/// Build the strategy selected in `config`.
#[must_use]
pub fn strategy_for(config: &DecompositionConfig) -> Box<dyn DecompositionStrategy> {
    match config.method {
        DecompositionMethod::Predefined => Box::new(AttributeDecomposition::predefined()),
        DecompositionMethod::Attribute => Box::new(AttributeDecomposition::new(
            &config.attribute_namespace,
            &config.attribute_key,
            config.attribute_separator.as_deref(),
        )),
        DecompositionMethod::Compartment => Box::new(CompartmentDecomposition),
        DecompositionMethod::Schuster => {
            Box::new(SchusterDecomposition::new(config.schuster_degree_threshold))
        }
        DecompositionMethod::DiseaseMap => Box::new(AttributeDecomposition::disease_map_pathway()),
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Leftover-handling switches for a decomposition run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecompositionOptions {
    pub add_transporter_subsystem: bool,
    pub add_default_subsystem: bool,
    pub split_default_subsystem: bool,
    pub minimum_subsystem_size: usize,
}

impl Default for DecompositionOptions {
    fn default() -> Self {
        Self {
            add_transporter_subsystem: true,
            add_default_subsystem: true,
            split_default_subsystem: false,
            minimum_subsystem_size: 3,
        }
    }
}

impl From<&DecompositionConfig> for DecompositionOptions {
    fn from(config: &DecompositionConfig) -> Self {
        Self {
            add_transporter_subsystem: config.add_transporter,
            add_default_subsystem: config.add_default,
            split_default_subsystem: config.split_default,
            minimum_subsystem_size: config.min_subsystem_size,
        }
    }
}

/// The working graph a decomposition refers to, plus the decomposition.
///
/// `graph` is borrowed unless cloning produced a new working copy.
#[derive(Debug)]
pub struct DecomposedModel<'g> {
    pub graph: Cow<'g, MetabolicGraph>,
    pub decomposition: Decomposition,
}

/// Runs a [`DecompositionStrategy`] and classifies leftover reactions.
pub struct DecompositionEngine<'a> {
    strategy: &'a dyn DecompositionStrategy,
    cloner: Option<&'a dyn SpeciesCloner>,
}

impl<'a> DecompositionEngine<'a> {
    #[must_use]
    pub fn new(strategy: &'a dyn DecompositionStrategy) -> Self {
        Self {
            strategy,
            cloner: None,
        }
    }

    /// Install the cloning collaborator used by strategies that need it.
    #[must_use]
    pub fn with_cloner(mut self, cloner: &'a dyn SpeciesCloner) -> Self {
        self.cloner = Some(cloner);
        self
    }

    /// Clone species if required, then decompose.
    ///
    /// # Errors
    ///
    /// Fails when the strategy requires cloning and no cloner is installed,
    /// or when the cloner itself fails. Nothing is retried.
    #[instrument(skip_all, fields(method = self.strategy.name()))]
    pub fn run<'g>(
        &self,
        graph: &'g MetabolicGraph,
        options: &DecompositionOptions,
    ) -> Result<DecomposedModel<'g>, DecompositionError> {
        let graph: Cow<'g, MetabolicGraph> = if self.strategy.requires_cloning() {
            let cloner = self.cloner.ok_or_else(|| {
                DecompositionError::CloningUnavailable(self.strategy.name().to_string())
            })?;
            Cow::Owned(
                cloner
                    .clone_species(graph)
                    .map_err(DecompositionError::CloningFailed)?,
            )
        } else {
            Cow::Borrowed(graph)
        };

        let decomposition = self.decompose(&graph, options);
        Ok(DecomposedModel {
            graph,
            decomposition,
        })
    }

    /// Decompose an already prepared working graph.
    #[must_use]
    pub fn decompose(
        &self,
        graph: &MetabolicGraph,
        options: &DecompositionOptions,
    ) -> Decomposition {
        let specific = self.strategy.run_specific(graph);
        debug!(subsystems = specific.len(), "strategy finished");
        let mut decomposition = Decomposition::new(specific);

        if options.add_transporter_subsystem {
            decomposition.add_subsystem(transporter_subsystem(graph, &decomposition));
        }

        if options.add_default_subsystem {
            let default = default_subsystem(graph, &decomposition);
            if options.split_default_subsystem {
                for part in
                    split::split_default_subsystem(graph, &default, options.minimum_subsystem_size)
                {
                    decomposition.add_subsystem(part);
                }
                let mut remainder = default_subsystem(graph, &decomposition);
                remainder.set_name(format!("{DEFAULT_SUBSYSTEM} 0"));
                decomposition.add_subsystem(remainder);
            } else {
                decomposition.add_subsystem(default);
            }
        }

        info!(
            subsystems = decomposition.len(),
            classified = decomposition.classified_reaction_count(),
            reactions = graph.reaction_nodes().count(),
            "decomposition complete"
        );
        decomposition
    }
}

/// Collect unclassified reactions that move one species between compartments.
#[must_use]
pub fn transporter_subsystem(graph: &MetabolicGraph, decomposition: &Decomposition) -> Subsystem {
    let mut subsystem = Subsystem::new(TRANSPORTER_SUBSYSTEM);

    for reaction in graph.reaction_nodes() {
        if decomposition.has_reaction_been_classified(reaction) {
            continue;
        }
        let (in_edges, out_edges) = (graph.in_edges(reaction), graph.out_edges(reaction));
        let ([in_edge], [out_edge]) = (in_edges.as_slice(), out_edges.as_slice()) else {
            continue;
        };
        let (Some((substrate, _)), Some((_, product))) =
            (graph.edge_endpoints(*in_edge), graph.edge_endpoints(*out_edge))
        else {
            continue;
        };
        let (Some(from), Some(to)) = (graph.compartment(substrate), graph.compartment(product))
        else {
            continue;
        };
        if from != to {
            subsystem.add_reaction(reaction);
            subsystem.add_edge_with_endpoints(graph, *in_edge);
            subsystem.add_edge_with_endpoints(graph, *out_edge);
        }
    }

    debug!(reactions = subsystem.reaction_count(), "transporter subsystem");
    subsystem
}

/// Collect every still-unclassified reaction with its neighbourhood.
#[must_use]
pub fn default_subsystem(graph: &MetabolicGraph, decomposition: &Decomposition) -> Subsystem {
    let mut subsystem = Subsystem::new(DEFAULT_SUBSYSTEM);
    for reaction in graph.reaction_nodes() {
        if !decomposition.has_reaction_been_classified(reaction) {
            subsystem.add_reaction_with_neighborhood(graph, reaction);
        }
    }
    debug!(reactions = subsystem.reaction_count(), "default subsystem");
    subsystem
}
