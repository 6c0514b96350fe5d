//! Over-representation analysis.
//!
//! # Overview
//!
//! Tests every subsystem for enrichment of a differential set of species
//! against a reference set, then controls the false discovery rate across
//! subsystems.
//!
//! ## Pipeline
//!
//! ```text
//! identifier lists ──resolve_identifiers()──▶ OraInput { differential ⊆ reference }
//!                                                 │
//! Decomposition ───────────────────────────────▶ analyze()
//!                                                 │  per subsystem: originals via original_of,
//!                                                 │  n = |reference ∩ S|, k = |differential ∩ S|,
//!                                                 │  p = P(X ≥ k), X ~ Hypergeometric(N, K, n)
//!                                                 ▼
//!                                  benjamini_hochberg(p, m = #subsystems, α)
//!                                                 ▼
//!                                             OraReport
//! ```
//!
//! Subsystems whose test cannot be evaluated (empty sample, invalid
//! parameters) are reported as [`TestOutcome::Degenerate`], count towards
//! `m`, and are never significant.

pub mod fdr;
pub mod hypergeometric;

use std::collections::{BTreeSet, HashSet};

use metanet_core::error::ErrorCode;
use metanet_core::model::MetabolicGraph;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::subsystem::{Decomposition, SubsystemId};

pub use fdr::benjamini_hochberg;
pub use hypergeometric::{Hypergeometric, HypergeometricError};

/// Default false-discovery-rate level.
pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OraError {
    #[error("significance level must lie in (0, 1], got {0}")]
    InvalidSignificanceLevel(f64),
}

impl OraError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidSignificanceLevel(_) => ErrorCode::InvalidSignificanceLevel,
        }
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Differential and reference species, as original (uncloned) nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OraInput {
    pub differential: BTreeSet<NodeIndex>,
    pub reference: BTreeSet<NodeIndex>,
    /// Differential identifiers that matched no species.
    pub unmatched: Vec<String>,
}

/// Map identifier lists onto the original species of `graph`.
///
/// Differential species always join the reference. An empty reference list
/// selects every original species.
#[must_use]
pub fn resolve_identifiers(
    graph: &MetabolicGraph,
    differential_ids: &BTreeSet<String>,
    reference_ids: &BTreeSet<String>,
) -> OraInput {
    let mut input = OraInput::default();
    let mut matched: HashSet<&str> = HashSet::new();

    for species in graph.original_species_nodes() {
        let id = graph.id_of(species);
        if differential_ids.contains(id) {
            input.differential.insert(species);
            input.reference.insert(species);
            matched.insert(id);
        }
        if reference_ids.is_empty() || reference_ids.contains(id) {
            input.reference.insert(species);
        }
    }

    input.unmatched = differential_ids
        .iter()
        .filter(|id| !matched.contains(id.as_str()))
        .cloned()
        .collect();
    input
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateReason {
    /// The subsystem holds no reference species.
    EmptySample,
    /// The distribution could not be evaluated.
    Numerical(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome {
    Tested(f64),
    Degenerate(DegenerateReason),
}

impl TestOutcome {
    /// The p-value used for ranking; degenerate tests count as 1.0.
    #[must_use]
    pub const fn p_value(&self) -> f64 {
        match self {
            Self::Tested(p) => *p,
            Self::Degenerate(_) => 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubsystemTest {
    pub subsystem: SubsystemId,
    pub name: String,
    pub reference_hits: usize,
    pub differential_hits: usize,
    pub outcome: TestOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OraReport {
    /// `N`: size of the reference set.
    pub population: usize,
    /// `K`: size of the differential set.
    pub successes: usize,
    pub significance_level: f64,
    /// One entry per subsystem, in decomposition order.
    pub tests: Vec<SubsystemTest>,
    /// Significant subsystems, by ascending p-value.
    pub significant: Vec<SubsystemId>,
}

impl OraReport {
    #[must_use]
    pub fn is_significant(&self, subsystem: SubsystemId) -> bool {
        self.significant.contains(&subsystem)
    }

    #[must_use]
    pub fn test(&self, subsystem: SubsystemId) -> Option<&SubsystemTest> {
        self.tests.iter().find(|t| t.subsystem == subsystem)
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverRepresentationAnalysis {
    significance_level: f64,
}

impl Default for OverRepresentationAnalysis {
    fn default() -> Self {
        Self {
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
        }
    }
}

impl OverRepresentationAnalysis {
    /// # Errors
    ///
    /// Fails unless `0 < significance_level ≤ 1`.
    pub fn new(significance_level: f64) -> Result<Self, OraError> {
        if significance_level.is_nan() || significance_level <= 0.0 || significance_level > 1.0 {
            return Err(OraError::InvalidSignificanceLevel(significance_level));
        }
        Ok(Self { significance_level })
    }

    #[must_use]
    pub const fn significance_level(&self) -> f64 {
        self.significance_level
    }

    /// Test every subsystem of `decomposition` and apply BH correction.
    ///
    /// `graph` is the working graph the decomposition refers to; its
    /// clone mapping folds cloned species back onto their originals. An
    /// empty `reference` selects every original species.
    #[instrument(skip_all, fields(subsystems = decomposition.len()))]
    #[must_use]
    pub fn analyze(
        &self,
        differential: &BTreeSet<NodeIndex>,
        reference: &BTreeSet<NodeIndex>,
        decomposition: &Decomposition,
        graph: &MetabolicGraph,
    ) -> OraReport {
        let differential: HashSet<NodeIndex> =
            differential.iter().map(|&n| graph.original_of(n)).collect();
        let mut reference: HashSet<NodeIndex> = if reference.is_empty() {
            graph.original_species_nodes().collect()
        } else {
            reference.iter().map(|&n| graph.original_of(n)).collect()
        };
        reference.extend(differential.iter().copied());

        let population = reference.len();
        let successes = differential.len();
        let distribution = Hypergeometric::new(population, successes);

        let mut tests = Vec::with_capacity(decomposition.len());
        let mut reference_temp: HashSet<NodeIndex> = HashSet::new();
        let mut differential_temp: HashSet<NodeIndex> = HashSet::new();
        for (id, subsystem) in decomposition.iter() {
            reference_temp.clear();
            differential_temp.clear();
            for &species in subsystem.species() {
                let original = graph.original_of(species);
                if differential.contains(&original) {
                    differential_temp.insert(original);
                    reference_temp.insert(original);
                } else if reference.contains(&original) {
                    reference_temp.insert(original);
                }
            }
            let (n, k) = (reference_temp.len(), differential_temp.len());

            let outcome = test_outcome(&distribution, n, k, id);

            tests.push(SubsystemTest {
                subsystem: id,
                name: subsystem.name().to_string(),
                reference_hits: n,
                differential_hits: k,
                outcome,
            });
        }

        let candidates: Vec<(SubsystemId, f64)> = tests
            .iter()
            .filter_map(|t| match t.outcome {
                TestOutcome::Tested(p) => Some((t.subsystem, p)),
                TestOutcome::Degenerate(_) => None,
            })
            .collect();
        debug!(
            tested = candidates.len(),
            degenerate = tests.len() - candidates.len(),
            "p-values computed"
        );

        let significant = if successes == 0 {
            Vec::new()
        } else {
            benjamini_hochberg(&candidates, tests.len(), self.significance_level)
        };

        info!(
            population,
            successes,
            significant = significant.len(),
            "over-representation analysis complete"
        );
        OraReport {
            population,
            successes,
            significance_level: self.significance_level,
            tests,
            significant,
        }
    }
}

/// Evaluate one subsystem's test; evaluation failures degrade to p = 1.0.
fn test_outcome(
    distribution: &Result<Hypergeometric, HypergeometricError>,
    n: usize,
    k: usize,
    subsystem: SubsystemId,
) -> TestOutcome {
    if n == 0 {
        return TestOutcome::Degenerate(DegenerateReason::EmptySample);
    }
    let p_value = distribution
        .as_ref()
        .map_err(Clone::clone)
        .and_then(|h| h.upper_tail(n, k));
    match p_value {
        Ok(p) => TestOutcome::Tested(p),
        Err(err) => {
            warn!(%subsystem, error = %err, "hypergeometric test failed");
            TestOutcome::Degenerate(DegenerateReason::Numerical(err.to_string()))
        }
    }
}
