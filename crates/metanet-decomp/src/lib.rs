#![forbid(unsafe_code)]
//! metanet-decomp library.
//!
//! Subsystem analysis of metabolic networks: decomposition into subsystems,
//! the subsystem-level overview graph, and over-representation analysis.
//!
//! # Conventions
//!
//! - **Errors**: one `thiserror` enum per concern, each mapping onto
//!   [`metanet_core::ErrorCode`].
//! - **Logging**: `tracing` spans on entry points, `debug!` for intermediate
//!   counts, `warn!` for degraded per-subsystem results.
//! - **Identity**: nodes and edges are petgraph indices into the working
//!   graph; subsystems are positions in their decomposition.

pub mod decompose;
pub mod export;
pub mod ora;
pub mod overview;
pub mod session;
pub mod subsystem;

pub use decompose::{
    DecomposedModel, DecompositionEngine, DecompositionError, DecompositionOptions,
    DecompositionStrategy, strategy_for,
};
pub use export::{JsonSubsystemExporter, SubsystemExporter};
pub use ora::{OraReport, OverRepresentationAnalysis, TestOutcome};
pub use overview::{InterfaceEdge, OverviewGraph};
pub use session::{Session, SessionError};
pub use subsystem::{Decomposition, Subsystem, SubsystemId};
