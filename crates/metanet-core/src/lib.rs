#![forbid(unsafe_code)]
//! metanet-core library.
//!
//! The metabolic network model every other metanet crate works on, plus the
//! ambient pieces they share: error codes, configuration, identifier-list
//! input and phase timing.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums for model errors, `anyhow::Result` for
//!   file-loading helpers.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod timing;

pub use error::{ErrorCode, ModelError};
pub use model::{MetabolicGraph, NodeRole};
