//! `mnet export`: write selected subsystems through the session's exporter.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use metanet_core::config::ProjectConfig;
use metanet_core::timing::PhaseTimer;
use metanet_decomp::{OverRepresentationAnalysis, SessionError, SubsystemId};
use tracing::info;

use super::{ModelArgs, open_session, subsystem_by_name};

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Subsystem to export (repeatable; default: all).
    #[arg(short, long = "subsystem", value_name = "NAME")]
    pub subsystems: Vec<String>,

    /// Export the subsystems found significant for this differential list.
    #[arg(long, value_name = "FILE", conflicts_with = "subsystems")]
    pub significant_for: Option<PathBuf>,

    /// Destination file (default: stdout).
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Execute `mnet export`.
pub fn run_export(
    args: &ExportArgs,
    project: &ProjectConfig,
    timer: &mut PhaseTimer,
) -> anyhow::Result<()> {
    let settings = args.model.settings(&project.decomposition);
    let mut session = open_session(&args.model.model, &settings, timer)?;

    let selection: Vec<SubsystemId> = if let Some(differential) = &args.significant_for {
        let analysis = OverRepresentationAnalysis::new(project.ora.significance_level)?;
        timer.time("ora", || {
            session
                .run_ora(differential, None, &analysis)
                .map(|report| report.significant.clone())
        })?
    } else {
        let decomposition = session.decomposition().ok_or(SessionError::NoOverview)?;
        if args.subsystems.is_empty() {
            decomposition.ids().collect()
        } else {
            args.subsystems
                .iter()
                .map(|name| subsystem_by_name(decomposition, name))
                .collect::<anyhow::Result<_>>()?
        }
    };

    let written = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut sink = BufWriter::new(file);
            let written = session.export_subsystems(&selection, &mut sink)?;
            sink.flush()
                .with_context(|| format!("Failed to write {}", path.display()))?;
            written
        }
        None => {
            let stdout = io::stdout();
            let mut sink = stdout.lock();
            session.export_subsystems(&selection, &mut sink)?
        }
    };
    info!(subsystems = written, "export finished");
    Ok(())
}
