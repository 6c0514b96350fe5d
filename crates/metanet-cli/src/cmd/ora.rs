//! `mnet ora`: over-representation analysis of a differential metabolite list.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use metanet_core::config::ProjectConfig;
use metanet_core::timing::PhaseTimer;
use metanet_decomp::ora::SubsystemTest;
use metanet_decomp::{OraReport, OverRepresentationAnalysis, SessionError, TestOutcome};
use serde::Serialize;

use super::{ModelArgs, open_session};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug, Clone)]
pub struct OraArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// File with one differential metabolite id per line.
    #[arg(short, long, value_name = "FILE")]
    pub differential: PathBuf,

    /// File with one reference metabolite id per line (default: every metabolite).
    #[arg(short, long, value_name = "FILE")]
    pub reference: Option<PathBuf>,

    /// FDR level for Benjamini-Hochberg (default from `[ora]`).
    #[arg(long, value_name = "ALPHA")]
    pub alpha: Option<f64>,

    /// Only print significant subsystems.
    #[arg(long)]
    pub significant_only: bool,
}

#[derive(Debug, Serialize)]
pub struct OraOutput<'a> {
    #[serde(flatten)]
    pub report: &'a OraReport,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub significant_names: Vec<&'a str>,
}

/// Execute `mnet ora`.
pub fn run_ora(
    args: &OraArgs,
    project: &ProjectConfig,
    output: OutputMode,
    timer: &mut PhaseTimer,
) -> anyhow::Result<()> {
    let analysis = OverRepresentationAnalysis::new(
        args.alpha.unwrap_or(project.ora.significance_level),
    )?;
    let settings = args.model.settings(&project.decomposition);
    let mut session = open_session(&args.model.model, &settings, timer)?;

    timer.time("ora", || {
        session
            .run_ora(&args.differential, args.reference.as_deref(), &analysis)
            .map(|_| ())
    })?;
    let report = session.last_ora().ok_or(SessionError::NoOverview)?;
    let significant_names = report
        .significant
        .iter()
        .filter_map(|&id| report.test(id))
        .map(|t| t.name.as_str())
        .collect();
    let payload = OraOutput {
        report,
        significant_names,
    };

    if args.significant_only {
        render_mode(output, &payload, render_significant_text, render_significant_pretty)
    } else {
        render_mode(output, &payload, render_text, render_pretty)
    }
}

fn p_value_column(test: &SubsystemTest) -> String {
    match &test.outcome {
        TestOutcome::Tested(p) => format!("{p:.3e}"),
        TestOutcome::Degenerate(_) => "n/a".to_string(),
    }
}

fn render_text(payload: &OraOutput<'_>, w: &mut dyn Write) -> io::Result<()> {
    let report = payload.report;
    for test in &report.tests {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}",
            test.subsystem.0,
            test.name,
            test.reference_hits,
            test.differential_hits,
            p_value_column(test),
            u8::from(report.is_significant(test.subsystem)),
        )?;
    }
    Ok(())
}

fn render_significant_text(payload: &OraOutput<'_>, w: &mut dyn Write) -> io::Result<()> {
    for name in &payload.significant_names {
        writeln!(w, "{name}")?;
    }
    Ok(())
}

fn render_pretty(payload: &OraOutput<'_>, w: &mut dyn Write) -> io::Result<()> {
    let report = payload.report;
    pretty_section(w, "Over-representation analysis")?;
    pretty_kv(w, "reference", report.population.to_string())?;
    pretty_kv(w, "differential", report.successes.to_string())?;
    pretty_kv(w, "FDR level", report.significance_level.to_string())?;
    writeln!(w)?;
    writeln!(
        w,
        "{:<32} {:>6} {:>6} {:>10}  ",
        "SUBSYSTEM", "REF", "DIFF", "P-VALUE"
    )?;
    for test in &report.tests {
        let mark = if report.is_significant(test.subsystem) {
            "*"
        } else {
            ""
        };
        writeln!(
            w,
            "{:<32} {:>6} {:>6} {:>10}  {mark}",
            test.name,
            test.reference_hits,
            test.differential_hits,
            p_value_column(test),
        )?;
    }
    writeln!(w)?;
    render_significant_pretty(payload, w)
}

fn render_significant_pretty(payload: &OraOutput<'_>, w: &mut dyn Write) -> io::Result<()> {
    if payload.significant_names.is_empty() {
        return writeln!(w, "no significant subsystems");
    }
    pretty_section(
        w,
        &format!("Significant subsystems ({})", payload.significant_names.len()),
    )?;
    for name in &payload.significant_names {
        writeln!(w, "  {name}")?;
    }
    Ok(())
}
