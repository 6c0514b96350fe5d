//! `mnet overview`: the subsystem-level overview graph.

use std::io::{self, Write};

use clap::Args;
use metanet_core::config::ProjectConfig;
use metanet_core::timing::PhaseTimer;
use metanet_decomp::overview::SubsystemSummary;
use metanet_decomp::{OverviewGraph, SubsystemId};
use serde::Serialize;

use super::{ModelArgs, built, open_session};
use crate::output::{OutputMode, pretty_section, render_mode};

#[derive(Args, Debug, Clone)]
pub struct OverviewArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Clamp for the drawn edge thickness (default from `[overview]`).
    #[arg(long, value_name = "N")]
    pub max_thickness: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct OverviewEdgeRow {
    pub a: SubsystemId,
    pub b: SubsystemId,
    pub a_name: String,
    pub b_name: String,
    pub weight: usize,
    pub thickness: usize,
}

#[derive(Debug, Serialize)]
pub struct OverviewReport {
    pub nodes: Vec<SubsystemSummary>,
    pub edges: Vec<OverviewEdgeRow>,
}

impl OverviewReport {
    fn new(overview: &OverviewGraph, max_thickness: usize) -> Self {
        let decomposition = overview.decomposition();
        let name_of = |id: SubsystemId| {
            decomposition
                .subsystem(id)
                .map(|s| s.name().to_string())
                .unwrap_or_default()
        };
        let nodes = decomposition
            .ids()
            .filter_map(|id| overview.node_of(id))
            .filter_map(|node| overview.subsystem_summary(node))
            .collect();
        let edges = overview
            .edges()
            .map(|(edge, interface)| OverviewEdgeRow {
                a: interface.a,
                b: interface.b,
                a_name: name_of(interface.a),
                b_name: name_of(interface.b),
                weight: overview.weight(edge),
                thickness: overview.display_thickness(edge, max_thickness),
            })
            .collect();
        Self { nodes, edges }
    }
}

/// Execute `mnet overview`.
pub fn run_overview(
    args: &OverviewArgs,
    project: &ProjectConfig,
    output: OutputMode,
    timer: &mut PhaseTimer,
) -> anyhow::Result<()> {
    let settings = args.model.settings(&project.decomposition);
    let session = open_session(&args.model.model, &settings, timer)?;
    let (_, overview) = built(&session)?;
    let max = args
        .max_thickness
        .unwrap_or(project.overview.max_edge_thickness);
    let report = timer.time("overview", || OverviewReport::new(overview, max));
    render_mode(output, &report, render_text, render_pretty)
}

fn render_text(report: &OverviewReport, w: &mut dyn Write) -> io::Result<()> {
    for node in &report.nodes {
        writeln!(
            w,
            "node\t{}\t{}\t{}\t{}",
            node.id.0, node.name, node.species, node.reactions
        )?;
    }
    for edge in &report.edges {
        writeln!(
            w,
            "edge\t{}\t{}\t{}\t{}",
            edge.a.0, edge.b.0, edge.weight, edge.thickness
        )?;
    }
    Ok(())
}

fn render_pretty(report: &OverviewReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Subsystems ({})", report.nodes.len()))?;
    for node in &report.nodes {
        writeln!(
            w,
            "{:>4}  {:<32} {:>4} species {:>4} reactions",
            node.id.0, node.name, node.species, node.reactions
        )?;
    }
    writeln!(w)?;
    pretty_section(w, &format!("Interfaces ({})", report.edges.len()))?;
    for edge in &report.edges {
        writeln!(
            w,
            "{:<24} -- {:<24} {:>4} {}",
            edge.a_name,
            edge.b_name,
            edge.weight,
            "=".repeat(edge.thickness)
        )?;
    }
    Ok(())
}
