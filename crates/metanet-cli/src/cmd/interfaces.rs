//! `mnet interfaces`: metabolites bridging two subsystems.

use std::io::{self, Write};

use clap::Args;
use metanet_core::config::DecompositionConfig;
use metanet_core::model::MetabolicGraph;
use metanet_core::timing::PhaseTimer;
use metanet_decomp::{OverviewGraph, SubsystemId};
use serde::Serialize;

use super::{ModelArgs, built, open_session, subsystem_by_name};
use crate::output::{OutputMode, pretty_section, render_mode};

#[derive(Args, Debug, Clone)]
pub struct InterfacesArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Producing subsystem.
    #[arg(long, value_name = "NAME")]
    pub from: String,

    /// Consuming subsystem.
    #[arg(long, value_name = "NAME")]
    pub to: String,

    /// Include interfaces in the opposite direction.
    #[arg(long)]
    pub both: bool,
}

#[derive(Debug, Serialize)]
pub struct InterfaceSpecies {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Serialize)]
pub struct InterfaceReport {
    pub from: String,
    pub to: String,
    pub both_directions: bool,
    pub species: Vec<InterfaceSpecies>,
}

fn collect(
    graph: &MetabolicGraph,
    overview: &OverviewGraph,
    from: SubsystemId,
    to: SubsystemId,
    out: &mut Vec<InterfaceSpecies>,
) {
    let name_of = |id: SubsystemId| {
        overview
            .decomposition()
            .subsystem(id)
            .map(|s| s.name().to_string())
            .unwrap_or_default()
    };
    for &species in overview.interface_nodes(from, to) {
        out.push(InterfaceSpecies {
            id: graph.id_of(species).to_string(),
            label: graph.node(species).and_then(|n| n.label.clone()),
            from: name_of(from),
            to: name_of(to),
        });
    }
}

/// Execute `mnet interfaces`.
pub fn run_interfaces(
    args: &InterfacesArgs,
    defaults: &DecompositionConfig,
    output: OutputMode,
    timer: &mut PhaseTimer,
) -> anyhow::Result<()> {
    let settings = args.model.settings(defaults);
    let session = open_session(&args.model.model, &settings, timer)?;
    let (graph, overview) = built(&session)?;
    let from = subsystem_by_name(overview.decomposition(), &args.from)?;
    let to = subsystem_by_name(overview.decomposition(), &args.to)?;

    let mut species = Vec::new();
    collect(graph, overview, from, to, &mut species);
    if args.both {
        collect(graph, overview, to, from, &mut species);
    }
    let report = InterfaceReport {
        from: args.from.clone(),
        to: args.to.clone(),
        both_directions: args.both,
        species,
    };
    render_mode(output, &report, render_text, render_pretty)
}

fn render_text(report: &InterfaceReport, w: &mut dyn Write) -> io::Result<()> {
    for s in &report.species {
        writeln!(w, "{}\t{}\t{}", s.id, s.from, s.to)?;
    }
    Ok(())
}

fn render_pretty(report: &InterfaceReport, w: &mut dyn Write) -> io::Result<()> {
    let arrow = if report.both_directions { "<->" } else { "->" };
    pretty_section(
        w,
        &format!(
            "{} {arrow} {}: {} interface metabolites",
            report.from,
            report.to,
            report.species.len()
        ),
    )?;
    for s in &report.species {
        let label = s.label.as_deref().unwrap_or("");
        writeln!(w, "{:<20} {:<28} {} -> {}", s.id, label, s.from, s.to)?;
    }
    Ok(())
}
