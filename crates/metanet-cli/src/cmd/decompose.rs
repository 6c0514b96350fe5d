//! `mnet decompose`: list the subsystems of a model.

use std::io::{self, Write};

use clap::Args;
use metanet_core::config::DecompositionConfig;
use metanet_core::model::MetabolicGraph;
use metanet_core::timing::PhaseTimer;
use metanet_decomp::{Decomposition, SubsystemId};
use serde::Serialize;

use super::{ModelArgs, built, open_session};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug, Clone)]
pub struct DecomposeArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Also list the reaction ids of every subsystem.
    #[arg(long)]
    pub members: bool,
}

#[derive(Debug, Serialize)]
pub struct SubsystemRow {
    pub id: SubsystemId,
    pub name: String,
    pub species: usize,
    pub reactions: usize,
    pub edges: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reaction_ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct DecomposeReport {
    pub method: &'static str,
    pub model_hash: String,
    pub species: usize,
    pub reactions: usize,
    pub clones: usize,
    pub classified_reactions: usize,
    pub subsystems: Vec<SubsystemRow>,
}

impl DecomposeReport {
    fn new(
        method: &'static str,
        graph: &MetabolicGraph,
        decomposition: &Decomposition,
        members: bool,
    ) -> Self {
        let subsystems = decomposition
            .iter()
            .map(|(id, subsystem)| SubsystemRow {
                id,
                name: subsystem.name().to_string(),
                species: subsystem.species_count(),
                reactions: subsystem.reaction_count(),
                edges: subsystem.edges().len(),
                reaction_ids: members.then(|| {
                    subsystem
                        .reactions()
                        .iter()
                        .map(|&r| graph.id_of(r).to_string())
                        .collect()
                }),
            })
            .collect();
        Self {
            method,
            model_hash: graph.content_hash.clone(),
            species: graph.species_nodes().count(),
            reactions: graph.reaction_nodes().count(),
            clones: graph.clone_count(),
            classified_reactions: decomposition.classified_reaction_count(),
            subsystems,
        }
    }
}

/// Execute `mnet decompose`.
pub fn run_decompose(
    args: &DecomposeArgs,
    defaults: &DecompositionConfig,
    output: OutputMode,
    timer: &mut PhaseTimer,
) -> anyhow::Result<()> {
    let settings = args.model.settings(defaults);
    let session = open_session(&args.model.model, &settings, timer)?;
    let (graph, overview) = built(&session)?;
    let report = DecomposeReport::new(
        settings.method.as_str(),
        graph,
        overview.decomposition(),
        args.members,
    );
    render_mode(output, &report, render_text, render_pretty)
}

fn render_text(report: &DecomposeReport, w: &mut dyn Write) -> io::Result<()> {
    for row in &report.subsystems {
        write!(
            w,
            "{}\t{}\t{}\t{}",
            row.id.0, row.name, row.species, row.reactions
        )?;
        if let Some(ids) = &row.reaction_ids {
            write!(w, "\t{}", ids.join(","))?;
        }
        writeln!(w)?;
    }
    Ok(())
}

fn render_pretty(report: &DecomposeReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Decomposition ({})", report.method))?;
    pretty_kv(w, "model", &report.model_hash)?;
    pretty_kv(
        w,
        "nodes",
        format!(
            "{} species ({} clones), {} reactions",
            report.species, report.clones, report.reactions
        ),
    )?;
    pretty_kv(
        w,
        "classified",
        format!("{}/{} reactions", report.classified_reactions, report.reactions),
    )?;
    writeln!(w)?;
    writeln!(w, "{:>4}  {:<32} {:>8} {:>10}", "#", "SUBSYSTEM", "SPECIES", "REACTIONS")?;
    for row in &report.subsystems {
        writeln!(
            w,
            "{:>4}  {:<32} {:>8} {:>10}",
            row.id.0, row.name, row.species, row.reactions
        )?;
        if let Some(ids) = &row.reaction_ids {
            writeln!(w, "      {}", ids.join(" "))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use metanet_core::model::GraphBuilder;
    use metanet_decomp::Subsystem;

    #[test]
    fn report_counts_and_members() {
        let mut b = GraphBuilder::new();
        b.add_species("a", None).expect("a");
        let r = b.add_reaction("R1").expect("R1");
        b.add_substrate("a", "R1").expect("edge");
        let graph = b.build();

        let mut subsystem = Subsystem::new("Only");
        subsystem.add_reaction_with_neighborhood(&graph, r);
        let decomposition = Decomposition::new(vec![subsystem]);

        let report = DecomposeReport::new("predefined", &graph, &decomposition, true);
        assert_eq!(report.species, 1);
        assert_eq!(report.classified_reactions, 1);
        let row = &report.subsystems[0];
        assert_eq!((row.species, row.reactions, row.edges), (1, 1, 1));
        assert_eq!(row.reaction_ids.as_deref(), Some(&["R1".to_string()][..]));

        let mut buf = Vec::new();
        render_text(&report, &mut buf).expect("render");
        assert_eq!(String::from_utf8(buf).expect("utf8"), "0\tOnly\t1\t1\tR1\n");
    }
}
