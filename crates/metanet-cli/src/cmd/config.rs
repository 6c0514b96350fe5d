//! `mnet config`: print the effective configuration.

use std::io::{self, Write};

use clap::Args;
use metanet_core::config::EffectiveConfig;

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {}

/// Execute `mnet config`.
pub fn run_config(
    _args: &ConfigArgs,
    config: &EffectiveConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    render_mode(output, config, render_text, render_pretty)
}

fn entries(config: &EffectiveConfig) -> Vec<(&'static str, String)> {
    let d = &config.project.decomposition;
    let join = |items: &[String]| {
        if items.is_empty() {
            "(any)".to_string()
        } else {
            items.join(",")
        }
    };
    vec![
        ("decomposition.method", d.method.as_str().to_string()),
        ("decomposition.attribute_namespace", d.attribute_namespace.clone()),
        ("decomposition.attribute_key", d.attribute_key.clone()),
        (
            "decomposition.attribute_separator",
            d.attribute_separator.clone().unwrap_or_default(),
        ),
        ("decomposition.add_transporter", d.add_transporter.to_string()),
        ("decomposition.add_default", d.add_default.to_string()),
        ("decomposition.split_default", d.split_default.to_string()),
        ("decomposition.min_subsystem_size", d.min_subsystem_size.to_string()),
        (
            "decomposition.schuster_degree_threshold",
            d.schuster_degree_threshold.to_string(),
        ),
        ("decomposition.clonable_species", join(&d.clonable_species)),
        ("decomposition.clone_threshold", d.clone_threshold.to_string()),
        (
            "ora.significance_level",
            config.project.ora.significance_level.to_string(),
        ),
        (
            "overview.max_edge_thickness",
            config.project.overview.max_edge_thickness.to_string(),
        ),
        ("output", config.resolved_output.clone()),
    ]
}

fn render_text(config: &EffectiveConfig, w: &mut dyn Write) -> io::Result<()> {
    for (key, value) in entries(config) {
        writeln!(w, "{key}={value}")?;
    }
    Ok(())
}

fn render_pretty(config: &EffectiveConfig, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Effective configuration")?;
    for (key, value) in entries(config) {
        pretty_kv(w, key, value)?;
    }
    Ok(())
}
