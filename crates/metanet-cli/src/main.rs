#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use metanet_core::config::resolve_config;
use metanet_core::timing::{PhaseTimer, timing_enabled_from_env};
use metanet_core::{ErrorCode, ModelError};
use metanet_decomp::ora::OraError;
use metanet_decomp::{DecompositionError, SessionError};
use output::{CliError, CodedError, OutputMode, render_error, resolve_output_mode};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "mnet",
    author,
    version,
    about = "mnet: subsystem decomposition and enrichment analysis for metabolic networks",
    long_about = None
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit a phase timing report to stderr.
    #[arg(long, global = true)]
    timing: bool,

    /// Shorthand for `--format json`.
    #[arg(long, global = true)]
    json: bool,

    /// Output format (default: pretty on a terminal, text when piped).
    #[arg(long, global = true, value_enum, value_name = "MODE")]
    format: Option<OutputMode>,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Project directory holding `.metanet/config.toml` (default: current directory).
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Decomposition",
        about = "Decompose a model into subsystems",
        long_about = "Decompose a model into subsystems and list them with their sizes.",
        after_help = "EXAMPLES:\n    # Subsystem labels from the model\n    mnet decompose model.json\n\n    # Connected components without currency metabolites\n    mnet decompose model.json --method schuster --degree-threshold 10\n\n    # Split unclassified reactions into components of at least 5 nodes\n    mnet decompose model.json --split-default --min-size 5"
    )]
    Decompose(cmd::decompose::DecomposeArgs),

    #[command(
        next_help_heading = "Decomposition",
        about = "Build the subsystem overview graph",
        long_about = "Build the overview graph: one node per subsystem, one edge per pair of subsystems sharing interface metabolites.",
        after_help = "EXAMPLES:\n    # Overview of the predefined subsystems\n    mnet overview model.json\n\n    # Group by compartment, emit JSON\n    mnet overview model.json --method compartment --json"
    )]
    Overview(cmd::overview::OverviewArgs),

    #[command(
        next_help_heading = "Decomposition",
        about = "List interface metabolites between two subsystems",
        long_about = "List the metabolites produced in one subsystem and consumed in another.",
        after_help = "EXAMPLES:\n    # Metabolites flowing from glycolysis into the TCA cycle\n    mnet interfaces model.json --from Glycolysis --to \"TCA cycle\"\n\n    # Both directions\n    mnet interfaces model.json --from Glycolysis --to \"TCA cycle\" --both"
    )]
    Interfaces(cmd::interfaces::InterfacesArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Over-representation analysis",
        long_about = "Test every subsystem for over-representation of differential metabolites (hypergeometric test, Benjamini-Hochberg FDR control).",
        after_help = "EXAMPLES:\n    # Reference = every metabolite in the model\n    mnet ora model.json --differential diff.txt\n\n    # Explicit reference list and FDR level\n    mnet ora model.json -d diff.txt -r measured.txt --alpha 0.01\n\n    # Names of significant subsystems only\n    mnet ora model.json -d diff.txt --significant-only --format text"
    )]
    Ora(cmd::ora::OraArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Export subsystems as JSON",
        long_about = "Write the species, reactions and edges of selected subsystems as JSON.",
        after_help = "EXAMPLES:\n    # Export every subsystem\n    mnet export model.json -o subsystems.json\n\n    # Export two subsystems by name\n    mnet export model.json -s Glycolysis -s \"Pentose phosphate pathway\"\n\n    # Export the subsystems enriched for a differential list\n    mnet export model.json --significant-for diff.txt"
    )]
    Export(cmd::export::ExportArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Show the effective configuration",
        long_about = "Show project and user configuration merged with defaults.",
        after_help = "EXAMPLES:\n    # Show configuration\n    mnet config\n\n    # Machine-readable\n    mnet config --json"
    )]
    Config(cmd::config::ConfigArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Bash\n    mnet completions bash > ~/.local/share/bash-completion/completions/mnet"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_env("METANET_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "metanet=debug,info"
        } else if quiet {
            "error"
        } else {
            "metanet=info,warn"
        })
    });

    let format = env::var("METANET_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
    }
}

/// Map a failure onto the shared error-code table.
fn error_code(err: &anyhow::Error) -> ErrorCode {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<CodedError>() {
            return e.code;
        }
        if let Some(e) = cause.downcast_ref::<SessionError>() {
            return e.code();
        }
        if let Some(e) = cause.downcast_ref::<DecompositionError>() {
            return e.code();
        }
        if let Some(e) = cause.downcast_ref::<OraError>() {
            return e.code();
        }
        if let Some(e) = cause.downcast_ref::<ModelError>() {
            return e.code();
        }
        if cause.is::<io::Error>() {
            return ErrorCode::InputFileUnreadable;
        }
    }
    ErrorCode::InternalUnexpected
}

fn report_failure(mode: OutputMode, code: ErrorCode, err: &anyhow::Error) -> ExitCode {
    debug!(code = code.code(), "command failed");
    let rendered = render_error(mode, &CliError::new(code, format!("{err:#}")));
    if rendered.is_err() {
        eprintln!("error[{code}]: {err:#}");
    }
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let mut timer = PhaseTimer::new(cli.timing || timing_enabled_from_env());

    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        return match cmd::completions::run_completions(args, &mut command) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => report_failure(OutputMode::Text, ErrorCode::InternalUnexpected, &err),
        };
    }

    let project_root = match cli.root.clone().map_or_else(env::current_dir, Ok) {
        Ok(root) => root,
        Err(err) => {
            let mode = resolve_output_mode(cli.format, cli.json, None);
            return report_failure(mode, ErrorCode::InternalUnexpected, &err.into());
        }
    };
    let config = match resolve_config(&project_root, cli.json) {
        Ok(config) => config,
        Err(err) => {
            let mode = resolve_output_mode(cli.format, cli.json, None);
            return report_failure(mode, ErrorCode::ConfigParseError, &err);
        }
    };
    let output = resolve_output_mode(cli.format, cli.json, config.user.output.as_deref());
    info!(root = %project_root.display(), "project resolved");

    let project = &config.project;
    let command_result = match &cli.command {
        Commands::Decompose(args) => {
            cmd::decompose::run_decompose(args, &project.decomposition, output, &mut timer)
        }
        Commands::Overview(args) => cmd::overview::run_overview(args, project, output, &mut timer),
        Commands::Interfaces(args) => {
            cmd::interfaces::run_interfaces(args, &project.decomposition, output, &mut timer)
        }
        Commands::Ora(args) => cmd::ora::run_ora(args, project, output, &mut timer),
        Commands::Export(args) => cmd::export::run_export(args, project, &mut timer),
        Commands::Config(args) => cmd::config::run_config(args, &config, output),
        Commands::Completions(_) => Ok(()),
    };

    if timer.is_enabled() {
        eprintln!("timing report:");
        eprint!("{}", timer.render());
    }

    match command_result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_failure(output, error_code(&err), &err),
    }
}
