use anyhow::Result;
use clap::Args;
use clap_complete::{Shell, generate};

/// Arguments for `mnet completions`.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write the completion script for `shell` to stdout.
pub fn run_completions(args: &CompletionsArgs, command: &mut clap::Command) -> Result<()> {
    let name = command.get_name().to_string();
    generate(args.shell, command, name, &mut std::io::stdout());
    Ok(())
}
