use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use shellboot_shell::ShellKind;

/// Shell startup bootstrap: daily update check, module installs and prompt setup.
#[derive(Debug, Parser)]
#[command(name = "shellboot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to settings file (overrides the per-user settings.json)
    #[arg(short, long, global = true, env = "SHELLBOOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging on the terminal
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the startup sequence and write the activation script
    Run(RunArgs),

    /// Check for package and module updates now
    Check(CheckArgs),

    /// Forget the last update check so the next run checks again
    Reset,

    /// Print the files shellboot reads and writes
    Paths,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Shell to generate the activation script for (pwsh, bash, zsh, fish)
    #[arg(short, long)]
    pub shell: Option<ShellKind>,

    /// Check for updates even if a check already ran today
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Seconds to wait for both checkers
    #[arg(short, long)]
    pub timeout: Option<u64>,
}
