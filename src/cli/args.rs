//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Prehook - Go repository checks for pre-commit, pre-push and CI.
#[derive(Debug, Parser)]
#[command(name = "prehook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (overrides <project>/prehook.yml)
    #[arg(short, long, global = true, env = "PREHOOK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to project root (overrides discovery from the current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only show failures
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the checks of a mode (default: pre-commit)
    Run(RunArgs),

    /// Verify, and install when missing, the tools checks depend on
    Prereq(PrereqArgs),

    /// Show the active configuration
    Info(InfoArgs),

    /// Write the default configuration to prehook.yml
    Writeconfig(WriteconfigArgs),

    /// Print the JSON schema of prehook.yml
    Schema,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Mode to run: pre-commit, pre-push, continuous-integration (ci) or lint
    #[arg(short, long, default_value = "pre-commit")]
    pub mode: String,

    /// Maximum checks running at once (default: number of CPUs)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Print the result as JSON instead of the terminal report
    #[arg(long)]
    pub json: bool,

    /// Do not fetch missing prerequisites
    #[arg(long)]
    pub no_install: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            mode: "pre-commit".to_string(),
            jobs: None,
            json: false,
            no_install: false,
        }
    }
}

/// Arguments for the `prereq` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct PrereqArgs {
    /// Only verify this mode's checks (default: every mode)
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Report missing tools without fetching them
    #[arg(long)]
    pub no_install: bool,
}

/// Arguments for the `info` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct InfoArgs {
    /// Print the resolved configuration as YAML
    #[arg(long)]
    pub yaml: bool,
}

/// Arguments for the `writeconfig` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct WriteconfigArgs {
    /// Overwrite an existing prehook.yml
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
