//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands, RunArgs};
use crate::error::Result;
use crate::ui::UserInterface;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Arguments
    ///
    /// * `ui` - User interface for displaying output
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Where commands find the project and its configuration.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    /// Repository root; checks run here.
    pub root: PathBuf,
    /// Explicit configuration file, overriding `<root>/prehook.yml`.
    pub config_path: Option<PathBuf>,
}

impl ProjectContext {
    /// Create a context for `root`.
    pub fn new(root: impl Into<PathBuf>, config_path: Option<PathBuf>) -> Self {
        Self {
            root: root.into(),
            config_path,
        }
    }

    /// The explicit configuration file, if any.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    project: ProjectContext,
}

impl CommandDispatcher {
    /// Create a new dispatcher for the given project.
    pub fn new(project: ProjectContext) -> Self {
        Self { project }
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project.root
    }

    /// Dispatch and execute a command.
    ///
    /// Routes the CLI subcommand to the appropriate command implementation
    /// and executes it. Without a subcommand, runs the pre-commit mode.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        match &cli.command {
            Some(Commands::Run(args)) => {
                let cmd = super::run::RunCommand::new(self.project.clone(), args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Prereq(args)) => {
                let cmd = super::prereq::PrereqCommand::new(self.project.clone(), args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Info(args)) => {
                let cmd = super::info::InfoCommand::new(self.project.clone(), args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Writeconfig(args)) => {
                let cmd =
                    super::writeconfig::WriteconfigCommand::new(&self.project.root, args.clone());
                cmd.execute(ui)
            }
            Some(Commands::Schema) => super::schema::SchemaCommand.execute(ui),
            Some(Commands::Completions(args)) => {
                let cmd = super::completions::CompletionsCommand::new(args.clone());
                cmd.execute(ui)
            }
            None => {
                let cmd = super::run::RunCommand::new(self.project.clone(), RunArgs::default());
                cmd.execute(ui)
            }
        }
    }
}
