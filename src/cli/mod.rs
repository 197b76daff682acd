//! Command-line interface for prehook.
//!
//! This module provides the CLI argument parsing using clap's derive macros
//! and command implementations.
//!
//! # Architecture
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{
    Cli, Commands, CompletionsArgs, InfoArgs, PrereqArgs, RunArgs, WriteconfigArgs,
};
pub use commands::{Command, CommandDispatcher, CommandResult, ProjectContext};
