//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. Commands that run external tools
//! also expose `execute_with`, taking the executor and fetcher explicitly.

pub mod completions;
pub mod dispatcher;
pub mod info;
pub mod prereq;
pub mod run;
pub mod schema;
pub mod writeconfig;

pub use dispatcher::{Command, CommandDispatcher, CommandResult, ProjectContext};
