//! Prehook CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use prehook::cli::{Cli, Commands, CommandDispatcher, ProjectContext};
use prehook::config::find_project_root;
use prehook::shell::is_ci;
use prehook::ui::{create_ui, OutputMode};
use prehook::PrehookError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
///
/// Logs go to stderr so `run --json` and `schema` keep stdout clean.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("prehook=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("prehook=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Exit code for errors raised before or instead of running checks.
fn error_exit_code(err: &PrehookError) -> u8 {
    match err {
        PrehookError::ConfigNotFound { .. }
        | PrehookError::ConfigParseError { .. }
        | PrehookError::ConfigValidationError { .. }
        | PrehookError::UnsupportedVersion { .. }
        | PrehookError::UnknownMode { .. } => 2,
        _ => 1,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("Prehook starting with args: {:?}", cli);

    let mut output_mode = OutputMode::from_flags(cli.verbose, cli.quiet);
    if matches!(&cli.command, Some(Commands::Run(args)) if args.json) {
        output_mode = OutputMode::Silent;
    }
    let color = !cli.no_color && !is_ci();

    let project_root = match &cli.project {
        Some(root) => root.clone(),
        None => {
            let cwd = std::env::current_dir().unwrap_or_default();
            find_project_root(&cwd).unwrap_or(cwd)
        }
    };

    let mut ui = create_ui(output_mode, color);
    let dispatcher = CommandDispatcher::new(ProjectContext::new(project_root, cli.config.clone()));

    match dispatcher.dispatch(&cli, ui.as_mut()) {
        Ok(result) => ExitCode::from(result.exit_code as u8),
        Err(e) => {
            // Errors are reported even when the UI is silenced for JSON output.
            eprintln!("Error: {}", e);
            ExitCode::from(error_exit_code(&e))
        }
    }
}
