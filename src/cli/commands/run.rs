//! Run command implementation.
//!
//! The `prehook run` command runs every check of one mode and exits with
//! 0 when all pass, 1 when any fails, and 3 when the mode's time budget
//! ran out.

use std::collections::HashMap;

use crate::cli::args::RunArgs;
use crate::config::{load_config, ModeName};
use crate::coverage::{CoverageReporter, HttpReporter};
use crate::error::Result;
use crate::requirements::{Fetcher, GoGetFetcher};
use crate::runner::{ModeRunner, RunOptions, RunProgress};
use crate::shell::{CommandExecutor, SystemExecutor};
use crate::ui::{render_mode_result, UserInterface};

use super::dispatcher::{Command, CommandResult, ProjectContext};

/// The run command implementation.
pub struct RunCommand {
    project: ProjectContext,
    args: RunArgs,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(project: ProjectContext, args: RunArgs) -> Self {
        Self { project, args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &RunArgs {
        &self.args
    }

    fn options(&self) -> RunOptions {
        let defaults = RunOptions::default();
        RunOptions {
            jobs: self.args.jobs.unwrap_or(defaults.jobs),
            install: !self.args.no_install,
        }
    }

    /// Execute with explicit collaborators.
    pub fn execute_with(
        &self,
        ui: &mut dyn UserInterface,
        executor: &dyn CommandExecutor,
        fetcher: &dyn Fetcher,
        reporter: Option<&dyn CoverageReporter>,
    ) -> Result<CommandResult> {
        let mode: ModeName = self.args.mode.parse()?;
        let loaded = load_config(&self.project.root, self.project.config_path())?;

        let mut runner = ModeRunner::new(&loaded.config, executor, fetcher);
        if let Some(reporter) = reporter {
            runner = runner.with_reporter(reporter);
        }

        if self.args.json {
            let result = runner.run(mode, &self.options(), &self.project.root)?;
            let json = serde_json::to_string_pretty(&result).map_err(anyhow::Error::from)?;
            println!("{}", json);
            return Ok(exit_for(result.outcome.exit_code()));
        }

        ui.show_header(&format!("prehook {}", mode));
        let mut spinner = ui.start_spinner(&format!("Running {} checks", mode));
        let mut done = 0;
        let mut total = 0;
        let result = runner.run_with_progress(
            mode,
            &self.options(),
            &self.project.root,
            |event| match event {
                RunProgress::ModeStarting { total: count, .. } => total = count,
                RunProgress::CheckFinished { result } => {
                    done += 1;
                    spinner.set_message(&format!("{}/{} done, last: {}", done, total, result.name));
                }
                RunProgress::BudgetExceeded => {
                    spinner.set_message("Time budget exceeded, cancelling");
                }
            },
        );
        spinner.finish_clear();
        let result = result?;

        render_mode_result(ui, &result);
        Ok(exit_for(result.outcome.exit_code()))
    }
}

fn exit_for(code: i32) -> CommandResult {
    if code == 0 {
        CommandResult::success()
    } else {
        CommandResult::failure(code)
    }
}

impl Command for RunCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let executor = SystemExecutor::new();
        let fetcher = GoGetFetcher::new(&executor, &self.project.root);
        let env: HashMap<String, String> = std::env::vars().collect();
        let reporter = match HttpReporter::from_env(&env) {
            Ok(reporter) => Some(reporter),
            Err(e) => {
                tracing::warn!("Coverage reporting unavailable: {:#}", e);
                None
            }
        };
        self.execute_with(
            ui,
            &executor,
            &fetcher,
            reporter.as_ref().map(|r| r as &dyn CoverageReporter),
        )
    }
}
