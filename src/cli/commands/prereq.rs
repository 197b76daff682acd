//! Prereq command implementation.
//!
//! The `prehook prereq` command resolves the prerequisites of every check
//! (of one mode, or of all modes) without running the checks themselves.

use std::collections::BTreeSet;

use crate::cli::args::PrereqArgs;
use crate::config::{load_config, CheckPrerequisite, Config, ModeName};
use crate::error::Result;
use crate::requirements::{Fetcher, GoGetFetcher, PrerequisiteChecker, PrerequisiteStatus};
use crate::shell::{CancelToken, CommandExecutor, SystemExecutor};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult, ProjectContext};

/// The prereq command implementation.
pub struct PrereqCommand {
    project: ProjectContext,
    args: PrereqArgs,
}

impl PrereqCommand {
    /// Create a new prereq command.
    pub fn new(project: ProjectContext, args: PrereqArgs) -> Self {
        Self { project, args }
    }

    fn modes(&self, config: &Config) -> Result<Vec<ModeName>> {
        match &self.args.mode {
            Some(name) => {
                let mode: ModeName = name.parse()?;
                config.require_mode(mode)?;
                Ok(vec![mode])
            }
            None => Ok(config.modes.keys().copied().collect()),
        }
    }

    /// Execute with explicit collaborators.
    pub fn execute_with(
        &self,
        ui: &mut dyn UserInterface,
        executor: &dyn CommandExecutor,
        fetcher: &dyn Fetcher,
    ) -> Result<CommandResult> {
        let loaded = load_config(&self.project.root, self.project.config_path())?;
        let modes = self.modes(&loaded.config)?;

        // One entry per distinct probe, in first-seen order.
        let mut seen = BTreeSet::new();
        let mut prerequisites: Vec<(String, CheckPrerequisite)> = Vec::new();
        for mode in &modes {
            if let Some(mode) = loaded.config.mode(*mode) {
                for check in &mode.checks {
                    for prerequisite in check.prerequisites() {
                        let key = (prerequisite.help_command.clone(), prerequisite.expected_exit_code);
                        if seen.insert(key) {
                            prerequisites.push((check.name(), prerequisite));
                        }
                    }
                }
            }
        }

        if prerequisites.is_empty() {
            ui.success("No prerequisites to verify");
            return Ok(CommandResult::success());
        }

        let mut checker = PrerequisiteChecker::new(executor, fetcher, &self.project.root);
        if self.args.no_install {
            checker = checker.without_install();
        }

        let cancel = CancelToken::new();
        let mut missing = 0;
        for (check, prerequisite) in &prerequisites {
            let command = prerequisite.command_line();
            match checker.check_one(prerequisite, &cancel) {
                PrerequisiteStatus::Present => {
                    ui.success(&format!("{} ({}): present", command, check))
                }
                PrerequisiteStatus::Installed => ui.success(&format!(
                    "{} ({}): installed from {}",
                    command, check, prerequisite.url
                )),
                PrerequisiteStatus::Unavailable { reason } => {
                    missing += 1;
                    ui.error(&format!("{} ({}): {}", command, check, reason));
                }
                PrerequisiteStatus::Cancelled => {
                    missing += 1;
                    ui.cancelled(&format!("{} ({}): cancelled", command, check));
                }
            }
        }

        if missing == 0 {
            Ok(CommandResult::success())
        } else {
            ui.error(&format!("{} prerequisite(s) unavailable", missing));
            Ok(CommandResult::failure(1))
        }
    }
}

impl Command for PrereqCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let executor = SystemExecutor::new();
        let fetcher = GoGetFetcher::new(&executor, &self.project.root);
        self.execute_with(ui, &executor, &fetcher)
    }
}
