//! Info command implementation.
//!
//! The `prehook info` command shows where the configuration came from and
//! what each mode runs.

use crate::cli::args::InfoArgs;
use crate::config::{load_config, ConfigSource, VERSION};
use crate::error::Result;
use crate::ui::theme::PrehookTheme;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult, ProjectContext};

/// The info command implementation.
pub struct InfoCommand {
    project: ProjectContext,
    args: InfoArgs,
}

impl InfoCommand {
    /// Create a new info command.
    pub fn new(project: ProjectContext, args: InfoArgs) -> Self {
        Self { project, args }
    }
}

impl Command for InfoCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let loaded = load_config(&self.project.root, self.project.config_path())?;

        if self.args.yaml {
            let yaml = serde_yaml::to_string(&loaded.config).map_err(anyhow::Error::from)?;
            print!("{}", yaml);
            return Ok(CommandResult::success());
        }

        let theme = PrehookTheme::new();
        ui.show_header(&format!("prehook {}", VERSION));
        let source = match &loaded.source {
            ConfigSource::File(path) => path.display().to_string(),
            ConfigSource::Default => "built-in defaults".to_string(),
        };
        ui.message(&format!("  {} {}", theme.highlight.apply_to("Config:"), source));
        ui.message(&format!(
            "  {} {}",
            theme.highlight.apply_to("Project:"),
            self.project.root.display()
        ));
        if !loaded.config.ignore_patterns.is_empty() {
            ui.message(&format!(
                "  {} {}",
                theme.highlight.apply_to("Ignore:"),
                loaded.config.ignore_patterns.join(", ")
            ));
        }

        for (name, mode) in &loaded.config.modes {
            let budget = match mode.budget() {
                Some(budget) => format!("{}s budget", budget.as_secs()),
                None => "no budget".to_string(),
            };
            ui.message("");
            ui.message(&format!(
                "  {} {}",
                theme.header.apply_to(name),
                theme.dim.apply_to(format!("({}, {} checks)", budget, mode.checks.len()))
            ));
            for check in &mode.checks {
                ui.message(&format!(
                    "    {} {}",
                    theme.highlight.apply_to(check.name()),
                    theme.dim.apply_to(check.description())
                ));
            }
        }

        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn shows_defaults_without_config_file() {
        let temp = TempDir::new().unwrap();
        let mut ui = MockUI::new();

        let result = InfoCommand::new(ProjectContext::new(temp.path(), None), InfoArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert!(result.success);
        assert!(ui.has_message("built-in defaults"));
        assert!(ui.has_message("pre-push"));
        assert!(ui.has_message("goimports"));
    }

    #[test]
    fn shows_config_file_and_custom_checks() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("prehook.yml"),
            "modes:\n  lint:\n    checks:\n      custom:\n      - display_name: shellcheck\n        command: [shellcheck, run.sh]\n",
        )
        .unwrap();
        let mut ui = MockUI::new();

        InfoCommand::new(ProjectContext::new(temp.path(), None), InfoArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert!(ui.has_message("prehook.yml"));
        assert!(ui.has_message("shellcheck"));
        assert!(ui.has_message("no budget"));
    }
}
