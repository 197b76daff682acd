//! Writeconfig command implementation.
//!
//! The `prehook writeconfig` command writes the default configuration so it
//! can be edited.

use std::path::{Path, PathBuf};

use crate::cli::args::WriteconfigArgs;
use crate::config::write_default_config;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The writeconfig command implementation.
pub struct WriteconfigCommand {
    project_root: PathBuf,
    args: WriteconfigArgs,
}

impl WriteconfigCommand {
    /// Create a new writeconfig command.
    pub fn new(project_root: &Path, args: WriteconfigArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            args,
        }
    }
}

impl Command for WriteconfigCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let path = write_default_config(&self.project_root, self.args.force)?;
        ui.success(&format!("Wrote {}", path.display()));
        Ok(CommandResult::success())
    }
}
