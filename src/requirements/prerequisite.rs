//! Prerequisite presence probing.

use crate::config::CheckPrerequisite;
use crate::shell::{CommandExecutor, CommandOptions};

impl CheckPrerequisite {
    /// Whether the tool is installed.
    ///
    /// Runs the help command and compares its exit code with
    /// `expected_exit_code`. Output is discarded. A probe that cannot be
    /// launched, is killed by a signal, or exits with any other code means
    /// "not present"; it is never an error.
    pub fn is_present(&self, executor: &dyn CommandExecutor, options: &CommandOptions) -> bool {
        match executor.execute(&self.help_command, options) {
            Ok(output) => {
                let present = output.exit_code == Some(self.expected_exit_code);
                tracing::debug!(
                    "Probe '{}' exited {:?} (expected {}): present={}",
                    self.command_line(),
                    output.exit_code,
                    self.expected_exit_code,
                    present
                );
                present
            }
            Err(e) => {
                tracing::debug!("Probe '{}' failed: {}", self.command_line(), e);
                false
            }
        }
    }
}
