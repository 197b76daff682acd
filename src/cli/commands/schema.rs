//! Schema command implementation.
//!
//! The `prehook schema` command prints the JSON schema of `prehook.yml`
//! for editor integration.

use crate::config::Config;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The configuration schema as pretty-printed JSON.
pub fn config_schema_json() -> Result<String> {
    let schema = schemars::schema_for!(Config);
    Ok(serde_json::to_string_pretty(&schema).map_err(anyhow::Error::from)?)
}

/// The schema command implementation.
pub struct SchemaCommand;

impl Command for SchemaCommand {
    fn execute(&self, _ui: &mut dyn UserInterface) -> Result<CommandResult> {
        println!("{}", config_schema_json()?);
        Ok(CommandResult::success())
    }
}
