//! Configuration file discovery and loading.
//!
//! The configuration lives in `prehook.yml` at the repository root. When
//! no file exists the built-in default configuration is used instead.

use crate::config::defaults::{default_config, default_config_yaml};
use crate::config::schema::Config;
use crate::config::validator::validate;
use crate::config::version::{check_min_version, Version};
use crate::error::{PrehookError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file at the repository root.
pub const CONFIG_FILE_NAME: &str = "prehook.yml";

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from this file.
    File(PathBuf),
    /// No file found; built-in defaults.
    Default,
}

/// A validated configuration and its origin.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: ConfigSource,
}

/// Find the repository root by walking up from `start`.
///
/// Looks for:
/// 1. `prehook.yml` (primary indicator)
/// 2. `.git` directory (fallback)
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if current.join(CONFIG_FILE_NAME).is_file() {
            return Some(current);
        }

        if current.join(".git").exists() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load a single config file and parse it into [`Config`].
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PrehookError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            PrehookError::Io(e)
        }
    })?;

    parse_config(&content, path)
}

/// Parse YAML content into [`Config`].
///
/// An empty document yields an empty configuration.
pub fn parse_config(content: &str, source_path: &Path) -> Result<Config> {
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(content).map_err(|e| PrehookError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load, version-check and validate the configuration for a project.
///
/// `explicit` overrides discovery; it must exist. Otherwise
/// `<project_root>/prehook.yml` is used when present, and the
/// default configuration when not.
pub fn load_config(project_root: &Path, explicit: Option<&Path>) -> Result<LoadedConfig> {
    let loaded = match explicit {
        Some(path) => LoadedConfig {
            config: load_config_file(path)?,
            source: ConfigSource::File(path.to_path_buf()),
        },
        None => {
            let path = project_root.join(CONFIG_FILE_NAME);
            if path.is_file() {
                LoadedConfig {
                    config: load_config_file(&path)?,
                    source: ConfigSource::File(path),
                }
            } else {
                tracing::debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, project_root.display());
                LoadedConfig {
                    config: default_config(),
                    source: ConfigSource::Default,
                }
            }
        }
    };

    check_min_version(&loaded.config.min_version, Version::current())?;
    validate(&loaded.config)?;
    Ok(loaded)
}

/// Write the default configuration to `<project_root>/prehook.yml`.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn write_default_config(project_root: &Path, force: bool) -> Result<PathBuf> {
    let path = project_root.join(CONFIG_FILE_NAME);
    if path.exists() && !force {
        return Err(PrehookError::ConfigValidationError {
            message: format!(
                "{} already exists; use --force to overwrite",
                path.display()
            ),
        });
    }

    let yaml = default_config_yaml()?;
    fs::write(&path, yaml)?;
    tracing::info!("Wrote {}", path.display());
    Ok(path)
}
