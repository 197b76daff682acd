//! Configuration loading, parsing, and validation for prehook.
//!
//! This module handles all aspects of configuration:
//! - Root schema in [`schema`]
//! - Check records and the [`CheckConfig`] union in [`checks`]
//! - File discovery and loading in [`loader`]
//! - Validation in [`validator`]
//! - `min_version` handling in [`version`]
//! - The built-in configuration in [`defaults`]
//!
//! # Example
//!
//! ```
//! use prehook::config::{load_config, ModeName};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! fs::write(
//!     temp.path().join("prehook.yml"),
//!     "modes:\n  pre-commit:\n    checks:\n      gofmt:\n      - {}\n    max_duration: 5\n",
//! )
//! .unwrap();
//!
//! let loaded = load_config(temp.path(), None).unwrap();
//! let mode = loaded.config.mode(ModeName::PreCommit).unwrap();
//! assert_eq!(mode.checks.len(), 1);
//! ```

pub mod checks;
pub mod defaults;
pub mod loader;
pub mod schema;
pub mod validator;
pub mod version;

// Schema re-exports
pub use checks::{
    Build, CheckConfig, CheckKind, CheckPrerequisite, Checks, Coverage, CoverageSettings, Custom,
    Errcheck, Gofmt, Goimports, Golint, Govet, Test,
};
pub use schema::{Config, Mode, ModeName};

// Loader re-exports
pub use loader::{
    find_project_root, load_config, load_config_file, parse_config, write_default_config,
    ConfigSource, LoadedConfig, CONFIG_FILE_NAME,
};

// Validator re-exports
pub use validator::{validate, validate_config, ValidationError};

pub use defaults::{default_config, default_config_yaml};
pub use version::{check_min_version, Version, VERSION};
