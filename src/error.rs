//! Error types for prehook operations.
//!
//! This module defines [`PrehookError`], the primary error type used
//! throughout the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Configuration problems are fatal and surface before any check runs
//! - Check-level failures (exit codes, coverage bands, missing
//!   prerequisites) are reported per check, not as errors
//! - Use `anyhow::Error` (via `PrehookError::Other`) for collaborator
//!   failures such as HTTP uploads or remediation fetches

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for prehook operations.
#[derive(Debug, Error)]
pub enum PrehookError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// The configuration asks for a newer prehook than the one running.
    #[error("Configuration requires prehook {required}, running {current}")]
    UnsupportedVersion { required: String, current: String },

    /// Requested mode is not declared in the configuration.
    #[error("Mode '{mode}' is not configured")]
    UnknownMode { mode: String },

    /// A prerequisite stayed absent after its single remediation attempt.
    #[error("Prerequisite unavailable for '{check}': {command}")]
    PrerequisiteUnavailable { check: String, command: String },

    /// A command could not be launched at all.
    #[error("Failed to launch command: {command}")]
    CommandLaunch { command: String },

    /// A coverage profile could not be parsed.
    #[error("Invalid coverage profile {path}: {message}")]
    CoverageProfile { path: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for prehook operations.
pub type Result<T> = std::result::Result<T, PrehookError>;
