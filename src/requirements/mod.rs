//! Prerequisite detection and installation.
//!
//! Checks backed by third-party tools declare prerequisites: a probe
//! command and the exit code it returns when the tool is installed. A
//! missing tool gets exactly one remediation fetch before the check is
//! failed.
//!
//! # Modules
//!
//! - [`prerequisite`] - Probing a single prerequisite
//! - [`checker`] - Per-run resolution with remediation and caching
//! - [`installer`] - The fetch collaborator
//! - [`status`] - Resolution outcome types

pub mod checker;
pub mod installer;
pub mod prerequisite;
pub mod status;

pub use checker::PrerequisiteChecker;
pub use installer::{Fetcher, GoGetFetcher};
pub use status::{PrerequisiteResult, PrerequisiteStatus};
