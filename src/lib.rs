//! Prehook - check orchestration for Go repositories.
//!
//! Prehook runs a configured set of checks (build, tests, formatters,
//! linters, coverage, custom programs) for one of four modes: pre-commit,
//! pre-push, continuous integration, or lint. Each mode has a wall-clock
//! budget; checks run concurrently and a missing tool gets one
//! remediation fetch before its check fails.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, parsing, and validation
//! - [`checks`] - Running individual checks
//! - [`coverage`] - Cover profile parsing, aggregation, and bands
//! - [`error`] - Error types and result aliases
//! - [`requirements`] - Prerequisite probing and remediation
//! - [`runner`] - Concurrent mode execution under a time budget
//! - [`shell`] - Process execution behind a mockable seam
//! - [`ui`] - Terminal output
//!
//! # Example
//!
//! ```
//! use prehook::config::{Coverage, CoverageSettings};
//! use prehook::coverage::{aggregate, CoverageSample, Verdict};
//!
//! let config = Coverage {
//!     global: CoverageSettings::new(50.0, 100.0),
//!     ..Default::default()
//! };
//! let samples = vec![
//!     CoverageSample::from_counts("pkgA", "pkgA/a.go", 8, 10),
//!     CoverageSample::from_counts("pkgB", "pkgB/b.go", 0, 5),
//! ];
//! let report = aggregate(&samples, &config);
//! assert_eq!(report.global.verdict, Verdict::Pass);
//! ```

pub mod checks;
pub mod cli;
pub mod config;
pub mod coverage;
pub mod error;
pub mod requirements;
pub mod runner;
pub mod shell;
pub mod ui;

pub use error::{PrehookError, Result};
