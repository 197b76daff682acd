//! Coverage collection, aggregation, and judging.
//!
//! Each package's tests produce a Go cover profile ([`profile`]). The
//! profiles are merged into one global figure and per-directory figures
//! ([`aggregate`]) which are judged against configured bands ([`band`]).
//! Merged results can be handed to an external service ([`report`]).

pub mod aggregate;
pub mod band;
pub mod profile;
pub mod report;

pub use aggregate::{
    aggregate, CoverageReport, CoverageSample, FileCoverage, ScopeCoverage, Statements,
};
pub use band::{Band, Verdict};
pub use profile::{module_path, Block, Profile};
pub use report::{publish, CoverageReporter, CoverageUpload, HttpReporter};
