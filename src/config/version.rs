//! `min_version` handling.

use crate::error::{PrehookError, Result};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

/// Current version of prehook.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^v?(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:[-+].*)?$").expect("valid version regex")
    })
}

/// A `major.minor.patch` triple. Pre-release and build suffixes are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Parse `1`, `1.2`, `1.2.3`, `v1.2.3` or `1.2.3-rc1`.
    pub fn parse(s: &str) -> Option<Self> {
        let caps = version_regex().captures(s.trim())?;
        let part = |i: usize| -> Option<u64> {
            match caps.get(i) {
                Some(m) => m.as_str().parse().ok(),
                None => Some(0),
            }
        };
        Some(Self {
            major: part(1)?,
            minor: part(2)?,
            patch: part(3)?,
        })
    }

    /// The version of the running binary.
    pub fn current() -> Self {
        Self::parse(VERSION).unwrap_or(Self {
            major: 0,
            minor: 0,
            patch: 0,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Fail when `min_version` is newer than `current`.
///
/// An empty `min_version` imposes no constraint.
pub fn check_min_version(min_version: &str, current: Version) -> Result<()> {
    if min_version.trim().is_empty() {
        return Ok(());
    }

    let Some(required) = Version::parse(min_version) else {
        return Err(PrehookError::ConfigValidationError {
            message: format!("min_version '{}' is not a semantic version", min_version),
        });
    };

    match required.cmp(&current) {
        Ordering::Greater => Err(PrehookError::UnsupportedVersion {
            required: required.to_string(),
            current: current.to_string(),
        }),
        _ => Ok(()),
    }
}
