//! Configuration schema definitions for prehook.
//!
//! This module contains the root structures that map to `prehook.yml`.
//! Check records live in [`crate::config::checks`].

use crate::config::checks::{CheckConfig, Checks, ChecksByKind};
use crate::error::PrehookError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Root configuration structure for `prehook.yml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Minimum prehook version able to run this configuration.
    pub min_version: String,

    /// Modes keyed by name.
    pub modes: BTreeMap<ModeName, Mode>,

    /// Glob patterns of files and directories to skip.
    pub ignore_patterns: Vec<String>,
}

impl Config {
    /// Look up a mode by name.
    pub fn mode(&self, name: ModeName) -> Option<&Mode> {
        self.modes.get(&name)
    }

    /// Look up a mode, failing with [`PrehookError::UnknownMode`].
    pub fn require_mode(&self, name: ModeName) -> crate::error::Result<&Mode> {
        self.mode(name).ok_or_else(|| PrehookError::UnknownMode {
            mode: name.to_string(),
        })
    }
}

/// The fixed set of execution modes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum ModeName {
    /// Run before each commit; must be fast.
    PreCommit,
    /// Run before pushing.
    PrePush,
    /// Run on the CI server.
    ContinuousIntegration,
    /// Slow or noisy linters, run on demand.
    Lint,
}

impl ModeName {
    /// All modes, in execution-cost order.
    pub const ALL: [ModeName; 4] = [
        ModeName::PreCommit,
        ModeName::PrePush,
        ModeName::ContinuousIntegration,
        ModeName::Lint,
    ];

    /// The configuration key of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeName::PreCommit => "pre-commit",
            ModeName::PrePush => "pre-push",
            ModeName::ContinuousIntegration => "continuous-integration",
            ModeName::Lint => "lint",
        }
    }
}

impl fmt::Display for ModeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModeName {
    type Err = PrehookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pre-commit" => Ok(ModeName::PreCommit),
            "pre-push" => Ok(ModeName::PrePush),
            "continuous-integration" | "ci" => Ok(ModeName::ContinuousIntegration),
            "lint" => Ok(ModeName::Lint),
            other => Err(PrehookError::UnknownMode {
                mode: other.to_string(),
            }),
        }
    }
}

/// A named bundle of checks sharing one time budget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct Mode {
    /// Checks keyed by kind; a kind may be listed several times.
    #[schemars(with = "ChecksByKind")]
    pub checks: Checks,

    /// Maximum wall-clock duration of the whole mode, in seconds.
    /// Zero disables the budget.
    pub max_duration: u64,
}

impl Mode {
    /// Create a mode from checks and a budget in seconds.
    pub fn new(checks: Vec<CheckConfig>, max_duration: u64) -> Self {
        Self {
            checks: Checks::new(checks),
            max_duration,
        }
    }

    /// The time budget, if any.
    pub fn budget(&self) -> Option<Duration> {
        if self.max_duration == 0 {
            None
        } else {
            Some(Duration::from_secs(self.max_duration))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::checks::CheckKind;

    #[test]
    fn empty_config_has_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert!(config.min_version.is_empty());
        assert!(config.modes.is_empty());
        assert!(config.ignore_patterns.is_empty());
    }

    #[test]
    fn parses_modes_and_durations() {
        let yaml = r#"
min_version: 0.4.6
modes:
  pre-commit:
    checks:
      build:
      - extra_args: []
      test:
      - extra_args: [-short]
    max_duration: 5
ignore_patterns:
- ".*"
- "*.pb.go"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.min_version, "0.4.6");
        let mode = config.mode(ModeName::PreCommit).unwrap();
        assert_eq!(mode.max_duration, 5);
        assert_eq!(mode.checks.len(), 2);
        assert_eq!(mode.checks.as_slice()[1].kind(), CheckKind::Test);
        assert_eq!(config.ignore_patterns, vec![".*", "*.pb.go"]);
    }

    #[test]
    fn rejects_unknown_mode_name() {
        let yaml = "modes:\n  nightly:\n    max_duration: 5\n";
        let result: Result<Config, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_negative_duration() {
        let yaml = "modes:\n  lint:\n    max_duration: -1\n";
        let result: Result<Config, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn mode_name_round_trips_through_str() {
        for name in ModeName::ALL {
            assert_eq!(name.as_str().parse::<ModeName>().unwrap(), name);
        }
        assert_eq!(
            "ci".parse::<ModeName>().unwrap(),
            ModeName::ContinuousIntegration
        );
        assert!("nightly".parse::<ModeName>().is_err());
    }

    #[test]
    fn zero_duration_has_no_budget() {
        assert_eq!(Mode::new(Vec::new(), 0).budget(), None);
        assert_eq!(
            Mode::new(Vec::new(), 15).budget(),
            Some(Duration::from_secs(15))
        );
    }

    #[test]
    fn require_mode_reports_missing_mode() {
        let config = Config::default();
        let err = config.require_mode(ModeName::Lint).unwrap_err();
        assert!(matches!(err, PrehookError::UnknownMode { .. }));
    }
}
