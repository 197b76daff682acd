//! Check configuration records.
//!
//! Each record maps to one entry under a mode's `checks:` key. The YAML
//! groups records by kind:
//!
//! ```yaml
//! checks:
//!   test:
//!   - extra_args: [-short]
//!   - extra_args: [-race]
//!   gofmt:
//!   - {}
//! ```
//!
//! In memory the records form the closed [`CheckConfig`] union, kept in
//! declaration order so the engine can match exhaustively over kinds.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

fn is_false(v: &bool) -> bool {
    !v
}

/// An external tool a check needs before it can run.
///
/// The help command is probed and its exit code compared with
/// `expected_exit_code`. When the tool is absent, `url` is fetched once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CheckPrerequisite {
    /// Command to probe for the tool. Must be fast and free of side effects.
    pub help_command: Vec<String>,

    /// Exit code the help command returns when the tool is installed.
    pub expected_exit_code: i32,

    /// Package location to fetch when the probe fails.
    pub url: String,
}

impl CheckPrerequisite {
    /// Create a prerequisite from a probe command, exit code and URL.
    pub fn new(help_command: &[&str], expected_exit_code: i32, url: &str) -> Self {
        Self {
            help_command: help_command.iter().map(|s| s.to_string()).collect(),
            expected_exit_code,
            url: url.to_string(),
        }
    }

    /// The probe command as a single printable line.
    pub fn command_line(&self) -> String {
        self.help_command.join(" ")
    }
}

/// `go build` over the whole tree.
///
/// Use several instances to build with different tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Build {
    /// Extra arguments passed before the package pattern, e.g. `-tags foo`.
    pub extra_args: Vec<String>,
}

/// `gofmt -l -s`. No options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Gofmt {}

/// `go test` over the whole tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Test {
    /// Extra arguments such as `-v`, `-short` or `-race`.
    pub extra_args: Vec<String>,
}

/// errcheck over all packages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Errcheck {
    /// Value passed to `-ignore`.
    pub ignores: String,
}

/// `goimports -l`. No options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Goimports {}

/// golint over all packages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Golint {
    /// Messages containing any of these substrings are ignored.
    pub blacklist: Vec<String>,
}

/// `go vet` over all packages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Govet {
    /// Messages containing any of these substrings are ignored.
    pub blacklist: Vec<String>,
}

/// A `[min, max]` coverage band, in percent.
///
/// `max_coverage == 0` leaves the upper bound unenforced. A band of
/// `{0, 0}` exempts its scope entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CoverageSettings {
    /// Minimum coverage; below it the scope fails.
    pub min_coverage: f64,

    /// Maximum coverage; above it the band is stale and should be raised.
    pub max_coverage: f64,
}

impl CoverageSettings {
    /// Create a band.
    pub fn new(min_coverage: f64, max_coverage: f64) -> Self {
        Self {
            min_coverage,
            max_coverage,
        }
    }
}

/// All tests run with coverage, merged across packages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Coverage {
    /// Count coverage produced by any package's tests toward every package
    /// it exercises. When false, directories without tests are not counted.
    pub use_global_inference: bool,

    /// Hand the merged results to the external coverage reporter.
    #[serde(alias = "use_external_reporting")]
    pub use_coveralls: bool,

    /// Band the whole repository must fit.
    pub global: CoverageSettings,

    /// Band for every directory without an explicit override.
    pub per_dir_default: CoverageSettings,

    /// Overrides keyed by POSIX path relative to the repository root
    /// (`.` is the root). A `null` value falls back to `per_dir_default`.
    pub per_dir: BTreeMap<String, Option<CoverageSettings>>,
}

/// A user configured external program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Custom {
    /// Display name, required.
    pub display_name: String,

    /// Description, optional.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Command line, required.
    pub command: Vec<String>,

    /// Fail the check when the command exits non-zero.
    #[serde(skip_serializing_if = "is_false")]
    pub check_exit_code: bool,

    /// Tools to install before running, in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prerequisites: Vec<CheckPrerequisite>,
}

/// The kind of a check, as written under `checks:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckKind {
    Build,
    Coverage,
    Custom,
    Errcheck,
    Gofmt,
    Goimports,
    Golint,
    Govet,
    Test,
}

impl CheckKind {
    /// The YAML key of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::Build => "build",
            CheckKind::Coverage => "coverage",
            CheckKind::Custom => "custom",
            CheckKind::Errcheck => "errcheck",
            CheckKind::Gofmt => "gofmt",
            CheckKind::Goimports => "goimports",
            CheckKind::Golint => "golint",
            CheckKind::Govet => "govet",
            CheckKind::Test => "test",
        }
    }

    /// One-line description shown by `prehook info`.
    pub fn description(&self) -> &'static str {
        match self {
            CheckKind::Build => "builds all packages",
            CheckKind::Coverage => "runs all tests with coverage and enforces bands",
            CheckKind::Custom => "runs a user configured command",
            CheckKind::Errcheck => "enforces checking of returned errors",
            CheckKind::Gofmt => "enforces all files are gofmt -s formatted",
            CheckKind::Goimports => "enforces all imports are goimports formatted",
            CheckKind::Golint => "enforces golint style",
            CheckKind::Govet => "runs go vet",
            CheckKind::Test => "runs all tests",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured check.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckConfig {
    Build(Build),
    Coverage(Coverage),
    Custom(Custom),
    Errcheck(Errcheck),
    Gofmt(Gofmt),
    Goimports(Goimports),
    Golint(Golint),
    Govet(Govet),
    Test(Test),
}

impl CheckConfig {
    /// The kind of this check.
    pub fn kind(&self) -> CheckKind {
        match self {
            CheckConfig::Build(_) => CheckKind::Build,
            CheckConfig::Coverage(_) => CheckKind::Coverage,
            CheckConfig::Custom(_) => CheckKind::Custom,
            CheckConfig::Errcheck(_) => CheckKind::Errcheck,
            CheckConfig::Gofmt(_) => CheckKind::Gofmt,
            CheckConfig::Goimports(_) => CheckKind::Goimports,
            CheckConfig::Golint(_) => CheckKind::Golint,
            CheckConfig::Govet(_) => CheckKind::Govet,
            CheckConfig::Test(_) => CheckKind::Test,
        }
    }

    /// Name used in reports. Custom checks use their display name.
    pub fn name(&self) -> String {
        match self {
            CheckConfig::Custom(custom) => custom.display_name.clone(),
            other => other.kind().to_string(),
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> String {
        match self {
            CheckConfig::Custom(custom) => custom
                .description
                .clone()
                .unwrap_or_else(|| format!("runs {}", custom.command.join(" "))),
            other => other.kind().description().to_string(),
        }
    }

    /// Tools that must be installed before this check can run.
    ///
    /// Third-party Go linters carry built-in prerequisites; custom checks
    /// declare their own.
    pub fn prerequisites(&self) -> Vec<CheckPrerequisite> {
        match self {
            CheckConfig::Custom(custom) => custom.prerequisites.clone(),
            CheckConfig::Errcheck(_) => vec![CheckPrerequisite::new(
                &["errcheck", "-h"],
                2,
                "github.com/kisielk/errcheck",
            )],
            CheckConfig::Goimports(_) => vec![CheckPrerequisite::new(
                &["goimports", "-h"],
                2,
                "golang.org/x/tools/cmd/goimports",
            )],
            CheckConfig::Golint(_) => vec![CheckPrerequisite::new(
                &["golint", "-h"],
                2,
                "golang.org/x/lint/golint",
            )],
            CheckConfig::Build(_)
            | CheckConfig::Coverage(_)
            | CheckConfig::Gofmt(_)
            | CheckConfig::Govet(_)
            | CheckConfig::Test(_) => Vec::new(),
        }
    }
}

/// The checks of one mode, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ChecksByKind", into = "ChecksByKind")]
pub struct Checks(Vec<CheckConfig>);

impl Checks {
    /// Wrap a list of checks.
    pub fn new(checks: Vec<CheckConfig>) -> Self {
        Self(checks)
    }

    /// Iterate over the checks.
    pub fn iter(&self) -> std::slice::Iter<'_, CheckConfig> {
        self.0.iter()
    }

    /// Number of configured checks.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no check is configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow as a slice.
    pub fn as_slice(&self) -> &[CheckConfig] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a Checks {
    type Item = &'a CheckConfig;
    type IntoIter = std::slice::Iter<'a, CheckConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// On-disk layout of a mode's checks: one sequence per kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct ChecksByKind {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub build: Vec<Build>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub coverage: Vec<Coverage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom: Vec<Custom>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errcheck: Vec<Errcheck>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gofmt: Vec<Gofmt>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub goimports: Vec<Goimports>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub golint: Vec<Golint>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub govet: Vec<Govet>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub test: Vec<Test>,
}

impl From<ChecksByKind> for Checks {
    fn from(by_kind: ChecksByKind) -> Self {
        let mut checks = Vec::new();
        checks.extend(by_kind.build.into_iter().map(CheckConfig::Build));
        checks.extend(by_kind.coverage.into_iter().map(CheckConfig::Coverage));
        checks.extend(by_kind.custom.into_iter().map(CheckConfig::Custom));
        checks.extend(by_kind.errcheck.into_iter().map(CheckConfig::Errcheck));
        checks.extend(by_kind.gofmt.into_iter().map(CheckConfig::Gofmt));
        checks.extend(by_kind.goimports.into_iter().map(CheckConfig::Goimports));
        checks.extend(by_kind.golint.into_iter().map(CheckConfig::Golint));
        checks.extend(by_kind.govet.into_iter().map(CheckConfig::Govet));
        checks.extend(by_kind.test.into_iter().map(CheckConfig::Test));
        Checks(checks)
    }
}

impl From<Checks> for ChecksByKind {
    fn from(checks: Checks) -> Self {
        let mut by_kind = ChecksByKind::default();
        for check in checks.0 {
            match check {
                CheckConfig::Build(c) => by_kind.build.push(c),
                CheckConfig::Coverage(c) => by_kind.coverage.push(c),
                CheckConfig::Custom(c) => by_kind.custom.push(c),
                CheckConfig::Errcheck(c) => by_kind.errcheck.push(c),
                CheckConfig::Gofmt(c) => by_kind.gofmt.push(c),
                CheckConfig::Goimports(c) => by_kind.goimports.push(c),
                CheckConfig::Golint(c) => by_kind.golint.push(c),
                CheckConfig::Govet(c) => by_kind.govet.push(c),
                CheckConfig::Test(c) => by_kind.test.push(c),
            }
        }
        by_kind
    }
}
