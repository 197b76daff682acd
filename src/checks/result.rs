//! Check outcomes.

use serde::{Serialize, Serializer};
use std::time::Duration;

use crate::config::CheckKind;
use crate::coverage::CoverageReport;

/// Final status of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// The check ran and found nothing wrong.
    Passed,

    /// The check ran (or could not run) and reported a problem.
    Failed,

    /// The mode's time budget ran out first.
    Cancelled,
}

impl CheckStatus {
    /// Get a display character for this status.
    pub fn display_char(&self) -> char {
        match self {
            CheckStatus::Passed => '✓',
            CheckStatus::Failed => '✗',
            CheckStatus::Cancelled => '⊘',
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CheckStatus::Passed => "passed",
            CheckStatus::Failed => "failed",
            CheckStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

pub(crate) fn as_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Result of running one check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    /// Display name.
    pub name: String,

    /// The check's kind key.
    pub kind: &'static str,

    pub status: CheckStatus,

    /// Execution duration.
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,

    /// One-line reason for a failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Captured tool output relevant to a failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Merged coverage, for coverage checks that finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<CoverageReport>,
}

impl CheckResult {
    fn new(name: &str, kind: &'static str, status: CheckStatus, duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            kind,
            status,
            duration,
            detail: None,
            output: None,
            coverage: None,
        }
    }

    /// A passing result.
    pub fn passed(name: &str, kind: CheckKind, duration: Duration) -> Self {
        Self::new(name, kind.as_str(), CheckStatus::Passed, duration)
    }

    /// A failing result with a reason and optional tool output.
    pub fn failed(
        name: &str,
        kind: CheckKind,
        duration: Duration,
        detail: impl Into<String>,
        output: Option<String>,
    ) -> Self {
        let mut result = Self::new(name, kind.as_str(), CheckStatus::Failed, duration);
        result.detail = Some(detail.into());
        result.output = output.filter(|o| !o.trim().is_empty());
        result
    }

    /// A result for a check stopped by the time budget.
    pub fn cancelled(name: &str, kind: CheckKind, duration: Duration) -> Self {
        Self::new(name, kind.as_str(), CheckStatus::Cancelled, duration).budget_exceeded()
    }

    fn budget_exceeded(mut self) -> Self {
        self.detail = Some("cancelled: time budget exceeded".to_string());
        self
    }

    /// Attach merged coverage.
    pub fn with_coverage(mut self, coverage: CoverageReport) -> Self {
        self.coverage = Some(coverage);
        self
    }

    /// Turn any result into a cancellation. Partial coverage is dropped.
    pub fn into_cancelled(self) -> Self {
        Self::new(&self.name, self.kind, CheckStatus::Cancelled, self.duration).budget_exceeded()
    }

    /// Whether the check passed.
    pub fn success(&self) -> bool {
        self.status == CheckStatus::Passed
    }

    /// Single-line summary for terminal output.
    pub fn summary_line(&self) -> String {
        let mut line = format!("{} {}", self.status.display_char(), self.name);
        if let Some(detail) = &self.detail {
            line.push_str(": ");
            line.push_str(detail);
        }
        line
    }
}
