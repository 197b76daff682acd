//! Handing merged coverage to an external reporting service.
//!
//! When a coverage check sets `use_coveralls`, the merged per-file totals
//! are uploaded after judging. Upload failures are logged and never change
//! the check's verdict.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::coverage::aggregate::{CoverageReport, FileCoverage};

/// Default upload endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://coveralls.io/api/v1/jobs";

/// Environment variable overriding the endpoint.
pub const ENDPOINT_ENV: &str = "PREHOOK_COVERAGE_URL";

/// Environment variable holding the repository token.
pub const TOKEN_ENV: &str = "COVERALLS_REPO_TOKEN";

/// Receives merged coverage.
pub trait CoverageReporter: Send + Sync {
    /// Publish one report.
    fn report(&self, upload: &CoverageUpload) -> Result<()>;
}

/// The payload sent to the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageUpload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_token: Option<String>,
    pub service_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_job_id: Option<String>,
    pub covered_percent: f64,
    pub source_files: Vec<FileCoverage>,
}

impl CoverageUpload {
    /// Build the payload for `report` with settings resolved from `env`.
    pub fn new(report: &CoverageReport, env: &HashMap<String, String>) -> Self {
        let (service_name, service_job_id) = detect_service(env);
        Self {
            repo_token: env.get(TOKEN_ENV).filter(|t| !t.is_empty()).cloned(),
            service_name,
            service_job_id,
            covered_percent: report.global.percentage,
            source_files: report.files.clone(),
        }
    }
}

fn detect_service(env: &HashMap<String, String>) -> (String, Option<String>) {
    if let Some(id) = env.get("GITHUB_RUN_ID") {
        ("github".to_string(), Some(id.clone()))
    } else if let Some(id) = env.get("TRAVIS_JOB_ID") {
        ("travis-ci".to_string(), Some(id.clone()))
    } else if let Some(id) = env.get("CIRCLE_BUILD_NUM") {
        ("circleci".to_string(), Some(id.clone()))
    } else {
        ("prehook".to_string(), None)
    }
}

/// Uploads reports as JSON over HTTP.
pub struct HttpReporter {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpReporter {
    /// Create a reporter posting to `endpoint`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    /// Create a reporter for the endpoint configured in `env`.
    pub fn from_env(env: &HashMap<String, String>) -> Result<Self> {
        let endpoint = env
            .get(ENDPOINT_ENV)
            .filter(|e| !e.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        Self::new(endpoint, Duration::from_secs(30))
    }

    /// The upload endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl CoverageReporter for HttpReporter {
    fn report(&self, upload: &CoverageUpload) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(upload)
            .send()
            .with_context(|| format!("Failed to upload coverage to {}", self.endpoint))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP {} uploading coverage to {}",
                response.status(),
                self.endpoint
            ));
        }
        Ok(())
    }
}

/// Upload `report`, logging instead of failing. Returns whether it was sent.
pub fn publish(
    reporter: &dyn CoverageReporter,
    report: &CoverageReport,
    env: &HashMap<String, String>,
) -> bool {
    let upload = CoverageUpload::new(report, env);
    match reporter.report(&upload) {
        Ok(()) => {
            tracing::info!(
                "Uploaded coverage for {} files",
                upload.source_files.len()
            );
            true
        }
        Err(e) => {
            tracing::warn!("Coverage upload failed: {:#}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Coverage, CoverageSettings};
    use crate::coverage::aggregate::{aggregate, CoverageSample};
    use httpmock::prelude::*;

    fn report() -> CoverageReport {
        let coverage = Coverage {
            global: CoverageSettings::new(10.0, 0.0),
            ..Default::default()
        };
        aggregate(
            &[CoverageSample::from_counts("pkg", "pkg/a.go", 3, 4)],
            &coverage,
        )
    }

    #[test]
    fn upload_carries_totals_and_token() {
        let mut env = HashMap::new();
        env.insert(TOKEN_ENV.to_string(), "secret".to_string());
        env.insert("GITHUB_RUN_ID".to_string(), "42".to_string());

        let upload = CoverageUpload::new(&report(), &env);
        assert_eq!(upload.repo_token.as_deref(), Some("secret"));
        assert_eq!(upload.service_name, "github");
        assert_eq!(upload.service_job_id.as_deref(), Some("42"));
        assert_eq!(upload.covered_percent, 75.0);
        assert_eq!(upload.source_files.len(), 1);
    }

    #[test]
    fn local_runs_have_no_job_id() {
        let upload = CoverageUpload::new(&report(), &HashMap::new());
        assert_eq!(upload.service_name, "prehook");
        assert!(upload.service_job_id.is_none());
        assert!(upload.repo_token.is_none());
    }

    #[test]
    fn endpoint_comes_from_env() {
        let mut env = HashMap::new();
        env.insert(ENDPOINT_ENV.to_string(), "http://localhost:1/jobs".to_string());
        let reporter = HttpReporter::from_env(&env).unwrap();
        assert_eq!(reporter.endpoint(), "http://localhost:1/jobs");

        let reporter = HttpReporter::from_env(&HashMap::new()).unwrap();
        assert_eq!(reporter.endpoint(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn posts_json_to_endpoint() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/jobs")
                .body_includes("\"covered_percent\":75.0")
                .body_includes("pkg/a.go");
            then.status(200);
        });

        let reporter = HttpReporter::new(server.url("/jobs"), Duration::from_secs(5)).unwrap();
        assert!(publish(&reporter, &report(), &HashMap::new()));
        mock.assert();
    }

    #[test]
    fn server_error_is_reported_not_raised() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/jobs");
            then.status(500);
        });

        let reporter = HttpReporter::new(server.url("/jobs"), Duration::from_secs(5)).unwrap();
        let err = reporter
            .report(&CoverageUpload::new(&report(), &HashMap::new()))
            .unwrap_err();
        assert!(err.to_string().contains("500"));
        assert!(!publish(&reporter, &report(), &HashMap::new()));
    }
}
