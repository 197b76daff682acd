//! Remediation fetches for missing prerequisites.
//!
//! A prerequisite's `url` names a Go package. The default [`Fetcher`]
//! installs it with `go get`; tests substitute their own.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use crate::shell::{display_command, CancelToken, CommandExecutor, CommandOptions};

/// Installs a package given its URL.
pub trait Fetcher: Send + Sync {
    /// Fetch and install `url`, giving up when `cancel` trips.
    fn fetch(&self, url: &str, cancel: &CancelToken) -> Result<()>;
}

/// Installs packages by running `go get <url>`.
pub struct GoGetFetcher<'a> {
    executor: &'a dyn CommandExecutor,
    cwd: PathBuf,
}

impl<'a> GoGetFetcher<'a> {
    /// Create a fetcher running in `cwd`.
    pub fn new(executor: &'a dyn CommandExecutor, cwd: &Path) -> Self {
        Self {
            executor,
            cwd: cwd.to_path_buf(),
        }
    }

    /// The command line used to fetch `url`.
    pub fn command_for(url: &str) -> Vec<String> {
        vec!["go".to_string(), "get".to_string(), url.to_string()]
    }
}

impl Fetcher for GoGetFetcher<'_> {
    fn fetch(&self, url: &str, cancel: &CancelToken) -> Result<()> {
        let argv = Self::command_for(url);
        tracing::info!("Fetching {}", url);
        let options = CommandOptions::in_dir(&self.cwd).with_cancel(cancel.clone());
        let output = self.executor.execute(&argv, &options)?;
        if output.cancelled {
            bail!("{} was cancelled", display_command(&argv));
        }
        if !output.success() {
            bail!(
                "{} exited with {:?}: {}",
                display_command(&argv),
                output.exit_code,
                output.combined()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::{MockExecutor, MockResponse};

    #[test]
    fn runs_go_get() {
        let executor = MockExecutor::new();
        executor.script("go get example.com/tool", vec![MockResponse::exit(0)]);
        let fetcher = GoGetFetcher::new(&executor, Path::new("."));
        assert!(fetcher.fetch("example.com/tool", &CancelToken::new()).is_ok());
        assert_eq!(executor.calls(), vec!["go get example.com/tool"]);
    }

    #[test]
    fn non_zero_exit_is_an_error_with_output() {
        let executor = MockExecutor::new();
        executor.script(
            "go get example.com/tool",
            vec![MockResponse::output(1, "", "cannot find module")],
        );
        let fetcher = GoGetFetcher::new(&executor, Path::new("."));
        let err = fetcher.fetch("example.com/tool", &CancelToken::new()).unwrap_err();
        assert!(err.to_string().contains("cannot find module"));
    }

    #[test]
    fn cancelled_fetch_is_an_error() {
        let executor = MockExecutor::new();
        executor.script(
            "go get example.com/tool",
            vec![MockResponse::slow(0, std::time::Duration::from_secs(30))],
        );
        let fetcher = GoGetFetcher::new(&executor, Path::new("."));
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = fetcher.fetch("example.com/tool", &cancel).unwrap_err();
        assert!(err.to_string().contains("cancelled"));
    }

    #[test]
    fn missing_go_binary_is_an_error() {
        let executor = MockExecutor::new();
        let fetcher = GoGetFetcher::new(&executor, Path::new("."));
        assert!(fetcher.fetch("example.com/tool", &CancelToken::new()).is_err());
    }
}
