//! Prerequisite resolution with a single remediation attempt.
//!
//! The `PrerequisiteChecker` probes each prerequisite; when one is absent
//! it fetches the prerequisite's URL once and probes again. Results are
//! cached per run so a tool shared by several checks is probed, and at
//! most fetched, once. Probes and fetches stop when the run is cancelled.

use crate::config::CheckPrerequisite;
use crate::requirements::installer::Fetcher;
use crate::requirements::status::{PrerequisiteResult, PrerequisiteStatus};
use crate::shell::{CancelToken, CommandExecutor, CommandOptions};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

type Key = (Vec<String>, i32);

/// One tool's resolution; its lock is held across probe and fetch.
type Slot = Arc<Mutex<Option<PrerequisiteStatus>>>;

/// Resolves prerequisites, shared by all checks of a run.
pub struct PrerequisiteChecker<'a> {
    executor: &'a dyn CommandExecutor,
    fetcher: &'a dyn Fetcher,
    cwd: PathBuf,
    install: bool,
    slots: Mutex<HashMap<Key, Slot>>,
}

impl<'a> PrerequisiteChecker<'a> {
    /// Create a checker probing in `cwd`.
    pub fn new(executor: &'a dyn CommandExecutor, fetcher: &'a dyn Fetcher, cwd: &Path) -> Self {
        Self {
            executor,
            fetcher,
            cwd: cwd.to_path_buf(),
            install: true,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Disable remediation: absent tools are reported, never fetched.
    pub fn without_install(mut self) -> Self {
        self.install = false;
        self
    }

    /// Resolve one prerequisite, using the cache when available.
    ///
    /// Two checks needing the same tool wait for each other; different
    /// tools resolve in parallel. Probe and fetch are killed when `cancel`
    /// trips, and a cancelled resolution is not cached.
    pub fn check_one(
        &self,
        prerequisite: &CheckPrerequisite,
        cancel: &CancelToken,
    ) -> PrerequisiteStatus {
        let key = (
            prerequisite.help_command.clone(),
            prerequisite.expected_exit_code,
        );
        let slot = self
            .slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(key)
            .or_default()
            .clone();

        let mut resolved = slot.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(status) = resolved.as_ref() {
            return status.clone();
        }
        if cancel.is_cancelled() {
            return PrerequisiteStatus::Cancelled;
        }

        let status = self.evaluate(prerequisite, cancel);
        if status != PrerequisiteStatus::Cancelled {
            *resolved = Some(status.clone());
        }
        status
    }

    /// Resolve prerequisites in order, stopping at the first unavailable one.
    ///
    /// The returned list ends with the failing prerequisite, if any.
    pub fn check_all(
        &self,
        prerequisites: &[CheckPrerequisite],
        cancel: &CancelToken,
    ) -> Vec<PrerequisiteResult> {
        let mut results = Vec::with_capacity(prerequisites.len());
        for prerequisite in prerequisites {
            let status = self.check_one(prerequisite, cancel);
            let available = status.is_available();
            results.push(PrerequisiteResult {
                command: prerequisite.command_line(),
                url: prerequisite.url.clone(),
                status,
            });
            if !available {
                break;
            }
        }
        results
    }

    fn evaluate(
        &self,
        prerequisite: &CheckPrerequisite,
        cancel: &CancelToken,
    ) -> PrerequisiteStatus {
        let options = CommandOptions::in_dir(&self.cwd).with_cancel(cancel.clone());
        if prerequisite.is_present(self.executor, &options) {
            return PrerequisiteStatus::Present;
        }
        if cancel.is_cancelled() {
            return PrerequisiteStatus::Cancelled;
        }

        let command = prerequisite.command_line();
        if !self.install {
            return PrerequisiteStatus::Unavailable {
                reason: format!("'{}' is not installed", command),
            };
        }
        if prerequisite.url.trim().is_empty() {
            return PrerequisiteStatus::Unavailable {
                reason: format!("'{}' is not installed and has no url to fetch", command),
            };
        }

        // Exactly one remediation attempt; a failed fetch uses it up.
        if let Err(e) = self.fetcher.fetch(&prerequisite.url, cancel) {
            if cancel.is_cancelled() {
                return PrerequisiteStatus::Cancelled;
            }
            tracing::warn!("Fetching {} failed: {}", prerequisite.url, e);
            return PrerequisiteStatus::Unavailable {
                reason: format!("fetching {} failed: {}", prerequisite.url, e),
            };
        }

        if prerequisite.is_present(self.executor, &options) {
            tracing::info!("Installed {}", prerequisite.url);
            PrerequisiteStatus::Installed
        } else if cancel.is_cancelled() {
            PrerequisiteStatus::Cancelled
        } else {
            PrerequisiteStatus::Unavailable {
                reason: format!(
                    "'{}' still not present after fetching {}",
                    command, prerequisite.url
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::{MockExecutor, MockResponse};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};

    /// Fetcher recording calls, succeeding or failing on demand.
    struct CountingFetcher {
        calls: AtomicUsize,
        succeed: bool,
    }

    impl CountingFetcher {
        fn new(succeed: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                succeed,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Fetcher for CountingFetcher {
        fn fetch(&self, _url: &str, _cancel: &CancelToken) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.succeed {
                Ok(())
            } else {
                anyhow::bail!("network unreachable")
            }
        }
    }

    fn tool() -> CheckPrerequisite {
        CheckPrerequisite::new(&["tool", "-help"], 2, "example.com/tool")
    }

    #[test]
    fn present_tool_is_not_fetched() {
        let executor = MockExecutor::new();
        executor.script("tool -help", vec![MockResponse::exit(2)]);
        let fetcher = CountingFetcher::new(true);
        let checker = PrerequisiteChecker::new(&executor, &fetcher, Path::new("."));

        assert_eq!(
            checker.check_one(&tool(), &CancelToken::new()),
            PrerequisiteStatus::Present
        );
        assert_eq!(fetcher.calls(), 0);
    }

    #[test]
    fn absent_tool_is_fetched_once_then_present() {
        let executor = MockExecutor::new();
        executor.script(
            "tool -help",
            vec![MockResponse::exit(127), MockResponse::exit(2)],
        );
        let fetcher = CountingFetcher::new(true);
        let checker = PrerequisiteChecker::new(&executor, &fetcher, Path::new("."));

        assert_eq!(
            checker.check_one(&tool(), &CancelToken::new()),
            PrerequisiteStatus::Installed
        );
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(executor.call_count("tool -help"), 2);
    }

    #[test]
    fn still_absent_after_fetch_is_unavailable_without_retry() {
        let executor = MockExecutor::new();
        executor.script("tool -help", vec![MockResponse::exit(127)]);
        let fetcher = CountingFetcher::new(true);
        let checker = PrerequisiteChecker::new(&executor, &fetcher, Path::new("."));

        let status = checker.check_one(&tool(), &CancelToken::new());
        assert!(!status.is_available());
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(executor.call_count("tool -help"), 2);
    }

    #[test]
    fn failed_fetch_uses_up_the_attempt() {
        let executor = MockExecutor::new();
        executor.script("tool -help", vec![MockResponse::exit(127)]);
        let fetcher = CountingFetcher::new(false);
        let checker = PrerequisiteChecker::new(&executor, &fetcher, Path::new("."));

        let status = checker.check_one(&tool(), &CancelToken::new());
        match status {
            PrerequisiteStatus::Unavailable { reason } => {
                assert!(reason.contains("network unreachable"))
            }
            other => panic!("unexpected status {:?}", other),
        }
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(executor.call_count("tool -help"), 1);
    }

    #[test]
    fn without_install_never_fetches() {
        let executor = MockExecutor::new();
        executor.script("tool -help", vec![MockResponse::exit(127)]);
        let fetcher = CountingFetcher::new(true);
        let checker =
            PrerequisiteChecker::new(&executor, &fetcher, Path::new(".")).without_install();

        assert!(!checker.check_one(&tool(), &CancelToken::new()).is_available());
        assert_eq!(fetcher.calls(), 0);
    }

    #[test]
    fn results_are_cached_per_run() {
        let executor = MockExecutor::new();
        executor.script("tool -help", vec![MockResponse::exit(2)]);
        let fetcher = CountingFetcher::new(true);
        let checker = PrerequisiteChecker::new(&executor, &fetcher, Path::new("."));

        checker.check_one(&tool(), &CancelToken::new());
        checker.check_one(&tool(), &CancelToken::new());
        assert_eq!(executor.call_count("tool -help"), 1);
    }

    #[test]
    fn check_all_short_circuits_on_first_unavailable() {
        let executor = MockExecutor::new();
        executor.script("first -h", vec![MockResponse::exit(127)]);
        executor.script("second -h", vec![MockResponse::exit(2)]);
        let fetcher = CountingFetcher::new(false);
        let checker = PrerequisiteChecker::new(&executor, &fetcher, Path::new("."));

        let prerequisites = vec![
            CheckPrerequisite::new(&["first", "-h"], 2, "example.com/first"),
            CheckPrerequisite::new(&["second", "-h"], 2, "example.com/second"),
        ];
        let results = checker.check_all(&prerequisites, &CancelToken::new());

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].command, "first -h");
        assert_eq!(executor.call_count("second -h"), 0);
    }

    #[test]
    fn missing_url_cannot_be_remediated() {
        let executor = MockExecutor::new();
        let fetcher = CountingFetcher::new(true);
        let checker = PrerequisiteChecker::new(&executor, &fetcher, Path::new("."));

        let status = checker.check_one(
            &CheckPrerequisite::new(&["tool", "-help"], 2, ""),
            &CancelToken::new(),
        );
        assert!(!status.is_available());
        assert_eq!(fetcher.calls(), 0);
    }

    #[test]
    fn cancelled_resolution_is_not_cached() {
        let executor = MockExecutor::new();
        executor.script(
            "tool -help",
            vec![
                MockResponse::slow(2, Duration::from_secs(30)),
                MockResponse::exit(2),
            ],
        );
        let fetcher = CountingFetcher::new(true);
        let checker = PrerequisiteChecker::new(&executor, &fetcher, Path::new("."));

        let cancel = CancelToken::new();
        let started = Instant::now();
        let status = thread::scope(|scope| {
            let resolving = scope.spawn(|| checker.check_one(&tool(), &cancel));
            thread::sleep(Duration::from_millis(50));
            cancel.cancel();
            resolving.join().unwrap()
        });

        assert_eq!(status, PrerequisiteStatus::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(
            checker.check_one(&tool(), &CancelToken::new()),
            PrerequisiteStatus::Present
        );
    }

    #[test]
    fn slow_fetch_does_not_block_other_tools() {
        let executor = MockExecutor::new();
        executor.script(
            "slow -h",
            vec![
                MockResponse::slow(127, Duration::from_millis(1500)),
                MockResponse::exit(2),
            ],
        );
        executor.script("fast -h", vec![MockResponse::exit(2)]);
        let fetcher = CountingFetcher::new(true);
        let checker = PrerequisiteChecker::new(&executor, &fetcher, Path::new("."));
        let cancel = CancelToken::new();

        let fast_elapsed = thread::scope(|scope| {
            scope.spawn(|| {
                checker.check_one(
                    &CheckPrerequisite::new(&["slow", "-h"], 2, "example.com/slow"),
                    &cancel,
                )
            });
            thread::sleep(Duration::from_millis(100));
            let started = Instant::now();
            let status = checker.check_one(
                &CheckPrerequisite::new(&["fast", "-h"], 2, "example.com/fast"),
                &cancel,
            );
            assert_eq!(status, PrerequisiteStatus::Present);
            started.elapsed()
        });

        assert!(fast_elapsed < Duration::from_millis(1000));
    }
}
