//! Mode execution orchestration.
//!
//! A mode's checks run concurrently on a bounded pool of worker threads
//! under the mode's time budget. When the budget runs out every running
//! command is killed and every unfinished check is reported as cancelled.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};

use crate::checks::{execute_check, CheckContext, CheckResult, CheckStatus, IgnoreMatcher};
use crate::config::{Config, ModeName};
use crate::coverage::CoverageReporter;
use crate::error::Result;
use crate::requirements::{Fetcher, PrerequisiteChecker};
use crate::shell::{CancelToken, CommandExecutor};

/// Progress events emitted while a mode runs.
#[derive(Debug)]
pub enum RunProgress<'a> {
    /// The mode is about to start its checks.
    ModeStarting {
        mode: ModeName,
        total: usize,
        budget: Option<Duration>,
    },
    /// A check finished.
    CheckFinished { result: &'a CheckResult },
    /// The budget ran out; remaining checks are being cancelled.
    BudgetExceeded,
}

/// Options for running a mode.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Maximum checks running at once.
    pub jobs: usize,
    /// Fetch missing prerequisites.
    pub install: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            jobs: thread::available_parallelism().map_or(4, |n| n.get()),
            install: true,
        }
    }
}

/// Overall result of a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeOutcome {
    Passed,
    Failed,
    /// The budget ran out before every check finished.
    TimedOut,
}

impl ModeOutcome {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            ModeOutcome::Passed => 0,
            ModeOutcome::Failed => 1,
            ModeOutcome::TimedOut => 3,
        }
    }
}

fn as_secs<S: Serializer>(d: &Option<Duration>, s: S) -> std::result::Result<S::Ok, S::Error> {
    match d {
        Some(d) => s.serialize_some(&d.as_secs()),
        None => s.serialize_none(),
    }
}

/// Result of running a mode.
#[derive(Debug, Clone, Serialize)]
pub struct ModeResult {
    pub mode: ModeName,
    pub outcome: ModeOutcome,
    /// Results in configuration order.
    pub checks: Vec<CheckResult>,
    /// Wall-clock duration of the whole mode.
    #[serde(rename = "duration_ms", serialize_with = "crate::checks::result::as_millis")]
    pub duration: Duration,
    #[serde(rename = "budget_secs", serialize_with = "as_secs")]
    pub budget: Option<Duration>,
}

impl ModeResult {
    /// Whether every check passed within the budget.
    pub fn success(&self) -> bool {
        self.outcome == ModeOutcome::Passed
    }

    /// Checks that did not pass.
    pub fn unsuccessful(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.success())
    }

    /// Count of checks with `status`.
    pub fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }
}

/// Runs the checks of one mode.
pub struct ModeRunner<'a> {
    config: &'a Config,
    executor: &'a dyn CommandExecutor,
    fetcher: &'a dyn Fetcher,
    reporter: Option<&'a dyn CoverageReporter>,
}

impl<'a> ModeRunner<'a> {
    /// Create a runner for `config`.
    pub fn new(
        config: &'a Config,
        executor: &'a dyn CommandExecutor,
        fetcher: &'a dyn Fetcher,
    ) -> Self {
        Self {
            config,
            executor,
            fetcher,
            reporter: None,
        }
    }

    /// Send coverage of checks with external reporting to `reporter`.
    pub fn with_reporter(mut self, reporter: &'a dyn CoverageReporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Run the specified mode.
    pub fn run(
        &self,
        name: ModeName,
        options: &RunOptions,
        project_root: &Path,
    ) -> Result<ModeResult> {
        self.run_with_progress(name, options, project_root, |_| {})
    }

    /// Run the specified mode with a progress callback.
    ///
    /// Progress is reported from the calling thread.
    pub fn run_with_progress(
        &self,
        name: ModeName,
        options: &RunOptions,
        project_root: &Path,
        mut on_progress: impl FnMut(RunProgress<'_>),
    ) -> Result<ModeResult> {
        let mode = self.config.require_mode(name)?;
        let checks = mode.checks.as_slice();
        let budget = mode.budget();
        let ignore = IgnoreMatcher::new(&self.config.ignore_patterns)?;

        let mut prerequisites = PrerequisiteChecker::new(self.executor, self.fetcher, project_root);
        if !options.install {
            prerequisites = prerequisites.without_install();
        }
        let env: HashMap<String, String> = std::env::vars().collect();
        let cancel = CancelToken::new();

        let ctx = CheckContext {
            executor: self.executor,
            prerequisites: &prerequisites,
            reporter: self.reporter,
            project_root,
            ignore: &ignore,
            env: &env,
            cancel: cancel.clone(),
        };

        let total = checks.len();
        let workers = options.jobs.max(1).min(total.max(1));
        tracing::info!(
            "Running {} ({} checks, {} workers, budget {:?})",
            name,
            total,
            workers,
            budget
        );
        on_progress(RunProgress::ModeStarting {
            mode: name,
            total,
            budget,
        });

        let start = Instant::now();
        let deadline = budget.map(|b| start + b);
        let next = AtomicUsize::new(0);
        let mut slots: Vec<Option<CheckResult>> = vec![None; total];
        let mut timed_out = false;

        thread::scope(|scope| {
            let (tx, rx) = mpsc::channel::<(usize, CheckResult)>();
            for _ in 0..workers {
                let tx = tx.clone();
                let ctx = &ctx;
                let next = &next;
                scope.spawn(move || loop {
                    let index = next.fetch_add(1, Ordering::SeqCst);
                    if index >= total {
                        break;
                    }
                    let check = &checks[index];
                    let result = if ctx.cancel.is_cancelled() {
                        CheckResult::cancelled(&check.name(), check.kind(), Duration::ZERO)
                    } else {
                        execute_check(check, ctx)
                    };
                    if tx.send((index, result)).is_err() {
                        break;
                    }
                });
            }
            drop(tx);

            loop {
                let received = match deadline {
                    Some(deadline) => {
                        let remaining = deadline.saturating_duration_since(Instant::now());
                        if remaining.is_zero() {
                            Err(RecvTimeoutError::Timeout)
                        } else {
                            rx.recv_timeout(remaining)
                        }
                    }
                    None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
                };
                match received {
                    Ok((index, result)) => {
                        on_progress(RunProgress::CheckFinished { result: &result });
                        slots[index] = Some(result);
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        tracing::warn!("{} exceeded its budget of {:?}", name, budget);
                        timed_out = true;
                        cancel.cancel();
                        on_progress(RunProgress::BudgetExceeded);
                        break;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }

            // Whatever finishes after the deadline was interrupted.
            for (index, result) in rx.iter() {
                let result = result.into_cancelled();
                on_progress(RunProgress::CheckFinished { result: &result });
                slots[index] = Some(result);
            }
        });

        let checks: Vec<CheckResult> = slots
            .into_iter()
            .zip(checks)
            .map(|(slot, check)| {
                slot.unwrap_or_else(|| {
                    CheckResult::cancelled(&check.name(), check.kind(), Duration::ZERO)
                })
            })
            .collect();

        let outcome = if timed_out {
            ModeOutcome::TimedOut
        } else if checks.iter().all(CheckResult::success) {
            ModeOutcome::Passed
        } else {
            ModeOutcome::Failed
        };
        let duration = start.elapsed();
        tracing::info!("{} finished in {:?}: {:?}", name, duration, outcome);

        Ok(ModeResult {
            mode: name,
            outcome,
            checks,
            duration,
            budget,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Build, CheckConfig, CheckPrerequisite, Custom, Gofmt, Mode, Test};
    use crate::shell::{MockExecutor, MockResponse};

    struct NoFetch;

    impl Fetcher for NoFetch {
        fn fetch(&self, _url: &str, _cancel: &CancelToken) -> anyhow::Result<()> {
            anyhow::bail!("offline")
        }
    }

    fn custom(name: &str, command: &[&str]) -> CheckConfig {
        CheckConfig::Custom(Custom {
            display_name: name.to_string(),
            command: command.iter().map(|s| s.to_string()).collect(),
            check_exit_code: true,
            ..Default::default()
        })
    }

    fn config_with(name: ModeName, mode: Mode) -> Config {
        let mut config = Config::default();
        config.modes.insert(name, mode);
        config
    }

    #[test]
    fn passing_checks_pass_the_mode() {
        let executor = MockExecutor::new();
        executor.script("go build ./...", vec![MockResponse::exit(0)]);
        executor.script("gofmt -l -s .", vec![MockResponse::exit(0)]);
        let config = config_with(
            ModeName::PreCommit,
            Mode::new(
                vec![
                    CheckConfig::Build(Build::default()),
                    CheckConfig::Gofmt(Gofmt {}),
                ],
                0,
            ),
        );

        let runner = ModeRunner::new(&config, &executor, &NoFetch);
        let result = runner
            .run(ModeName::PreCommit, &RunOptions::default(), Path::new("."))
            .unwrap();

        assert_eq!(result.outcome, ModeOutcome::Passed);
        assert_eq!(result.checks.len(), 2);
        assert_eq!(result.checks[0].name, "build");
        assert_eq!(result.outcome.exit_code(), 0);
    }

    #[test]
    fn one_failure_fails_the_mode_but_others_still_run() {
        let executor = MockExecutor::new();
        executor.script("go test ./...", vec![MockResponse::exit(1)]);
        executor.script("go build ./...", vec![MockResponse::exit(0)]);
        let config = config_with(
            ModeName::PrePush,
            Mode::new(
                vec![
                    CheckConfig::Test(Test::default()),
                    CheckConfig::Build(Build::default()),
                ],
                0,
            ),
        );

        let runner = ModeRunner::new(&config, &executor, &NoFetch);
        let result = runner
            .run(ModeName::PrePush, &RunOptions::default(), Path::new("."))
            .unwrap();

        assert_eq!(result.outcome, ModeOutcome::Failed);
        assert_eq!(result.count(CheckStatus::Passed), 1);
        assert_eq!(result.count(CheckStatus::Failed), 1);
        assert_eq!(result.outcome.exit_code(), 1);
    }

    #[test]
    fn budget_cancels_unfinished_checks() {
        let executor = MockExecutor::new();
        executor.script("quick", vec![MockResponse::exit(0)]);
        executor.script("slow", vec![MockResponse::slow(0, Duration::from_secs(30))]);
        let config = config_with(
            ModeName::PreCommit,
            Mode::new(vec![custom("quick", &["quick"]), custom("slow", &["slow"])], 1),
        );

        let runner = ModeRunner::new(&config, &executor, &NoFetch);
        let started = Instant::now();
        let result = runner
            .run(ModeName::PreCommit, &RunOptions::default(), Path::new("."))
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(result.outcome, ModeOutcome::TimedOut);
        assert_eq!(result.checks[0].status, CheckStatus::Passed);
        assert_eq!(result.checks[1].status, CheckStatus::Cancelled);
        assert_eq!(result.outcome.exit_code(), 3);
    }

    #[test]
    fn budget_cuts_off_slow_prerequisite_resolution() {
        let executor = MockExecutor::new();
        executor.script("tool -help", vec![MockResponse::slow(2, Duration::from_secs(8))]);
        executor.script("tool run", vec![MockResponse::exit(0)]);
        let check = CheckConfig::Custom(Custom {
            display_name: "tool".to_string(),
            command: vec!["tool".to_string(), "run".to_string()],
            check_exit_code: true,
            prerequisites: vec![CheckPrerequisite::new(
                &["tool", "-help"],
                2,
                "example.com/tool",
            )],
            ..Default::default()
        });
        let config = config_with(ModeName::PreCommit, Mode::new(vec![check], 1));

        let runner = ModeRunner::new(&config, &executor, &NoFetch);
        let started = Instant::now();
        let result = runner
            .run(ModeName::PreCommit, &RunOptions::default(), Path::new("."))
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(4));
        assert_eq!(result.outcome, ModeOutcome::TimedOut);
        assert_eq!(result.checks[0].status, CheckStatus::Cancelled);
        assert_eq!(executor.call_count("tool run"), 0);
    }

    #[test]
    fn queued_checks_are_cancelled_with_one_worker() {
        let executor = MockExecutor::new();
        executor.script("slow", vec![MockResponse::slow(0, Duration::from_secs(30))]);
        executor.script("never", vec![MockResponse::exit(0)]);
        let config = config_with(
            ModeName::Lint,
            Mode::new(vec![custom("slow", &["slow"]), custom("never", &["never"])], 1),
        );

        let options = RunOptions {
            jobs: 1,
            install: false,
        };
        let runner = ModeRunner::new(&config, &executor, &NoFetch);
        let result = runner.run(ModeName::Lint, &options, Path::new(".")).unwrap();

        assert_eq!(result.outcome, ModeOutcome::TimedOut);
        assert!(result
            .checks
            .iter()
            .all(|c| c.status == CheckStatus::Cancelled));
        assert_eq!(executor.call_count("never"), 0);
    }

    #[test]
    fn unknown_mode_is_an_error() {
        let executor = MockExecutor::new();
        let config = Config::default();
        let runner = ModeRunner::new(&config, &executor, &NoFetch);
        assert!(runner
            .run(ModeName::Lint, &RunOptions::default(), Path::new("."))
            .is_err());
    }

    #[test]
    fn empty_mode_passes() {
        let executor = MockExecutor::new();
        let config = config_with(ModeName::Lint, Mode::new(vec![], 5));
        let runner = ModeRunner::new(&config, &executor, &NoFetch);
        let result = runner
            .run(ModeName::Lint, &RunOptions::default(), Path::new("."))
            .unwrap();
        assert!(result.success());
        assert!(result.checks.is_empty());
    }

    #[test]
    fn progress_reports_every_check() {
        let executor = MockExecutor::new();
        executor.script("a", vec![MockResponse::exit(0)]);
        executor.script("b", vec![MockResponse::exit(1)]);
        let config = config_with(
            ModeName::PreCommit,
            Mode::new(vec![custom("a", &["a"]), custom("b", &["b"])], 0),
        );

        let mut finished = Vec::new();
        let runner = ModeRunner::new(&config, &executor, &NoFetch);
        runner
            .run_with_progress(
                ModeName::PreCommit,
                &RunOptions::default(),
                Path::new("."),
                |event| {
                    if let RunProgress::CheckFinished { result } = event {
                        finished.push(result.name.clone());
                    }
                },
            )
            .unwrap();

        finished.sort();
        assert_eq!(finished, vec!["a", "b"]);
    }

    #[test]
    fn result_serializes_for_json_output() {
        let executor = MockExecutor::new();
        executor.script("go build ./...", vec![MockResponse::exit(0)]);
        let config = config_with(
            ModeName::PreCommit,
            Mode::new(vec![CheckConfig::Build(Build::default())], 5),
        );
        let runner = ModeRunner::new(&config, &executor, &NoFetch);
        let result = runner
            .run(ModeName::PreCommit, &RunOptions::default(), Path::new("."))
            .unwrap();

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["mode"], "pre-commit");
        assert_eq!(json["outcome"], "passed");
        assert_eq!(json["budget_secs"], 5);
        assert_eq!(json["checks"][0]["kind"], "build");
    }
}
