//! Command execution.
//!
//! Checks and prerequisite probes never spawn processes directly; they go
//! through [`CommandExecutor`] so the engine can be driven by a scripted
//! executor in tests.

use crate::error::{PrehookError, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// How often a running child is polled for exit or cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Shared flag used to kill every running child of a mode.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of executing a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code (None if killed by signal or cancelled).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Whether the command was killed through its [`CancelToken`].
    pub cancelled: bool,

    /// Execution duration.
    pub duration: Duration,
}

impl CommandOutput {
    /// A finished command with the given exit code.
    pub fn exited(exit_code: i32, stdout: &str, stderr: &str) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            cancelled: false,
            duration: Duration::ZERO,
        }
    }

    /// A command killed by cancellation.
    pub fn cancelled(duration: Duration) -> Self {
        Self {
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            cancelled: true,
            duration,
        }
    }

    /// Whether the command exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout followed by stderr, as shown in failure details.
    pub fn combined(&self) -> String {
        match (self.stdout.trim_end(), self.stderr.trim_end()) {
            ("", err) => err.to_string(),
            (out, "") => out.to_string(),
            (out, err) => format!("{}\n{}", out, err),
        }
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Token that kills the child when set.
    pub cancel: Option<CancelToken>,
}

impl CommandOptions {
    /// Run in `cwd`.
    pub fn in_dir(cwd: &Path) -> Self {
        Self {
            cwd: Some(cwd.to_path_buf()),
            cancel: None,
        }
    }

    /// Attach a cancellation token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Runs an argument vector and captures its output.
pub trait CommandExecutor: Send + Sync {
    /// Execute `argv`.
    ///
    /// # Errors
    ///
    /// Returns [`PrehookError::CommandLaunch`] when the process cannot be
    /// started (empty argv, binary not found, permission denied). A
    /// process that starts and exits non-zero is an `Ok` output.
    fn execute(&self, argv: &[String], options: &CommandOptions) -> Result<CommandOutput>;
}

/// Executes commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl SystemExecutor {
    /// Create a system executor.
    pub fn new() -> Self {
        Self
    }
}

fn spawn_reader<R: Read + Send + 'static>(stream: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut stream) = stream {
            let _ = stream.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).to_string()
    })
}

impl CommandExecutor for SystemExecutor {
    fn execute(&self, argv: &[String], options: &CommandOptions) -> Result<CommandOutput> {
        let command_line = argv.join(" ");
        let Some((program, args)) = argv.split_first() else {
            return Err(PrehookError::CommandLaunch {
                command: command_line,
            });
        };

        tracing::debug!("Executing: {}", command_line);
        let start = Instant::now();

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|e| {
            tracing::debug!("Failed to launch {}: {}", command_line, e);
            PrehookError::CommandLaunch {
                command: command_line.clone(),
            }
        })?;

        // Drain pipes on separate threads so a chatty child never blocks.
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let status = loop {
            if let Some(status) = child.try_wait()? {
                break Some(status);
            }
            if options.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
                tracing::debug!("Cancelling: {}", command_line);
                let _ = child.kill();
                let _ = child.wait();
                break None;
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();
        let duration = start.elapsed();

        Ok(match status {
            Some(status) => CommandOutput {
                exit_code: status.code(),
                stdout,
                stderr,
                cancelled: false,
                duration,
            },
            None => CommandOutput {
                stdout,
                stderr,
                ..CommandOutput::cancelled(duration)
            },
        })
    }
}

/// Render an argv for logs and failure messages.
pub fn display_command(argv: &[String]) -> String {
    argv.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn combined_joins_streams() {
        let out = CommandOutput::exited(1, "out\n", "err\n");
        assert_eq!(out.combined(), "out\nerr");
        assert_eq!(CommandOutput::exited(1, "", "err").combined(), "err");
        assert_eq!(CommandOutput::exited(1, "out", "").combined(), "out");
    }

    #[test]
    fn success_requires_zero_exit() {
        assert!(CommandOutput::exited(0, "", "").success());
        assert!(!CommandOutput::exited(2, "", "").success());
        assert!(!CommandOutput::cancelled(Duration::ZERO).success());
    }

    #[test]
    fn empty_argv_is_launch_failure() {
        let err = SystemExecutor::new()
            .execute(&[], &CommandOptions::default())
            .unwrap_err();
        assert!(matches!(err, PrehookError::CommandLaunch { .. }));
    }

    #[test]
    fn missing_binary_is_launch_failure() {
        let err = SystemExecutor::new()
            .execute(
                &argv(&["prehook-definitely-not-a-real-binary"]),
                &CommandOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, PrehookError::CommandLaunch { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn captures_output_and_exit_code() {
        let out = SystemExecutor::new()
            .execute(
                &argv(&["sh", "-c", "echo hello; echo oops >&2; exit 3"]),
                &CommandOptions::default(),
            )
            .unwrap();
        assert_eq!(out.exit_code, Some(3));
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.stderr.trim(), "oops");
        assert!(!out.cancelled);
    }

    #[cfg(unix)]
    #[test]
    fn runs_in_working_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join("marker"), "").unwrap();
        let out = SystemExecutor::new()
            .execute(&argv(&["ls"]), &CommandOptions::in_dir(temp.path()))
            .unwrap();
        assert!(out.stdout.contains("marker"));
    }

    #[cfg(unix)]
    #[test]
    fn cancellation_kills_child() {
        let token = CancelToken::new();
        let canceller = token.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            canceller.cancel();
        });

        let out = SystemExecutor::new()
            .execute(
                &argv(&["sleep", "10"]),
                &CommandOptions::default().with_cancel(token),
            )
            .unwrap();
        handle.join().unwrap();

        assert!(out.cancelled);
        assert_eq!(out.exit_code, None);
        assert!(out.duration < Duration::from_secs(5));
    }
}
