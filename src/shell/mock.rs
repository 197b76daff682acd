//! Scripted executor for testing.
//!
//! `MockExecutor` implements [`CommandExecutor`] without spawning
//! processes. Responses are queued per command line; the last queued
//! response repeats. Unscripted commands go to an optional handler, and
//! otherwise fail to launch as if the binary were missing.
//!
//! # Example
//!
//! ```
//! use prehook::shell::{CommandExecutor, CommandOptions, MockExecutor, MockResponse};
//!
//! let executor = MockExecutor::new();
//! executor.script("tool -help", vec![MockResponse::exit(127), MockResponse::exit(2)]);
//!
//! let argv = vec!["tool".to_string(), "-help".to_string()];
//! let first = executor.execute(&argv, &CommandOptions::default()).unwrap();
//! let second = executor.execute(&argv, &CommandOptions::default()).unwrap();
//! assert_eq!(first.exit_code, Some(127));
//! assert_eq!(second.exit_code, Some(2));
//! assert_eq!(executor.call_count("tool -help"), 2);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{PrehookError, Result};

use super::command::{display_command, CommandExecutor, CommandOptions, CommandOutput};

type Handler = Box<dyn Fn(&[String], &CommandOptions) -> Result<CommandOutput> + Send + Sync>;

/// One scripted outcome.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// The process runs for `delay`, then exits.
    Exit {
        code: i32,
        stdout: String,
        stderr: String,
        delay: Duration,
    },
    /// The process cannot be started.
    LaunchFailure,
}

impl MockResponse {
    /// Exit immediately with `code` and no output.
    pub fn exit(code: i32) -> Self {
        Self::output(code, "", "")
    }

    /// Exit immediately with `code` and the given output.
    pub fn output(code: i32, stdout: &str, stderr: &str) -> Self {
        MockResponse::Exit {
            code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            delay: Duration::ZERO,
        }
    }

    /// Run for `delay` before exiting with `code`.
    pub fn slow(code: i32, delay: Duration) -> Self {
        MockResponse::Exit {
            code,
            stdout: String::new(),
            stderr: String::new(),
            delay,
        }
    }
}

/// Executor returning scripted results.
#[derive(Default)]
pub struct MockExecutor {
    responses: Mutex<HashMap<String, VecDeque<MockResponse>>>,
    calls: Mutex<Vec<String>>,
    handler: Option<Handler>,
}

impl MockExecutor {
    /// Create an executor with no scripted commands.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route unscripted commands to `handler`.
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&[String], &CommandOptions) -> Result<CommandOutput> + Send + Sync + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Queue responses for a command line (arguments joined by spaces).
    pub fn script(&self, command: &str, responses: Vec<MockResponse>) {
        let mut map = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        map.entry(command.to_string())
            .or_default()
            .extend(responses);
    }

    /// Every command line executed so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// How many times `command` was executed.
    pub fn call_count(&self, command: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == command).count()
    }

    fn next_response(&self, command: &str) -> Option<MockResponse> {
        let mut map = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        let queue = map.get_mut(command)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl CommandExecutor for MockExecutor {
    fn execute(&self, argv: &[String], options: &CommandOptions) -> Result<CommandOutput> {
        let command = display_command(argv);
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(command.clone());

        let response = match self.next_response(&command) {
            Some(response) => response,
            None => match &self.handler {
                Some(handler) => return handler(argv, options),
                None => MockResponse::LaunchFailure,
            },
        };

        match response {
            MockResponse::LaunchFailure => Err(PrehookError::CommandLaunch { command }),
            MockResponse::Exit {
                code,
                stdout,
                stderr,
                delay,
            } => {
                let start = Instant::now();
                while start.elapsed() < delay {
                    if options.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
                        return Ok(CommandOutput::cancelled(start.elapsed()));
                    }
                    thread::sleep(Duration::from_millis(5));
                }
                Ok(CommandOutput {
                    duration: start.elapsed(),
                    ..CommandOutput::exited(code, &stdout, &stderr)
                })
            }
        }
    }
}
