//! Go cover profile parsing.
//!
//! `go test -coverprofile` writes a `mode:` header followed by one line
//! per instrumented block:
//!
//! ```text
//! mode: count
//! example.com/repo/pkg/file.go:10.2,12.16 2 1
//! ```
//!
//! File names carry the module path; [`Profile::strip_module`] rewrites
//! them relative to the repository root.

use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{PrehookError, Result};

fn block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(.+):(\d+)\.(\d+),(\d+)\.(\d+) (\d+) (\d+)$").expect("valid block regex")
    })
}

/// One instrumented block of source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    /// Source file, POSIX separated.
    pub file: String,
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    /// Statements in the block.
    pub num_stmt: u64,
    /// Times the block executed.
    pub count: u64,
}

impl Block {
    /// Identity of the block's span, shared by every sample covering it.
    pub fn span(&self) -> (String, u32, u32, u32, u32) {
        (
            self.file.clone(),
            self.start_line,
            self.start_col,
            self.end_line,
            self.end_col,
        )
    }

    /// Directory holding the block's file; `.` for the root.
    pub fn dir(&self) -> String {
        parent_dir(&self.file)
    }
}

/// A parsed cover profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    /// `set`, `count`, or `atomic`.
    pub mode: String,
    pub blocks: Vec<Block>,
}

impl Profile {
    /// Parse profile text.
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let mut profile = Profile::default();
        let mut lines = content.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

        match lines.next() {
            Some((_, first)) => match first.trim().strip_prefix("mode:") {
                Some(mode) => profile.mode = mode.trim().to_string(),
                None => return Err("missing 'mode:' header".to_string()),
            },
            None => return Ok(profile),
        }

        for (index, line) in lines {
            let caps = block_regex()
                .captures(line.trim())
                .ok_or_else(|| format!("line {}: malformed block '{}'", index + 1, line))?;
            let num = |i: usize| -> std::result::Result<u64, String> {
                caps[i]
                    .parse::<u64>()
                    .map_err(|e| format!("line {}: {}", index + 1, e))
            };
            let pos = |i: usize| -> std::result::Result<u32, String> {
                caps[i]
                    .parse::<u32>()
                    .map_err(|e| format!("line {}: {}", index + 1, e))
            };
            profile.blocks.push(Block {
                file: caps[1].to_string(),
                start_line: pos(2)?,
                start_col: pos(3)?,
                end_line: pos(4)?,
                end_col: pos(5)?,
                num_stmt: num(6)?,
                count: num(7)?,
            });
        }

        Ok(profile)
    }

    /// Load and parse a profile file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content).map_err(|message| PrehookError::CoverageProfile {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Rewrite file names from module-qualified to repository-relative.
    ///
    /// Files outside the module are left untouched.
    pub fn strip_module(&mut self, module: &str) {
        let prefix = format!("{}/", module.trim_end_matches('/'));
        for block in &mut self.blocks {
            if let Some(rest) = block.file.strip_prefix(&prefix) {
                block.file = rest.to_string();
            }
        }
    }
}

/// Read the module path from `go.mod` in `root`, if there is one.
pub fn module_path(root: &Path) -> Option<String> {
    let content = fs::read_to_string(root.join("go.mod")).ok()?;
    content.lines().find_map(|line| {
        line.trim()
            .strip_prefix("module")
            .filter(|rest| rest.starts_with(char::is_whitespace))
            .map(|rest| rest.trim().trim_matches('"').to_string())
    })
}

/// Parent directory of a POSIX relative path; `.` when there is none.
pub fn parent_dir(path: &str) -> String {
    match path.rsplit_once('/') {
        Some((dir, _)) if !dir.is_empty() => dir.to_string(),
        _ => ".".to_string(),
    }
}
