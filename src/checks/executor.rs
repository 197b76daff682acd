//! Check execution engine.
//!
//! Turns one configured check into go tool invocations and judges their
//! output. Prerequisites are resolved first; an unavailable prerequisite
//! fails the check without running it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crate::checks::packages::{discover_packages, has_test_files, package_arg, IgnoreMatcher};
use crate::checks::result::CheckResult;
use crate::config::{
    Build, CheckConfig, Coverage, Custom, Errcheck, Golint, Govet, Test,
};
use crate::coverage::{self, module_path, CoverageReporter, CoverageSample, Profile};
use crate::requirements::{PrerequisiteChecker, PrerequisiteStatus};
use crate::shell::{display_command, CancelToken, CommandExecutor, CommandOptions, CommandOutput};

static SCRATCH_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Everything a check needs from the run it belongs to.
pub struct CheckContext<'a> {
    /// Runs every external command.
    pub executor: &'a dyn CommandExecutor,
    /// Shared prerequisite resolution for the run.
    pub prerequisites: &'a PrerequisiteChecker<'a>,
    /// Receives coverage when a check asks for external reporting.
    pub reporter: Option<&'a dyn CoverageReporter>,
    /// Repository root; commands run here.
    pub project_root: &'a Path,
    pub ignore: &'a IgnoreMatcher,
    /// Environment used to describe coverage uploads.
    pub env: &'a HashMap<String, String>,
    /// Tripped when the mode's budget runs out.
    pub cancel: CancelToken,
}

impl CheckContext<'_> {
    fn options(&self) -> CommandOptions {
        CommandOptions::in_dir(self.project_root).with_cancel(self.cancel.clone())
    }
}

enum Outcome {
    Passed,
    Failed {
        detail: String,
        output: Option<String>,
    },
    Cancelled,
    Coverage(coverage::CoverageReport),
}

impl Outcome {
    fn failed(detail: impl Into<String>, output: impl Into<String>) -> Self {
        Outcome::Failed {
            detail: detail.into(),
            output: Some(output.into()),
        }
    }
}

/// Run one check to completion (or cancellation).
pub fn execute_check(check: &CheckConfig, ctx: &CheckContext<'_>) -> CheckResult {
    let start = Instant::now();
    let name = check.name();
    let kind = check.kind();
    tracing::debug!("Starting check {}", name);

    let prerequisites = check.prerequisites();
    let resolved = ctx.prerequisites.check_all(&prerequisites, &ctx.cancel);
    if let Some(missing) = resolved.last().filter(|r| !r.status.is_available()) {
        let reason = match &missing.status {
            PrerequisiteStatus::Cancelled => {
                return CheckResult::cancelled(&name, kind, start.elapsed());
            }
            PrerequisiteStatus::Unavailable { reason } => reason.clone(),
            PrerequisiteStatus::Present | PrerequisiteStatus::Installed => String::new(),
        };
        tracing::warn!("Check {} skipped: {}", name, reason);
        return CheckResult::failed(
            &name,
            kind,
            start.elapsed(),
            format!("prerequisite unavailable: {}", missing.command),
            Some(reason),
        );
    }

    if ctx.cancel.is_cancelled() {
        return CheckResult::cancelled(&name, kind, start.elapsed());
    }

    let outcome = match check {
        CheckConfig::Build(build) => run_build(build, ctx),
        CheckConfig::Test(test) => run_test(test, ctx),
        CheckConfig::Gofmt(_) => run_listing(
            vec!["gofmt".into(), "-l".into(), "-s".into(), ".".into()],
            "need formatting",
            ctx,
        ),
        CheckConfig::Goimports(_) => run_listing(
            vec!["goimports".into(), "-l".into(), ".".into()],
            "have unsorted imports",
            ctx,
        ),
        CheckConfig::Errcheck(errcheck) => run_errcheck(errcheck, ctx),
        CheckConfig::Golint(golint) => run_golint(golint, ctx),
        CheckConfig::Govet(govet) => run_govet(govet, ctx),
        CheckConfig::Coverage(config) => run_coverage(config, ctx),
        CheckConfig::Custom(custom) => run_custom(custom, ctx),
    };

    let duration = start.elapsed();
    let result = match outcome {
        Outcome::Passed => CheckResult::passed(&name, kind, duration),
        Outcome::Failed { detail, output } => {
            CheckResult::failed(&name, kind, duration, detail, output)
        }
        Outcome::Cancelled => CheckResult::cancelled(&name, kind, duration),
        Outcome::Coverage(report) => {
            let failures = report.failures();
            if failures.is_empty() {
                CheckResult::passed(&name, kind, duration).with_coverage(report)
            } else {
                let detail = failures
                    .iter()
                    .map(|s| format!("{} {:.1}% outside {}", s.scope, s.percentage, s.band))
                    .collect::<Vec<_>>()
                    .join(", ");
                CheckResult::failed(&name, kind, duration, detail, None).with_coverage(report)
            }
        }
    };
    tracing::debug!("Check {} finished: {}", name, result.status);
    result
}

/// Run `argv`, mapping launch failures and cancellation to outcomes.
fn run(argv: &[String], ctx: &CheckContext<'_>) -> Result<CommandOutput, Outcome> {
    match ctx.executor.execute(argv, &ctx.options()) {
        Ok(output) if output.cancelled => Err(Outcome::Cancelled),
        Ok(output) => Ok(output),
        Err(e) => Err(Outcome::Failed {
            detail: format!("failed to launch {}", display_command(argv)),
            output: Some(e.to_string()),
        }),
    }
}

fn exit_detail(argv: &[String], output: &CommandOutput) -> String {
    match output.exit_code {
        Some(code) => format!("{} exited with code {}", display_command(argv), code),
        None => format!("{} was terminated by a signal", display_command(argv)),
    }
}

/// Pass on exit code 0.
fn run_exit_code(argv: Vec<String>, ctx: &CheckContext<'_>) -> Outcome {
    match run(&argv, ctx) {
        Ok(output) if output.success() => Outcome::Passed,
        Ok(output) => Outcome::failed(exit_detail(&argv, &output), output.combined()),
        Err(outcome) => outcome,
    }
}

fn go_command(subcommand: &str, extra_args: &[String]) -> Vec<String> {
    let mut argv = vec!["go".to_string(), subcommand.to_string()];
    argv.extend(extra_args.iter().cloned());
    argv.push("./...".to_string());
    argv
}

fn run_build(build: &Build, ctx: &CheckContext<'_>) -> Outcome {
    run_exit_code(go_command("build", &build.extra_args), ctx)
}

fn run_test(test: &Test, ctx: &CheckContext<'_>) -> Outcome {
    run_exit_code(go_command("test", &test.extra_args), ctx)
}

fn run_errcheck(errcheck: &Errcheck, ctx: &CheckContext<'_>) -> Outcome {
    let mut argv = vec!["errcheck".to_string()];
    if !errcheck.ignores.trim().is_empty() {
        argv.push("-ignore".to_string());
        argv.push(errcheck.ignores.clone());
    }
    argv.push("./...".to_string());
    run_exit_code(argv, ctx)
}

/// File path at the start of a tool diagnostic (`path:line:col: msg`).
fn diagnostic_path(line: &str) -> &str {
    line.split(':').next().unwrap_or(line).trim()
}

/// Tools that print offending files, one per line. Any listed file that
/// is not ignored fails the check.
fn run_listing(argv: Vec<String>, problem: &str, ctx: &CheckContext<'_>) -> Outcome {
    let output = match run(&argv, ctx) {
        Ok(output) => output,
        Err(outcome) => return outcome,
    };
    if !output.success() {
        return Outcome::failed(exit_detail(&argv, &output), output.combined());
    }

    let files: Vec<&str> = output
        .stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !ctx.ignore.is_ignored(l))
        .collect();
    if files.is_empty() {
        Outcome::Passed
    } else {
        Outcome::failed(
            format!("{} file(s) {}", files.len(), problem),
            files.join("\n"),
        )
    }
}

/// Diagnostics left after dropping blacklisted and ignored lines.
fn remaining_diagnostics<'o>(
    output: &'o str,
    blacklist: &[String],
    ignore: &IgnoreMatcher,
) -> Vec<&'o str> {
    output
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty() && !l.starts_with('#'))
        .filter(|l| !blacklist.iter().any(|b| !b.is_empty() && l.contains(b.as_str())))
        .filter(|l| !ignore.is_ignored(diagnostic_path(l)))
        .collect()
}

fn run_golint(golint: &Golint, ctx: &CheckContext<'_>) -> Outcome {
    let argv = vec!["golint".to_string(), "./...".to_string()];
    let output = match run(&argv, ctx) {
        Ok(output) => output,
        Err(outcome) => return outcome,
    };
    let combined = output.combined();
    let issues = remaining_diagnostics(&combined, &golint.blacklist, ctx.ignore);
    if !issues.is_empty() {
        Outcome::failed(format!("{} lint issue(s)", issues.len()), issues.join("\n"))
    } else if !output.success() {
        Outcome::failed(exit_detail(&argv, &output), combined)
    } else {
        Outcome::Passed
    }
}

fn run_govet(govet: &Govet, ctx: &CheckContext<'_>) -> Outcome {
    let argv = vec!["go".to_string(), "vet".to_string(), "./...".to_string()];
    let output = match run(&argv, ctx) {
        Ok(output) => output,
        Err(outcome) => return outcome,
    };
    // go vet exits non-zero whenever it reports anything, so the verdict
    // rests on what survives the blacklist.
    let combined = output.combined();
    let issues = remaining_diagnostics(&combined, &govet.blacklist, ctx.ignore);
    if issues.is_empty() {
        Outcome::Passed
    } else {
        Outcome::failed(format!("{} vet issue(s)", issues.len()), issues.join("\n"))
    }
}

fn run_custom(custom: &Custom, ctx: &CheckContext<'_>) -> Outcome {
    if custom.command.is_empty() {
        return Outcome::Failed {
            detail: "no command configured".to_string(),
            output: None,
        };
    }
    match run(&custom.command, ctx) {
        Ok(output) if custom.check_exit_code && !output.success() => {
            Outcome::failed(exit_detail(&custom.command, &output), output.combined())
        }
        Ok(_) => Outcome::Passed,
        Err(outcome) => outcome,
    }
}

/// Temporary directory for one coverage check's profiles.
fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!(
        "prehook-coverage-{}-{}",
        std::process::id(),
        SCRATCH_COUNTER.fetch_add(1, Ordering::SeqCst)
    ))
}

fn run_coverage(config: &Coverage, ctx: &CheckContext<'_>) -> Outcome {
    let packages = match discover_packages(ctx.project_root, ctx.ignore) {
        Ok(packages) => packages,
        Err(e) => {
            return Outcome::Failed {
                detail: "could not list packages".to_string(),
                output: Some(e.to_string()),
            }
        }
    };

    let scratch = scratch_dir();
    if let Err(e) = fs::create_dir_all(&scratch) {
        return Outcome::Failed {
            detail: format!("could not create {}", scratch.display()),
            output: Some(e.to_string()),
        };
    }
    let collected = collect_samples(config, &packages, &scratch, ctx);
    if let Err(e) = fs::remove_dir_all(&scratch) {
        tracing::debug!("Could not remove {}: {}", scratch.display(), e);
    }
    let samples = match collected {
        Ok(samples) => samples,
        Err(outcome) => return outcome,
    };

    let report = coverage::aggregate(&samples, config);
    tracing::info!(
        "Coverage {:.1}% over {} statements",
        report.global.percentage,
        report.global.statements.total
    );

    if ctx.cancel.is_cancelled() {
        return Outcome::Cancelled;
    }
    if config.use_coveralls {
        match ctx.reporter {
            Some(reporter) => {
                coverage::publish(reporter, &report, ctx.env);
            }
            None => tracing::warn!("No coverage reporter configured; skipping upload"),
        }
    }
    Outcome::Coverage(report)
}

/// Run each package's tests with a cover profile and parse the results.
fn collect_samples(
    config: &Coverage,
    packages: &[String],
    scratch: &Path,
    ctx: &CheckContext<'_>,
) -> Result<Vec<CoverageSample>, Outcome> {
    let module = module_path(ctx.project_root);
    let mut samples = Vec::with_capacity(packages.len());

    for (index, package) in packages.iter().enumerate() {
        if ctx.cancel.is_cancelled() {
            return Err(Outcome::Cancelled);
        }
        // Without inference a directory is judged only by its own tests.
        if !config.use_global_inference
            && !has_test_files(ctx.project_root, package, ctx.ignore)
        {
            tracing::debug!("Skipping {}: no test files", package);
            continue;
        }
        let profile_path = scratch.join(format!("{}.out", index));
        let mut argv = vec![
            "go".to_string(),
            "test".to_string(),
            "-covermode=count".to_string(),
            format!("-coverprofile={}", profile_path.display()),
        ];
        if config.use_global_inference {
            argv.push("-coverpkg=./...".to_string());
        }
        argv.push(package_arg(package));

        let output = run(&argv, ctx)?;
        if !output.success() {
            return Err(Outcome::failed(
                format!("tests failed in {}", package),
                output.combined(),
            ));
        }

        // Packages without test files produce no profile.
        if !profile_path.exists() {
            tracing::debug!("No coverage profile for {}", package);
            continue;
        }
        let mut profile = Profile::load(&profile_path).map_err(|e| Outcome::Failed {
            detail: format!("unreadable coverage profile for {}", package),
            output: Some(e.to_string()),
        })?;
        if let Some(module) = &module {
            profile.strip_module(module);
        }
        samples.push(CoverageSample::new(package.clone(), profile));
    }

    Ok(samples)
}
