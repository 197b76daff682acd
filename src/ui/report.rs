//! Rendering check and mode results.

use std::time::Duration;

use crate::checks::{CheckResult, CheckStatus};
use crate::coverage::{CoverageReport, ScopeCoverage, Verdict};
use crate::runner::{ModeOutcome, ModeResult};

use super::UserInterface;

/// Format a duration for display.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 1.0 {
        format!("{}ms", d.as_millis())
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

fn scope_line(scope: &ScopeCoverage) -> String {
    format!(
        "{}: {:.1}% ({}/{}) {}",
        scope.scope,
        scope.percentage,
        scope.statements.covered,
        scope.statements.total,
        scope.band
    )
}

fn render_coverage(ui: &mut dyn UserInterface, report: &CoverageReport) {
    let verbose = ui.output_mode().shows_command_output();
    for scope in std::iter::once(&report.global).chain(report.directories.iter()) {
        match scope.verdict {
            Verdict::BelowMin => ui.error(&format!("  {} below minimum", scope_line(scope))),
            Verdict::AboveMax => ui.warning(&format!(
                "  {} above maximum; raise the band",
                scope_line(scope)
            )),
            Verdict::Pass | Verdict::Exempt if verbose => {
                ui.message(&format!("  {}", scope_line(scope)))
            }
            _ => {}
        }
    }
}

/// Render one check's result.
pub fn render_check(ui: &mut dyn UserInterface, result: &CheckResult) {
    let timing = format_duration(result.duration);
    match result.status {
        CheckStatus::Passed => {
            ui.success(&format!("{} ({})", result.name, timing));
            if let Some(report) = &result.coverage {
                ui.message(&format!("  coverage {:.1}%", report.global.percentage));
                render_coverage(ui, report);
            }
        }
        CheckStatus::Failed => {
            let detail = result.detail.as_deref().unwrap_or("failed");
            ui.error(&format!("{}: {} ({})", result.name, detail, timing));
            if let Some(report) = &result.coverage {
                render_coverage(ui, report);
            }
            if let Some(output) = &result.output {
                for line in output.lines() {
                    ui.error(&format!("    {}", line));
                }
            }
        }
        CheckStatus::Cancelled => ui.cancelled(&format!("{} (cancelled)", result.name)),
    }
}

/// Render a whole mode: every check, then a summary line.
pub fn render_mode_result(ui: &mut dyn UserInterface, result: &ModeResult) {
    for check in &result.checks {
        render_check(ui, check);
    }

    let total = result.checks.len();
    let elapsed = format_duration(result.duration);
    match result.outcome {
        ModeOutcome::Passed => ui.success(&format!(
            "{} passed: {} check(s) in {}",
            result.mode, total, elapsed
        )),
        ModeOutcome::Failed => ui.error(&format!(
            "{} failed: {} of {} check(s) failed in {}",
            result.mode,
            result.count(CheckStatus::Failed),
            total,
            elapsed
        )),
        ModeOutcome::TimedOut => ui.error(&format!(
            "{} timed out after {}: {} check(s) cancelled",
            result.mode,
            result.budget.map(format_duration).unwrap_or(elapsed),
            result.count(CheckStatus::Cancelled)
        )),
    }
}
