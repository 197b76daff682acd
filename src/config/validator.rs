//! Configuration validation rules.
//!
//! This module validates configuration for correctness:
//! - Coverage bands must lie in `[0, 100]` with `min <= max` when `max > 0`
//! - `per_dir` keys must be POSIX paths relative to the repository root
//! - Custom checks need a display name and a command
//! - Prerequisites need a help command
//! - Ignore patterns must be valid globs

use crate::config::checks::{CheckConfig, CheckPrerequisite, CoverageSettings};
use crate::config::schema::Config;
use crate::error::{PrehookError, Result};
use globset::Glob;

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
    /// Mode name if error is mode-specific
    pub mode: Option<String>,
    /// Check name if error is check-specific
    pub check: Option<String>,
}

impl ValidationError {
    fn in_check(rule: &str, mode: &str, check: &str, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            message,
            mode: Some(mode.to_string()),
            check: Some(check.to_string()),
        }
    }
}

/// Validate a configuration and return all errors.
///
/// This function collects all validation errors rather than stopping
/// at the first one, allowing users to fix multiple issues at once.
pub fn validate_config(config: &Config) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_ignore_patterns(config));
    for (name, mode) in &config.modes {
        for check in &mode.checks {
            errors.extend(validate_check(name.as_str(), check));
        }
    }

    errors
}

/// Validate and return the first error as a [`PrehookError`].
///
/// All messages are joined so a single run reports every problem.
pub fn validate(config: &Config) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        return Ok(());
    }

    let message = errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    Err(PrehookError::ConfigValidationError { message })
}

fn validate_ignore_patterns(config: &Config) -> Vec<ValidationError> {
    config
        .ignore_patterns
        .iter()
        .filter_map(|pattern| {
            Glob::new(pattern).err().map(|e| ValidationError {
                rule: "invalid-ignore-pattern".to_string(),
                message: format!("Ignore pattern '{}' is invalid: {}", pattern, e),
                mode: None,
                check: None,
            })
        })
        .collect()
}

fn validate_check(mode: &str, check: &CheckConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let name = check.name();

    match check {
        CheckConfig::Coverage(coverage) => {
            let mut bands = vec![
                ("global".to_string(), coverage.global),
                ("per_dir_default".to_string(), coverage.per_dir_default),
            ];
            for (dir, band) in &coverage.per_dir {
                if let Err(reason) = validate_dir_key(dir) {
                    errors.push(ValidationError::in_check(
                        "invalid-per-dir-path",
                        mode,
                        &name,
                        format!(
                            "Mode '{}': coverage per_dir key '{}' {}",
                            mode, dir, reason
                        ),
                    ));
                }
                if let Some(band) = band {
                    bands.push((format!("per_dir '{}'", dir), *band));
                }
            }
            for (scope, band) in bands {
                if let Err(reason) = validate_band(&band) {
                    errors.push(ValidationError::in_check(
                        "invalid-coverage-band",
                        mode,
                        &name,
                        format!("Mode '{}': coverage {} {}", mode, scope, reason),
                    ));
                }
            }
        }
        CheckConfig::Custom(custom) => {
            if custom.display_name.trim().is_empty() {
                errors.push(ValidationError::in_check(
                    "missing-display-name",
                    mode,
                    &name,
                    format!("Mode '{}': custom check must have a display_name", mode),
                ));
            }
            if custom.command.is_empty() || custom.command[0].trim().is_empty() {
                errors.push(ValidationError::in_check(
                    "missing-command",
                    mode,
                    &name,
                    format!(
                        "Mode '{}': custom check '{}' must have a command",
                        mode, custom.display_name
                    ),
                ));
            }
            errors.extend(
                custom
                    .prerequisites
                    .iter()
                    .filter_map(|p| validate_prerequisite(mode, &name, p)),
            );
        }
        CheckConfig::Build(_)
        | CheckConfig::Errcheck(_)
        | CheckConfig::Gofmt(_)
        | CheckConfig::Goimports(_)
        | CheckConfig::Golint(_)
        | CheckConfig::Govet(_)
        | CheckConfig::Test(_) => {}
    }

    errors
}

fn validate_prerequisite(
    mode: &str,
    check: &str,
    prerequisite: &CheckPrerequisite,
) -> Option<ValidationError> {
    let empty = prerequisite.help_command.is_empty()
        || prerequisite.help_command[0].trim().is_empty();
    empty.then(|| {
        ValidationError::in_check(
            "missing-help-command",
            mode,
            check,
            format!(
                "Mode '{}': prerequisite of '{}' must have a help_command",
                mode, check
            ),
        )
    })
}

/// Check a coverage band's bounds.
pub fn validate_band(band: &CoverageSettings) -> std::result::Result<(), String> {
    let in_range = |v: f64| (0.0..=100.0).contains(&v);
    if !in_range(band.min_coverage) {
        return Err(format!(
            "min_coverage {} is outside [0, 100]",
            band.min_coverage
        ));
    }
    if !in_range(band.max_coverage) {
        return Err(format!(
            "max_coverage {} is outside [0, 100]",
            band.max_coverage
        ));
    }
    if band.max_coverage > 0.0 && band.min_coverage > band.max_coverage {
        return Err(format!(
            "min_coverage {} exceeds max_coverage {}",
            band.min_coverage, band.max_coverage
        ));
    }
    Ok(())
}

/// Check a `per_dir` key: `.` or a clean relative POSIX path.
pub fn validate_dir_key(dir: &str) -> std::result::Result<(), String> {
    if dir == "." {
        return Ok(());
    }
    if dir.is_empty() {
        return Err("is empty".to_string());
    }
    if dir.contains('\\') {
        return Err("must use '/' as separator".to_string());
    }
    if dir.starts_with('/') {
        return Err("must be relative to the repository root".to_string());
    }
    for component in dir.split('/') {
        match component {
            "" => return Err("contains an empty path element".to_string()),
            "." | ".." => {
                return Err(format!("contains a '{}' path element", component));
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::checks::{Coverage, Custom, Gofmt};
    use crate::config::schema::{Mode, ModeName};
    use std::collections::BTreeMap;

    fn config_with(checks: Vec<CheckConfig>) -> Config {
        let mut modes = BTreeMap::new();
        modes.insert(ModeName::PrePush, Mode::new(checks, 15));
        Config {
            modes,
            ..Default::default()
        }
    }

    #[test]
    fn valid_config_passes() {
        let config = config_with(vec![CheckConfig::Gofmt(Gofmt {})]);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn rejects_band_outside_percent_range() {
        assert!(validate_band(&CoverageSettings::new(-1.0, 100.0)).is_err());
        assert!(validate_band(&CoverageSettings::new(0.0, 101.0)).is_err());
    }

    #[test]
    fn rejects_inverted_band_only_when_max_enforced() {
        assert!(validate_band(&CoverageSettings::new(80.0, 50.0)).is_err());
        assert!(validate_band(&CoverageSettings::new(80.0, 0.0)).is_ok());
        assert!(validate_band(&CoverageSettings::new(0.0, 0.0)).is_ok());
    }

    #[test]
    fn dir_keys_must_be_clean_relative_paths() {
        assert!(validate_dir_key(".").is_ok());
        assert!(validate_dir_key("cmd/tool").is_ok());
        assert!(validate_dir_key("/abs").is_err());
        assert!(validate_dir_key("a/../b").is_err());
        assert!(validate_dir_key("./a").is_err());
        assert!(validate_dir_key("a//b").is_err());
        assert!(validate_dir_key("a/").is_err());
        assert!(validate_dir_key("a\\b").is_err());
        assert!(validate_dir_key("").is_err());
    }

    #[test]
    fn reports_every_invalid_coverage_entry() {
        let mut per_dir = BTreeMap::new();
        per_dir.insert("../outside".to_string(), None);
        per_dir.insert("pkg".to_string(), Some(CoverageSettings::new(90.0, 10.0)));
        let coverage = Coverage {
            global: CoverageSettings::new(150.0, 0.0),
            per_dir,
            ..Default::default()
        };
        let errors = validate_config(&config_with(vec![CheckConfig::Coverage(coverage)]));
        let rules: Vec<&str> = errors.iter().map(|e| e.rule.as_str()).collect();
        assert_eq!(rules.len(), 3);
        assert!(rules.contains(&"invalid-per-dir-path"));
        assert_eq!(
            rules.iter().filter(|r| **r == "invalid-coverage-band").count(),
            2
        );
        assert!(errors.iter().all(|e| e.mode.as_deref() == Some("pre-push")));
    }

    #[test]
    fn custom_check_needs_name_and_command() {
        let custom = Custom::default();
        let errors = validate_config(&config_with(vec![CheckConfig::Custom(custom)]));
        let rules: Vec<&str> = errors.iter().map(|e| e.rule.as_str()).collect();
        assert!(rules.contains(&"missing-display-name"));
        assert!(rules.contains(&"missing-command"));
    }

    #[test]
    fn prerequisite_needs_help_command() {
        let custom = Custom {
            display_name: "tool".to_string(),
            command: vec!["tool".to_string()],
            prerequisites: vec![CheckPrerequisite::default()],
            ..Default::default()
        };
        let errors = validate_config(&config_with(vec![CheckConfig::Custom(custom)]));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, "missing-help-command");
        assert_eq!(errors[0].check.as_deref(), Some("tool"));
    }

    #[test]
    fn rejects_invalid_ignore_pattern() {
        let config = Config {
            ignore_patterns: vec!["[unclosed".to_string()],
            ..Default::default()
        };
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, "invalid-ignore-pattern");
    }

    #[test]
    fn validate_joins_all_messages() {
        let custom = Custom::default();
        let err = validate(&config_with(vec![CheckConfig::Custom(custom)])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("display_name"));
        assert!(msg.contains("command"));
    }
}
