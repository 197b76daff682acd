//! Built-in default configuration.
//!
//! Used when a repository has no `prehook.yml`, and written out by
//! `prehook writeconfig`.

use crate::config::checks::{
    Build, CheckConfig, Coverage, CoverageSettings, Errcheck, Gofmt, Goimports, Golint, Govet,
    Test,
};
use crate::config::schema::{Config, Mode, ModeName};
use crate::config::version::VERSION;
use std::collections::BTreeMap;

fn default_coverage() -> Coverage {
    Coverage {
        use_global_inference: false,
        use_coveralls: false,
        global: CoverageSettings::new(50.0, 100.0),
        per_dir_default: CoverageSettings::new(0.0, 0.0),
        per_dir: BTreeMap::new(),
    }
}

fn test_with(args: &[&str]) -> CheckConfig {
    CheckConfig::Test(Test {
        extra_args: args.iter().map(|s| s.to_string()).collect(),
    })
}

/// The default configuration.
pub fn default_config() -> Config {
    let mut modes = BTreeMap::new();

    modes.insert(
        ModeName::PreCommit,
        Mode::new(
            vec![
                CheckConfig::Build(Build::default()),
                CheckConfig::Gofmt(Gofmt {}),
                test_with(&["-short"]),
            ],
            5,
        ),
    );

    modes.insert(
        ModeName::PrePush,
        Mode::new(
            vec![
                CheckConfig::Coverage(default_coverage()),
                CheckConfig::Goimports(Goimports {}),
                test_with(&["-v", "-race"]),
            ],
            15,
        ),
    );

    modes.insert(
        ModeName::ContinuousIntegration,
        Mode::new(
            vec![
                CheckConfig::Build(Build::default()),
                CheckConfig::Coverage(default_coverage()),
                CheckConfig::Gofmt(Gofmt {}),
                CheckConfig::Goimports(Goimports {}),
                test_with(&["-v", "-race"]),
            ],
            120,
        ),
    );

    modes.insert(
        ModeName::Lint,
        Mode::new(
            vec![
                CheckConfig::Errcheck(Errcheck {
                    ignores: "Close".to_string(),
                }),
                CheckConfig::Golint(Golint::default()),
                CheckConfig::Govet(Govet {
                    blacklist: vec![" composite literal uses unkeyed fields".to_string()],
                }),
            ],
            15,
        ),
    );

    Config {
        min_version: VERSION.to_string(),
        modes,
        ignore_patterns: vec![".*".to_string(), "_*".to_string(), "*.pb.go".to_string()],
    }
}

/// The default configuration rendered as YAML.
pub fn default_config_yaml() -> crate::error::Result<String> {
    serde_yaml::to_string(&default_config()).map_err(|e| {
        crate::error::PrehookError::Other(anyhow::anyhow!("Failed to render config: {}", e))
    })
}
