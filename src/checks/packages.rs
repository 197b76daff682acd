//! Go package discovery honoring `ignore_patterns`.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::{PrehookError, Result};

/// Directories the go tool never treats as packages.
const GO_IGNORED_DIRS: &[&str] = &["testdata", "vendor"];

/// Matches path components against the configured ignore globs.
///
/// A path is ignored when any of its components matches, so `.*` skips
/// everything under a hidden directory.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    patterns: GlobSet,
}

impl IgnoreMatcher {
    /// Compile `patterns`.
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| PrehookError::ConfigValidationError {
                message: format!("invalid ignore pattern '{}': {}", pattern, e),
            })?;
            builder.add(glob);
        }
        let patterns = builder
            .build()
            .map_err(|e| PrehookError::ConfigValidationError {
                message: format!("invalid ignore patterns: {}", e),
            })?;
        Ok(Self { patterns })
    }

    /// Whether a single file or directory name is ignored.
    pub fn is_ignored_name(&self, name: &str) -> bool {
        self.patterns.is_match(name)
    }

    /// Whether a relative path has an ignored component.
    pub fn is_ignored(&self, relative: &str) -> bool {
        relative
            .split(['/', '\\'])
            .filter(|c| !c.is_empty() && *c != ".")
            .any(|c| self.is_ignored_name(c))
    }
}

/// Convert a path under `root` to the POSIX form used in configs.
pub fn relative_posix(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// The go tool's argument for a package directory.
pub fn package_arg(dir: &str) -> String {
    if dir == "." {
        ".".to_string()
    } else {
        format!("./{}", dir)
    }
}

/// Whether the package directory `dir` has a non-ignored `_test.go` file.
pub fn has_test_files(root: &Path, dir: &str, ignore: &IgnoreMatcher) -> bool {
    let Ok(entries) = fs::read_dir(root.join(dir)) else {
        return false;
    };
    entries.filter_map(|e| e.ok()).any(|entry| {
        let name = entry.file_name().to_string_lossy().into_owned();
        entry.file_type().is_ok_and(|t| t.is_file())
            && name.ends_with("_test.go")
            && !ignore.is_ignored_name(&name)
    })
}

/// Directories under `root` holding at least one non-ignored `.go` file.
///
/// Returned sorted, as POSIX paths relative to `root` (`.` for the root).
pub fn discover_packages(root: &Path, ignore: &IgnoreMatcher) -> Result<Vec<String>> {
    let mut packages = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !GO_IGNORED_DIRS.contains(&name.as_ref()) && !ignore.is_ignored_name(&name)
        });

    for entry in walker {
        let entry = entry.map_err(|e| PrehookError::Other(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !name.ends_with(".go") || ignore.is_ignored_name(&name) {
            continue;
        }
        let dir = entry
            .path()
            .parent()
            .map(|p| relative_posix(root, p))
            .unwrap_or_else(|| ".".to_string());
        if !packages.contains(&dir) {
            packages.push(dir);
        }
    }

    packages.sort();
    tracing::debug!("Discovered {} packages", packages.len());
    Ok(packages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn defaults() -> IgnoreMatcher {
        IgnoreMatcher::new(&[".*".to_string(), "_*".to_string(), "*.pb.go".to_string()])
            .unwrap()
    }

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "package x\n").unwrap();
    }

    #[test]
    fn finds_directories_with_go_files() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "main.go");
        touch(temp.path(), "pkg/a/a.go");
        touch(temp.path(), "pkg/b/b.go");
        touch(temp.path(), "docs/readme.md");

        let packages = discover_packages(temp.path(), &defaults()).unwrap();
        assert_eq!(packages, vec![".", "pkg/a", "pkg/b"]);
    }

    #[test]
    fn skips_ignored_directories_and_files() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), ".git/hooks/x.go");
        touch(temp.path(), "_tools/gen.go");
        touch(temp.path(), "api/api.pb.go");
        touch(temp.path(), "vendor/dep/dep.go");
        touch(temp.path(), "pkg/testdata/fixture.go");
        touch(temp.path(), "pkg/p.go");

        let packages = discover_packages(temp.path(), &defaults()).unwrap();
        assert_eq!(packages, vec!["pkg"]);
    }

    #[test]
    fn ignore_applies_to_any_component() {
        let ignore = defaults();
        assert!(ignore.is_ignored("a/.hidden/b.go"));
        assert!(ignore.is_ignored("api/x.pb.go"));
        assert!(!ignore.is_ignored("./pkg/a.go"));
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        let err = IgnoreMatcher::new(&["[".to_string()]).unwrap_err();
        assert!(matches!(err, PrehookError::ConfigValidationError { .. }));
    }

    #[test]
    fn detects_own_test_files() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "tested/a.go");
        touch(temp.path(), "tested/a_test.go");
        touch(temp.path(), "untested/b.go");
        touch(temp.path(), "untested/sub/b_test.go");
        touch(temp.path(), "hidden/c.go");
        touch(temp.path(), "hidden/_c_test.go");

        assert!(has_test_files(temp.path(), "tested", &defaults()));
        assert!(!has_test_files(temp.path(), "untested", &defaults()));
        assert!(!has_test_files(temp.path(), "hidden", &defaults()));
        assert!(!has_test_files(temp.path(), "missing", &defaults()));
    }

    #[test]
    fn package_args_are_relative() {
        assert_eq!(package_arg("."), ".");
        assert_eq!(package_arg("pkg/a"), "./pkg/a");
    }
}
