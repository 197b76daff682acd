//! Merging per-package samples into global and per-directory coverage.
//!
//! Samples are unioned at block granularity: a block is covered when any
//! sample executed it. The global figure always uses every sample, so it
//! does not depend on `use_global_inference`. Per-directory figures do:
//!
//! - With inference, every block lands in the directory of its file, no
//!   matter which package's tests produced it.
//! - Without inference, a directory only counts blocks produced by its own
//!   tests, and directories without tests are left out.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::Coverage;
use crate::coverage::band::{Band, Verdict};
use crate::coverage::profile::{parent_dir, Block, Profile};

/// Coverage produced by one package's tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageSample {
    /// Directory of the package whose tests ran; `.` for the root.
    pub package: String,
    pub blocks: Vec<Block>,
}

impl CoverageSample {
    /// Wrap a parsed profile.
    pub fn new(package: impl Into<String>, profile: Profile) -> Self {
        Self {
            package: package.into(),
            blocks: profile.blocks,
        }
    }

    /// A sample covering `covered` of `total` statements in `file`.
    pub fn from_counts(package: &str, file: &str, covered: u64, total: u64) -> Self {
        let mut blocks = Vec::new();
        if covered > 0 {
            blocks.push(synthetic_block(file, 1, covered, 1));
        }
        if total > covered {
            blocks.push(synthetic_block(file, 2, total - covered, 0));
        }
        Self {
            package: package.to_string(),
            blocks,
        }
    }
}

fn synthetic_block(file: &str, line: u32, num_stmt: u64, count: u64) -> Block {
    Block {
        file: file.to_string(),
        start_line: line,
        start_col: 1,
        end_line: line,
        end_col: 2,
        num_stmt,
        count,
    }
}

/// Covered and total statement counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statements {
    pub covered: u64,
    pub total: u64,
}

impl Statements {
    /// Coverage in percent. No statements counts as 0%.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.covered as f64 * 100.0 / self.total as f64
        }
    }

    fn add(&mut self, num_stmt: u64, covered: bool) {
        self.total += num_stmt;
        if covered {
            self.covered += num_stmt;
        }
    }
}

/// A judged scope: the repository or one directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopeCoverage {
    /// `global`, or a directory path.
    pub scope: String,
    #[serde(flatten)]
    pub statements: Statements,
    pub percentage: f64,
    pub band: Band,
    pub verdict: Verdict,
}

impl ScopeCoverage {
    fn judge(scope: impl Into<String>, statements: Statements, band: Band) -> Self {
        let percentage = statements.percentage();
        Self {
            scope: scope.into(),
            statements,
            percentage,
            band,
            verdict: band.evaluate(percentage),
        }
    }
}

/// Per-file totals of the merged coverage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileCoverage {
    pub path: String,
    #[serde(flatten)]
    pub statements: Statements,
}

/// The merged result of a coverage check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageReport {
    pub global: ScopeCoverage,
    /// Judged directories, sorted by path.
    pub directories: Vec<ScopeCoverage>,
    /// Every file of the global union, sorted by path.
    pub files: Vec<FileCoverage>,
}

impl CoverageReport {
    /// Scopes whose verdict fails the check.
    pub fn failures(&self) -> Vec<&ScopeCoverage> {
        std::iter::once(&self.global)
            .chain(self.directories.iter())
            .filter(|s| s.verdict.is_failure())
            .collect()
    }

    /// Whether every scope fits its band.
    pub fn passed(&self) -> bool {
        self.failures().is_empty()
    }
}

type Span = (String, u32, u32, u32, u32);

/// Union of blocks: statement count and whether any sample ran the block.
fn union<'a>(blocks: impl Iterator<Item = &'a Block>) -> BTreeMap<Span, (u64, bool)> {
    let mut merged: BTreeMap<Span, (u64, bool)> = BTreeMap::new();
    for block in blocks {
        let entry = merged.entry(block.span()).or_insert((block.num_stmt, false));
        entry.0 = entry.0.max(block.num_stmt);
        entry.1 |= block.count > 0;
    }
    merged
}

fn totals<'a>(blocks: impl Iterator<Item = (&'a Span, &'a (u64, bool))>) -> Statements {
    let mut statements = Statements::default();
    for (_, (num_stmt, covered)) in blocks {
        statements.add(*num_stmt, *covered);
    }
    statements
}

/// Merge samples and judge every scope against `config`.
pub fn aggregate(samples: &[CoverageSample], config: &Coverage) -> CoverageReport {
    let merged = union(samples.iter().flat_map(|s| s.blocks.iter()));
    let global = ScopeCoverage::judge("global", totals(merged.iter()), config.global_band());

    let mut files: BTreeMap<String, Statements> = BTreeMap::new();
    for ((file, ..), (num_stmt, covered)) in &merged {
        files
            .entry(file.clone())
            .or_default()
            .add(*num_stmt, *covered);
    }

    let per_dir: BTreeMap<String, Statements> = if config.use_global_inference {
        let mut dirs: BTreeMap<String, Statements> = BTreeMap::new();
        for ((file, ..), (num_stmt, covered)) in &merged {
            dirs.entry(parent_dir(file))
                .or_default()
                .add(*num_stmt, *covered);
        }
        dirs
    } else {
        let mut by_package: BTreeMap<&str, Vec<&Block>> = BTreeMap::new();
        for sample in samples {
            by_package
                .entry(sample.package.as_str())
                .or_default()
                .extend(sample.blocks.iter().filter(|b| b.dir() == sample.package));
        }
        by_package
            .into_iter()
            .map(|(dir, blocks)| {
                let own = union(blocks.into_iter());
                (dir.to_string(), totals(own.iter()))
            })
            .collect()
    };

    let directories = per_dir
        .into_iter()
        .filter(|(_, statements)| statements.total > 0)
        .map(|(dir, statements)| {
            let band = config.band_for(&dir);
            ScopeCoverage::judge(dir, statements, band)
        })
        .collect();

    CoverageReport {
        global,
        directories,
        files: files
            .into_iter()
            .map(|(path, statements)| FileCoverage { path, statements })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoverageSettings;

    fn config(inference: bool) -> Coverage {
        Coverage {
            use_global_inference: inference,
            global: CoverageSettings::new(50.0, 100.0),
            per_dir_default: CoverageSettings::new(70.0, 100.0),
            ..Default::default()
        }
    }

    fn scope<'a>(report: &'a CoverageReport, dir: &str) -> Option<&'a ScopeCoverage> {
        report.directories.iter().find(|s| s.scope == dir)
    }

    #[test]
    fn global_merges_all_packages() {
        let mut coverage = config(false);
        coverage
            .per_dir
            .insert("pkgB".to_string(), Some(CoverageSettings::new(0.0, 0.0)));
        let samples = vec![
            CoverageSample::from_counts("pkgA", "pkgA/a.go", 8, 10),
            CoverageSample::from_counts("pkgB", "pkgB/b.go", 0, 5),
        ];

        let report = aggregate(&samples, &coverage);

        assert_eq!(report.global.statements, Statements { covered: 8, total: 15 });
        assert!((report.global.percentage - 53.333).abs() < 0.01);
        assert_eq!(report.global.verdict, Verdict::Pass);
        assert_eq!(scope(&report, "pkgA").unwrap().verdict, Verdict::Pass);
        assert_eq!(scope(&report, "pkgB").unwrap().verdict, Verdict::Exempt);
        assert!(report.passed());
    }

    #[test]
    fn global_ignores_inference_flag() {
        let samples = vec![
            CoverageSample::from_counts("pkgA", "pkgB/b.go", 3, 4),
            CoverageSample::from_counts("pkgA", "pkgA/a.go", 1, 4),
        ];
        let with = aggregate(&samples, &config(true));
        let without = aggregate(&samples, &config(false));
        assert_eq!(with.global, without.global);
    }

    #[test]
    fn inference_credits_the_exercised_directory() {
        let samples = vec![
            CoverageSample::from_counts("pkgA", "pkgA/a.go", 4, 4),
            CoverageSample::from_counts("pkgA", "pkgB/b.go", 2, 4),
        ];

        let inferred = aggregate(&samples, &config(true));
        assert_eq!(
            scope(&inferred, "pkgB").unwrap().statements,
            Statements { covered: 2, total: 4 }
        );

        let own = aggregate(&samples, &config(false));
        assert!(scope(&own, "pkgB").is_none());
        assert_eq!(
            scope(&own, "pkgA").unwrap().statements,
            Statements { covered: 4, total: 4 }
        );
    }

    #[test]
    fn block_covered_by_any_sample_counts_once() {
        let samples = vec![
            CoverageSample::from_counts("pkgA", "pkgA/a.go", 2, 4),
            CoverageSample::from_counts("pkgA", "pkgA/a.go", 0, 4),
        ];
        let report = aggregate(&samples, &config(true));
        assert_eq!(report.global.statements, Statements { covered: 2, total: 4 });
    }

    #[test]
    fn below_min_fails_the_directory() {
        let samples = vec![
            CoverageSample::from_counts("pkgA", "pkgA/a.go", 9, 10),
            CoverageSample::from_counts("pkgC", "pkgC/c.go", 1, 10),
        ];
        let report = aggregate(&samples, &config(false));
        let failures = report.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].scope, "pkgC");
        assert_eq!(failures[0].verdict, Verdict::BelowMin);
        assert!(!report.passed());
    }

    #[test]
    fn above_global_max_fails() {
        let mut coverage = config(false);
        coverage.global = CoverageSettings::new(10.0, 40.0);
        coverage.per_dir_default = CoverageSettings::new(0.0, 0.0);
        let samples = vec![CoverageSample::from_counts(".", "main.go", 9, 10)];

        let report = aggregate(&samples, &coverage);
        assert_eq!(report.global.verdict, Verdict::AboveMax);
        assert_eq!(scope(&report, ".").unwrap().verdict, Verdict::Exempt);
    }

    #[test]
    fn empty_samples_have_zero_global_and_no_directories() {
        let report = aggregate(&[], &config(true));
        assert_eq!(report.global.statements.total, 0);
        assert_eq!(report.global.percentage, 0.0);
        assert_eq!(report.global.verdict, Verdict::BelowMin);
        assert!(report.directories.is_empty());
    }

    #[test]
    fn files_are_listed_sorted() {
        let samples = vec![
            CoverageSample::from_counts("b", "b/b.go", 1, 2),
            CoverageSample::from_counts("a", "a/a.go", 1, 1),
        ];
        let report = aggregate(&samples, &config(true));
        let paths: Vec<_> = report.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a/a.go", "b/b.go"]);
    }
}
