//! Coverage bands and their verdicts.

use serde::Serialize;
use std::fmt;

use crate::config::{Coverage, CoverageSettings};

/// The band a scope is held to after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Band {
    /// `{0, 0}`: the scope is never judged.
    Exempt,
    /// A band with a lower bound and an optional upper bound.
    Enforced { min: f64, max: Option<f64> },
}

impl From<CoverageSettings> for Band {
    fn from(settings: CoverageSettings) -> Self {
        if settings.is_exempt() {
            Band::Exempt
        } else if settings.max_coverage == 0.0 {
            Band::Enforced {
                min: settings.min_coverage,
                max: None,
            }
        } else {
            Band::Enforced {
                min: settings.min_coverage,
                max: Some(settings.max_coverage),
            }
        }
    }
}

impl Band {
    /// Judge a percentage against this band.
    pub fn evaluate(&self, percentage: f64) -> Verdict {
        match *self {
            Band::Exempt => Verdict::Exempt,
            Band::Enforced { min, .. } if percentage < min => Verdict::BelowMin,
            Band::Enforced { max: Some(max), .. } if percentage > max => Verdict::AboveMax,
            Band::Enforced { .. } => Verdict::Pass,
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Band::Exempt => write!(f, "exempt"),
            Band::Enforced { min, max: None } => write!(f, "[{:.1}%, -]", min),
            Band::Enforced { min, max: Some(max) } => write!(f, "[{:.1}%, {:.1}%]", min, max),
        }
    }
}

/// The outcome of judging one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Exempt,
    /// Coverage fell under the band.
    BelowMin,
    /// Coverage rose over the band; the band should be raised.
    AboveMax,
}

impl Verdict {
    /// Whether the verdict fails the check.
    pub fn is_failure(&self) -> bool {
        matches!(self, Verdict::BelowMin | Verdict::AboveMax)
    }
}

impl CoverageSettings {
    /// `{0, 0}` exempts its scope.
    pub fn is_exempt(&self) -> bool {
        self.min_coverage == 0.0 && self.max_coverage == 0.0
    }
}

impl Coverage {
    /// The band applied to the whole repository.
    pub fn global_band(&self) -> Band {
        Band::from(self.global)
    }

    /// The band for directory `dir`.
    ///
    /// An exact key in `per_dir` wins; a `null` entry, or no entry, falls
    /// back to `per_dir_default`. Parents and children of a key are not
    /// affected by it.
    pub fn band_for(&self, dir: &str) -> Band {
        let settings = self
            .per_dir
            .get(dir)
            .copied()
            .flatten()
            .unwrap_or(self.per_dir_default);
        Band::from(settings)
    }
}
