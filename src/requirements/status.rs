//! Prerequisite status types.
//!
//! Each prerequisite resolution produces a `PrerequisiteStatus` that
//! describes whether the tool was found, installed, or is unavailable.

/// The result of resolving a single prerequisite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrerequisiteStatus {
    /// The probe matched on the first try; nothing was fetched.
    Present,

    /// The probe failed, the fetch ran, and the second probe matched.
    Installed,

    /// Still absent after the single remediation attempt (or remediation
    /// was disabled).
    Unavailable {
        /// Why the tool is unavailable.
        reason: String,
    },

    /// Resolution was interrupted by the mode's time budget.
    Cancelled,
}

impl PrerequisiteStatus {
    /// Whether the check may proceed.
    pub fn is_available(&self) -> bool {
        matches!(
            self,
            PrerequisiteStatus::Present | PrerequisiteStatus::Installed
        )
    }
}

/// The status of one prerequisite of a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrerequisiteResult {
    /// The probe command line.
    pub command: String,
    /// The fetch location.
    pub url: String,
    /// The resolution outcome.
    pub status: PrerequisiteStatus,
}
