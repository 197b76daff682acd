//! Running individual checks.
//!
//! - [`executor`] maps each check kind to its commands and verdict
//! - [`packages`] finds Go packages and applies `ignore_patterns`
//! - [`result`] holds per-check outcomes

pub mod executor;
pub mod packages;
pub mod result;

pub use executor::{execute_check, CheckContext};
pub use packages::{discover_packages, IgnoreMatcher};
pub use result::{CheckResult, CheckStatus};
