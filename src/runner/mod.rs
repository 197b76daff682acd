//! Mode execution orchestration.

pub mod mode;

pub use mode::{ModeOutcome, ModeResult, ModeRunner, RunOptions, RunProgress};
