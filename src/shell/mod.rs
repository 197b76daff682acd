//! Process execution behind a mockable seam.

pub mod command;
pub mod mock;
pub mod platform;

pub use command::{
    display_command, CancelToken, CommandExecutor, CommandOptions, CommandOutput, SystemExecutor,
};
pub use mock::{MockExecutor, MockResponse};
pub use platform::is_ci;
