//! Terminal user interface components.
//!
//! This module provides:
//! - [`UserInterface`] trait for UI abstraction
//! - [`TerminalUI`] for terminal usage
//! - [`MockUI`] for capturing output in tests
//! - Rendering of mode results in [`report`]
//!
//! # Example
//!
//! ```
//! use prehook::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.show_header("pre-commit");
//! ui.success("All checks passed");
//! assert!(ui.has_success("All checks passed"));
//! ```

pub mod mock;
pub mod output;
pub mod report;
pub mod spinner;
pub mod terminal;
pub mod theme;

pub use mock::{MockSpinner, MockUI};
pub use output::OutputMode;
pub use report::{format_duration, render_check, render_mode_result};
pub use spinner::ProgressSpinner;
pub use terminal::{create_ui, TerminalUI};
pub use theme::{should_use_colors, PrehookTheme};

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Display a message to the user.
    fn message(&mut self, msg: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message. Shown in every mode but silent.
    fn error(&mut self, msg: &str);

    /// Display a cancelled item.
    fn cancelled(&mut self, msg: &str);

    /// Start a spinner for an operation.
    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle>;

    /// Show a header/banner.
    fn show_header(&mut self, title: &str);

    /// Check if attached to a terminal.
    fn is_interactive(&self) -> bool;
}

/// Handle for controlling a spinner.
pub trait SpinnerHandle {
    /// Update the spinner message.
    fn set_message(&mut self, msg: &str);

    /// Print a line above the spinner.
    fn println(&mut self, line: &str);

    /// Stop with a success line.
    fn finish_success(&mut self, msg: &str);

    /// Stop with an error line.
    fn finish_error(&mut self, msg: &str);

    /// Stop and remove the spinner.
    fn finish_clear(&mut self);
}
