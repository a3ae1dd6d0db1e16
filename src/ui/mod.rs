//! Terminal output for the CLI.
//!
//! This module provides:
//! - [`UserInterface`] trait for UI abstraction
//! - [`TerminalUI`] for real terminals
//! - [`MockUI`] for tests
//! - [`PercentBar`], an `indicatif` progress bar that accepts resolution progress

pub mod mock;
pub mod output;
pub mod progress;
pub mod terminal;
pub mod theme;

pub use mock::{MockProgress, MockUI};
pub use output::OutputMode;
pub use progress::PercentBar;
pub use terminal::TerminalUI;
pub use theme::{should_use_colors, GeoTheme};

use crate::progress::ProgressSink;

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Print command output. Shown in every mode.
    fn output(&mut self, text: &str);

    /// Display a status message.
    fn message(&mut self, msg: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message. Shown in every mode.
    fn error(&mut self, msg: &str);

    /// Show a header/banner.
    fn show_header(&mut self, title: &str);

    /// Show a labelled value.
    fn key_value(&mut self, key: &str, value: &str);

    /// Start a percentage progress display.
    fn start_progress(&mut self, message: &str) -> Box<dyn ProgressHandle>;
}

/// Progress display that receives percentages and can be closed.
pub trait ProgressHandle: ProgressSink {
    /// This display as a plain progress sink.
    fn as_sink(&mut self) -> &mut dyn ProgressSink;

    /// Close the display after a completed run.
    fn finish(&mut self, msg: &str);

    /// Close the display after a failed run.
    fn abandon(&mut self, msg: &str);
}

