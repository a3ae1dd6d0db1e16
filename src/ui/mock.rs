//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion.
//!
//! # Example
//!
//! ```
//! use taluka_geo::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.message("Resolving 3 regions");
//! ui.success("Done!");
//!
//! assert!(ui.messages().contains(&"Resolving 3 regions".to_string()));
//! assert!(ui.has_success("Done"));
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use super::{OutputMode, ProgressHandle, UserInterface};
use crate::progress::ProgressSink;

/// Mock UI implementation for testing.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    outputs: Vec<String>,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    headers: Vec<String>,
    key_values: Vec<(String, String)>,
    progress_labels: Vec<String>,
    progress: Rc<RefCell<Vec<u8>>>,
}

impl MockUI {
    /// Create a new MockUI with Normal output mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new MockUI with a specific output mode.
    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Get all captured command output.
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// Captured command output joined with newlines.
    pub fn output_text(&self) -> String {
        self.outputs.join("\n")
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn key_values(&self) -> &[(String, String)] {
        &self.key_values
    }

    /// Value shown for `key`, if any.
    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.key_values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Labels of every progress display started.
    pub fn progress_labels(&self) -> &[String] {
        &self.progress_labels
    }

    /// Every percentage reported to any progress display.
    pub fn progress_values(&self) -> Vec<u8> {
        self.progress.borrow().clone()
    }

    /// Check if any message contains the given text.
    pub fn has_message(&self, text: &str) -> bool {
        self.messages.iter().any(|m| m.contains(text))
    }

    pub fn has_success(&self, text: &str) -> bool {
        self.successes.iter().any(|m| m.contains(text))
    }

    pub fn has_warning(&self, text: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(text))
    }

    pub fn has_error(&self, text: &str) -> bool {
        self.errors.iter().any(|m| m.contains(text))
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn output(&mut self, text: &str) {
        self.outputs.push(text.to_string());
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn show_header(&mut self, title: &str) {
        self.headers.push(title.to_string());
    }

    fn key_value(&mut self, key: &str, value: &str) {
        self.key_values.push((key.to_string(), value.to_string()));
    }

    fn start_progress(&mut self, message: &str) -> Box<dyn ProgressHandle> {
        self.progress_labels.push(message.to_string());
        Box::new(MockProgress {
            values: Rc::clone(&self.progress),
            finished: None,
        })
    }
}

/// Progress handle that records into its [`MockUI`].
#[derive(Debug)]
pub struct MockProgress {
    values: Rc<RefCell<Vec<u8>>>,
    finished: Option<String>,
}

impl ProgressSink for MockProgress {
    fn report(&mut self, percent: u8) {
        self.values.borrow_mut().push(percent);
    }
}

impl ProgressHandle for MockProgress {
    fn as_sink(&mut self) -> &mut dyn ProgressSink {
        self
    }

    fn finish(&mut self, msg: &str) {
        self.finished = Some(msg.to_string());
    }

    fn abandon(&mut self, msg: &str) {
        self.finished = Some(msg.to_string());
    }
}
