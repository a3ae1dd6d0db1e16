//! Progress bars for resolution runs.

use indicatif::{ProgressBar, ProgressStyle};

use super::theme::GeoTheme;
use super::ProgressHandle;
use crate::progress::ProgressSink;

const BAR_TEMPLATE: &str = "{spinner:.cyan} {msg} [{bar:30.cyan/dim}] {pos:>3}%";

fn message_only_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Percentage bar drawn on stderr.
pub struct PercentBar {
    bar: ProgressBar,
}

impl PercentBar {
    /// Visible bar with a message.
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        bar.set_style(style);
        bar.set_message(message.to_string());
        Self { bar }
    }

    /// Bar that draws nothing (quiet mode, non-TTY).
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Current position (0-100).
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl ProgressSink for PercentBar {
    fn report(&mut self, percent: u8) {
        self.bar.set_position(u64::from(percent.min(100)));
    }
}

impl ProgressHandle for PercentBar {
    fn as_sink(&mut self) -> &mut dyn ProgressSink {
        self
    }

    fn finish(&mut self, msg: &str) {
        self.bar.set_style(message_only_style());
        self.bar.finish_with_message(GeoTheme::new().format_success(msg));
    }

    fn abandon(&mut self, msg: &str) {
        self.bar.set_style(message_only_style());
        self.bar.abandon_with_message(GeoTheme::new().format_error(msg));
    }
}
