//! Terminal UI.

use console::Term;
use std::io::Write;

use super::{GeoTheme, OutputMode, PercentBar, ProgressHandle, UserInterface};

const KEY_WIDTH: usize = 14;

/// UI writing results to stdout and status to stderr.
pub struct TerminalUI {
    out: Term,
    err: Term,
    theme: GeoTheme,
    mode: OutputMode,
}

impl TerminalUI {
    pub fn new(mode: OutputMode, colors: bool) -> Self {
        let theme = if colors {
            GeoTheme::new()
        } else {
            GeoTheme::plain()
        };

        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            theme,
            mode,
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn output(&mut self, text: &str) {
        writeln!(self.out, "{}", text).ok();
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.out, "{}", msg).ok();
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.out, "{}", self.theme.format_success(msg)).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.err, "{}", self.theme.format_warning(msg)).ok();
        }
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.err, "{}", self.theme.format_error(msg)).ok();
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            writeln!(self.out, "\n{}\n", self.theme.format_header(title)).ok();
        }
    }

    fn key_value(&mut self, key: &str, value: &str) {
        writeln!(
            self.out,
            "  {}",
            self.theme.format_key_value(key, value, KEY_WIDTH)
        )
        .ok();
    }

    fn start_progress(&mut self, message: &str) -> Box<dyn ProgressHandle> {
        if self.mode.shows_progress() && self.err.is_term() {
            Box::new(PercentBar::new(message))
        } else {
            Box::new(PercentBar::hidden())
        }
    }
}
