//! Progress reporting for resolution runs.
//!
//! Progress is an integer percentage. Consumers see a non-decreasing sequence
//! that ends with exactly one `100`.

/// Receives progress percentages (0-100).
pub trait ProgressSink {
    /// Called with the current percentage.
    fn report(&mut self, percent: u8);
}

impl<F: FnMut(u8)> ProgressSink for F {
    fn report(&mut self, percent: u8) {
        self(percent)
    }
}

/// Sink that drops every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _percent: u8) {}
}

/// Sink that records every report. Handy for tests and summaries.
#[derive(Debug, Default, Clone)]
pub struct RecordedProgress {
    pub values: Vec<u8>,
}

impl RecordedProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last reported value.
    pub fn last(&self) -> Option<u8> {
        self.values.last().copied()
    }

    /// Whether the values never decrease.
    pub fn is_monotonic(&self) -> bool {
        self.values.windows(2).all(|w| w[0] <= w[1])
    }
}

impl ProgressSink for RecordedProgress {
    fn report(&mut self, percent: u8) {
        self.values.push(percent);
    }
}

/// Wraps a sink and enforces the progress contract.
///
/// Regressions are dropped, values are capped at 100, and nothing is
/// forwarded after the terminal 100.
pub struct ProgressTracker<'a> {
    sink: &'a mut dyn ProgressSink,
    last: Option<u8>,
    finished: bool,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(sink: &'a mut dyn ProgressSink) -> Self {
        Self {
            sink,
            last: None,
            finished: false,
        }
    }

    /// Forward `percent` if it does not go backwards.
    pub fn report(&mut self, percent: u8) {
        if self.finished {
            return;
        }
        let percent = percent.min(100);
        if self.last.is_some_and(|last| percent < last) {
            return;
        }
        self.last = Some(percent);
        self.finished = percent == 100;
        self.sink.report(percent);
    }

    /// Emit the terminal 100 unless it was already sent.
    pub fn finish(&mut self) {
        self.report(100);
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Overall percentage when `done_before` of `total` items were already
/// complete and the remaining items are `sub_percent` done.
pub fn weighted_percent(done_before: usize, total: usize, sub_percent: u8) -> u8 {
    if total == 0 {
        return 100;
    }
    let remaining = total.saturating_sub(done_before) as f64;
    let value = (done_before as f64 * 100.0 + remaining * sub_percent as f64) / total as f64;
    value.round().clamp(0.0, 100.0) as u8
}
