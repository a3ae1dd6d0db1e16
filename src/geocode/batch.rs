//! Sequential, throttled batch geocoding.
//!
//! Requests are issued one at a time with a fixed pause between consecutive
//! requests and none after the last. There is no fan-out.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::remote::Geocoder;
use super::types::Coordinate;
use crate::progress::ProgressSink;

/// Default pause between consecutive remote requests.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(200);

/// Blocks between requests.
pub trait Pause {
    fn pause(&self, duration: Duration);
}

/// [`Pause`] that sleeps the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadPause;

impl Pause for ThreadPause {
    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Shared flag that stops a batch before its next request.
#[derive(Debug, Default, Clone)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Resolves many location strings through one [`Geocoder`], one at a time.
pub struct BatchResolver<'a> {
    geocoder: &'a dyn Geocoder,
    pause: &'a dyn Pause,
    delay: Duration,
    cancel: Option<CancellationToken>,
}

impl<'a> BatchResolver<'a> {
    /// Resolver with the default delay, sleeping between requests.
    pub fn new(geocoder: &'a dyn Geocoder) -> Self {
        Self {
            geocoder,
            pause: &ThreadPause,
            delay: DEFAULT_REQUEST_DELAY,
            cancel: None,
        }
    }

    /// Set the pause between consecutive requests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Use a custom [`Pause`].
    pub fn with_pause(mut self, pause: &'a dyn Pause) -> Self {
        self.pause = pause;
        self
    }

    /// Stop issuing requests once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Get the configured delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Geocode every distinct non-blank location in input order.
    ///
    /// Duplicates are matched exactly and results are keyed by the location
    /// as given. Progress is reported after each attempt and reaches 100 only after the
    /// last one. Unresolved locations are absent from the result.
    pub fn resolve_batch<S: AsRef<str>>(
        &self,
        locations: &[S],
        progress: &mut dyn ProgressSink,
    ) -> HashMap<String, Coordinate> {
        let mut results = HashMap::new();
        let unique = distinct_non_blank(locations);
        let total = unique.len();

        if total == 0 {
            progress.report(100);
            return results;
        }

        info!("Geocoding {} unique locations...", total);

        for (i, location) in unique.iter().enumerate() {
            if self.is_cancelled() {
                warn!(
                    "Geocoding cancelled after {} of {} locations",
                    i, total
                );
                progress.report(100);
                break;
            }

            match self.geocoder.geocode(location) {
                Some(coords) => {
                    results.insert(location.to_string(), coords);
                }
                None => warn!("Failed to geocode: {}", location),
            }

            let done = i + 1;
            let percent = (100.0 * done as f64 / total as f64).round() as u8;
            progress.report(percent);

            if done < total {
                self.pause.pause(self.delay);
            }
        }

        info!(
            "Geocoding complete: {}/{} locations found",
            results.len(),
            total
        );

        results
    }
}

/// Exact-match dedup in input order, skipping whitespace-only entries.
fn distinct_non_blank<S: AsRef<str>>(locations: &[S]) -> Vec<&str> {
    let mut seen = HashSet::new();
    locations
        .iter()
        .map(AsRef::as_ref)
        .filter(|location| !location.trim().is_empty() && seen.insert(*location))
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::cell::RefCell;
    use std::time::Instant;

    /// Geocoder answering from a fixed map and recording every call.
    #[derive(Default)]
    pub struct SpyGeocoder {
        pub answers: HashMap<String, Coordinate>,
        pub calls: RefCell<Vec<(String, Instant)>>,
    }

    impl SpyGeocoder {
        pub fn new<I: IntoIterator<Item = (&'static str, Coordinate)>>(answers: I) -> Self {
            Self {
                answers: answers
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
                calls: RefCell::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }

        pub fn queries(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|(q, _)| q.clone()).collect()
        }
    }

    impl Geocoder for SpyGeocoder {
        fn geocode(&self, location: &str) -> Option<Coordinate> {
            self.calls
                .borrow_mut()
                .push((location.to_string(), Instant::now()));
            self.answers.get(location).copied()
        }
    }

    /// Pause that records requested durations without sleeping.
    #[derive(Default)]
    pub struct RecordingPause {
        pub pauses: RefCell<Vec<Duration>>,
    }

    impl Pause for RecordingPause {
        fn pause(&self, duration: Duration) {
            self.pauses.borrow_mut().push(duration);
        }
    }
}
