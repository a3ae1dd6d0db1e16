//! Tiered resolution of region names.
//!
//! Each region is looked up in the static table, then in the cache, and only
//! what is still missing goes to the remote geocoder. Newly resolved
//! coordinates are written back to the cache.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, info};

use super::batch::{BatchResolver, CancellationToken, Pause, ThreadPause, DEFAULT_REQUEST_DELAY};
use super::remote::Geocoder;
use super::types::{unique_non_blank, Coordinate, LocationContext, Resolution};
use crate::cache::{CacheStats, CacheStore};
use crate::progress::{weighted_percent, ProgressSink, ProgressTracker};
use crate::static_table::StaticLookupTable;

/// Entry point for geocoding region names.
pub struct GeocodingService {
    static_table: StaticLookupTable,
    cache: CacheStore,
    geocoder: Box<dyn Geocoder>,
    context: LocationContext,
    request_delay: Duration,
    pause: Box<dyn Pause>,
    bare_name_lookup: bool,
}

impl GeocodingService {
    /// Create a service from its three tiers.
    pub fn new(
        static_table: StaticLookupTable,
        cache: CacheStore,
        geocoder: Box<dyn Geocoder>,
    ) -> Self {
        Self {
            static_table,
            cache,
            geocoder,
            context: LocationContext::default(),
            request_delay: DEFAULT_REQUEST_DELAY,
            pause: Box::new(ThreadPause),
            bare_name_lookup: true,
        }
    }

    /// Default context used by [`resolve_regions_default`](Self::resolve_regions_default).
    pub fn with_context(mut self, context: LocationContext) -> Self {
        self.context = context;
        self
    }

    /// Pause between consecutive remote requests.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Replace how the service waits between requests.
    pub fn with_pause(mut self, pause: Box<dyn Pause>) -> Self {
        self.pause = pause;
        self
    }

    /// Swap the cache store, e.g. for an in-memory one.
    pub fn with_cache(mut self, cache: CacheStore) -> Self {
        self.cache = cache;
        self
    }

    /// Also accept cache entries keyed by the bare region name.
    pub fn with_bare_name_lookup(mut self, enabled: bool) -> Self {
        self.bare_name_lookup = enabled;
        self
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn static_table(&self) -> &StaticLookupTable {
        &self.static_table
    }

    pub fn context(&self) -> &LocationContext {
        &self.context
    }

    pub fn request_delay(&self) -> Duration {
        self.request_delay
    }

    fn batch_resolver(&self, cancel: Option<&CancellationToken>) -> BatchResolver<'_> {
        let batch = BatchResolver::new(self.geocoder.as_ref())
            .with_delay(self.request_delay)
            .with_pause(self.pause.as_ref());
        match cancel {
            Some(token) => batch.with_cancellation(token.clone()),
            None => batch,
        }
    }

    /// Resolve region names using the service's default context.
    pub fn resolve_regions_default<S: AsRef<str>>(
        &self,
        region_names: &[S],
        progress: &mut dyn ProgressSink,
    ) -> Resolution {
        self.resolve_regions(region_names, &self.context, progress)
    }

    /// Resolve region names within `context`.
    ///
    /// The result is keyed by the trimmed original name.
    pub fn resolve_regions<S: AsRef<str>>(
        &self,
        region_names: &[S],
        context: &LocationContext,
        progress: &mut dyn ProgressSink,
    ) -> Resolution {
        self.resolve_regions_cancellable(region_names, context, progress, None)
    }

    /// [`resolve_regions`](Self::resolve_regions) that stops issuing remote
    /// requests once `cancel` is triggered.
    pub fn resolve_regions_cancellable<S: AsRef<str>>(
        &self,
        region_names: &[S],
        context: &LocationContext,
        progress: &mut dyn ProgressSink,
        cancel: Option<&CancellationToken>,
    ) -> Resolution {
        let mut tracker = ProgressTracker::new(progress);
        let regions = unique_non_blank(region_names);
        let requested = regions.len();

        let mut resolution = Resolution {
            requested,
            ..Resolution::default()
        };

        if requested == 0 {
            tracker.finish();
            return resolution;
        }

        tracker.report(0);

        let mut remaining = Vec::new();
        for region in regions {
            if let Some(coords) = self.static_table.get(&region) {
                debug!("Static hit: {}", region);
                resolution.tiers.from_static += 1;
                resolution.results.insert(region, coords);
            } else if let Some(coords) = self.cached_region(&region, context) {
                debug!("Cache hit: {}", region);
                resolution.tiers.from_cache += 1;
                resolution.results.insert(region, coords);
            } else {
                remaining.push(region);
            }
        }

        if remaining.is_empty() {
            info!("All {} regions resolved without network", requested);
            tracker.finish();
            return resolution;
        }

        let resolved_free = requested - remaining.len();
        info!(
            "Fetching {} of {} regions remotely ({} from static table, {} from cache)",
            remaining.len(),
            requested,
            resolution.tiers.from_static,
            resolution.tiers.from_cache
        );

        let queries: Vec<(String, String)> = remaining
            .into_iter()
            .map(|region| (context.qualify(&region), region))
            .collect();
        let query_strings: Vec<&str> = queries.iter().map(|(q, _)| q.as_str()).collect();

        let fetched = {
            let mut on_batch = |p: u8| tracker.report(weighted_percent(resolved_free, requested, p));
            self.batch_resolver(cancel)
                .resolve_batch(&query_strings, &mut on_batch)
        };

        self.cache.set_batch(&fetched);

        for (query, region) in queries {
            if let Some(coords) = fetched.get(&query) {
                resolution.tiers.from_remote += 1;
                resolution.results.insert(region, *coords);
            }
        }

        tracker.finish();
        info!(
            "Resolved {}/{} regions ({}%)",
            resolution.resolved(),
            requested,
            resolution.success_rate_percent()
        );
        resolution
    }

    fn cached_region(&self, region: &str, context: &LocationContext) -> Option<Coordinate> {
        self.cache.get(&context.qualify(region)).or_else(|| {
            if self.bare_name_lookup {
                self.cache.get(region)
            } else {
                None
            }
        })
    }

    /// Cache-then-remote lookup for a single raw location string.
    pub fn resolve_one(&self, location: &str) -> Option<Coordinate> {
        if location.trim().is_empty() {
            return None;
        }

        if let Some(cached) = self.cache.get(location) {
            debug!("Cache hit: {}", location);
            return Some(cached);
        }

        debug!("Cache miss: {} - fetching...", location);
        let coords = self.geocoder.geocode(location)?;
        self.cache.set(location, coords);
        Some(coords)
    }

    /// Cache-aware batch over raw location strings. No static tier, no context.
    pub fn resolve_locations<S: AsRef<str>>(
        &self,
        locations: &[S],
        progress: &mut dyn ProgressSink,
    ) -> HashMap<String, Coordinate> {
        let mut tracker = ProgressTracker::new(progress);
        let unique = unique_non_blank(locations);
        let total = unique.len();

        let mut results = self.cache.get_batch(&unique);
        debug!("Cache hits: {}/{}", results.len(), total);

        let uncached: Vec<&String> = unique.iter().filter(|l| !results.contains_key(*l)).collect();
        if uncached.is_empty() {
            tracker.finish();
            return results;
        }

        let cached = total - uncached.len();
        let fetched = {
            let mut on_batch = |p: u8| tracker.report(weighted_percent(cached, total, p));
            self.batch_resolver(None)
                .resolve_batch(&uncached, &mut on_batch)
        };

        self.cache.set_batch(&fetched);
        info!(
            "Cache performance: {} hits, {} fetches",
            cached,
            fetched.len()
        );
        results.extend(fetched);

        tracker.finish();
        results
    }

    /// Remove every cache entry. Returns the count removed.
    pub fn clear_cache(&self) -> usize {
        self.cache.clear_all()
    }

    /// Remove invalid cache entries. Returns the count removed.
    pub fn clear_expired_cache(&self) -> usize {
        self.cache.clear_expired()
    }

    /// Cache diagnostics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{cache_key, now_millis, CacheEntry};
    use crate::geocode::batch::test_support::{RecordingPause, SpyGeocoder};
    use crate::progress::{NoProgress, RecordedProgress};
    use std::rc::Rc;

    /// Geocoder handle that lets the test keep inspecting the spy.
    struct Shared(Rc<SpyGeocoder>);

    impl Geocoder for Shared {
        fn geocode(&self, location: &str) -> Option<Coordinate> {
            self.0.geocode(location)
        }
    }

    struct SharedPause(Rc<RecordingPause>);

    impl Pause for SharedPause {
        fn pause(&self, duration: Duration) {
            self.0.pause(duration)
        }
    }

    struct Fixture {
        service: GeocodingService,
        spy: Rc<SpyGeocoder>,
        pause: Rc<RecordingPause>,
    }

    fn fixture(
        table: StaticLookupTable,
        cache: CacheStore,
        answers: Vec<(&'static str, Coordinate)>,
    ) -> Fixture {
        let spy = Rc::new(SpyGeocoder::new(answers));
        let pause = Rc::new(RecordingPause::default());
        let service = GeocodingService::new(table, cache, Box::new(Shared(spy.clone())))
            .with_pause(Box::new(SharedPause(pause.clone())));
        Fixture {
            service,
            spy,
            pause,
        }
    }

    fn atpadi() -> Coordinate {
        Coordinate::new(17.27, 74.98)
    }

    fn jat() -> Coordinate {
        Coordinate::new(17.05, 75.0)
    }

    #[test]
    fn mixed_tiers_scenario() {
        let table = StaticLookupTable::from_entries([("जत", jat())]);
        let cache = CacheStore::memory();
        cache.set("Atpadi, Sangli, Maharashtra, India", atpadi());
        let f = fixture(table, cache, vec![]);

        let mut progress = RecordedProgress::new();
        let resolution = f.service.resolve_regions(
            &["Atpadi", "जत", "Unknown Place"],
            &LocationContext::default(),
            &mut progress,
        );

        assert_eq!(resolution.results.len(), 2);
        assert_eq!(resolution.get("Atpadi"), Some(&atpadi()));
        assert_eq!(resolution.get("जत"), Some(&jat()));
        assert_eq!(resolution.get("Unknown Place"), None);
        assert_eq!(resolution.success_rate_percent(), 67);
        assert_eq!(
            f.spy.queries(),
            vec!["Unknown Place, Sangli, Maharashtra, India"]
        );
        assert_eq!(resolution.tiers.from_static, 1);
        assert_eq!(resolution.tiers.from_cache, 1);
        assert_eq!(resolution.tiers.from_remote, 0);
        assert!(progress.is_monotonic());
        assert_eq!(progress.last(), Some(100));
    }

    #[test]
    fn static_tier_wins_over_cache() {
        let table = StaticLookupTable::from_entries([("Miraj", Coordinate::new(16.82, 74.64))]);
        let cache = CacheStore::memory();
        cache.set("Miraj, Sangli, Maharashtra, India", Coordinate::new(1.0, 1.0));
        cache.set("Miraj", Coordinate::new(2.0, 2.0));
        let f = fixture(table, cache, vec![]);

        let resolution =
            f.service
                .resolve_regions(&["Miraj"], &LocationContext::default(), &mut NoProgress);

        assert_eq!(resolution.get("Miraj"), Some(&Coordinate::new(16.82, 74.64)));
    }

    #[test]
    fn all_static_makes_no_remote_calls() {
        let table = StaticLookupTable::from_entries([("जत", jat()), ("मिरज", atpadi())]);
        let f = fixture(table, CacheStore::memory(), vec![]);
        let mut progress = RecordedProgress::new();

        let resolution =
            f.service
                .resolve_regions(&["जत", "मिरज"], &LocationContext::default(), &mut progress);

        assert_eq!(resolution.resolved(), 2);
        assert_eq!(f.spy.call_count(), 0);
        assert_eq!(progress.last(), Some(100));
        assert_eq!(progress.values.iter().filter(|&&p| p == 100).count(), 1);
    }

    #[test]
    fn partial_remote_failure() {
        let f = fixture(
            StaticLookupTable::empty(),
            CacheStore::memory(),
            vec![
                ("A, Sangli, Maharashtra, India", Coordinate::new(1.0, 1.0)),
                ("C, Sangli, Maharashtra, India", Coordinate::new(3.0, 3.0)),
            ],
        );

        let resolution =
            f.service
                .resolve_regions(&["A", "B", "C"], &LocationContext::default(), &mut NoProgress);

        assert_eq!(resolution.results.len(), 2);
        assert_eq!(resolution.success_rate_percent(), 67);
        assert_eq!(f.spy.call_count(), 3);
        assert_eq!(f.pause.pauses.borrow().len(), 2);
    }

    #[test]
    fn second_run_is_served_from_cache() {
        let f = fixture(
            StaticLookupTable::empty(),
            CacheStore::memory(),
            vec![
                ("Palus, Sangli, Maharashtra, India", Coordinate::new(17.1, 74.45)),
                ("Miraj, Sangli, Maharashtra, India", Coordinate::new(16.82, 74.64)),
            ],
        );
        let ctx = LocationContext::default();

        let first = f
            .service
            .resolve_regions(&["Palus", "Miraj", "Nowhere"], &ctx, &mut NoProgress);
        let calls_after_first = f.spy.call_count();
        let second = f
            .service
            .resolve_regions(&["Palus", "Miraj"], &ctx, &mut NoProgress);

        assert_eq!(calls_after_first, 3);
        assert_eq!(f.spy.call_count(), 3);
        assert_eq!(first.get("Palus"), second.get("Palus"));
        assert_eq!(first.get("Miraj"), second.get("Miraj"));
        assert_eq!(second.tiers.from_cache, 2);
    }

    #[test]
    fn identical_runs_give_identical_results() {
        let f = fixture(
            StaticLookupTable::empty(),
            CacheStore::memory(),
            vec![("Palus, Sangli, Maharashtra, India", Coordinate::new(17.1, 74.45))],
        );
        let ctx = LocationContext::default();

        let first = f.service.resolve_regions(&["Palus"], &ctx, &mut NoProgress);
        let second = f.service.resolve_regions(&["Palus"], &ctx, &mut NoProgress);

        assert_eq!(first.results, second.results);
        assert_eq!(f.spy.call_count(), 1);
    }

    #[test]
    fn remote_results_are_written_back_under_qualified_key() {
        let f = fixture(
            StaticLookupTable::empty(),
            CacheStore::memory(),
            vec![("Palus, Sangli, Maharashtra, India", Coordinate::new(17.1, 74.45))],
        );

        f.service
            .resolve_regions(&["Palus"], &LocationContext::default(), &mut NoProgress);

        assert!(f
            .service
            .cache()
            .backend()
            .get(&cache_key("Palus, Sangli, Maharashtra, India"))
            .unwrap()
            .is_some());
        assert_eq!(f.service.cache().get("Palus"), None);
    }

    #[test]
    fn bare_name_cache_entries_are_honoured() {
        let cache = CacheStore::memory();
        cache.set("Shirala", Coordinate::new(16.98, 74.13));
        let f = fixture(StaticLookupTable::empty(), cache, vec![]);

        let resolution =
            f.service
                .resolve_regions(&["Shirala"], &LocationContext::default(), &mut NoProgress);

        assert_eq!(resolution.get("Shirala"), Some(&Coordinate::new(16.98, 74.13)));
        assert_eq!(f.spy.call_count(), 0);
    }

    #[test]
    fn bare_name_lookup_can_be_disabled() {
        let cache = CacheStore::memory();
        cache.set("Shirala", Coordinate::new(16.98, 74.13));
        let spy = Rc::new(SpyGeocoder::default());
        let service = GeocodingService::new(
            StaticLookupTable::empty(),
            cache,
            Box::new(Shared(spy.clone())),
        )
        .with_pause(Box::new(RecordingPause::default()))
        .with_bare_name_lookup(false);

        let resolution =
            service.resolve_regions(&["Shirala"], &LocationContext::default(), &mut NoProgress);

        assert_eq!(resolution.resolved(), 0);
        assert_eq!(spy.call_count(), 1);
    }

    #[test]
    fn expired_cache_entry_falls_through_to_remote() {
        let cache = CacheStore::memory();
        let stale = CacheEntry::at(atpadi(), now_millis() - 31 * 24 * 60 * 60 * 1000);
        cache
            .backend()
            .set(
                &cache_key("Atpadi, Sangli, Maharashtra, India"),
                &stale.to_json().unwrap(),
            )
            .unwrap();
        let f = fixture(
            StaticLookupTable::empty(),
            cache,
            vec![("Atpadi, Sangli, Maharashtra, India", Coordinate::new(17.4, 74.9))],
        );

        let resolution =
            f.service
                .resolve_regions(&["Atpadi"], &LocationContext::default(), &mut NoProgress);

        assert_eq!(resolution.get("Atpadi"), Some(&Coordinate::new(17.4, 74.9)));
        assert_eq!(f.spy.call_count(), 1);
    }

    #[test]
    fn progress_accounts_for_free_tiers() {
        let table = StaticLookupTable::from_entries([("S", jat())]);
        let f = fixture(
            table,
            CacheStore::memory(),
            vec![("R1, Sangli, Maharashtra, India", atpadi())],
        );
        let mut progress = RecordedProgress::new();

        f.service
            .resolve_regions(&["S", "R1", "R2"], &LocationContext::default(), &mut progress);

        // 0 at start, then 1/3 free + half of remote, then done
        assert_eq!(progress.values, vec![0, 67, 100]);
    }

    #[test]
    fn progress_single_terminal_event_for_remote_runs() {
        let f = fixture(StaticLookupTable::empty(), CacheStore::memory(), vec![]);
        let mut progress = RecordedProgress::new();

        f.service.resolve_regions(
            &["a", "b", "c", "d"],
            &LocationContext::default(),
            &mut progress,
        );

        assert!(progress.is_monotonic());
        assert_eq!(progress.values.iter().filter(|&&p| p == 100).count(), 1);
        assert_eq!(progress.last(), Some(100));
    }

    #[test]
    fn blank_and_duplicate_names_are_ignored() {
        let table = StaticLookupTable::from_entries([("जत", jat())]);
        let f = fixture(table, CacheStore::memory(), vec![]);

        let resolution = f.service.resolve_regions(
            &["  जत ", "", "जत", "   "],
            &LocationContext::default(),
            &mut NoProgress,
        );

        assert_eq!(resolution.requested, 1);
        assert_eq!(resolution.get("जत"), Some(&jat()));
        assert_eq!(resolution.success_rate_percent(), 100);
    }

    #[test]
    fn empty_input_reports_done() {
        let f = fixture(StaticLookupTable::empty(), CacheStore::memory(), vec![]);
        let mut progress = RecordedProgress::new();

        let resolution =
            f.service
                .resolve_regions::<&str>(&[], &LocationContext::default(), &mut progress);

        assert_eq!(resolution.requested, 0);
        assert_eq!(resolution.success_rate_percent(), 0);
        assert_eq!(progress.values, vec![100]);
    }

    #[test]
    fn custom_context_qualifies_queries() {
        let f = fixture(StaticLookupTable::empty(), CacheStore::memory(), vec![]);
        let ctx = LocationContext::new("Kolhapur", "Maharashtra", "India");

        f.service.resolve_regions(&["Karvir"], &ctx, &mut NoProgress);

        assert_eq!(f.spy.queries(), vec!["Karvir, Kolhapur, Maharashtra, India"]);
    }

    #[test]
    fn cancelled_run_returns_partial_results() {
        let f = fixture(
            StaticLookupTable::empty(),
            CacheStore::memory(),
            vec![("a, Sangli, Maharashtra, India", atpadi())],
        );
        let token = CancellationToken::new();
        token.cancel();
        let mut progress = RecordedProgress::new();

        let resolution = f.service.resolve_regions_cancellable(
            &["a", "b"],
            &LocationContext::default(),
            &mut progress,
            Some(&token),
        );

        assert_eq!(f.spy.call_count(), 0);
        assert_eq!(resolution.resolved(), 0);
        assert_eq!(progress.last(), Some(100));
    }

    #[test]
    fn resolve_one_uses_cache_then_remote() {
        let f = fixture(
            StaticLookupTable::empty(),
            CacheStore::memory(),
            vec![("Vita", Coordinate::new(17.27, 74.54))],
        );

        assert_eq!(f.service.resolve_one("Vita"), Some(Coordinate::new(17.27, 74.54)));
        assert_eq!(f.service.resolve_one(" vita "), Some(Coordinate::new(17.27, 74.54)));
        assert_eq!(f.spy.call_count(), 1);
        assert_eq!(f.service.resolve_one("   "), None);
    }

    #[test]
    fn resolve_locations_fetches_only_uncached() {
        let cache = CacheStore::memory();
        cache.set("Sangli", Coordinate::new(16.85, 74.58));
        let f = fixture(
            StaticLookupTable::empty(),
            cache,
            vec![("Miraj", Coordinate::new(16.82, 74.64))],
        );
        let mut progress = RecordedProgress::new();

        let results = f
            .service
            .resolve_locations(&["Sangli", "Miraj", "Nowhere"], &mut progress);

        assert_eq!(results.len(), 2);
        assert_eq!(f.spy.queries(), vec!["Miraj", "Nowhere"]);
        assert_eq!(f.service.cache().get("Miraj"), Some(Coordinate::new(16.82, 74.64)));
        assert!(progress.is_monotonic());
        assert_eq!(progress.last(), Some(100));
    }

    #[test]
    fn resolve_locations_all_cached_skips_network() {
        let cache = CacheStore::memory();
        cache.set("Sangli", Coordinate::new(16.85, 74.58));
        let f = fixture(StaticLookupTable::empty(), cache, vec![]);
        let mut progress = RecordedProgress::new();

        let results = f.service.resolve_locations(&["Sangli"], &mut progress);

        assert_eq!(results.len(), 1);
        assert_eq!(f.spy.call_count(), 0);
        assert_eq!(progress.values, vec![100]);
    }

    #[test]
    fn maintenance_operations() {
        let cache = CacheStore::memory();
        cache.set("a", atpadi());
        cache.set("b", atpadi());
        let f = fixture(StaticLookupTable::empty(), cache, vec![]);

        assert_eq!(f.service.cache_stats().valid, 2);
        assert_eq!(f.service.clear_expired_cache(), 0);
        assert_eq!(f.service.clear_cache(), 2);
        assert_eq!(f.service.cache_stats().total, 0);
    }

    #[test]
    fn disabled_cache_still_resolves() {
        let f = fixture(
            StaticLookupTable::empty(),
            CacheStore::disabled(),
            vec![("Jat, Sangli, Maharashtra, India", jat())],
        );
        let ctx = LocationContext::default();

        f.service.resolve_regions(&["Jat"], &ctx, &mut NoProgress);
        let second = f.service.resolve_regions(&["Jat"], &ctx, &mut NoProgress);

        assert_eq!(second.get("Jat"), Some(&jat()));
        assert_eq!(f.spy.call_count(), 2);
    }
}
