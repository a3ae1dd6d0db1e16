//! Geocode cache store.
//!
//! Every operation is best effort: backend failures are logged and turn into
//! misses or no-ops, so a broken cache only costs extra remote lookups.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use super::backend::{CacheBackend, FileBackend, MemoryBackend, NullBackend};
use super::entry::{cache_key, now_millis, CacheEntry, CACHE_PREFIX, MS_PER_DAY};
use super::validation::{validate, ValidationResult};
use super::CACHE_DIR_NAME;
use crate::error::GeoError;
use crate::geocode::Coordinate;

/// Diagnostic counts for the cache namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Keys under the cache prefix.
    pub total: usize,
    /// Keys holding a fresh entry.
    pub valid: usize,
    /// Keys holding an expired, old-version or corrupt value.
    pub expired: usize,
    /// Stored value size in KiB, two decimals.
    pub size_estimate_kb: f64,
}

/// A stored cache value, as listed by [`CacheStore::list`].
#[derive(Debug, Clone, PartialEq)]
pub struct ListedEntry {
    /// Storage key.
    pub key: String,
    /// Parsed entry, if the value deserialized.
    pub entry: Option<CacheEntry>,
    /// Validity at listing time.
    pub status: &'static str,
}

/// Coordinate cache over a [`CacheBackend`].
pub struct CacheStore {
    backend: Box<dyn CacheBackend>,
}

impl CacheStore {
    /// Create a store over an explicit backend.
    pub fn new(backend: Box<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Create a store persisted under `dir`.
    pub fn file(dir: &Path) -> Self {
        Self::new(Box::new(FileBackend::new(dir.join(CACHE_DIR_NAME))))
    }

    /// Create a store that lives in memory only.
    pub fn memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()))
    }

    /// Create a store for contexts with no persistent storage.
    pub fn disabled() -> Self {
        Self::new(Box::new(NullBackend))
    }

    /// Underlying backend.
    pub fn backend(&self) -> &dyn CacheBackend {
        self.backend.as_ref()
    }

    /// Whether the backend has a persistent store.
    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    /// Cached coordinate for a location, if present and valid.
    ///
    /// Invalid or corrupt values are deleted as a side effect.
    pub fn get(&self, location_name: &str) -> Option<Coordinate> {
        if !self.is_available() {
            return None;
        }

        let key = cache_key(location_name);
        let raw = match self.backend.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Error reading cache for {:?}: {}", location_name, e);
                return None;
            }
        };

        match validate(&raw, now_millis()) {
            ValidationResult::Fresh(entry) => Some(entry.coordinates),
            stale => {
                debug!("Evicting {} cache entry {:?}", stale.label(), key);
                if let Err(e) = self.backend.remove(&key) {
                    warn!("Failed to evict cache entry {:?}: {}", key, e);
                }
                None
            }
        }
    }

    /// Cache a coordinate for a location, replacing any existing entry.
    ///
    /// Write failures (including quota errors) are logged and ignored.
    pub fn set(&self, location_name: &str, coordinates: Coordinate) {
        if !self.is_available() {
            return;
        }

        let key = cache_key(location_name);
        let result = CacheEntry::new(coordinates)
            .to_json()
            .map_err(GeoError::from)
            .and_then(|json| self.backend.set(&key, &json));

        if let Err(e) = result {
            warn!("Error caching coordinates for {:?}: {}", location_name, e);
        }
    }

    /// Cached coordinates for each name that hits. Misses are absent.
    pub fn get_batch<S: AsRef<str>>(&self, location_names: &[S]) -> HashMap<String, Coordinate> {
        location_names
            .iter()
            .filter_map(|name| {
                let name = name.as_ref();
                self.get(name).map(|c| (name.to_string(), c))
            })
            .collect()
    }

    /// Cache every pair in `coordinates`.
    pub fn set_batch(&self, coordinates: &HashMap<String, Coordinate>) {
        for (name, coords) in coordinates {
            self.set(name, *coords);
        }
    }

    /// Remove every key under the cache prefix. Returns the count removed.
    pub fn clear_all(&self) -> usize {
        let mut cleared = 0;
        for key in self.namespace_keys() {
            match self.backend.remove(&key) {
                Ok(true) => cleared += 1,
                Ok(false) => {}
                Err(e) => warn!("Failed to remove cache entry {:?}: {}", key, e),
            }
        }
        debug!("Cleared {} geocode cache entries", cleared);
        cleared
    }

    /// Remove every invalid or corrupt value. Returns the count removed.
    pub fn clear_expired(&self) -> usize {
        let now = now_millis();
        let mut cleared = 0;

        for key in self.namespace_keys() {
            let raw = match self.backend.get(&key) {
                Ok(Some(raw)) => raw,
                _ => continue,
            };
            if validate(&raw, now).is_stale() {
                match self.backend.remove(&key) {
                    Ok(true) => cleared += 1,
                    Ok(false) => {}
                    Err(e) => warn!("Failed to remove cache entry {:?}: {}", key, e),
                }
            }
        }

        if cleared > 0 {
            debug!("Cleared {} expired geocode cache entries", cleared);
        }
        cleared
    }

    /// Count entries by validity and estimate stored size.
    pub fn stats(&self) -> CacheStats {
        let now = now_millis();
        let mut stats = CacheStats::default();
        let mut total_bytes = 0usize;

        for key in self.namespace_keys() {
            stats.total += 1;
            match self.backend.get(&key) {
                Ok(Some(raw)) => {
                    total_bytes += raw.len();
                    if validate(&raw, now).is_stale() {
                        stats.expired += 1;
                    } else {
                        stats.valid += 1;
                    }
                }
                _ => stats.expired += 1,
            }
        }

        stats.size_estimate_kb = (total_bytes as f64 / 1024.0 * 100.0).round() / 100.0;
        stats
    }

    /// Age in fractional days of the stored entry for a location.
    ///
    /// Reports stale entries too; does not evict.
    pub fn age_days(&self, location_name: &str) -> Option<f64> {
        let raw = self.backend.get(&cache_key(location_name)).ok()??;
        let entry = CacheEntry::from_json(&raw).ok()?;
        Some(entry.age_ms(now_millis()) as f64 / MS_PER_DAY as f64)
    }

    /// Every stored value under the prefix, newest first. Corrupt values last.
    pub fn list(&self) -> Vec<ListedEntry> {
        let now = now_millis();
        let mut listed: Vec<ListedEntry> = self
            .namespace_keys()
            .into_iter()
            .filter_map(|key| {
                let raw = self.backend.get(&key).ok()??;
                let status = validate(&raw, now).label();
                let entry = CacheEntry::from_json(&raw).ok();
                Some(ListedEntry { key, entry, status })
            })
            .collect();

        listed.sort_by_key(|l| std::cmp::Reverse(l.entry.as_ref().map(|e| e.timestamp)));
        listed
    }

    fn namespace_keys(&self) -> Vec<String> {
        if !self.is_available() {
            return Vec::new();
        }
        match self.backend.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|k| k.starts_with(CACHE_PREFIX))
                .collect(),
            Err(e) => {
                warn!("Error listing geocode cache: {}", e);
                Vec::new()
            }
        }
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::memory()
    }
}
