//! Cache entry type and key canonicalization.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::geocode::Coordinate;

/// Namespace prefix shared by every cache key.
pub const CACHE_PREFIX: &str = "geocode_cache_";

/// Current entry schema version. Entries written under another version are invalid.
pub const CACHE_VERSION: &str = "v1";

/// Entries older than this many days are invalid.
pub const CACHE_EXPIRATION_DAYS: i64 = 30;

/// Expiration window in milliseconds.
pub const CACHE_EXPIRATION_MS: i64 = CACHE_EXPIRATION_DAYS * MS_PER_DAY;

pub(crate) const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// A cached coordinate with its write time and schema version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached coordinate.
    pub coordinates: Coordinate,
    /// Write time, epoch milliseconds.
    pub timestamp: i64,
    /// Schema version the entry was written under.
    pub version: String,
}

impl CacheEntry {
    /// Create an entry stamped with the current time and version.
    pub fn new(coordinates: Coordinate) -> Self {
        Self::at(coordinates, now_millis())
    }

    /// Create an entry with an explicit timestamp.
    pub fn at(coordinates: Coordinate, timestamp: i64) -> Self {
        Self {
            coordinates,
            timestamp,
            version: CACHE_VERSION.to_string(),
        }
    }

    /// Age in milliseconds relative to `now_ms`.
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.timestamp
    }

    /// Age relative to now.
    pub fn age(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.age_ms(now_millis()))
    }

    /// Whether the entry was written under the current schema version.
    pub fn is_current_version(&self) -> bool {
        self.version == CACHE_VERSION
    }

    /// Whether the entry is older than the expiration window at `now_ms`.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.age_ms(now_ms) >= CACHE_EXPIRATION_MS
    }

    /// Valid iff current version and younger than the expiration window.
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        self.is_current_version() && !self.is_expired_at(now_ms)
    }

    /// Validity relative to now.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(now_millis())
    }

    /// Serialize to the stored string form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse the stored string form.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// Storage key for a location name.
///
/// Names that differ only in case or surrounding whitespace share a key.
pub fn cache_key(location_name: &str) -> String {
    format!(
        "{}{}_{}",
        CACHE_PREFIX,
        CACHE_VERSION,
        location_name.trim().to_lowercase()
    )
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
