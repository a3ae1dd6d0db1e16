//! Persistent geocode cache.
//!
//! Maps canonicalized location names to coordinates with a 30-day expiration
//! window and a schema version tag. Storage is pluggable through
//! [`CacheBackend`]: one JSON file per entry on disk, an in-memory map, or a null backend
//! for contexts without persistent storage.

pub mod backend;
pub mod entry;
pub mod store;
pub mod validation;

pub use backend::{CacheBackend, FileBackend, MemoryBackend, NullBackend};
pub use entry::{
    cache_key, now_millis, CacheEntry, CACHE_EXPIRATION_DAYS, CACHE_EXPIRATION_MS, CACHE_PREFIX,
    CACHE_VERSION,
};
pub use store::{CacheStats, CacheStore, ListedEntry};
pub use validation::{format_duration, validate, ValidationResult};

/// Directory, under the cache dir, holding one file per entry.
pub const CACHE_DIR_NAME: &str = "geocode-cache";

/// Get the default cache directory.
pub fn default_cache_dir() -> std::path::PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("taluka-geo")
}
