//! Configuration schema for taluka-geo.
//!
//! Maps the `config.yml` format onto typed structs. Every field has a
//! default, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{default_cache_dir, CacheStore, FileBackend};
use crate::error::Result;
use crate::geocode::{
    Geocoder, GeocodingService, LocationContext, NominatimClient, OfflineGeocoder,
    DEFAULT_ENDPOINT, DEFAULT_USER_AGENT,
};
use crate::static_table::{BoundingBox, StaticLookupTable};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    /// Remote geocoder settings
    pub geocoder: GeocoderConfig,

    /// Administrative context appended to region names
    pub context: LocationContext,

    /// Persistent cache settings
    pub cache: CacheConfig,

    /// Static lookup table source
    pub static_table: StaticTableConfig,

    /// Acceptance window for `table build`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoundingBox>,
}

/// Remote geocoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    /// Search endpoint URL
    pub endpoint: String,

    /// Client identification sent with every request
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Pause between consecutive requests in milliseconds
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
        }
    }
}

impl GeocoderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_request_delay_ms() -> u64 {
    200
}

fn default_true() -> bool {
    true
}

/// Persistent cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// When false, nothing is persisted
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cache directory (defaults to the platform cache dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Storage quota for the cache file in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            max_bytes: None,
        }
    }
}

impl CacheConfig {
    /// Directory the cache file lives in.
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(default_cache_dir)
    }
}

/// Static lookup table source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticTableConfig {
    /// JSON file replacing the bundled table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl GeoConfig {
    /// Cache store selected by the `cache` section.
    pub fn cache_store(&self) -> CacheStore {
        if !self.cache.enabled {
            return CacheStore::disabled();
        }
        let path = self.cache.resolved_dir().join(crate::cache::CACHE_DIR_NAME);
        let backend = match self.cache.max_bytes {
            Some(limit) => FileBackend::new(path).with_max_bytes(limit),
            None => FileBackend::new(path),
        };
        CacheStore::new(Box::new(backend))
    }

    /// Static table selected by the `static_table` section.
    pub fn static_lookup_table(&self) -> StaticLookupTable {
        match &self.static_table.path {
            Some(path) => StaticLookupTable::from_file(path),
            None => StaticLookupTable::bundled(),
        }
    }

    /// Remote geocoder, or an offline one when `offline` is set.
    pub fn geocoder(&self, offline: bool) -> Result<Box<dyn Geocoder>> {
        if offline {
            return Ok(Box::new(OfflineGeocoder));
        }
        let client = NominatimClient::with_endpoint(
            &self.geocoder.endpoint,
            &self.geocoder.user_agent,
            self.geocoder.timeout(),
        )?;
        Ok(Box::new(client))
    }

    /// Fully wired service.
    pub fn build_service(&self, offline: bool) -> Result<GeocodingService> {
        Ok(GeocodingService::new(
            self.static_lookup_table(),
            self.cache_store(),
            self.geocoder(offline)?,
        )
        .with_context(self.context.clone())
        .with_request_delay(self.geocoder.request_delay()))
    }
}
