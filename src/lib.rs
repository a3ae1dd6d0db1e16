//! taluka-geo - Tiered geocoding of administrative region names.
//!
//! Region names are resolved through three tiers, cheapest first: a curated
//! static table, a persistent cache with a 30-day expiry, and a throttled
//! remote geocoder. Remote results are written back to the cache.
//!
//! # Modules
//!
//! - [`cache`] - Persistent coordinate cache and its storage backends
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, merging, and validation
//! - [`error`] - Error types and result aliases
//! - [`geocode`] - Remote client, batch resolver and the tiered service
//! - [`progress`] - Progress reporting contract
//! - [`static_table`] - Curated lookup table and table generation
//! - [`ui`] - Terminal output and progress bars
//!
//! # Example
//!
//! ```
//! use taluka_geo::cache::CacheStore;
//! use taluka_geo::geocode::{GeocodingService, LocationContext, OfflineGeocoder};
//! use taluka_geo::progress::NoProgress;
//! use taluka_geo::static_table::StaticLookupTable;
//!
//! let service = GeocodingService::new(
//!     StaticLookupTable::bundled(),
//!     CacheStore::memory(),
//!     Box::new(OfflineGeocoder),
//! );
//! let resolution = service.resolve_regions(
//!     &["मिरज", "जत"],
//!     &LocationContext::default(),
//!     &mut NoProgress,
//! );
//! assert_eq!(resolution.success_rate_percent(), 100);
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod geocode;
pub mod progress;
pub mod static_table;
pub mod ui;

pub use error::{GeoError, Result};
