//! Configuration loading, merging and validation.
//!
//! - Schema definitions in [`schema`]
//! - File discovery, environment overrides and validation in [`loader`]
//! - Deep merging in [`merger`]
//!
//! # Example
//!
//! ```
//! use taluka_geo::config::load_merged_config;
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let dir = temp.path().join(".taluka-geo");
//! fs::create_dir_all(&dir).unwrap();
//! fs::write(dir.join("config.yml"), "context:\n  district: Satara").unwrap();
//!
//! let config = load_merged_config(temp.path()).unwrap();
//! assert_eq!(config.context.district, "Satara");
//! ```

pub mod loader;
pub mod merger;
pub mod schema;

pub use loader::{
    apply_env_overrides, load_config, load_config_value, load_layers, load_merged_config,
    parse_config, resolve_config, validate, ConfigPaths, CONFIG_DIR, ENV_CACHE_DIR, ENV_ENDPOINT,
};
pub use merger::{deep_merge, merge_configs};
pub use schema::{CacheConfig, GeoConfig, GeocoderConfig, StaticTableConfig};
