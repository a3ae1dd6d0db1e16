//! Error types for taluka-geo operations.
//!
//! This module defines [`GeoError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Remote, cache and static-table failures are recovered where they happen
//!   and turn into "no coordinate" values; they only show up here when a
//!   lower-level component reports them to its caller
//! - Configuration and CLI-level I/O errors are surfaced to the user
//! - Use `anyhow::Error` (via `GeoError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for taluka-geo operations.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// The persistent store refused a write because it is full.
    #[error("Cache quota exceeded: {needed} bytes needed, limit is {limit}")]
    QuotaExceeded { needed: u64, limit: u64 },

    /// Geocoding endpoint replied with a non-success status.
    #[error("HTTP {status} from geocoding endpoint")]
    HttpStatus { status: u16 },

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for taluka-geo operations.
pub type Result<T> = std::result::Result<T, GeoError>;
