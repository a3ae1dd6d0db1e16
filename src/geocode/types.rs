//! Coordinate, location context, and resolution result types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default district used to qualify bare region names.
pub const DEFAULT_DISTRICT: &str = "Sangli";
/// Default state used to qualify bare region names.
pub const DEFAULT_STATE: &str = "Maharashtra";
/// Default country used to qualify bare region names.
pub const DEFAULT_COUNTRY: &str = "India";

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Create a coordinate.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// Geographic context used to disambiguate a bare region name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationContext {
    pub district: String,
    pub state: String,
    pub country: String,
}

impl Default for LocationContext {
    fn default() -> Self {
        Self {
            district: DEFAULT_DISTRICT.to_string(),
            state: DEFAULT_STATE.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
        }
    }
}

impl LocationContext {
    /// Create a context from its parts.
    pub fn new(
        district: impl Into<String>,
        state: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            district: district.into(),
            state: state.into(),
            country: country.into(),
        }
    }

    /// Build the fully-qualified query string for a region.
    ///
    /// `"{region}, {district}, {state}, {country}"`
    pub fn qualify(&self, region: &str) -> String {
        format!(
            "{}, {}, {}, {}",
            region, self.district, self.state, self.country
        )
    }
}

/// Outcome of resolving a set of region names.
///
/// `results` only holds regions that resolved; misses are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Resolution {
    /// Original (trimmed, un-qualified) region name to coordinate.
    pub results: HashMap<String, Coordinate>,
    /// Number of distinct non-blank region names requested.
    pub requested: usize,
    /// Which tier answered each resolved region.
    pub tiers: TierCounts,
}

/// Per-tier hit counts for a resolution run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub from_static: usize,
    pub from_cache: usize,
    pub from_remote: usize,
}

impl Resolution {
    /// Number of regions that resolved.
    pub fn resolved(&self) -> usize {
        self.results.len()
    }

    /// `round(100 * resolved / requested)`, or 0 when nothing was requested.
    pub fn success_rate_percent(&self) -> u8 {
        success_rate(self.resolved(), self.requested)
    }

    /// Look up a region's coordinate.
    pub fn get(&self, region: &str) -> Option<&Coordinate> {
        self.results.get(region)
    }
}

/// Percentage of `resolved` out of `requested`, rounded to the nearest integer.
pub fn success_rate(resolved: usize, requested: usize) -> u8 {
    if requested == 0 {
        return 0;
    }
    let pct = (100.0 * resolved as f64 / requested as f64).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Trim names, drop blanks and keep the first occurrence of each.
pub(crate) fn unique_non_blank<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for name in names {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            out.push(trimmed.to_string());
        }
    }
    out
}
