//! Curated region-name to coordinate table.
//!
//! The table is the highest-confidence tier: names are matched exactly (after
//! trimming) in their original script, so Devanagari taluka names never go
//! through the remote geocoder. The table is read at most once per
//! [`StaticLookupTable`] instance; a missing or malformed source yields an
//! empty table that stays empty.

pub mod builder;

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use serde_json::Value;
use tracing::{debug, warn};

use crate::geocode::Coordinate;

pub use builder::{build_table, BoundingBox, TableBuild, TableRequest};

/// Table compiled into the binary: Sangli district talukas.
pub const BUNDLED_TABLE: &str = include_str!("../../data/taluka-coords.json");

/// Where the table is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticSource {
    /// The table compiled into the binary.
    Bundled,
    /// A JSON file on disk.
    File(PathBuf),
    /// No table.
    Empty,
}

/// Lazily loaded, memoized lookup table.
#[derive(Debug)]
pub struct StaticLookupTable {
    source: StaticSource,
    table: OnceLock<HashMap<String, Coordinate>>,
}

impl StaticLookupTable {
    /// Create a table that loads from `source` on first use.
    pub fn new(source: StaticSource) -> Self {
        Self {
            source,
            table: OnceLock::new(),
        }
    }

    /// Table backed by the bundled resource.
    pub fn bundled() -> Self {
        Self::new(StaticSource::Bundled)
    }

    /// Table backed by a JSON file.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self::new(StaticSource::File(path.into()))
    }

    /// Table that is always empty.
    pub fn empty() -> Self {
        Self::new(StaticSource::Empty)
    }

    /// Already-loaded table built from explicit entries.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Coordinate)>,
        S: AsRef<str>,
    {
        let table = entries
            .into_iter()
            .map(|(name, coords)| (name.as_ref().trim().to_string(), coords))
            .collect();
        let lock = OnceLock::new();
        let _ = lock.set(table);
        Self {
            source: StaticSource::Empty,
            table: lock,
        }
    }

    /// The configured source.
    pub fn source(&self) -> &StaticSource {
        &self.source
    }

    /// Whether the table has been read.
    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }

    /// Load the table, reading the source on the first call only.
    pub fn load(&self) -> &HashMap<String, Coordinate> {
        self.table.get_or_init(|| {
            let table = read_source(&self.source);
            debug!("Loaded {} static coordinates from {:?}", table.len(), self.source);
            table
        })
    }

    /// Exact-match lookup on the trimmed name.
    pub fn get(&self, name: &str) -> Option<Coordinate> {
        self.load().get(name.trim()).copied()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.load().len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.load().is_empty()
    }
}

impl Default for StaticLookupTable {
    fn default() -> Self {
        Self::bundled()
    }
}

fn read_source(source: &StaticSource) -> HashMap<String, Coordinate> {
    match source {
        StaticSource::Bundled => parse_table(BUNDLED_TABLE),
        StaticSource::File(path) => match fs::read_to_string(path) {
            Ok(json) => parse_table(&json),
            Err(e) => {
                warn!("Static coordinate table {:?} unavailable: {}", path, e);
                HashMap::new()
            }
        },
        StaticSource::Empty => HashMap::new(),
    }
}

/// Parse a `{ name: { lat, lon } }` object.
///
/// Entries whose `lat` and `lon` are not both JSON numbers are dropped.
/// Anything other than an object yields an empty table.
pub fn parse_table(json: &str) -> HashMap<String, Coordinate> {
    let value: Value = match serde_json::from_str(json) {
        Ok(v) => v,
        Err(e) => {
            warn!("Static coordinate table is not valid JSON: {}", e);
            return HashMap::new();
        }
    };

    let Value::Object(map) = value else {
        warn!("Static coordinate table is not a JSON object");
        return HashMap::new();
    };

    let mut table = HashMap::with_capacity(map.len());
    for (name, entry) in map {
        let lat = entry.get("lat").and_then(Value::as_f64);
        let lon = entry.get("lon").and_then(Value::as_f64);
        match (lat, lon) {
            (Some(lat), Some(lon)) => {
                table.insert(name.trim().to_string(), Coordinate::new(lat, lon));
            }
            _ => debug!("Dropping malformed static entry {:?}", name),
        }
    }
    table
}
