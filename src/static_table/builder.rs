//! Generates a static table by geocoding region names once.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::error::{GeoError, Result};
use crate::geocode::{BatchResolver, Coordinate, LocationContext};
use crate::progress::ProgressSink;

/// Latitude/longitude window a generated coordinate must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Default for BoundingBox {
    /// Sangli district.
    fn default() -> Self {
        Self {
            min_lat: 16.5,
            max_lat: 17.6,
            min_lon: 73.7,
            max_lon: 75.4,
        }
    }
}

impl BoundingBox {
    /// Whether `coords` lies inside the box, edges included.
    pub fn contains(&self, coords: &Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&coords.lat)
            && (self.min_lon..=self.max_lon).contains(&coords.lon)
    }

    /// Reject boxes whose minimum exceeds their maximum.
    pub fn validate(&self) -> Result<()> {
        if self.min_lat > self.max_lat {
            return Err(GeoError::ConfigValidationError {
                message: format!(
                    "bounds.min_lat ({}) is greater than bounds.max_lat ({})",
                    self.min_lat, self.max_lat
                ),
            });
        }
        if self.min_lon > self.max_lon {
            return Err(GeoError::ConfigValidationError {
                message: format!(
                    "bounds.min_lon ({}) is greater than bounds.max_lon ({})",
                    self.min_lon, self.max_lon
                ),
            });
        }
        Ok(())
    }
}

/// One table row to generate.
///
/// `key` is the name stored in the table; `query` is what gets geocoded.
/// They differ when the table is keyed in one script and searched in another,
/// e.g. `जत=Jat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRequest {
    pub key: String,
    pub query: String,
}

impl TableRequest {
    /// Parse `key=query` or a bare name used for both.
    pub fn parse(input: &str) -> Option<Self> {
        let (key, query) = match input.split_once('=') {
            Some((key, query)) => (key.trim(), query.trim()),
            None => (input.trim(), input.trim()),
        };
        if key.is_empty() || query.is_empty() {
            return None;
        }
        Some(Self {
            key: key.to_string(),
            query: query.to_string(),
        })
    }
}

/// Result of a table build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableBuild {
    pub table: BTreeMap<String, Coordinate>,
    pub not_found: Vec<String>,
    pub out_of_bounds: Vec<(String, Coordinate)>,
}

impl TableBuild {
    /// Number of rejected rows.
    pub fn rejected(&self) -> usize {
        self.not_found.len() + self.out_of_bounds.len()
    }

    /// Table in the `{ name: { lat, lon } }` format, coordinates at 4 decimals.
    pub fn to_json(&self) -> Result<String> {
        let mut map = Map::new();
        for (name, coords) in &self.table {
            map.insert(
                name.clone(),
                json!({ "lat": round4(coords.lat), "lon": round4(coords.lon) }),
            );
        }
        Ok(serde_json::to_string_pretty(&Value::Object(map))?)
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Geocode `requests` within `context` and collect a table.
///
/// Rows with no match go to `not_found`; rows outside `bounds` go to
/// `out_of_bounds`.
pub fn build_table(
    requests: &[TableRequest],
    context: &LocationContext,
    batch: &BatchResolver<'_>,
    bounds: Option<&BoundingBox>,
    progress: &mut dyn ProgressSink,
) -> TableBuild {
    let queries: Vec<String> = requests.iter().map(|r| context.qualify(&r.query)).collect();
    let fetched = batch.resolve_batch(&queries, progress);

    let mut build = TableBuild::default();
    for (request, query) in requests.iter().zip(&queries) {
        if build.table.contains_key(&request.key) {
            continue;
        }
        match fetched.get(query) {
            Some(coords) if bounds.map_or(true, |b| b.contains(coords)) => {
                build.table.insert(request.key.clone(), *coords);
            }
            Some(coords) => {
                warn!("{} ({}) out of expected range: {}", request.key, request.query, coords);
                build.out_of_bounds.push((request.key.clone(), *coords));
            }
            None => build.not_found.push(request.key.clone()),
        }
    }

    info!(
        "Table build: {} fetched, {} rejected",
        build.table.len(),
        build.rejected()
    );
    build
}
