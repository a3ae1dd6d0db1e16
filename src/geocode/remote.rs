//! Remote geocoding over the Nominatim search API.
//!
//! Provides a blocking HTTP client that turns a free-text location into the
//! first matching coordinate. Every failure mode collapses to `None`.

use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::types::Coordinate;
use crate::error::{GeoError, Result};

/// Public Nominatim search endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";

/// Client identification sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Wildlife-Call-Management-Dashboard/1.0";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolves a single location string to a coordinate.
pub trait Geocoder {
    /// Best match for `location`, or `None` when nothing usable came back.
    fn geocode(&self, location: &str) -> Option<Coordinate>;
}

impl<G: Geocoder + ?Sized> Geocoder for &G {
    fn geocode(&self, location: &str) -> Option<Coordinate> {
        (**self).geocode(location)
    }
}

impl<G: Geocoder + ?Sized> Geocoder for Box<G> {
    fn geocode(&self, location: &str) -> Option<Coordinate> {
        (**self).geocode(location)
    }
}

/// Geocoder that never resolves anything. Used when network access is off.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineGeocoder;

impl Geocoder for OfflineGeocoder {
    fn geocode(&self, location: &str) -> Option<Coordinate> {
        debug!("Offline: skipping remote lookup for {:?}", location);
        None
    }
}

/// Nominatim search client.
pub struct NominatimClient {
    client: Client,
    endpoint: String,
    user_agent: String,
    timeout: Duration,
}

impl NominatimClient {
    /// Client for the public endpoint with default timeout.
    pub fn new() -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT, DEFAULT_USER_AGENT, DEFAULT_TIMEOUT)
    }

    /// Client for a custom endpoint, user agent and timeout.
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        user_agent: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            user_agent: user_agent.into(),
            timeout,
        })
    }

    /// Get the configured endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Request URL for a location query.
    pub fn query_url(&self, location: &str) -> String {
        format!(
            "{}?q={}&format=json&limit=1",
            self.endpoint,
            urlencoding::encode(location.trim())
        )
    }

    /// Issue one search request.
    ///
    /// `Ok(None)` means the service answered with no usable result.
    pub fn search(&self, location: &str) -> Result<Option<Coordinate>> {
        let response = self
            .client
            .get(self.query_url(location))
            .header(USER_AGENT, &self.user_agent)
            .send()?;

        if !response.status().is_success() {
            return Err(GeoError::HttpStatus {
                status: response.status().as_u16(),
            });
        }

        let body: Value = response.json()?;
        Ok(first_coordinate(&body))
    }
}

impl Geocoder for NominatimClient {
    fn geocode(&self, location: &str) -> Option<Coordinate> {
        if location.trim().is_empty() {
            warn!("Empty location name provided to geocoder");
            return None;
        }

        debug!("Geocoding {:?}", location);
        match self.search(location) {
            Ok(Some(coords)) => {
                info!("Geocoded: {} -> {}", location, coords);
                Some(coords)
            }
            Ok(None) => {
                warn!("No coordinates found for location: {}", location);
                None
            }
            Err(e) => {
                warn!("Error geocoding location {:?}: {}", location, e);
                None
            }
        }
    }
}

/// Coordinate of the first element of a search response array.
///
/// `lat`/`lon` may be strings (as Nominatim sends them) or numbers.
pub fn first_coordinate(body: &Value) -> Option<Coordinate> {
    let first = body.as_array()?.first()?;
    let lat = parse_degree(first.get("lat")?)?;
    let lon = parse_degree(first.get("lon")?)?;
    Some(Coordinate::new(lat, lon))
}

fn parse_degree(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Number(n) => n.as_f64()?,
        _ => return None,
    };
    parsed.is_finite().then_some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> NominatimClient {
        NominatimClient::with_endpoint(
            server.url("/search"),
            DEFAULT_USER_AGENT,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn default_client_uses_public_endpoint() {
        let client = NominatimClient::new().unwrap();
        assert_eq!(client.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn query_url_encodes_location() {
        let client = NominatimClient::new().unwrap();
        let url = client.query_url(" Atpadi, Sangli, Maharashtra, India ");
        assert_eq!(
            url,
            "https://nominatim.openstreetmap.org/search?q=Atpadi%2C%20Sangli%2C%20Maharashtra%2C%20India&format=json&limit=1"
        );
    }

    #[test]
    fn first_coordinate_parses_strings() {
        let body = json!([{ "lat": "17.2700", "lon": "74.9800", "display_name": "Atpadi" }]);
        assert_eq!(first_coordinate(&body), Some(Coordinate::new(17.27, 74.98)));
    }

    #[test]
    fn first_coordinate_parses_numbers() {
        let body = json!([{ "lat": 16.5, "lon": 74.1 }]);
        assert_eq!(first_coordinate(&body), Some(Coordinate::new(16.5, 74.1)));
    }

    #[test]
    fn first_coordinate_rejects_bad_shapes() {
        assert_eq!(first_coordinate(&json!([])), None);
        assert_eq!(first_coordinate(&json!({ "lat": "1", "lon": "2" })), None);
        assert_eq!(first_coordinate(&json!([{ "lat": "abc", "lon": "2" }])), None);
        assert_eq!(first_coordinate(&json!([{ "lat": "1" }])), None);
        assert_eq!(first_coordinate(&json!([{ "lat": "NaN", "lon": "2" }])), None);
    }

    #[test]
    fn geocode_returns_first_result() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/search")
                .query_param("q", "Miraj, Sangli, Maharashtra, India")
                .query_param("format", "json")
                .query_param("limit", "1")
                .header("User-Agent", DEFAULT_USER_AGENT);
            then.status(200).json_body(json!([
                { "lat": "16.8222", "lon": "74.6450" },
                { "lat": "0", "lon": "0" }
            ]));
        });

        let client = client_for(&server);
        let coords = client.geocode("Miraj, Sangli, Maharashtra, India");

        assert_eq!(coords, Some(Coordinate::new(16.8222, 74.645)));
        mock.assert_calls(1);
    }

    #[test]
    fn geocode_empty_array_is_none() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/search");
            then.status(200).json_body(json!([]));
        });

        assert_eq!(client_for(&server).geocode("Unknown Place"), None);
    }

    #[test]
    fn geocode_http_error_is_none() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/search");
            then.status(503);
        });

        assert_eq!(client_for(&server).geocode("Jat"), None);
        // No retry
        mock.assert_calls(1);
    }

    #[test]
    fn search_reports_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/search");
            then.status(429);
        });

        let err = client_for(&server).search("Jat").unwrap_err();
        assert!(matches!(err, GeoError::HttpStatus { status: 429 }));
    }

    #[test]
    fn geocode_malformed_body_is_none() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/search");
            then.status(200).body("<html>not json</html>");
        });

        assert_eq!(client_for(&server).geocode("Palus"), None);
    }

    #[test]
    fn geocode_blank_location_skips_request() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/search");
            then.status(200).json_body(json!([]));
        });

        assert_eq!(client_for(&server).geocode("   "), None);
        mock.assert_calls(0);
    }

    #[test]
    fn unreachable_endpoint_is_none() {
        let client = NominatimClient::with_endpoint(
            "http://127.0.0.1:9/search",
            DEFAULT_USER_AGENT,
            Duration::from_millis(500),
        )
        .unwrap();
        assert_eq!(client.geocode("Jat"), None);
    }

    #[test]
    fn offline_geocoder_never_resolves() {
        assert_eq!(OfflineGeocoder.geocode("Jat"), None);
    }
}
