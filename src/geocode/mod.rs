//! Geocoding: the remote client, throttled batching and the tiered service.

pub mod batch;
pub mod remote;
pub mod service;
pub mod types;

pub use batch::{BatchResolver, CancellationToken, Pause, ThreadPause, DEFAULT_REQUEST_DELAY};
pub use remote::{
    first_coordinate, Geocoder, NominatimClient, OfflineGeocoder, DEFAULT_ENDPOINT,
    DEFAULT_TIMEOUT, DEFAULT_USER_AGENT,
};
pub use service::GeocodingService;
pub use types::{
    success_rate, Coordinate, LocationContext, Resolution, TierCounts, DEFAULT_COUNTRY,
    DEFAULT_DISTRICT, DEFAULT_STATE,
};
