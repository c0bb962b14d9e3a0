//! Google Maps Geocoding and Places integration.
//!
//! - [`PlacesProvider`]: the seam the search pipeline talks to
//! - [`GoogleMapsClient`]: the production implementation over `leadscout-http`
//! - [`types`]: raw response envelopes as Google sends them
//!
//! Searches are single-page: a nearby search returns at most one page of
//! results and `next_page_token` is never followed.

pub mod client;
pub mod types;

pub use client::GoogleMapsClient;

use async_trait::async_trait;
use leadscout_http::HttpError;
use serde::{Deserialize, Serialize};

/// Google's nearby search radius bounds, in metres.
pub const MIN_RADIUS_M: u32 = 1;
pub const MAX_RADIUS_M: u32 = 50_000;

/// Clamp a requested radius into the range the Places API accepts.
pub fn clamp_radius(radius_m: u32) -> u32 {
    radius_m.clamp(MIN_RADIUS_M, MAX_RADIUS_M)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// One hit from a nearby search. Only enough to decide whether to fetch details.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyPlace {
    pub place_id: String,
    pub name: Option<String>,
    pub types: Vec<String>,
    pub rating: Option<f64>,
    pub location: Option<GeoPoint>,
}

/// The detail fields a lead is built from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceDetails {
    pub name: Option<String>,
    pub formatted_address: Option<String>,
    pub formatted_phone_number: Option<String>,
    pub website: Option<String>,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
    pub location: Option<GeoPoint>,
}

#[derive(Debug, thiserror::Error)]
pub enum PlacesError {
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Google answered, but with a non-success `status` field.
    #[error("{endpoint} returned {status}: {message}")]
    Status {
        endpoint: &'static str,
        status: String,
        message: String,
    },
}

#[async_trait]
pub trait PlacesProvider: Send + Sync {
    /// Resolve free-form location text to coordinates. `None` when nothing matched.
    async fn geocode(&self, location: &str) -> Result<Option<GeoPoint>, PlacesError>;

    /// Establishments around `center` matching `keyword`.
    async fn nearby(
        &self,
        center: GeoPoint,
        radius_m: u32,
        keyword: &str,
    ) -> Result<Vec<NearbyPlace>, PlacesError>;

    /// Contact and rating details. `None` when the place no longer exists.
    async fn details(&self, place_id: &str) -> Result<Option<PlaceDetails>, PlacesError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_is_clamped() {
        assert_eq!(clamp_radius(0), 1);
        assert_eq!(clamp_radius(20_000), 20_000);
        assert_eq!(clamp_radius(90_000), 50_000);
    }
}
