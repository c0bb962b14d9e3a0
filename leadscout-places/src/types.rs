//! Raw Google Maps web-service envelopes.
//!
//! Every response carries a `status` string; HTTP 200 does not mean success.
//! Fields we never read are left out and ignored during deserialization.
use crate::{GeoPoint, NearbyPlace, PlaceDetails};
use serde::Deserialize;

pub const STATUS_OK: &str = "OK";
pub const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";
pub const STATUS_NOT_FOUND: &str = "NOT_FOUND";

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResult {
    #[serde(default)]
    pub formatted_address: Option<String>,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<LatLng> for GeoPoint {
    fn from(l: LatLng) -> Self {
        GeoPoint {
            lat: l.lat,
            lng: l.lng,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NearbySearchResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub results: Vec<NearbyResult>,
    /// Present when more pages exist.
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NearbyResult {
    pub place_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

impl From<NearbyResult> for NearbyPlace {
    fn from(r: NearbyResult) -> Self {
        NearbyPlace {
            place_id: r.place_id,
            name: r.name,
            types: r.types,
            rating: r.rating,
            location: r.geometry.map(|g| g.location.into()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceDetailsResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub result: Option<PlaceDetailsResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceDetailsResult {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub formatted_phone_number: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub user_ratings_total: Option<u32>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

impl From<PlaceDetailsResult> for PlaceDetails {
    fn from(r: PlaceDetailsResult) -> Self {
        PlaceDetails {
            name: r.name,
            formatted_address: r.formatted_address,
            formatted_phone_number: r.formatted_phone_number,
            website: r.website,
            rating: r.rating,
            user_ratings_total: r.user_ratings_total,
            location: r.geometry.map(|g| g.location.into()),
        }
    }
}
