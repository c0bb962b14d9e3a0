//! Google Maps web-service client with leadscout defaults.
//!
//! Handles the API key, request parameter shaping and Google's in-body `status`
//! codes before handing typed results to the search pipeline.
use crate::types::{
    GeocodeResponse, NearbySearchResponse, PlaceDetailsResponse, STATUS_NOT_FOUND, STATUS_OK,
    STATUS_ZERO_RESULTS,
};
use crate::{GeoPoint, NearbyPlace, PlaceDetails, PlacesError, PlacesProvider, clamp_radius};
use async_trait::async_trait;
use leadscout_http::{Auth, HttpClient, RequestOpts};
use std::borrow::Cow;
use std::time::{Duration, Instant};

pub const GOOGLE_MAPS_API_BASE: &str = "https://maps.googleapis.com/maps/api/";

const DETAIL_FIELDS: &str =
    "name,formatted_address,formatted_phone_number,website,rating,user_ratings_total,geometry";

#[derive(Clone)]
pub struct GoogleMapsClient {
    http: HttpClient,
    api_key: String,
}

impl GoogleMapsClient {
    /// Client against the public Google endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self, PlacesError> {
        Self::with_endpoint(api_key, GOOGLE_MAPS_API_BASE)
    }

    /// Client against an alternative base URL (proxies, test servers).
    pub fn with_endpoint(api_key: impl Into<String>, endpoint: &str) -> Result<Self, PlacesError> {
        let base = if endpoint.ends_with('/') {
            Cow::Borrowed(endpoint)
        } else {
            Cow::Owned(format!("{endpoint}/"))
        };
        Ok(Self {
            http: HttpClient::new(&base)?,
            api_key: api_key.into(),
        })
    }

    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.http = self.http.with_timeout(dur);
        self
    }

    pub fn with_retries(mut self, n: usize) -> Self {
        self.http = self.http.with_retries(n);
        self
    }

    fn opts<'a>(&'a self, query: Vec<(&'a str, Cow<'a, str>)>) -> RequestOpts<'a> {
        RequestOpts {
            auth: Some(Auth::Query {
                name: "key",
                value: Cow::Borrowed(&self.api_key),
            }),
            query: Some(query),
            ..Default::default()
        }
    }
}

fn status_error(endpoint: &'static str, status: String, message: Option<String>) -> PlacesError {
    PlacesError::Status {
        endpoint,
        status,
        message: message.unwrap_or_else(|| "no error_message in response".into()),
    }
}

#[async_trait]
impl PlacesProvider for GoogleMapsClient {
    async fn geocode(&self, location: &str) -> Result<Option<GeoPoint>, PlacesError> {
        let started = Instant::now();
        tracing::info!(target: "places", location = %location, "places.geocode.start");

        let resp: GeocodeResponse = self
            .http
            .get_json("geocode/json", self.opts(vec![("address", location.into())]))
            .await?;

        match resp.status.as_str() {
            STATUS_OK | STATUS_ZERO_RESULTS => {
                let first = resp.results.into_iter().next();
                let resolved = first.as_ref().and_then(|r| r.formatted_address.clone());
                let point = first.map(|r| GeoPoint::from(r.geometry.location));
                tracing::info!(
                    target: "places",
                    location = %location,
                    resolved = ?resolved,
                    found = point.is_some(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "places.geocode.done"
                );
                Ok(point)
            }
            _ => {
                tracing::warn!(
                    target: "places",
                    location = %location,
                    status = %resp.status,
                    message = ?resp.error_message,
                    "places.geocode.error"
                );
                Err(status_error("geocode", resp.status, resp.error_message))
            }
        }
    }

    async fn nearby(
        &self,
        center: GeoPoint,
        radius_m: u32,
        keyword: &str,
    ) -> Result<Vec<NearbyPlace>, PlacesError> {
        let started = Instant::now();
        let radius = clamp_radius(radius_m);
        let params: Vec<(&str, Cow<'_, str>)> = vec![
            ("location", format!("{},{}", center.lat, center.lng).into()),
            ("radius", radius.to_string().into()),
            ("keyword", keyword.into()),
            ("type", "establishment".into()),
        ];

        let resp: NearbySearchResponse = self
            .http
            .get_json("place/nearbysearch/json", self.opts(params))
            .await?;

        match resp.status.as_str() {
            STATUS_OK | STATUS_ZERO_RESULTS => {
                let places: Vec<NearbyPlace> = resp.results.into_iter().map(Into::into).collect();
                tracing::info!(
                    target: "places",
                    keyword = %keyword,
                    radius,
                    hit_count = places.len(),
                    more_pages = resp.next_page_token.is_some(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "places.nearby.done"
                );
                Ok(places)
            }
            _ => {
                tracing::warn!(
                    target: "places",
                    keyword = %keyword,
                    status = %resp.status,
                    message = ?resp.error_message,
                    "places.nearby.error"
                );
                Err(status_error("nearbysearch", resp.status, resp.error_message))
            }
        }
    }

    async fn details(&self, place_id: &str) -> Result<Option<PlaceDetails>, PlacesError> {
        let params: Vec<(&str, Cow<'_, str>)> = vec![
            ("place_id", place_id.into()),
            ("fields", DETAIL_FIELDS.into()),
        ];

        let resp: PlaceDetailsResponse = self
            .http
            .get_json("place/details/json", self.opts(params))
            .await?;

        match resp.status.as_str() {
            STATUS_OK => Ok(resp.result.map(Into::into)),
            STATUS_NOT_FOUND | STATUS_ZERO_RESULTS => {
                tracing::debug!(target: "places", place_id = %place_id, status = %resp.status, "places.details.missing");
                Ok(None)
            }
            _ => {
                tracing::warn!(
                    target: "places",
                    place_id = %place_id,
                    status = %resp.status,
                    message = ?resp.error_message,
                    "places.details.error"
                );
                Err(status_error("details", resp.status, resp.error_message))
            }
        }
    }
}
