//! The search flow behind `POST /api/search` and `leadscout search`.
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use leadscout_common::{
    Lead, LeadFields, LeadscoutError, SearchCenter, SearchRequest, SearchResponse,
};
use leadscout_places::{NearbyPlace, PlaceDetails, PlacesError, PlacesProvider};
use leadscout_store::LeadStore;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

pub const DEFAULT_DETAILS_CONCURRENCY: usize = 4;

const UNKNOWN_NAME: &str = "Unknown";

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error(transparent)]
    Places(#[from] PlacesError),

    #[error("storage: {0}")]
    Storage(String),
}

impl From<LeadscoutError> for SearchError {
    fn from(e: LeadscoutError) -> Self {
        match e {
            LeadscoutError::InvalidRequest(m) => SearchError::InvalidRequest(m),
            LeadscoutError::LocationNotFound(l) => SearchError::LocationNotFound(l),
            LeadscoutError::Storage(m) => SearchError::Storage(m),
            other => SearchError::Storage(other.to_string()),
        }
    }
}

/// Destination for leads produced by a search.
#[async_trait]
pub trait LeadSink: Send + Sync {
    async fn save_leads(&self, leads: &[Lead]) -> leadscout_common::Result<u64>;
}

#[async_trait]
impl LeadSink for LeadStore {
    async fn save_leads(&self, leads: &[Lead]) -> leadscout_common::Result<u64> {
        self.insert_leads(leads)
            .await
            .map_err(|e| LeadscoutError::Storage(e.to_string()))
    }
}

/// Link that opens the place in Google Maps.
pub fn google_maps_url(place_id: &str) -> String {
    format!("https://www.google.com/maps/place/?q=place_id:{place_id}")
}

/// Lower-case a category and join words with `_` so "Coffee Shop" meets Google's `coffee_shop`.
pub fn normalize_category(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_ascii_lowercase()
}

pub struct LeadSearch<P: ?Sized> {
    provider: Arc<P>,
    sink: Arc<dyn LeadSink>,
    details_concurrency: usize,
}

impl<P> LeadSearch<P>
where
    P: PlacesProvider + ?Sized,
{
    pub fn new(provider: Arc<P>, sink: Arc<dyn LeadSink>) -> Self {
        Self {
            provider,
            sink,
            details_concurrency: DEFAULT_DETAILS_CONCURRENCY,
        }
    }

    pub fn with_details_concurrency(mut self, n: usize) -> Self {
        self.details_concurrency = n.max(1);
        self
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    pub async fn run(&self, req: &SearchRequest) -> Result<SearchResponse, SearchError> {
        req.validate()?;
        let started = Instant::now();
        tracing::info!(
            target: "search",
            query = %req.query,
            location = %req.location,
            radius = req.radius,
            min_rating = ?req.min_rating,
            has_website = ?req.has_website,
            "search.start"
        );

        let center = self
            .provider
            .geocode(&req.location)
            .await?
            .ok_or_else(|| SearchError::LocationNotFound(req.location.clone()))?;

        let nearby = self
            .provider
            .nearby(center, req.radius, req.query.trim())
            .await?;
        let nearby_count = nearby.len();

        let categories: HashSet<String> = req
            .effective_categories()
            .into_iter()
            .map(normalize_category)
            .collect();
        let candidates: Vec<NearbyPlace> = nearby
            .into_iter()
            .filter(|p| matches_categories(p, &categories))
            .collect();

        let provider = &self.provider;
        let detailed: Vec<(NearbyPlace, Option<PlaceDetails>)> = stream::iter(candidates)
            .map(|place| async move {
                let details = provider.details(&place.place_id).await?;
                Ok::<_, PlacesError>((place, details))
            })
            .buffered(self.details_concurrency)
            .try_collect()
            .await?;

        let min_rating = req.effective_min_rating();
        let leads: Vec<Lead> = detailed
            .into_iter()
            .filter_map(|(place, details)| match details {
                Some(d) => Some(build_lead(&place, d)),
                None => {
                    tracing::debug!(target: "search", place_id = %place.place_id, "search.details.skipped");
                    None
                }
            })
            .filter(|lead| passes_filters(lead, min_rating, req.has_website))
            .collect();

        if !leads.is_empty() {
            self.sink.save_leads(&leads).await?;
        }

        tracing::info!(
            target: "search",
            query = %req.query,
            nearby = nearby_count,
            leads = leads.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search.done"
        );

        Ok(SearchResponse::new(
            leads,
            SearchCenter {
                lat: center.lat,
                lng: center.lng,
                address: req.location.clone(),
            },
        ))
    }
}

fn matches_categories(place: &NearbyPlace, categories: &HashSet<String>) -> bool {
    categories.is_empty()
        || place
            .types
            .iter()
            .any(|t| categories.contains(&normalize_category(t)))
}

fn passes_filters(lead: &Lead, min_rating: Option<f64>, has_website: Option<bool>) -> bool {
    if let Some(floor) = min_rating {
        if lead.rating.unwrap_or(0.0) < floor {
            return false;
        }
    }
    has_website.is_none_or(|want| lead.has_website == want)
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

fn build_lead(place: &NearbyPlace, d: PlaceDetails) -> Lead {
    let location = d.location.or(place.location);
    Lead::new(LeadFields {
        name: non_blank(d.name)
            .or_else(|| non_blank(place.name.clone()))
            .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
        address: d.formatted_address.unwrap_or_default(),
        phone: non_blank(d.formatted_phone_number),
        website: non_blank(d.website),
        google_maps_url: google_maps_url(&place.place_id),
        rating: d.rating,
        review_count: d.user_ratings_total,
        latitude: location.map(|p| p.lat).unwrap_or(0.0),
        longitude: location.map(|p| p.lng).unwrap_or(0.0),
    })
}
