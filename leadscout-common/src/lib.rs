//! Common types and utilities shared across leadscout crates.
//!
//! This crate defines the lead domain model, the wire shapes of the search API,
//! output formats, observability helpers, and the shared error type used
//! throughout the leadscout workspace. It has no HTTP or storage dependencies.
//!
//! # Overview
//!
//! - [`Lead`]: a business record produced by a search
//! - [`SearchRequest`] / [`SearchResponse`] / [`SearchCenter`]: `POST /api/search` shapes
//! - [`StatusCheck`]: client heartbeat records
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`LeadscoutError`] and [`Result`]: Shared error handling
//! - [`OutputFormat`]: how the CLI renders leads
//!
//! # Examples
//!
//! ```rust
//! use leadscout_common::{SearchRequest, DEFAULT_RADIUS_M};
//!
//! let req: SearchRequest =
//!     serde_json::from_str(r#"{"query":"bakery","location":"Paris, France"}"#).unwrap();
//! assert_eq!(req.radius, DEFAULT_RADIUS_M);
//! assert!(req.validate().is_ok());
//! ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub mod observability;

/// Search radius used when a request omits one (20 km).
pub const DEFAULT_RADIUS_M: u32 = 20_000;

/// A business record returned by a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    pub google_maps_url: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u32>,
    pub has_website: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
}

/// Everything about a lead except its identity and timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadFields {
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub google_maps_url: String,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub latitude: f64,
    pub longitude: f64,
}

impl Lead {
    /// Mint a lead with a fresh id and `created_at = now`.
    ///
    /// `has_website` is derived from `website` being present and non-blank.
    pub fn new(fields: LeadFields) -> Self {
        let has_website = fields
            .website
            .as_deref()
            .is_some_and(|w| !w.trim().is_empty());
        Self {
            id: Uuid::new_v4(),
            name: fields.name,
            address: fields.address,
            phone: fields.phone,
            website: fields.website,
            google_maps_url: fields.google_maps_url,
            rating: fields.rating,
            review_count: fields.review_count,
            has_website,
            latitude: fields.latitude,
            longitude: fields.longitude,
            created_at: Utc::now(),
        }
    }
}

fn default_radius() -> u32 {
    DEFAULT_RADIUS_M
}

/// Body of `POST /api/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub location: String,
    /// Metres around the geocoded location.
    #[serde(default = "default_radius")]
    pub radius: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_website: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            location: location.into(),
            radius: DEFAULT_RADIUS_M,
            min_rating: None,
            has_website: None,
            categories: None,
        }
    }

    /// Reject requests the upstream APIs cannot answer meaningfully.
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(LeadscoutError::InvalidRequest("query must not be empty".into()));
        }
        if self.location.trim().is_empty() {
            return Err(LeadscoutError::InvalidRequest(
                "location must not be empty".into(),
            ));
        }
        if let Some(r) = self.min_rating {
            if !r.is_finite() {
                return Err(LeadscoutError::InvalidRequest(
                    "min_rating must be a finite number".into(),
                ));
            }
        }
        Ok(())
    }

    /// Rating floor, if one is in force. Zero or negative floors filter nothing.
    pub fn effective_min_rating(&self) -> Option<f64> {
        self.min_rating.filter(|r| *r > 0.0)
    }

    /// Non-blank category names, if any were supplied.
    pub fn effective_categories(&self) -> Vec<&str> {
        self.categories
            .iter()
            .flatten()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect()
    }
}

/// The geocoded center of a search. `address` echoes the requested location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCenter {
    pub lat: f64,
    pub lng: f64,
    pub address: String,
}

/// Body returned from `POST /api/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub leads: Vec<Lead>,
    pub total_count: usize,
    pub search_center: SearchCenter,
}

impl SearchResponse {
    pub fn new(leads: Vec<Lead>, search_center: SearchCenter) -> Self {
        Self {
            total_count: leads.len(),
            leads,
            search_center,
        }
    }
}

/// A client heartbeat record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCheck {
    pub id: Uuid,
    pub client_name: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusCheckCreate {
    pub client_name: String,
}

impl From<StatusCheckCreate> for StatusCheck {
    fn from(input: StatusCheckCreate) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_name: input.client_name,
            timestamp: Utc::now(),
        }
    }
}

/// Preferred output format for rendered leads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
    GeoJson,
}

impl FromStr for OutputFormat {
    type Err = LeadscoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "geojson" => Ok(Self::GeoJson),
            other => Err(LeadscoutError::InvalidRequest(format!(
                "unknown output format '{other}' (expected table, json, csv or geojson)"
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Csv => "csv",
            Self::GeoJson => "geojson",
        };
        f.write_str(s)
    }
}

/// Error types used across leadscout.
#[derive(thiserror::Error, Debug)]
pub enum LeadscoutError {
    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The requested location could not be geocoded.
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    /// Google Maps (or another upstream) failed.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Persistence failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The caller sent something we cannot act on.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Operation exceeded the configured timeout.
    #[error("Timeout occurred")]
    Timeout,
}

/// Convenient alias for results that use [`LeadscoutError`].
pub type Result<T> = std::result::Result<T, LeadscoutError>;
