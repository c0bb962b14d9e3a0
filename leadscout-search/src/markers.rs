//! GeoJSON map markers for leads.
//!
//! Leads with a website get a green `with-website` marker, the rest a red
//! `no-website` marker. Coordinates are `[lng, lat]` as GeoJSON requires.
use leadscout_common::{Lead, SearchCenter};
use serde::Serialize;

pub const WITH_WEBSITE_MARKER: &str = "with-website";
pub const NO_WEBSITE_MARKER: &str = "no-website";
pub const WITH_WEBSITE_COLOR: &str = "#16a34a";
pub const NO_WEBSITE_COLOR: &str = "#dc2626";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerCollection {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<SearchCenter>,
    pub features: Vec<MarkerFeature>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerFeature {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
    pub geometry: PointGeometry,
    pub properties: MarkerProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointGeometry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub coordinates: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerProperties {
    pub id: String,
    pub name: String,
    pub address: String,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub has_website: bool,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub google_maps_url: String,
    pub marker: &'static str,
    #[serde(rename = "marker-color")]
    pub marker_color: &'static str,
}

impl MarkerFeature {
    pub fn from_lead(lead: &Lead) -> Self {
        let (marker, marker_color) = if lead.has_website {
            (WITH_WEBSITE_MARKER, WITH_WEBSITE_COLOR)
        } else {
            (NO_WEBSITE_MARKER, NO_WEBSITE_COLOR)
        };
        let id = lead.id.to_string();
        Self {
            kind: "Feature",
            id: id.clone(),
            geometry: PointGeometry {
                kind: "Point",
                coordinates: [lead.longitude, lead.latitude],
            },
            properties: MarkerProperties {
                id,
                name: lead.name.clone(),
                address: lead.address.clone(),
                rating: lead.rating,
                review_count: lead.review_count,
                has_website: lead.has_website,
                website: lead.website.clone(),
                phone: lead.phone.clone(),
                google_maps_url: lead.google_maps_url.clone(),
                marker,
                marker_color,
            },
        }
    }
}

/// `[min_lng, min_lat, max_lng, max_lat]` over the features, `None` when empty.
fn bbox(features: &[MarkerFeature]) -> Option<[f64; 4]> {
    let mut it = features.iter().map(|f| f.geometry.coordinates);
    let [lng, lat] = it.next()?;
    Some(it.fold([lng, lat, lng, lat], |[w, s, e, n], [x, y]| {
        [w.min(x), s.min(y), e.max(x), n.max(y)]
    }))
}

/// Build a collection for `leads`, optionally anchored on a search center.
pub fn markers_for(leads: &[Lead], center: Option<SearchCenter>) -> MarkerCollection {
    let features: Vec<MarkerFeature> = leads.iter().map(MarkerFeature::from_lead).collect();
    MarkerCollection {
        kind: "FeatureCollection",
        bbox: bbox(&features),
        center,
        features,
    }
}

/// The marker set currently on the map. Each search replaces it wholesale.
#[derive(Debug, Default)]
pub struct MarkerLayer {
    center: Option<SearchCenter>,
    features: Vec<MarkerFeature>,
}

impl MarkerLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.features.clear();
        self.center = None;
    }

    /// Clear existing markers, then create one per lead.
    pub fn replace(&mut self, leads: &[Lead], center: Option<SearchCenter>) {
        self.clear();
        self.features
            .extend(leads.iter().map(MarkerFeature::from_lead));
        self.center = center;
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn center(&self) -> Option<&SearchCenter> {
        self.center.as_ref()
    }

    pub fn to_collection(&self) -> MarkerCollection {
        MarkerCollection {
            kind: "FeatureCollection",
            bbox: bbox(&self.features),
            center: self.center.clone(),
            features: self.features.clone(),
        }
    }
}
