use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use leadscout_places::{GeoPoint, NearbyPlace, PlaceDetails, PlacesError, PlacesProvider};
use leadscout_search::LeadSearch;
use leadscout_server::{AppState, router};
use leadscout_store::LeadStore;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

struct FakePlaces;

#[async_trait]
impl PlacesProvider for FakePlaces {
    async fn geocode(&self, location: &str) -> Result<Option<GeoPoint>, PlacesError> {
        match location {
            "Denied" => Err(PlacesError::Status {
                endpoint: "geocode",
                status: "REQUEST_DENIED".into(),
                message: "The provided API key is invalid.".into(),
            }),
            l if l.contains("XYZ") => Ok(None),
            _ => Ok(Some(GeoPoint { lat: 40.7128, lng: -74.006 })),
        }
    }

    async fn nearby(
        &self,
        _center: GeoPoint,
        _radius_m: u32,
        _keyword: &str,
    ) -> Result<Vec<NearbyPlace>, PlacesError> {
        Ok(["a", "b"]
            .into_iter()
            .map(|id| NearbyPlace {
                place_id: id.into(),
                name: None,
                types: vec!["restaurant".into()],
                rating: None,
                location: None,
            })
            .collect())
    }

    async fn details(&self, place_id: &str) -> Result<Option<PlaceDetails>, PlacesError> {
        let d = match place_id {
            "a" => PlaceDetails {
                name: Some("Katz's Delicatessen".into()),
                formatted_address: Some("205 E Houston St, New York".into()),
                website: Some("https://katzsdelicatessen.example".into()),
                rating: Some(4.5),
                user_ratings_total: Some(30000),
                location: Some(GeoPoint { lat: 40.72, lng: -73.98 }),
                ..Default::default()
            },
            _ => PlaceDetails {
                name: Some("Bagel Corner".into()),
                rating: Some(3.8),
                location: Some(GeoPoint { lat: 40.71, lng: -74.01 }),
                ..Default::default()
            },
        };
        Ok(Some(d))
    }
}

async fn app() -> axum::Router {
    let store = LeadStore::in_memory().await.unwrap();
    let provider: Arc<dyn PlacesProvider> = Arc::new(FakePlaces);
    let search = LeadSearch::new(provider, Arc::new(store.clone()));
    router(Arc::new(AppState::new(search, store)))
}

async fn send(app: &axum::Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &axum::Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn root_reports_service_name() {
    let app = app().await;
    for uri in ["/api/", "/api"] {
        let (status, body) = send_json(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Google Maps Scraper API");
    }
}

#[tokio::test]
async fn status_checks_roundtrip() {
    let app = app().await;
    let (status, created) =
        send_json(&app, Method::POST, "/api/status", Some(json!({"client_name": "test_client"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["client_name"], "test_client");
    assert!(created["id"].is_string() && created["timestamp"].is_string());

    let (_, list) = send_json(&app, Method::GET, "/api/status", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["id"], created["id"]);
}

#[tokio::test]
async fn search_returns_leads_and_center() {
    let app = app().await;
    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/search",
        Some(json!({"query": "restaurants", "location": "New York, NY", "radius": 5000})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 2);
    assert_eq!(body["search_center"]["address"], "New York, NY");
    assert_eq!(body["search_center"]["lat"], 40.7128);
    let lead = &body["leads"][0];
    for field in [
        "id", "name", "address", "phone", "website", "google_maps_url", "rating",
        "review_count", "has_website", "latitude", "longitude",
    ] {
        assert!(lead.get(field).is_some(), "missing {field}");
    }
    assert_eq!(lead["has_website"], true);
    assert_eq!(body["leads"][1]["has_website"], false);
}

#[tokio::test]
async fn search_filters_apply() {
    let app = app().await;
    let (_, body) = send_json(
        &app,
        Method::POST,
        "/api/search",
        Some(json!({"query": "restaurants", "location": "New York", "min_rating": 4.0, "has_website": true})),
    )
    .await;
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["leads"][0]["name"], "Katz's Delicatessen");
}

#[tokio::test]
async fn unknown_location_is_400() {
    let app = app().await;
    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/search",
        Some(json!({"query": "restaurants", "location": "ThisIsNotARealLocationXYZ123"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("Location not found"));
}

#[tokio::test]
async fn upstream_failure_is_500_with_reason() {
    let app = app().await;
    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/search",
        Some(json!({"query": "restaurants", "location": "Denied"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Search failed:"));
    assert!(detail.contains("REQUEST_DENIED"));
}

#[tokio::test]
async fn malformed_search_bodies_are_422() {
    let app = app().await;
    let (status, body) =
        send_json(&app, Method::POST, "/api/search", Some(json!({"location": "Paris"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());

    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/search",
        Some(json!({"query": "", "location": "Paris"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn leads_list_sort_export_and_clear() {
    let app = app().await;
    let search = json!({"query": "restaurants", "location": "New York"});
    send_json(&app, Method::POST, "/api/search", Some(search)).await;

    let (status, leads) = send_json(&app, Method::GET, "/api/leads?sort=name", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(leads[0]["name"], "Bagel Corner");

    let (_, leads) = send_json(&app, Method::GET, "/api/leads?sort=rating&order=desc", None).await;
    assert_eq!(leads[0]["name"], "Katz's Delicatessen");

    let (status, body) = send_json(&app, Method::GET, "/api/leads?sort=distance", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("distance"));

    let (status, csv) = send(&app, Method::GET, "/api/leads/export.csv?sort=name", None).await;
    assert_eq!(status, StatusCode::OK);
    let csv = String::from_utf8(csv).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("Name,Address,Phone,Website,Rating,Reviews,Has Website,Latitude,Longitude,Google Maps URL")
    );
    assert!(lines.next().unwrap().starts_with("Bagel Corner,"));

    let (_, markers) = send_json(&app, Method::GET, "/api/leads/markers", None).await;
    assert_eq!(markers["type"], "FeatureCollection");
    assert_eq!(markers["features"].as_array().unwrap().len(), 2);

    let (status, deleted) = send_json(&app, Method::DELETE, "/api/leads", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["deleted_count"], 2);
    let (_, leads) = send_json(&app, Method::GET, "/api/leads", None).await;
    assert_eq!(leads, json!([]));
}

#[tokio::test]
async fn export_is_a_csv_attachment() {
    let app = app().await;
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/leads/export.csv")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/csv; charset=utf-8");
    assert!(
        resp.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("leads.csv")
    );
}
