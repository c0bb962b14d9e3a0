use leadscout_places::{GeoPoint, GoogleMapsClient, PlacesError, PlacesProvider};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "AIza-test-key";

fn client_for(server: &MockServer) -> GoogleMapsClient {
    GoogleMapsClient::with_endpoint(KEY, &format!("{}/maps/api", server.uri()))
        .expect("client")
        .with_timeout(Duration::from_secs(2))
        .with_retries(0)
}

#[tokio::test]
async fn geocode_returns_first_location() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/maps/api/geocode/json"))
        .and(query_param("address", "Toronto, ON"))
        .and(query_param("key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [
                {"formatted_address": "Toronto, ON, Canada",
                 "geometry": {"location": {"lat": 43.6532, "lng": -79.3832}}},
                {"geometry": {"location": {"lat": 0.0, "lng": 0.0}}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let point = client_for(&server)
        .geocode("Toronto, ON")
        .await
        .expect("geocode ok")
        .expect("a match");
    assert_eq!(point, GeoPoint { lat: 43.6532, lng: -79.3832 });
}

#[tokio::test]
async fn geocode_zero_results_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/maps/api/geocode/json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "ZERO_RESULTS", "results": []})),
        )
        .mount(&server)
        .await;

    let point = client_for(&server)
        .geocode("ThisIsNotARealLocationXYZ123")
        .await
        .expect("zero results is not an error");
    assert!(point.is_none());
}

#[tokio::test]
async fn request_denied_is_a_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/maps/api/geocode/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid.",
            "results": []
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .geocode("Paris")
        .await
        .expect_err("denied");
    match err {
        PlacesError::Status {
            endpoint,
            status,
            message,
        } => {
            assert_eq!(endpoint, "geocode");
            assert_eq!(status, "REQUEST_DENIED");
            assert!(message.contains("invalid"));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn nearby_sends_clamped_radius_and_keyword() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/maps/api/place/nearbysearch/json"))
        .and(query_param("location", "40.7,-74"))
        .and(query_param("radius", "50000"))
        .and(query_param("keyword", "coffee shops"))
        .and(query_param("type", "establishment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [
                {"place_id": "a", "name": "Joe", "types": ["cafe"]},
                {"place_id": "b", "name": "Stumptown", "types": ["cafe", "store"], "rating": 4.6}
            ],
            "next_page_token": "ignored"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let places = client_for(&server)
        .nearby(GeoPoint { lat: 40.7, lng: -74.0 }, 120_000, "coffee shops")
        .await
        .expect("nearby ok");
    assert_eq!(places.len(), 2);
    assert_eq!(places[1].place_id, "b");
    assert_eq!(places[1].rating, Some(4.6));
}

#[tokio::test]
async fn details_not_found_is_none_and_ok_maps_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/maps/api/place/details/json"))
        .and(query_param("place_id", "gone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "NOT_FOUND"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/maps/api/place/details/json"))
        .and(query_param("place_id", "here"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "result": {
                "name": "Tartine",
                "formatted_address": "600 Guerrero St, San Francisco",
                "formatted_phone_number": "(415) 487-2600",
                "website": "https://tartine.example",
                "rating": 4.5,
                "user_ratings_total": 7000,
                "geometry": {"location": {"lat": 37.76, "lng": -122.42}}
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.details("gone").await.expect("ok").is_none());

    let d = client.details("here").await.expect("ok").expect("some");
    assert_eq!(d.name.as_deref(), Some("Tartine"));
    assert_eq!(d.formatted_phone_number.as_deref(), Some("(415) 487-2600"));
    assert_eq!(d.user_ratings_total, Some(7000));
    assert_eq!(d.location, Some(GeoPoint { lat: 37.76, lng: -122.42 }));
}
