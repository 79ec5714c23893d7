//! PlacesClient against a local fake of the Places web service.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use craic::errors::PlacesError;
use craic::geo::Coordinate;
use craic::places::{DETAIL_PHOTO_WIDTH, PlacesClient};

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn nearby(
    State(seen): State<Seen>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    seen.lock().unwrap().push(params.clone());
    if params.get("key").map(String::as_str) != Some("good-key") {
        return Json(json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid.",
            "results": []
        }));
    }
    Json(json!({
        "status": "OK",
        "results": [
            {
                "place_id": "brazen",
                "name": "The Brazen Head",
                "rating": 4.4,
                "vicinity": "20 Lower Bridge St",
                "opening_hours": { "open_now": true },
                "photos": [{ "photo_reference": "ref-1" }],
                "geometry": { "location": { "lat": 53.3448, "lng": -6.2764 } }
            },
            {
                "name": "Mystery Bar",
                "geometry": { "location": { "lat": 53.34, "lng": -6.26 } }
            },
            { "place_id": "nowhere", "name": "No Geometry" }
        ]
    }))
}

async fn details(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    match params.get("place_id").map(String::as_str) {
        Some("brazen") => Json(json!({
            "status": "OK",
            "result": {
                "place_id": "brazen",
                "name": "The Brazen Head",
                "formatted_address": "20 Lower Bridge St, Dublin 8",
                "formatted_phone_number": "01 677 9549",
                "website": "https://www.brazenhead.com/",
                "price_level": 2,
                "rating": 4.4,
                "geometry": { "location": { "lat": 53.3448, "lng": -6.2764 } },
                "opening_hours": { "weekday_text": ["Monday: 10:30 AM – 12:00 AM"] },
                "photos": [{ "photo_reference": "ref-1" }, { "photo_reference": "ref-2" }]
            }
        })),
        _ => Json(json!({ "status": "NOT_FOUND" })),
    }
}

async fn spawn_fake() -> (String, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/nearbysearch/json", get(nearby))
        .route("/details/json", get(details))
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/"), seen)
}

fn client(base: &str, key: &str) -> PlacesClient {
    PlacesClient::new(key).unwrap().with_base_url(base)
}

#[tokio::test]
async fn test_nearby_sends_pub_query() {
    let (base, seen) = spawn_fake().await;
    let places = client(&base, "good-key")
        .nearby(Coordinate::DUBLIN, 1200)
        .await
        .unwrap();

    let params = seen.lock().unwrap()[0].clone();
    assert_eq!(params["location"], "53.3498,-6.2603");
    assert_eq!(params["radius"], "1200");
    assert_eq!(params["type"], "bar|bar_and_grill|pub|irish_pub");

    assert_eq!(places.len(), 2);
    let brazen = &places[0];
    assert_eq!(brazen.id.as_deref(), Some("brazen"));
    assert_eq!(brazen.open_now, Some(true));
    assert_eq!(brazen.photo_reference.as_deref(), Some("ref-1"));
    assert_eq!(places[1].id, None);
    assert_eq!(places[1].name, "Mystery Bar");
}

#[tokio::test]
async fn test_nearby_denied_is_status_error() {
    let (base, _seen) = spawn_fake().await;
    let err = client(&base, "bad-key")
        .nearby(Coordinate::DUBLIN, 5000)
        .await
        .unwrap_err();
    match err {
        PlacesError::Status { status, message } => {
            assert_eq!(status, "REQUEST_DENIED");
            assert!(message.unwrap().contains("invalid"));
        }
        other => panic!("Expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn test_details_found() {
    let (base, _seen) = spawn_fake().await;
    let client = client(&base, "good-key");
    let details = client.details("brazen").await.unwrap().unwrap();

    assert_eq!(details.name, "The Brazen Head");
    assert_eq!(details.price_level, Some(2));
    assert_eq!(details.opening_hours.len(), 1);
    assert_eq!(details.photo_references, vec!["ref-1", "ref-2"]);

    let photo = client.photo_url(&details.photo_references[0], DETAIL_PHOTO_WIDTH);
    assert!(photo.contains("/photo?maxwidth=800&photo_reference=ref-1&key=good-key"));
}

#[tokio::test]
async fn test_details_not_found_is_none() {
    let (base, _seen) = spawn_fake().await;
    let details = client(&base, "good-key").details("nope").await.unwrap();
    assert!(details.is_none());
}

#[tokio::test]
async fn test_http_error_is_transport_error() {
    let (base, _seen) = spawn_fake().await;
    let err = client(&format!("{base}missing"), "good-key")
        .nearby(Coordinate::DUBLIN, 5000)
        .await
        .unwrap_err();
    assert!(matches!(err, PlacesError::Transport(_)));
}
