//! Integration tests for patchlog-store API endpoints
//!
//! Tests cover:
//! - Health endpoint (no auth required)
//! - Listing records with and without the year filter
//! - Import authentication via the x-patchlog-secret header
//! - Import validation and all-or-nothing batch semantics

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use patchlog_common::api::{SharedSecret, SECRET_HEADER};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot` method
use patchlog_store::{build_router, db, AppState};

const SECRET: &str = "PiKaChu";

/// Test helper: router backed by a fresh in-memory database
async fn setup_app() -> axum::Router {
    let pool = db::init_memory_database()
        .await
        .expect("Should open in-memory database");
    let state = AppState::new(pool, SharedSecret::new(SECRET).unwrap());
    build_router(state)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn import(secret: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/updates/import")
        .header("content-type", "application/json");
    if let Some(secret) = secret {
        builder = builder.header(SECRET_HEADER, secret);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

fn sample_batch() -> Value {
    json!([
        {
            "versionName": "2.5.0",
            "releaseDate": "Mar 2024",
            "year": "2024",
            "majorFeatures": ["New Weapon: FAMAS", "Erangel 2.0", "Metro Royale Season 3"],
            "weaponChanges": ["M416 recoil reduced", "AWM damage buffed"],
            "mapChanges": ["Erangel visual overhaul", "New compounds added"]
        },
        {
            "versionName": "2.4.0",
            "releaseDate": "Jan 2024",
            "year": "2024",
            "majorFeatures": ["Ranked Season 31", "New Mode: Arena Training", "UI Improvements"],
            "weaponChanges": ["UMP45 fire rate increased"],
            "mapChanges": []
        },
        {
            "versionName": "2.3.0",
            "releaseDate": "Nov 2023",
            "year": "2023",
            "majorFeatures": ["Livik 2.0", "New Vehicle: Monster Truck", "Season Updates"]
        }
    ])
}

// =============================================================================
// Health Endpoint
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let app = setup_app().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "patchlog-store");
    assert!(body["version"].is_string());
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_list_empty_store() {
    let app = setup_app().await;

    let response = app.oneshot(get("/api/updates")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response.into_body()).await, json!([]));
}

#[tokio::test]
async fn test_list_after_import_all_and_by_year() {
    let app = setup_app().await;

    let response = app
        .clone()
        .oneshot(import(Some(SECRET), sample_batch()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["inserted"], 3);
    assert_eq!(body["ids"].as_array().unwrap().len(), 3);

    let response = app.clone().oneshot(get("/api/updates")).await.unwrap();
    let all = extract_json(response.into_body()).await;
    let names: Vec<&str> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["versionName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["2.5.0", "2.4.0", "2.3.0"]);

    let response = app.oneshot(get("/api/updates?year=2023")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let only_2023 = extract_json(response.into_body()).await;
    assert_eq!(only_2023.as_array().unwrap().len(), 1);
    assert_eq!(only_2023[0]["versionName"], "2.3.0");
}

#[tokio::test]
async fn test_list_preserves_absent_and_empty_lists() {
    let app = setup_app().await;
    app.clone()
        .oneshot(import(Some(SECRET), sample_batch()))
        .await
        .unwrap();

    let response = app.oneshot(get("/api/updates")).await.unwrap();
    let all = extract_json(response.into_body()).await;

    // 2.4.0 recorded no map changes; 2.3.0 recorded nothing at all
    assert_eq!(all[1]["mapChanges"], json!([]));
    assert!(all[2].get("weaponChanges").is_none());
    assert!(all[2].get("mapChanges").is_none());
}

#[tokio::test]
async fn test_list_rejects_malformed_year() {
    let app = setup_app().await;

    for uri in ["/api/updates?year=24", "/api/updates?year=abcd", "/api/updates?year="] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri {}", uri);

        let body = extract_json(response.into_body()).await;
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }
}

// =============================================================================
// Import Authentication
// =============================================================================

#[tokio::test]
async fn test_import_without_secret_rejected() {
    let app = setup_app().await;

    let response = app.clone().oneshot(import(None, sample_batch())).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let response = app.oneshot(get("/api/updates")).await.unwrap();
    assert_eq!(extract_json(response.into_body()).await, json!([]));
}

#[tokio::test]
async fn test_import_with_wrong_secret_rejected() {
    let app = setup_app().await;

    for wrong in ["wrong", "pikachu", "PIKACHU"] {
        let response = app
            .clone()
            .oneshot(import(Some(wrong), sample_batch()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "secret {}", wrong);
    }
}

#[tokio::test]
async fn test_wrong_then_right_secret_no_lockout() {
    let app = setup_app().await;

    let response = app
        .clone()
        .oneshot(import(Some("wrong"), sample_batch()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(import(Some(SECRET), sample_batch()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Import Validation and Atomicity
// =============================================================================

#[tokio::test]
async fn test_import_undecodable_body() {
    let app = setup_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/updates/import")
        .header(SECRET_HEADER, SECRET)
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Invalid update batch"));
}

#[tokio::test]
async fn test_import_shape_mismatch() {
    let app = setup_app().await;

    // Object instead of array
    let response = app
        .clone()
        .oneshot(import(Some(SECRET), json!({"versionName": "2.5.0"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Malformed year
    let response = app
        .oneshot(import(
            Some(SECRET),
            json!([{
                "versionName": "2.5.0",
                "releaseDate": "Mar 2024",
                "year": "Mar 2024",
                "majorFeatures": []
            }]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_conflict_applies_nothing() {
    let app = setup_app().await;

    app.clone()
        .oneshot(import(
            Some(SECRET),
            json!([{
                "versionName": "2.3.0",
                "releaseDate": "Nov 2023",
                "year": "2023",
                "majorFeatures": ["Livik 2.0"]
            }]),
        ))
        .await
        .unwrap();

    // sample_batch repeats 2.3.0 after two new records
    let response = app
        .clone()
        .oneshot(import(Some(SECRET), sample_batch()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"]["message"].as_str().unwrap().contains("2.3.0"));

    let response = app.oneshot(get("/api/updates")).await.unwrap();
    let all = extract_json(response.into_body()).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_import_body_size_limit() {
    let app = setup_app().await;

    let oversized = vec![b' '; patchlog_store::MAX_BODY_BYTES + 1024];
    let request = Request::builder()
        .method("POST")
        .uri("/api/updates/import")
        .header(SECRET_HEADER, SECRET)
        .body(Body::from(oversized))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_cors_preflight_allowed() {
    let app = setup_app().await;

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/updates")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "GET")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}
