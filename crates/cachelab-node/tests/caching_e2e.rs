//! End-to-end tests for the caching routes.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use cachelab_core::{CachingResourceService, ManualClock, ServiceConfig};
use cachelab_node::api::{create_router, AppState};
use chrono::DateTime;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn create_state() -> (AppState, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(
        DateTime::from_timestamp(1_700_000_030, 0).unwrap(),
    ));
    let service = Arc::new(CachingResourceService::with_clock(
        ServiceConfig::default(),
        clock.clone(),
    ));
    (AppState::new(service, 30), clock)
}

fn create_test_app() -> (axum::Router, Arc<ManualClock>) {
    let (state, clock) = create_state();
    state.health.set_ready(true);
    (create_router(state), clock)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn conditional(uri: &str, name: header::HeaderName, value: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(name, value)
        .body(Body::empty())
        .unwrap()
}

fn post_update(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/update")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> axum::body::Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn header_str(response: &axum::response::Response, name: header::HeaderName) -> String {
    response.headers()[name].to_str().unwrap().to_string()
}

// ==================== no-store ====================

#[tokio::test]
async fn test_no_store_is_never_cached() {
    let (app, _) = create_test_app();

    let response = app.clone().oneshot(get("/api/no-store")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CACHE_CONTROL), "no-store");
    assert!(response.headers().get(header::ETAG).is_none());
    assert!(response.headers().get(header::LAST_MODIFIED).is_none());

    let body = json_body(response).await;
    assert_eq!(body["discipline"], "no-store");
    assert!(!body["data"].as_str().unwrap().is_empty());
}

// ==================== ETag ====================

#[tokio::test]
async fn test_etag_revalidation_flow() {
    let (app, _) = create_test_app();

    let response = app.clone().oneshot(get("/api/etag")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CACHE_CONTROL), "no-cache");
    let etag1 = header_str(&response, header::ETAG);
    let body = json_body(response).await;
    assert_eq!(body["content"], "Initial content");
    assert_eq!(body["version"], 1);
    assert_eq!(body["validator"], etag1.as_str());

    let response = app
        .clone()
        .oneshot(conditional("/api/etag", header::IF_NONE_MATCH, &etag1))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(header_str(&response, header::CACHE_CONTROL), "no-cache");
    assert_eq!(header_str(&response, header::ETAG), etag1);
    assert!(body_bytes(response).await.is_empty());

    let response = app
        .clone()
        .oneshot(post_update(&json!({ "content": "changed" }).to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let update = json_body(response).await;
    assert_eq!(update["success"], true);
    assert_eq!(update["new_data"]["version"], 2);
    assert_eq!(update["new_data"]["content"], "changed");

    let response = app
        .clone()
        .oneshot(conditional("/api/etag", header::IF_NONE_MATCH, &etag1))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let etag2 = header_str(&response, header::ETAG);
    assert_ne!(etag1, etag2);
    assert_eq!(json_body(response).await["content"], "changed");

    let response = app
        .clone()
        .oneshot(conditional("/api/etag", header::IF_NONE_MATCH, &etag2))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
}

#[tokio::test]
async fn test_etag_weak_or_garbage_validator_is_a_miss() {
    let (app, _) = create_test_app();

    let response = app.clone().oneshot(get("/api/etag")).await.unwrap();
    let etag = header_str(&response, header::ETAG);

    for candidate in [format!("W/{etag}"), "*".to_string(), "garbage".to_string()] {
        let response = app
            .clone()
            .oneshot(conditional("/api/etag", header::IF_NONE_MATCH, &candidate))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "validator {candidate}");
    }
}

// ==================== Last-Modified ====================

#[tokio::test]
async fn test_last_modified_revalidation() {
    let (app, clock) = create_test_app();

    let response = app.clone().oneshot(get("/api/last-modified")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CACHE_CONTROL), "no-cache");
    let last_modified = header_str(&response, header::LAST_MODIFIED);
    assert_eq!(last_modified, "Tue, 14 Nov 2023 22:13:00 GMT");

    let response = app
        .clone()
        .oneshot(conditional(
            "/api/last-modified",
            header::IF_MODIFIED_SINCE,
            &last_modified,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

    // A later date on the client side is still "unchanged".
    let response = app
        .clone()
        .oneshot(conditional(
            "/api/last-modified",
            header::IF_MODIFIED_SINCE,
            "Wed, 15 Nov 2023 00:00:00 GMT",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

    clock.advance(Duration::from_secs(120));
    app.clone().oneshot(post_update("{}")).await.unwrap();

    let response = app
        .clone()
        .oneshot(conditional(
            "/api/last-modified",
            header::IF_MODIFIED_SINCE,
            &last_modified,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_str(&response, header::LAST_MODIFIED),
        "Tue, 14 Nov 2023 22:15:00 GMT"
    );
}

#[tokio::test]
async fn test_malformed_if_modified_since_serves_fresh() {
    let (app, _) = create_test_app();

    let response = app
        .clone()
        .oneshot(conditional(
            "/api/last-modified",
            header::IF_MODIFIED_SINCE,
            "last tuesday",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::LAST_MODIFIED).is_some());
}

// ==================== max-age ====================

#[tokio::test]
async fn test_max_age_bodies_differ() {
    let (app, _) = create_test_app();

    let first = app.clone().oneshot(get("/api/max-age")).await.unwrap();
    let second = app.clone().oneshot(get("/api/max-age")).await.unwrap();

    assert_eq!(header_str(&first, header::CACHE_CONTROL), "max-age=30");
    assert_eq!(header_str(&second, header::CACHE_CONTROL), "max-age=30");
    assert!(first.headers().get(header::ETAG).is_none());

    let a = json_body(first).await;
    let b = json_body(second).await;
    assert_ne!(a["nonce"], b["nonce"]);
}

// ==================== update & status ====================

#[tokio::test]
async fn test_update_without_body_generates_placeholder() {
    let (app, _) = create_test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/update")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CACHE_CONTROL), "no-store");

    let body = json_body(response).await;
    assert_eq!(body["new_data"]["version"], 2);
    assert!(body["new_data"]["content"]
        .as_str()
        .unwrap()
        .starts_with("Updated at "));
}

#[tokio::test]
async fn test_update_rejects_bad_input() {
    let (app, _) = create_test_app();

    let response = app.clone().oneshot(post_update("{not json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let form = Request::builder()
        .method("POST")
        .uri("/api/update")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("content=changed"))
        .unwrap();
    let response = app.clone().oneshot(form).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let response = app
        .clone()
        .oneshot(post_update(&json!({ "content": "a\u{0}b" }).to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["details"][0]["field"], "content");

    // Rejected updates leave the resource alone.
    let response = app.clone().oneshot(get("/api/status")).await.unwrap();
    let status = json_body(response).await;
    assert_eq!(status["version"], 1);
    assert_eq!(status["content"], "Initial content");
}

#[tokio::test]
async fn test_status_reports_current_validators() {
    let (app, _) = create_test_app();

    let etag = header_str(
        &app.clone().oneshot(get("/api/etag")).await.unwrap(),
        header::ETAG,
    );

    let response = app.clone().oneshot(get("/api/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let status = json_body(response).await;
    assert_eq!(status["etag"], etag.as_str());
    assert_eq!(status["last_modified"], "Tue, 14 Nov 2023 22:13:00 GMT");
}

// ==================== time-bucket steps ====================

#[tokio::test]
async fn test_step_etag_follows_clock() {
    let (app, clock) = create_test_app();

    let response = app.clone().oneshot(get("/2")).await.unwrap();
    assert_eq!(header_str(&response, header::CACHE_CONTROL), "no-cache");
    let etag = header_str(&response, header::ETAG);

    let response = app
        .clone()
        .oneshot(conditional("/2", header::IF_NONE_MATCH, &etag))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

    clock.advance(Duration::from_secs(60));
    let response = app
        .clone()
        .oneshot(conditional("/2", header::IF_NONE_MATCH, &etag))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_steps_directives() {
    let (app, _) = create_test_app();

    let response = app.clone().oneshot(get("/1")).await.unwrap();
    assert_eq!(header_str(&response, header::CACHE_CONTROL), "no-store");

    let response = app.clone().oneshot(get("/3")).await.unwrap();
    assert_eq!(header_str(&response, header::CACHE_CONTROL), "no-cache");
    assert_eq!(
        header_str(&response, header::LAST_MODIFIED),
        "Tue, 14 Nov 2023 22:13:00 GMT"
    );

    let response = app.clone().oneshot(get("/4")).await.unwrap();
    assert_eq!(header_str(&response, header::CACHE_CONTROL), "max-age=30");
    let etag = header_str(&response, header::ETAG);

    let response = app
        .clone()
        .oneshot(conditional("/4", header::IF_NONE_MATCH, &etag))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(header_str(&response, header::CACHE_CONTROL), "max-age=30");
}

// ==================== ambient routes ====================

#[tokio::test]
async fn test_health_and_metrics() {
    let (app, _) = create_test_app();

    let response = app.clone().oneshot(get("/health/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    app.clone().oneshot(get("/api/etag")).await.unwrap();
    let response = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(body_bytes(response).await.to_vec()).unwrap();
    assert!(text.contains("cachelab_cache_decisions"));
    assert!(text.contains("cachelab_http_requests"));
}

#[tokio::test]
async fn test_readiness_follows_serving_state() {
    let (state, _) = create_state();
    let health = state.health.clone();
    let app = create_router(state);

    let response = app.clone().oneshot(get("/health/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let response = app.clone().oneshot(get("/health/live")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    health.set_ready(true);
    let response = app.clone().oneshot(get("/health/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["resource"]["version"], 1);

    health.set_ready(false);
    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (app, _) = create_test_app();

    let request = Request::builder()
        .uri("/api/no-store")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(header_str(&response, "x-request-id".parse().unwrap()), "abc-123");
}
