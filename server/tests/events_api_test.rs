//! End-to-end tests for the events API.
//!
//! Each test runs the full router against a real [`SupabaseClient`] pointed
//! at a wiremock server standing in for the Supabase project.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use uninear_server::config::Config;
use uninear_server::cors::CorsOrigins;
use uninear_server::routes::{create_router, AppState};
use uninear_server::supabase::SupabaseClient;

const TEST_KEY: &str = "test-anon-key";

fn app_for(server: &MockServer) -> Router {
    let config = Config {
        supabase_url: server.uri(),
        supabase_key: TEST_KEY.to_string(),
        port: 8000,
        cors_origins: CorsOrigins::Any,
    };
    let gateway = SupabaseClient::new(&config.supabase_url, &config.supabase_key)
        .expect("client should build");
    create_router(AppState::new(config, Arc::new(gateway)))
}

async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let body = body.map_or_else(Body::empty, |v| Body::from(v.to_string()));
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(body)
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn root_is_live_without_remote_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let response = call(app_for(&server), "GET", "/", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"status": "UniNear API is Live 🚀"})
    );
}

#[tokio::test]
async fn list_events_returns_rows_from_store() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/events"))
        .and(query_param("select", "*"))
        .and(header("apikey", TEST_KEY))
        .and(header("Authorization", format!("Bearer {TEST_KEY}").as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "title": "Mock Event"}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = call(app_for(&server), "GET", "/events", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!([{"id": 1, "title": "Mock Event"}])
    );
}

#[tokio::test]
async fn list_events_store_failure_is_500() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/events"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({"message": "relation \"public.events\" does not exist"})),
        )
        .mount(&server)
        .await;

    let response = call(app_for(&server), "GET", "/events", None).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({"detail": "relation \"public.events\" does not exist"})
    );
}

#[tokio::test]
async fn list_events_unreachable_store_is_500() {
    let config = Config {
        supabase_url: "http://127.0.0.1:9".to_string(),
        supabase_key: TEST_KEY.to_string(),
        port: 8000,
        cors_origins: CorsOrigins::Any,
    };
    let gateway = SupabaseClient::new(&config.supabase_url, &config.supabase_key)
        .expect("client should build");
    let app = create_router(AppState::new(config, Arc::new(gateway)));

    let response = call(app, "GET", "/events", None).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let detail = json_body(response).await["detail"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(!detail.is_empty());
}

#[tokio::test]
async fn create_event_stores_start_time_and_default_status() {
    let server = MockServer::start().await;
    let expected_record = json!({
        "title": "Test Event",
        "start_time": "2025-10-15T09:00:00",
        "location": "Test Location",
        "capacity": 100,
        "price": 10.0,
        "status": "Draft",
        "mood_tags": []
    });
    Mock::given(method("POST"))
        .and(path("/rest/v1/events"))
        .and(header("Prefer", "return=representation"))
        .and(body_json(&expected_record))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": 1,
            "title": "Test Event",
            "start_time": "2025-10-15T09:00:00",
            "location": "Test Location",
            "capacity": 100,
            "price": 10.0,
            "status": "Draft",
            "mood_tags": []
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let response = call(
        app_for(&server),
        "POST",
        "/events",
        Some(json!({
            "title": "Test Event",
            "date": "2025-10-15T09:00:00",
            "location": "Test Location",
            "capacity": 100,
            "price": 10.0
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let created = json_body(response).await;
    assert_eq!(created["id"], json!(1));
    assert_eq!(created["start_time"], json!("2025-10-15T09:00:00"));
    assert_eq!(created["status"], json!("Draft"));
}

#[tokio::test]
async fn create_event_missing_fields_is_422_without_remote_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let response = call(
        app_for(&server),
        "POST",
        "/events",
        Some(json!({"title": "Test Event"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    let missing: Vec<&str> = body["detail"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(missing, vec!["date", "location", "capacity", "price"]);
    for error in body["detail"].as_array().unwrap() {
        assert_eq!(error["kind"], json!("missing"));
    }
}

#[tokio::test]
async fn create_event_rejected_by_store_is_400() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/events"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": "42501",
            "message": "new row violates row-level security policy for table \"events\""
        })))
        .mount(&server)
        .await;

    let response = call(
        app_for(&server),
        "POST",
        "/events",
        Some(json!({
            "title": "Test Event",
            "date": "2025-10-15T09:00:00",
            "location": "Test Location",
            "capacity": 100,
            "price": 10.0
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({"detail": "new row violates row-level security policy for table \"events\""})
    );
}

#[tokio::test]
async fn update_event_sends_only_supplied_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/events"))
        .and(query_param("id", "eq.42"))
        .and(header("Prefer", "return=representation"))
        .and(body_json(json!({"title": "Updated"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": 42, "title": "Updated"}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = call(
        app_for(&server),
        "PATCH",
        "/events/42",
        Some(json!({"title": "Updated"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!([{"id": 42, "title": "Updated"}])
    );
}

#[tokio::test]
async fn update_unknown_event_returns_empty_array() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/events"))
        .and(query_param("id", "eq.404"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let response = call(
        app_for(&server),
        "PATCH",
        "/events/404",
        Some(json!({"title": "Updated"})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn update_event_with_date_sends_start_time() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/events"))
        .and(query_param("id", "eq.7"))
        .and(body_json(json!({
            "start_time": "2025-11-01T18:00:00",
            "description": null
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 7}])))
        .expect(1)
        .mount(&server)
        .await;

    let response = call(
        app_for(&server),
        "PATCH",
        "/events/7",
        Some(json!({"date": "2025-11-01T18:00:00", "description": null})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn delete_event_is_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/events"))
        .and(query_param("id", "eq.5"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&server)
        .await;

    for _ in 0..2 {
        let response = call(app_for(&server), "DELETE", "/events/5", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"message": "Event deleted successfully"})
        );
    }
}

#[tokio::test]
async fn delete_event_rejected_by_store_is_400() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/events"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "22P02",
            "message": "invalid input syntax for type bigint: \"abc\""
        })))
        .mount(&server)
        .await;

    let response = call(app_for(&server), "DELETE", "/events/abc", None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({"detail": "invalid input syntax for type bigint: \"abc\""})
    );
}
