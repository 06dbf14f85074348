//! Health and metrics endpoint tests.

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::Value;

use crate::common::{InMemoryChats, TestApp};

fn server() -> TestServer {
    let app = TestApp::new(InMemoryChats::new());
    TestServer::new(app.router()).expect("test server")
}

#[tokio::test]
async fn test_health_check_returns_ok() {
    let response = server().get("/health").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_liveness_reports_alive() {
    let response = server().get("/health/live").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "alive");
}

#[tokio::test]
async fn test_readiness_reports_unreachable_dependencies() {
    let response = server().get("/health/ready").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let json: Value = response.json();
    assert_eq!(json["status"], "unhealthy");
    assert_eq!(json["checks"]["database"]["status"], "unhealthy");
    assert_eq!(json["checks"]["redis"]["status"], "unhealthy");
    assert_eq!(json["checks"]["gateway"]["online_users"], 0);
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_gateway_metrics() {
    let response = server().get("/metrics").await;

    response.assert_status_ok();
    assert!(response.text().contains("chat_gateway_websocket_connections_active"));
}

#[tokio::test]
async fn test_gateway_without_token_is_unauthorized() {
    let response = server().get("/gateway").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_gateway_with_bad_token_is_unauthorized() {
    let response = server()
        .get("/gateway")
        .add_query_param("token", "not-a-jwt")
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cors_allows_any_origin_by_default() {
    let app = TestApp::new(InMemoryChats::new());

    let response = app
        .request(
            axum::http::Request::builder()
                .uri("/health")
                .header("Origin", "http://example.com")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}
