//! 健康检查 API 集成测试

use axum::{
    body::Body,
    http::{Request, StatusCode},
};

mod common;
use common::TestApp;

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new();

    let response = app
        .request(
            Request::builder()
                .uri("/api/v1/healthcheck")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.data()["status"], "ok");
    assert_eq!(response.data()["version"], env!("CARGO_PKG_VERSION"));
    assert!(response.data()["uptime_secs"].is_number());
}

#[tokio::test]
async fn test_readiness_endpoint() {
    let app = TestApp::new();

    let response = app
        .request(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["ready"], true);

    let checks = response.body["checks"].as_array().expect("checks array");
    assert_eq!(checks.len(), 1);
    assert_eq!(checks[0]["name"], "credential_store");
    assert_eq!(checks[0]["status"], "healthy");
    assert!(checks[0].get("message").is_none());
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = TestApp::new();

    let response = app
        .request(
            Request::builder()
                .uri("/api/v1/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);

    // 受保护路由旁边拼错的路径同样是 404，而不是 401
    let response = app
        .request(
            Request::builder()
                .method("POST")
                .uri("/api/v1/users/log-out")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
