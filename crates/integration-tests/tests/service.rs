//! Tests for routes and middleware that need no database.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use stall_market_api::config::LoginRolePolicy;
use stall_market_integration_tests::{TestApp, test_config};

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();

    let resp = app.get("/health", None).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, json!("ok"));
}

#[tokio::test]
async fn test_request_id_is_returned() {
    let app = TestApp::new();

    let resp = app.get("/health", None).await;

    assert!(resp.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_table_names() {
    let app = TestApp::new();

    let resp = app.get("/api/tables", None).await;

    assert_eq!(resp.status, StatusCode::OK);
    let names: Vec<&str> = resp
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 8);
    assert!(names.contains(&"stall_items"));
    assert!(names.contains(&"revoked_tokens"));
}

#[tokio::test]
async fn test_unknown_table_is_not_found() {
    let app = TestApp::new();

    let resp = app.get("/api/tables/sessions", None).await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.error(), Some("Unknown table: sessions"));
}

#[tokio::test]
async fn test_product_routes_require_token() {
    let app = TestApp::new();

    let resp = app
        .post("/api/products", None, &json!({ "stall_id": 1 }))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = app.send(Method::DELETE, "/api/products/1", None, None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_stall_upsert_requires_vendor() {
    let app = TestApp::new();
    let registered = app
        .post(
            "/api/auth/register",
            None,
            &json!({
                "full_name": "Bea",
                "email": "bea@x.com",
                "password": "secret123",
                "role": "buyer",
            }),
        )
        .await;

    let resp = app
        .send(Method::POST, "/api/stalls", registered.token(), None)
        .await;

    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.error(), Some("Vendor account required"));
}

#[tokio::test]
async fn test_login_is_rate_limited_per_client() {
    let mut config = test_config(LoginRolePolicy::default());
    config.auth_rate_limit = true;
    let app = TestApp::with_config(config);
    let login = json!({ "email": "dom@x.com", "password": "secret123" });

    for _ in 0..5 {
        let resp = app.post_from("203.0.113.9", "/api/auth/login", &login).await;
        assert_ne!(resp.status, StatusCode::TOO_MANY_REQUESTS);
    }
    let resp = app.post_from("203.0.113.9", "/api/auth/login", &login).await;
    assert_eq!(resp.status, StatusCode::TOO_MANY_REQUESTS);

    let other = app.post_from("198.51.100.4", "/api/auth/login", &login).await;
    assert_ne!(other.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_rate_limit_can_be_disabled() {
    let app = TestApp::new();
    let login = json!({ "email": "dom@x.com", "password": "secret123" });

    for _ in 0..8 {
        let resp = app.post_from("203.0.113.9", "/api/auth/login", &login).await;
        assert_ne!(resp.status, StatusCode::TOO_MANY_REQUESTS);
    }
}
