//! End-to-end tests for registration, login and token-protected routes.
//!
//! Run with: cargo test -p stall-market-integration-tests

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{Value, json};

use stall_market_api::config::LoginRolePolicy;
use stall_market_core::UserId;
use stall_market_integration_tests::TestApp;

fn registration(full_name: &str, email: &str, role: &str) -> Value {
    json!({
        "full_name": full_name,
        "email": email,
        "password": "secret123",
        "role": role,
    })
}

fn credentials(email: &str, password: &str) -> Value {
    json!({ "email": email, "password": password })
}

fn user_id(body: &Value) -> UserId {
    let id = body["user"]["id"].as_i64().unwrap();
    UserId::new(i32::try_from(id).unwrap())
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_vendor_creates_stall() {
    let app = TestApp::new();

    let resp = app
        .post("/api/auth/register", None, &registration("Dom", "dom@x.com", "vendor"))
        .await;

    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body["message"], "User registered successfully!");
    assert_eq!(resp.body["user"]["email"], "dom@x.com");
    assert_eq!(resp.body["user"]["role"], "vendor");
    assert!(resp.body["user"].get("password_hash").is_none());
    assert!(resp.token().is_some());

    assert_eq!(app.store.stall_count(user_id(&resp.body)).await, 1);
}

#[tokio::test]
async fn test_register_buyer_has_no_stall() {
    let app = TestApp::new();

    let resp = app
        .post("/api/auth/register", None, &registration("Bea", "bea@x.com", "buyer"))
        .await;

    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(app.store.stall_count(user_id(&resp.body)).await, 0);
}

#[tokio::test]
async fn test_register_accepts_whitespace_password() {
    let app = TestApp::new();
    let form = json!({
        "full_name": "Dom",
        "email": "dom@x.com",
        "password": "      ",
        "role": "vendor",
    });

    let resp = app.post("/api/auth/register", None, &form).await;
    assert_eq!(resp.status, StatusCode::CREATED);

    let login = app
        .post("/api/auth/login", None, &credentials("dom@x.com", "      "))
        .await;
    assert_eq!(login.status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::new();
    let form = registration("Dom", "dom@x.com", "vendor");

    let first = app.post("/api/auth/register", None, &form).await;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = app.post("/api/auth/register", None, &form).await;
    assert_eq!(second.status, StatusCode::BAD_REQUEST);
    assert_eq!(second.error(), Some("Email already exists"));
    assert_eq!(app.store.user_count().await, 1);
}

#[tokio::test]
async fn test_register_validation_messages() {
    let app = TestApp::new();

    let resp = app
        .post("/api/auth/register", None, &json!({ "email": "a@x.com" }))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error(), Some("Missing Fields"));

    let mut form = registration("Dom", "dom@x.com", "admin");
    let resp = app.post("/api/auth/register", None, &form).await;
    assert_eq!(resp.error(), Some("Invalid role"));

    form["role"] = json!("vendor");
    form["password"] = json!("12345");
    let resp = app.post("/api/auth/register", None, &form).await;
    assert_eq!(resp.error(), Some("Password too short"));

    form["password"] = json!("secret123");
    form["email"] = json!("not-an-email");
    let resp = app.post("/api/auth/register", None, &form).await;
    assert_eq!(resp.error(), Some("Invalid email address"));

    assert_eq!(app.store.user_count().await, 0);
}

#[tokio::test]
async fn test_register_rejects_malformed_json() {
    let app = TestApp::new();

    let resp = app
        .post("/api/auth/register", None, &json!("not an object"))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.error().is_some());
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_returns_same_stall() {
    let app = TestApp::new();
    let registered = app
        .post("/api/auth/register", None, &registration("Dom", "dom@x.com", "vendor"))
        .await;
    let owner = user_id(&registered.body);

    let resp = app
        .post("/api/auth/login", None, &credentials("dom@x.com", "secret123"))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["message"], "Login successful");
    assert_eq!(resp.body["stall_status"], "ok");
    let stall_name = resp.body["user"]["stall"]["stall_name"].as_str().unwrap();
    assert!(stall_name.contains("Dom"));
    assert_eq!(app.store.stall_count(owner).await, 1);
}

#[tokio::test]
async fn test_buyer_login_has_null_stall() {
    let app = TestApp::new();
    app.post("/api/auth/register", None, &registration("Bea", "bea@x.com", "buyer"))
        .await;

    let resp = app
        .post("/api/auth/login", None, &credentials("bea@x.com", "secret123"))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body["user"]["stall"].is_null());
    assert!(resp.body.get("stall_status").is_none());
}

#[tokio::test]
async fn test_login_failures() {
    let app = TestApp::new();
    app.post("/api/auth/register", None, &registration("Dom", "dom@x.com", "vendor"))
        .await;

    let resp = app
        .post("/api/auth/login", None, &credentials("dom@x.com", "wrong-password"))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.error(), Some("Invalid password"));
    assert!(resp.token().is_none());

    let resp = app
        .post("/api/auth/login", None, &credentials("nobody@x.com", "secret123"))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error(), Some("User not found"));

    let resp = app
        .post("/api/auth/login", None, &json!({ "email": "dom@x.com" }))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_repairs_missing_stall() {
    let app = TestApp::new();
    let registered = app
        .post("/api/auth/register", None, &registration("Dom", "dom@x.com", "vendor"))
        .await;
    let owner = user_id(&registered.body);
    assert!(app.store.remove_stall(owner).await);

    let resp = app
        .post("/api/auth/login", None, &credentials("dom@x.com", "secret123"))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["stall_status"], "ok");
    assert!(!resp.body["user"]["stall"].is_null());
    assert_eq!(app.store.stall_count(owner).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_logins_repair_once() {
    let app = Arc::new(TestApp::new());
    let registered = app
        .post("/api/auth/register", None, &registration("Dom", "dom@x.com", "vendor"))
        .await;
    let owner = user_id(&registered.body);
    assert!(app.store.remove_stall(owner).await);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let app = Arc::clone(&app);
            tokio::spawn(async move {
                app.post("/api/auth/login", None, &credentials("dom@x.com", "secret123"))
                    .await
            })
        })
        .collect();

    let mut stall_ids = Vec::new();
    for handle in handles {
        let resp = handle.await.unwrap();
        assert_eq!(resp.status, StatusCode::OK);
        stall_ids.push(resp.body["user"]["stall"]["stall_id"].clone());
    }

    assert_eq!(app.store.stall_count(owner).await, 1);
    assert!(stall_ids.iter().all(|id| *id == stall_ids[0]));
}

#[tokio::test]
async fn test_match_policy_rejects_wrong_role() {
    let app = TestApp::with_policy(LoginRolePolicy::RequireMatch);
    app.post("/api/auth/register", None, &registration("Dom", "dom@x.com", "vendor"))
        .await;

    let resp = app
        .post(
            "/api/auth/login",
            None,
            &json!({ "email": "dom@x.com", "password": "secret123", "role": "buyer" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error(), Some("User not found"));

    let resp = app
        .post(
            "/api/auth/login",
            None,
            &json!({ "email": "dom@x.com", "password": "secret123", "role": "vendor" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}

// ============================================================================
// Token-protected routes
// ============================================================================

#[tokio::test]
async fn test_profile_echoes_claims() {
    let app = TestApp::new();
    let registered = app
        .post("/api/auth/register", None, &registration("Dom", "dom@x.com", "vendor"))
        .await;
    let token = registered.token().unwrap();

    let resp = app.get("/api/profile", Some(token)).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["message"], "Welcome, dom@x.com!");
    assert_eq!(resp.body["user"]["email"], "dom@x.com");
    assert_eq!(resp.body["user"]["role"], "vendor");
    assert_eq!(resp.body["user"]["id"], registered.body["user"]["id"]);
    assert!(resp.body["user"]["exp"].as_i64().unwrap() > resp.body["user"]["iat"].as_i64().unwrap());
}

#[tokio::test]
async fn test_profile_requires_token() {
    let app = TestApp::new();

    let resp = app.get("/api/profile", None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.error(), Some("No token provided"));

    let resp = app.get("/api/profile", Some("not.a.token")).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.error(), Some("Invalid or expired token"));
}

#[tokio::test]
async fn test_me_reads_from_store() {
    let app = TestApp::new();
    let registered = app
        .post("/api/auth/register", None, &registration("Dom", "dom@x.com", "vendor"))
        .await;

    let resp = app.get("/api/auth/me", registered.token()).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["user"]["full_name"], "Dom");
}

#[tokio::test]
async fn test_buyer_cannot_create_products() {
    let app = TestApp::new();
    let registered = app
        .post("/api/auth/register", None, &registration("Bea", "bea@x.com", "buyer"))
        .await;

    let resp = app
        .post(
            "/api/products",
            registered.token(),
            &json!({ "stall_id": 1, "item_name": "Mango", "price": "50.00" }),
        )
        .await;

    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.error(), Some("Vendor account required"));
}
