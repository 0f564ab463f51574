//! Integration tests for Stall Market.
//!
//! The full router is driven in-process with `tower::ServiceExt::oneshot`.
//! Identity routes run against the in-memory credential store, so no
//! database is needed for them; the pool is connected lazily and never used
//! unless a test reaches a `PostgreSQL`-backed route.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p stall-market-integration-tests
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use stall_market_api::config::{JwtConfig, LoginRolePolicy, MarketConfig};
use stall_market_api::routes;
use stall_market_api::state::AppState;
use stall_market_api::store::memory::MemoryCredentialStore;

const TEST_DATABASE_URL: &str = "postgres://localhost/stall_market_test";
const TEST_JWT_SECRET: &str = "integration-test-signing-key-9f3Kq7Zx2Lm8Rv4T";

/// Configuration for an in-process test server.
#[must_use]
pub fn test_config(policy: LoginRolePolicy) -> MarketConfig {
    MarketConfig {
        database_url: SecretString::from(TEST_DATABASE_URL),
        host: [127, 0, 0, 1].into(),
        port: 0,
        jwt: JwtConfig {
            secret: SecretString::from(TEST_JWT_SECRET),
            expires_in: Duration::from_secs(3600),
        },
        login_role_policy: policy,
        upload_dir: std::env::temp_dir().join("stall-market-test-uploads"),
        cors_origins: Vec::new(),
        auth_rate_limit: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A router wired to an in-memory credential store.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryCredentialStore>,
}

impl TestApp {
    /// Build an app with the default login policy.
    ///
    /// # Panics
    ///
    /// Panics if the lazy pool cannot be created from the test URL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(LoginRolePolicy::default())
    }

    /// Build an app with a specific login policy.
    ///
    /// # Panics
    ///
    /// Panics if the lazy pool cannot be created from the test URL.
    #[must_use]
    pub fn with_policy(policy: LoginRolePolicy) -> Self {
        Self::with_config(test_config(policy))
    }

    /// Build an app from a full configuration.
    ///
    /// # Panics
    ///
    /// Panics if the lazy pool cannot be created from the test URL.
    #[must_use]
    pub fn with_config(config: MarketConfig) -> Self {
        let store = Arc::new(MemoryCredentialStore::new());
        let pool = PgPool::connect_lazy(TEST_DATABASE_URL).expect("valid test database URL");
        let state = AppState::with_store(config, pool, store.clone());

        Self {
            router: routes::app(state),
            store,
        }
    }

    /// Send a request and return status, response headers and parsed JSON body.
    ///
    /// Non-JSON bodies come back as a JSON string.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        self.dispatch(request).await
    }

    /// POST a JSON body as a client at `ip`, as seen through a proxy.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn post_from(&self, ip: &str, uri: &str, body: &Value) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("x-forwarded-for", ip)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request");

        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> Response {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        Response {
            status,
            headers,
            body,
        }
    }

    /// POST a JSON body.
    pub async fn post(&self, uri: &str, token: Option<&str>, body: &Value) -> Response {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    /// GET without a body.
    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        self.send(Method::GET, uri, token, None).await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A buffered response.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl Response {
    /// The `error` message of an error body.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }

    /// The `token` field of an auth response.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.body.get("token").and_then(Value::as_str)
    }
}
