//! HTTP route handlers for the marketplace API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Auth (rate limited)
//! POST /api/auth/register      - Create an account
//! POST /api/auth/login         - Exchange credentials for a token
//! GET  /api/auth/me            - Current account (requires auth)
//! GET  /api/profile            - Token claims (requires auth)
//!
//! # Stalls
//! GET  /api/stalls             - Stall cards
//! POST /api/stalls             - Save the caller's stall (vendor, multipart)
//! GET  /api/cards              - Stall cards
//!
//! # Products
//! GET    /api/products         - Items, optionally `?stall_id=`
//! POST   /api/products         - Create item (vendor, owner)
//! PUT    /api/products/{id}    - Update item (vendor, owner)
//! DELETE /api/products/{id}    - Delete item (vendor, owner)
//!
//! # Images
//! POST /api/images             - Attach an uploaded image (vendor, multipart)
//!
//! # Tables
//! GET  /api/tables             - Listable table names
//! GET  /api/tables/{name}      - All rows of one table
//!
//! GET  /uploads/*              - Uploaded files
//! ```

pub mod auth;
pub mod images;
pub mod products;
pub mod profile;
pub mod stalls;
pub mod tables;

use std::collections::HashMap;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode},
    middleware::from_fn,
    routing::{get, post, put},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::config::MarketConfig;
use crate::error::{AppError, Result};
use crate::middleware::rate_limit::RateLimiterLayer;
use crate::middleware::{auth_rate_limiter, request_id_middleware};
use crate::services::uploads::PUBLIC_PREFIX;
use crate::state::AppState;

/// Largest accepted multipart body.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Map a body that is not valid JSON to a 400 with the extractor's reason.
pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// A file part of a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

/// A fully buffered multipart form.
///
/// Text fields that are blank count as absent. File inputs left empty by the
/// browser (no name, no bytes) are dropped.
#[derive(Debug, Default)]
pub struct FormData {
    text: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl FormData {
    /// Drain every field of `multipart`.
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if let Some(file_name) = field.file_name().map(str::to_owned) {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.files.insert(
                    name,
                    UploadedFile {
                        file_name: Some(file_name).filter(|n| !n.is_empty()),
                        bytes,
                    },
                );
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                form.text.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Remove a text field, trimmed; blank values are `None`.
    pub fn take_text(&mut self, name: &str) -> Option<String> {
        self.text
            .remove(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Remove a file field.
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Create the auth routes router.
fn auth_routes(limiter: Option<RateLimiterLayer>) -> Router<AppState> {
    let limited = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));
    let limited = match limiter {
        Some(layer) => limited.layer(layer),
        None => limited,
    };

    limited.route("/me", get(auth::me))
}

/// Create the stall routes router.
fn stall_routes() -> Router<AppState> {
    Router::new().route(
        "/",
        get(stalls::list)
            .post(stalls::upsert)
            .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
    )
}

/// Create the product routes router.
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route("/{id}", put(products::update).delete(products::delete))
}

/// Create the table listing routes router.
fn table_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(tables::index))
        .route("/{name}", get(tables::show))
}

/// Create all `/api` routes.
pub fn routes(config: &MarketConfig) -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes(auth_rate_limiter(config)))
        .route("/api/profile", get(profile::profile))
        .nest("/api/stalls", stall_routes())
        .route("/api/cards", get(stalls::list))
        .nest("/api/products", product_routes())
        .route(
            "/api/images",
            post(images::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .nest("/api/tables", table_routes())
}

/// CORS for the configured origins; any origin when none are configured.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the complete application: routes, uploads and the middleware stack.
pub fn app(state: AppState) -> Router {
    let config = state.config();
    let uploads = ServeDir::new(config.upload_dir.clone());
    let cors = cors_layer(&config.cors_origins);
    let api = routes(config);

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(api)
        .nest_service(PUBLIC_PREFIX, uploads)
        .layer(cors)
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
