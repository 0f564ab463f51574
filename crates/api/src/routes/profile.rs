//! Token smoke-test route.

use axum::{Json, response::IntoResponse};
use serde_json::json;

use crate::middleware::RequireAuth;

/// Greet the bearer of a valid token and echo its claims.
pub async fn profile(RequireAuth(claims): RequireAuth) -> impl IntoResponse {
    Json(json!({
        "message": format!("Welcome, {}!", claims.email),
        "user": claims,
    }))
}
