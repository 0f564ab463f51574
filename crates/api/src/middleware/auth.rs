//! Authentication extractors.
//!
//! Requests authenticate with `Authorization: Bearer <token>`. The token is
//! verified on every request; nothing is kept server-side.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::set_sentry_user;
use crate::services::token::Claims;
use crate::state::AppState;

/// Extractor that requires a valid session token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(claims): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", claims.email)
/// }
/// ```
pub struct RequireAuth(pub Claims);

/// Extractor that requires a valid session token for a vendor account.
pub struct RequireVendor(pub Claims);

/// Error returned when a request is not allowed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No bearer token on the request.
    MissingToken,
    /// The token failed verification or has expired.
    InvalidToken,
    /// The token is valid but the account is not a vendor.
    NotVendor,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingToken => (StatusCode::UNAUTHORIZED, "No token provided"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            Self::NotVendor => (StatusCode::FORBIDDEN, "Vendor account required"),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthRejection::MissingToken)?;

        let claims = state.tokens().verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected session token");
            AuthRejection::InvalidToken
        })?;

        set_sentry_user(&claims.id, Some(claims.email.as_str()));
        Ok(Self(claims))
    }
}

impl FromRequestParts<AppState> for RequireVendor {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(claims) = RequireAuth::from_request_parts(parts, state).await?;
        if !claims.role.is_vendor() {
            return Err(AuthRejection::NotVendor);
        }
        Ok(Self(claims))
    }
}
