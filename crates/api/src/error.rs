//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Every error body is `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::uploads::UploadError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Storing an upload failed.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Listing a table failed.
    #[error("Failed to fetch {table}: {source}")]
    Fetch {
        table: &'static str,
        #[source]
        source: RepositoryError,
    },

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// User is authenticated but may not do this.
    #[error("{0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Fetch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::Validation(_) | AuthError::EmailTaken | AuthError::UserNotFound => {
                    StatusCode::BAD_REQUEST
                }
                AuthError::InvalidPassword => StatusCode::UNAUTHORIZED,
                AuthError::Repository(_) | AuthError::Token(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Upload(err) => match err {
                UploadError::UnsupportedType | UploadError::Empty => StatusCode::BAD_REQUEST,
                UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Fetch { table, .. } => format!("Failed to fetch {table}"),
            _ if status.is_server_error() => "Internal server error".to_string(),
            Self::Database(RepositoryError::Conflict(what)) => what.clone(),
            Self::Auth(err) => err.to_string(),
            Self::Upload(err) => err.to_string(),
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::auth::MISSING_FIELDS;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_auth_errors_map_to_client_statuses() {
        let (status, body) = body_of(AuthError::Validation(MISSING_FIELDS).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing Fields");

        let (status, body) = body_of(AuthError::EmailTaken.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email already exists");

        let (status, body) = body_of(AuthError::UserNotFound.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "User not found");

        let (status, body) = body_of(AuthError::InvalidPassword.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid password");
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption("secret detail".into()));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");

        let (_, body) = body_of(AuthError::PasswordHash.into()).await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_fetch_error_names_table() {
        let err = AppError::Fetch {
            table: "stalls",
            source: RepositoryError::NotFound,
        };
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch stalls");
    }

    #[tokio::test]
    async fn test_conflict_is_a_client_error() {
        let err = AppError::Database(RepositoryError::Conflict(
            "owner already has a stall".to_string(),
        ));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "owner already has a stall");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::NotFound("Product not found".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Forbidden("You do not own this stall".to_string()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Upload(UploadError::UnsupportedType).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
