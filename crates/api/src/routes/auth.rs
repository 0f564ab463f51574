//! Registration, login and current-user routes.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use super::json_body;
use crate::error::{AppError, Result, set_sentry_user};
use crate::middleware::RequireAuth;
use crate::models::{StallSummary, UserSummary};
use crate::services::auth::StallOutcome;
use crate::state::AppState;

/// Registration form. Absent or null fields are treated as empty.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Login form.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    /// Only consulted when logins are gated on role.
    pub role: Option<String>,
}

#[derive(Serialize)]
struct RegisterResponse {
    message: &'static str,
    token: String,
    user: UserSummary,
}

#[derive(Serialize)]
struct LoginUser {
    #[serde(flatten)]
    user: UserSummary,
    stall: Option<StallSummary>,
}

#[derive(Serialize)]
struct LoginResponse {
    message: &'static str,
    token: String,
    user: LoginUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    stall_status: Option<&'static str>,
}

/// Create an account.
///
/// Vendors get a default stall created together with the account.
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let form = json_body(payload)?;

    let registered = state
        .auth()
        .register(
            form.full_name.as_deref().unwrap_or_default(),
            form.email.as_deref().unwrap_or_default(),
            form.password.as_deref().unwrap_or_default(),
            form.role.as_deref().unwrap_or_default(),
        )
        .await?;

    set_sentry_user(&registered.user.id, Some(registered.user.email.as_str()));

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully!",
            token: registered.token,
            user: UserSummary::from(&registered.user),
        }),
    ))
}

/// Exchange email and password for a session token.
///
/// For vendors the response carries their stall, recreated if it was
/// missing, and a `stall_status` of `ok` or `degraded`.
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let form = json_body(payload)?;

    let logged_in = state
        .auth()
        .login(
            form.email.as_deref().unwrap_or_default(),
            form.password.as_deref().unwrap_or_default(),
            form.role.as_deref(),
        )
        .await?;

    set_sentry_user(&logged_in.user.id, Some(logged_in.user.email.as_str()));

    let stall_status = match logged_in.stall {
        StallOutcome::NotApplicable => None,
        StallOutcome::Ready(_) => Some("ok"),
        StallOutcome::Degraded => Some("degraded"),
    };

    Ok(Json(LoginResponse {
        message: "Login successful",
        token: logged_in.token,
        user: LoginUser {
            user: UserSummary::from(&logged_in.user),
            stall: logged_in.stall.summary().cloned(),
        },
        stall_status,
    }))
}

/// Current account, read fresh from the store.
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(claims): RequireAuth,
) -> Result<impl IntoResponse> {
    let user = state
        .auth()
        .get_user(claims.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(serde_json::json!({ "user": UserSummary::from(&user) })))
}
