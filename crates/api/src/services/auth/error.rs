//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::token::TokenError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Input rejected before touching the store. The message is shown to
    /// the client as-is.
    #[error("{0}")]
    Validation(&'static str),

    /// Email is already registered.
    #[error("Email already exists")]
    EmailTaken,

    /// No account matches the login request.
    #[error("User not found")]
    UserNotFound,

    /// Password does not match the stored hash.
    #[error("Invalid password")]
    InvalidPassword,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Token signing error.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
