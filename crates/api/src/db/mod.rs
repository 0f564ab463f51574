//! Database operations for the marketplace `PostgreSQL` schema.
//!
//! ## Tables
//!
//! - `users` - Accounts (email, Argon2 password hash, role, display name)
//! - `vendors` / `buyers` - Role profile, exactly one per user
//! - `stalls` - Vendor storefronts, at most one per owner (`UNIQUE (user_id)`)
//! - `stall_items` - Products listed under a stall
//! - `images` - Uploaded pictures attached to items, stalls or users
//! - `reviews` - Stall ratings
//! - `revoked_tokens` - Listed only; never consulted
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p stall-market-cli -- migrate
//! ```

pub mod credentials;
pub mod images;
pub mod products;
pub mod stalls;
pub mod tables;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use credentials::PgCredentialStore;
pub use images::ImageRepository;
pub use products::ProductRepository;
pub use stalls::StallRepository;
pub use tables::{ListedTable, TableRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique violations to `Conflict`, everything else to `Database`.
    pub(crate) fn from_unique(e: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(what.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
