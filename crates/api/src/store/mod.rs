//! Credential store port used by the identity core.
//!
//! The identity core only ever talks to this trait. `PostgreSQL` backs it in
//! production ([`crate::db::PgCredentialStore`]); tests use
//! [`memory::MemoryCredentialStore`].

#[cfg(any(test, feature = "test-support"))]
pub mod memory;

use async_trait::async_trait;

use stall_market_core::{Email, Role, UserId};

use crate::db::RepositoryError;
use crate::models::{NewStall, Stall, User, UserRecord};

/// Everything needed to create an account in one step.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: Email,
    /// Argon2 PHC string; never the plaintext password.
    pub password_hash: String,
    pub role: Role,
    pub full_name: String,
    /// Initial stall, inserted alongside the user. Set for vendors only.
    pub stall: Option<NewStall>,
}

/// A freshly created account.
#[derive(Debug, Clone)]
pub struct Account {
    pub user: User,
    pub stall: Option<Stall>,
}

/// Persistence for users, role profiles and stall ownership.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a user and their password hash by exact email.
    async fn find_user_by_email(&self, email: &Email)
    -> Result<Option<UserRecord>, RepositoryError>;

    /// Look up a user by id.
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Create the user row, its role profile row and, if given, its stall.
    ///
    /// All rows are written or none are. Returns `Conflict` if the email is
    /// already registered.
    async fn create_account(&self, account: NewAccount) -> Result<Account, RepositoryError>;

    /// The stall owned by `owner`, if any.
    async fn find_stall_by_owner(&self, owner: UserId) -> Result<Option<Stall>, RepositoryError>;

    /// Insert a stall for `owner`.
    ///
    /// Returns `Conflict` if `owner` already has one.
    async fn insert_stall(&self, owner: UserId, stall: &NewStall)
    -> Result<Stall, RepositoryError>;
}
