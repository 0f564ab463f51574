//! In-process credential store for tests.
//!
//! Mirrors the `PostgreSQL` constraints the identity core relies on: unique
//! email, and at most one stall per owner.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use stall_market_core::{Email, StallId, UserId};

use super::{Account, CredentialStore, NewAccount};
use crate::db::RepositoryError;
use crate::models::{NewStall, Stall, User, UserRecord};

#[derive(Default)]
struct Tables {
    users: Vec<UserRecord>,
    stalls: Vec<Stall>,
    next_user_id: i32,
    next_stall_id: i32,
}

impl Tables {
    fn insert_stall(&mut self, owner: UserId, stall: &NewStall) -> Result<Stall, RepositoryError> {
        if self.stalls.iter().any(|s| s.owner_id == owner) {
            return Err(RepositoryError::Conflict(
                "owner already has a stall".to_owned(),
            ));
        }

        self.next_stall_id += 1;
        let stall = Stall {
            id: StallId::new(self.next_stall_id),
            owner_id: owner,
            stall_name: stall.stall_name.clone(),
            stall_description: stall.stall_description.clone(),
            category: stall.category.clone(),
            stall_address: stall.stall_address.clone(),
            stall_city: stall.stall_city.clone(),
            stall_state: stall.stall_state.clone(),
            stall_zip_code: stall.stall_zip_code.clone(),
            created_at: Utc::now(),
        };
        self.stalls.push(stall.clone());
        Ok(stall)
    }
}

/// Credential store holding everything in memory behind a mutex.
#[derive(Default)]
pub struct MemoryCredentialStore {
    tables: Mutex<Tables>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered users.
    pub async fn user_count(&self) -> usize {
        self.tables.lock().await.users.len()
    }

    /// Number of stalls owned by `owner`.
    pub async fn stall_count(&self, owner: UserId) -> usize {
        self.tables
            .lock()
            .await
            .stalls
            .iter()
            .filter(|s| s.owner_id == owner)
            .count()
    }

    /// Delete `owner`'s stall out of band. Returns whether one existed.
    pub async fn remove_stall(&self, owner: UserId) -> bool {
        let mut tables = self.tables.lock().await;
        let before = tables.stalls.len();
        tables.stalls.retain(|s| s.owner_id != owner);
        tables.stalls.len() != before
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_user_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|r| &r.user.email == email)
            .cloned())
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|r| r.user.id == id)
            .map(|r| r.user.clone()))
    }

    async fn create_account(&self, account: NewAccount) -> Result<Account, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|r| r.user.email == account.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        tables.next_user_id += 1;
        let user = User {
            id: UserId::new(tables.next_user_id),
            email: account.email,
            role: account.role,
            full_name: account.full_name,
            created_at: Utc::now(),
        };

        // Both writes happen under one lock, so nothing is observable half-done.
        let stall = match &account.stall {
            Some(new_stall) => Some(tables.insert_stall(user.id, new_stall)?),
            None => None,
        };
        tables.users.push(UserRecord {
            user: user.clone(),
            password_hash: account.password_hash,
        });

        Ok(Account { user, stall })
    }

    async fn find_stall_by_owner(&self, owner: UserId) -> Result<Option<Stall>, RepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.stalls.iter().find(|s| s.owner_id == owner).cloned())
    }

    async fn insert_stall(
        &self,
        owner: UserId,
        stall: &NewStall,
    ) -> Result<Stall, RepositoryError> {
        self.tables.lock().await.insert_stall(owner, stall)
    }
}
