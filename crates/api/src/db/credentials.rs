//! `PostgreSQL` credential store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use stall_market_core::{Email, Role, UserId};

use super::RepositoryError;
use super::stalls::{StallRepository, insert_stall};
use crate::models::{NewStall, Stall, User, UserRecord};
use crate::store::{Account, CredentialStore, NewAccount};

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: UserId,
    email: String,
    role: Role,
    full_name: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.user_id,
            email,
            role: row.role,
            full_name: row.full_name,
            created_at: row.created_at,
        })
    }
}

/// Credential store backed by the `users`, `vendors`, `buyers` and `stalls`
/// tables.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Create a new store over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_user_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHashRow>(
            r"
            SELECT user_id, email, role, full_name, created_at, password_hash
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            Ok(UserRecord {
                user: r.user.try_into()?,
                password_hash: r.password_hash,
            })
        })
        .transpose()
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT user_id, email, role, full_name, created_at
            FROM users
            WHERE user_id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn create_account(&self, account: NewAccount) -> Result<Account, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (email, password_hash, role, full_name)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, email, role, full_name, created_at
            ",
        )
        .bind(account.email.as_str())
        .bind(&account.password_hash)
        .bind(account.role)
        .bind(&account.full_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "email already exists"))?;

        let user = User::try_from(row)?;

        let profile_sql = match user.role {
            Role::Vendor => "INSERT INTO vendors (user_id) VALUES ($1)",
            Role::Buyer => "INSERT INTO buyers (user_id) VALUES ($1)",
        };
        sqlx::query(profile_sql)
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        let stall = match &account.stall {
            Some(new_stall) => Some(insert_stall(&mut *tx, user.id, new_stall).await?),
            None => None,
        };

        tx.commit().await?;

        Ok(Account { user, stall })
    }

    async fn find_stall_by_owner(&self, owner: UserId) -> Result<Option<Stall>, RepositoryError> {
        StallRepository::new(&self.pool).get_by_owner(owner).await
    }

    async fn insert_stall(
        &self,
        owner: UserId,
        stall: &NewStall,
    ) -> Result<Stall, RepositoryError> {
        StallRepository::new(&self.pool).create(owner, stall).await
    }
}
