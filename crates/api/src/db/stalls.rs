//! Stall repository.
//!
//! `stalls.user_id` is unique: a vendor owns at most one stall, and the
//! identity core keeps it at exactly one.

use sqlx::{PgExecutor, PgPool};

use stall_market_core::{StallId, UserId};

use super::RepositoryError;
use crate::models::{NewStall, Stall, StallCard};

/// Repository for stall database operations.
pub struct StallRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StallRepository<'a> {
    /// Create a new stall repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the stall owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_owner(&self, owner: UserId) -> Result<Option<Stall>, RepositoryError> {
        let stall = sqlx::query_as::<_, Stall>(
            r"
            SELECT stall_id, user_id, stall_name, stall_description, category,
                   stall_address, stall_city, stall_state, stall_zip_code, created_at
            FROM stalls
            WHERE user_id = $1
            ",
        )
        .bind(owner)
        .fetch_optional(self.pool)
        .await?;

        Ok(stall)
    }

    /// Get a stall by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: StallId) -> Result<Option<Stall>, RepositoryError> {
        let stall = sqlx::query_as::<_, Stall>(
            r"
            SELECT stall_id, user_id, stall_name, stall_description, category,
                   stall_address, stall_city, stall_state, stall_zip_code, created_at
            FROM stalls
            WHERE stall_id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(stall)
    }

    /// Insert a stall for `owner`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if `owner` already has a stall.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, owner: UserId, stall: &NewStall) -> Result<Stall, RepositoryError> {
        insert_stall(self.pool, owner, stall).await
    }

    /// Create `owner`'s stall, or overwrite it if one already exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, owner: UserId, stall: &NewStall) -> Result<Stall, RepositoryError> {
        let stall = sqlx::query_as::<_, Stall>(
            r"
            INSERT INTO stalls (user_id, stall_name, stall_description, category,
                                stall_address, stall_city, stall_state, stall_zip_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id) DO UPDATE SET
                stall_name = EXCLUDED.stall_name,
                stall_description = EXCLUDED.stall_description,
                category = EXCLUDED.category,
                stall_address = EXCLUDED.stall_address,
                stall_city = EXCLUDED.stall_city,
                stall_state = EXCLUDED.stall_state,
                stall_zip_code = EXCLUDED.stall_zip_code
            RETURNING stall_id, user_id, stall_name, stall_description, category,
                      stall_address, stall_city, stall_state, stall_zip_code, created_at
            ",
        )
        .bind(owner)
        .bind(&stall.stall_name)
        .bind(&stall.stall_description)
        .bind(&stall.category)
        .bind(&stall.stall_address)
        .bind(&stall.stall_city)
        .bind(&stall.stall_state)
        .bind(&stall.stall_zip_code)
        .fetch_one(self.pool)
        .await?;

        Ok(stall)
    }

    /// List every stall as a card, ordered by stall ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_cards(&self) -> Result<Vec<StallCard>, RepositoryError> {
        // Using runtime query to avoid SQLx offline mode cache requirements
        let cards = sqlx::query_as::<_, StallCard>(
            r"
            SELECT s.stall_id, s.user_id, s.stall_name, s.stall_description, s.category,
                   s.stall_address, s.stall_city, s.stall_state, s.stall_zip_code,
                   v.business_name, v.vendor_contact,
                   banner.image_url AS banner_url,
                   icon.image_url AS icon_url,
                   (SELECT AVG(r.rating)::float8 FROM reviews r WHERE r.stall_id = s.stall_id)
                       AS rating
            FROM stalls s
            LEFT JOIN vendors v ON v.user_id = s.user_id
            LEFT JOIN images banner
                ON banner.stall_id = s.stall_id
               AND banner.entity_type = 'stall'
               AND banner.image_type = 'banner'
            LEFT JOIN images icon
                ON icon.stall_id = s.stall_id
               AND icon.entity_type = 'stall'
               AND icon.image_type = 'icon'
            ORDER BY s.stall_id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(cards)
    }
}

/// Insert a stall using any executor, so account creation can run it inside
/// its transaction.
pub(crate) async fn insert_stall<'e, E>(
    executor: E,
    owner: UserId,
    stall: &NewStall,
) -> Result<Stall, RepositoryError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Stall>(
        r"
        INSERT INTO stalls (user_id, stall_name, stall_description, category,
                            stall_address, stall_city, stall_state, stall_zip_code)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING stall_id, user_id, stall_name, stall_description, category,
                  stall_address, stall_city, stall_state, stall_zip_code, created_at
        ",
    )
    .bind(owner)
    .bind(&stall.stall_name)
    .bind(&stall.stall_description)
    .bind(&stall.category)
    .bind(&stall.stall_address)
    .bind(&stall.stall_city)
    .bind(&stall.stall_state)
    .bind(&stall.stall_zip_code)
    .fetch_one(executor)
    .await
    .map_err(|e| RepositoryError::from_unique(e, "owner already has a stall"))
}
