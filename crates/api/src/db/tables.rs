//! Raw per-table listing.
//!
//! Each listable table has one fixed query. Rows come back as JSON objects
//! built by `PostgreSQL`, so the listing needs no row type per table.

use sqlx::PgPool;

use super::RepositoryError;

/// A table exposed through `GET /api/tables/{name}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListedTable {
    Users,
    Vendors,
    Buyers,
    Stalls,
    StallItems,
    Images,
    Reviews,
    RevokedTokens,
}

impl ListedTable {
    /// Every listable table, in display order.
    pub const ALL: [Self; 8] = [
        Self::Users,
        Self::Vendors,
        Self::Buyers,
        Self::Stalls,
        Self::StallItems,
        Self::Images,
        Self::Reviews,
        Self::RevokedTokens,
    ];

    /// The table name used in URLs and error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Vendors => "vendors",
            Self::Buyers => "buyers",
            Self::Stalls => "stalls",
            Self::StallItems => "stall_items",
            Self::Images => "images",
            Self::Reviews => "reviews",
            Self::RevokedTokens => "revoked_tokens",
        }
    }

    /// Look up a table by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Query returning all rows as a single JSON array.
    const fn sql(self) -> &'static str {
        match self {
            // Never expose password hashes.
            Self::Users => {
                r"
                SELECT COALESCE(json_agg(t), '[]'::json) FROM (
                    SELECT user_id, email, role, full_name, created_at
                    FROM users ORDER BY user_id
                ) t
                "
            }
            Self::Vendors => {
                "SELECT COALESCE(json_agg(t), '[]'::json) FROM (SELECT * FROM vendors ORDER BY user_id) t"
            }
            Self::Buyers => {
                "SELECT COALESCE(json_agg(t), '[]'::json) FROM (SELECT * FROM buyers ORDER BY user_id) t"
            }
            Self::Stalls => {
                "SELECT COALESCE(json_agg(t), '[]'::json) FROM (SELECT * FROM stalls ORDER BY stall_id) t"
            }
            Self::StallItems => {
                "SELECT COALESCE(json_agg(t), '[]'::json) FROM (SELECT * FROM stall_items ORDER BY item_id) t"
            }
            Self::Images => {
                "SELECT COALESCE(json_agg(t), '[]'::json) FROM (SELECT * FROM images ORDER BY image_id) t"
            }
            Self::Reviews => {
                "SELECT COALESCE(json_agg(t), '[]'::json) FROM (SELECT * FROM reviews ORDER BY review_id) t"
            }
            Self::RevokedTokens => {
                "SELECT COALESCE(json_agg(t), '[]'::json) FROM (SELECT * FROM revoked_tokens ORDER BY token_id) t"
            }
        }
    }
}

/// Repository for raw table listings.
pub struct TableRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TableRepository<'a> {
    /// Create a new table repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch every row of `table` as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn fetch_all(&self, table: ListedTable) -> Result<serde_json::Value, RepositoryError> {
        let rows = sqlx::query_scalar::<_, serde_json::Value>(table.sql())
            .fetch_one(self.pool)
            .await?;
        Ok(rows)
    }
}
