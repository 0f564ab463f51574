//! Stall item (product) repository.

use sqlx::PgPool;

use stall_market_core::{ImageType, ItemId, StallId, UserId};

use super::RepositoryError;
use super::images::{ImageTarget, attach_image, delete_item_images};
use crate::models::{NewProduct, Product, ProductChanges};

/// Repository for stall item database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List items with their thumbnail URL, optionally for one stall.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, stall_id: Option<StallId>) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(
            r"
            SELECT i.item_id, i.stall_id, i.item_name, i.item_description, i.price,
                   i.item_stocks, i.in_stock, i.category, i.created_at,
                   thumb.image_url AS thumbnail_url
            FROM stall_items i
            LEFT JOIN images thumb
                ON thumb.item_id = i.item_id
               AND thumb.entity_type = 'item'
               AND thumb.image_type = 'thumbnail'
            WHERE $1::int4 IS NULL OR i.stall_id = $1
            ORDER BY i.item_id
            ",
        )
        .bind(stall_id)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Get the owner of the stall an item belongs to.
    ///
    /// Returns `None` if the item does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_owner(&self, id: ItemId) -> Result<Option<UserId>, RepositoryError> {
        let owner = sqlx::query_scalar::<_, UserId>(
            r"
            SELECT s.user_id
            FROM stall_items i
            JOIN stalls s ON s.stall_id = i.stall_id
            WHERE i.item_id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(owner)
    }

    /// Create an item and, if an image URL is given, its thumbnail.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, product: &NewProduct) -> Result<ItemId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let item_id = sqlx::query_scalar::<_, ItemId>(
            r"
            INSERT INTO stall_items (stall_id, item_name, item_description, price,
                                     item_stocks, in_stock, category)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING item_id
            ",
        )
        .bind(product.stall_id)
        .bind(&product.item_name)
        .bind(&product.item_description)
        .bind(product.price)
        .bind(product.item_stocks)
        .bind(product.in_stock())
        .bind(&product.category)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(url) = &product.image_url {
            attach_image(&mut tx, ImageTarget::Item(item_id), ImageType::Thumbnail, url).await?;
        }

        tx.commit().await?;
        Ok(item_id)
    }

    /// Apply a partial update. A new stock count recomputes `in_stock`; a new
    /// image URL replaces the thumbnail.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(&self, id: ItemId, changes: &ProductChanges) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE stall_items SET
                item_name = COALESCE($2, item_name),
                item_description = COALESCE($3, item_description),
                price = COALESCE($4, price),
                item_stocks = COALESCE($5, item_stocks),
                in_stock = COALESCE($6, in_stock),
                category = COALESCE($7, category)
            WHERE item_id = $1
            ",
        )
        .bind(id)
        .bind(&changes.item_name)
        .bind(&changes.item_description)
        .bind(changes.price)
        .bind(changes.item_stocks)
        .bind(changes.in_stock())
        .bind(&changes.category)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        if let Some(url) = &changes.image_url {
            attach_image(&mut tx, ImageTarget::Item(id), ImageType::Thumbnail, url).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Delete an item and every image attached to it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ItemId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        delete_item_images(&mut tx, id).await?;

        let result = sqlx::query("DELETE FROM stall_items WHERE item_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }
}
