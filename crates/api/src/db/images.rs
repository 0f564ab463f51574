//! Image repository.

use sqlx::{PgConnection, PgPool};

use stall_market_core::{ImageEntity, ImageType, ItemId, StallId, UserId};

use super::RepositoryError;
use crate::models::Image;

/// The record an image is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTarget {
    Item(ItemId),
    Stall(StallId),
    User(UserId),
}

impl ImageTarget {
    /// The `entity_type` column value for this target.
    #[must_use]
    pub const fn entity(self) -> ImageEntity {
        match self {
            Self::Item(_) => ImageEntity::Item,
            Self::Stall(_) => ImageEntity::Stall,
            Self::User(_) => ImageEntity::User,
        }
    }

    const fn columns(self) -> (Option<ItemId>, Option<StallId>, Option<UserId>) {
        match self {
            Self::Item(id) => (Some(id), None, None),
            Self::Stall(id) => (None, Some(id), None),
            Self::User(id) => (None, None, Some(id)),
        }
    }
}

/// Repository for image database operations.
pub struct ImageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ImageRepository<'a> {
    /// Create a new image repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Attach an image to `target`.
    ///
    /// Thumbnails, banners and icons replace any existing image of the same
    /// type on the same target; gallery images accumulate.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn attach(
        &self,
        target: ImageTarget,
        image_type: ImageType,
        image_url: &str,
    ) -> Result<Image, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let image = attach_image(&mut tx, target, image_type, image_url).await?;
        tx.commit().await?;
        Ok(image)
    }
}

/// Attach an image on an open connection or transaction.
pub(crate) async fn attach_image(
    conn: &mut PgConnection,
    target: ImageTarget,
    image_type: ImageType,
    image_url: &str,
) -> Result<Image, RepositoryError> {
    let (item_id, stall_id, user_id) = target.columns();

    if image_type.is_singular() {
        sqlx::query(
            r"
            DELETE FROM images
            WHERE entity_type = $1
              AND image_type = $2
              AND item_id IS NOT DISTINCT FROM $3
              AND stall_id IS NOT DISTINCT FROM $4
              AND user_id IS NOT DISTINCT FROM $5
            ",
        )
        .bind(target.entity())
        .bind(image_type)
        .bind(item_id)
        .bind(stall_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    }

    let image = sqlx::query_as::<_, Image>(
        r"
        INSERT INTO images (image_url, entity_type, image_type, item_id, stall_id, user_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING image_id, image_url, entity_type, image_type, item_id, stall_id, user_id
        ",
    )
    .bind(image_url)
    .bind(target.entity())
    .bind(image_type)
    .bind(item_id)
    .bind(stall_id)
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(image)
}

/// Delete every image attached to an item.
pub(crate) async fn delete_item_images(
    conn: &mut PgConnection,
    item_id: ItemId,
) -> Result<u64, RepositoryError> {
    let result = sqlx::query("DELETE FROM images WHERE item_id = $1")
        .bind(item_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_sets_exactly_one_column() {
        assert_eq!(
            ImageTarget::Item(ItemId::new(3)).columns(),
            (Some(ItemId::new(3)), None, None)
        );
        assert_eq!(
            ImageTarget::Stall(StallId::new(4)).columns(),
            (None, Some(StallId::new(4)), None)
        );
        assert_eq!(ImageTarget::User(UserId::new(5)).entity(), ImageEntity::User);
    }
}
