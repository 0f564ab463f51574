//! Image records.

use serde::Serialize;

use stall_market_core::{ImageEntity, ImageId, ImageType, ItemId, StallId, UserId};

/// A stored image and the entity it belongs to.
///
/// Exactly one of `item_id`, `stall_id`, `user_id` is set, matching
/// `entity_type`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Image {
    pub image_id: ImageId,
    pub image_url: String,
    pub entity_type: ImageEntity,
    pub image_type: ImageType,
    pub item_id: Option<ItemId>,
    pub stall_id: Option<StallId>,
    pub user_id: Option<UserId>,
}
