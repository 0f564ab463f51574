//! Stall item (product) domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stall_market_core::{ItemId, Price, StallId};

/// An item listed under a stall, with its thumbnail if one exists.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub item_id: ItemId,
    pub stall_id: StallId,
    pub item_name: String,
    pub item_description: Option<String>,
    pub price: Price,
    pub item_stocks: i32,
    pub in_stock: bool,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub thumbnail_url: Option<String>,
}

/// Validated input for creating an item.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub stall_id: StallId,
    pub item_name: String,
    pub item_description: Option<String>,
    pub price: Price,
    pub item_stocks: i32,
    pub category: Option<String>,
    /// Stored as the item's thumbnail image when present.
    pub image_url: Option<String>,
}

impl NewProduct {
    /// Items are in stock exactly when they have stock left.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.item_stocks > 0
    }
}

/// Partial update for an item. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub item_name: Option<String>,
    pub item_description: Option<String>,
    pub price: Option<Price>,
    pub item_stocks: Option<i32>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

impl ProductChanges {
    /// The new `in_stock` flag, if the stock count changes.
    #[must_use]
    pub fn in_stock(&self) -> Option<bool> {
        self.item_stocks.map(|stocks| stocks > 0)
    }
}
