//! Stall domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stall_market_core::{StallId, UserId};

/// Placeholder value for stall location fields the vendor has not filled in.
pub const UNKNOWN: &str = "Unknown";

/// A vendor storefront. Each vendor owns exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Stall {
    #[sqlx(rename = "stall_id")]
    #[serde(rename = "stall_id")]
    pub id: StallId,
    #[sqlx(rename = "user_id")]
    #[serde(rename = "user_id")]
    pub owner_id: UserId,
    pub stall_name: String,
    pub stall_description: Option<String>,
    pub category: Option<String>,
    pub stall_address: Option<String>,
    pub stall_city: Option<String>,
    pub stall_state: Option<String>,
    pub stall_zip_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Column values for inserting or replacing a stall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStall {
    pub stall_name: String,
    pub stall_description: Option<String>,
    pub category: Option<String>,
    pub stall_address: Option<String>,
    pub stall_city: Option<String>,
    pub stall_state: Option<String>,
    pub stall_zip_code: Option<String>,
}

impl NewStall {
    /// The placeholder stall every vendor gets until they fill in their own.
    #[must_use]
    pub fn default_for(full_name: &str) -> Self {
        Self {
            stall_name: format!("{full_name}'s Stall"),
            stall_description: Some(format!("Default stall for {full_name}")),
            category: Some("General".to_string()),
            stall_address: Some(UNKNOWN.to_string()),
            stall_city: Some(UNKNOWN.to_string()),
            stall_state: Some(UNKNOWN.to_string()),
            stall_zip_code: None,
        }
    }
}

/// The `{stall_id, stall_name}` pair embedded in auth responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StallSummary {
    pub stall_id: StallId,
    pub stall_name: String,
}

impl From<&Stall> for StallSummary {
    fn from(stall: &Stall) -> Self {
        Self {
            stall_id: stall.id,
            stall_name: stall.stall_name.clone(),
        }
    }
}

/// A stall as shown on the public listing: stall columns, the owner's vendor
/// profile, banner and icon URLs, and the average review rating.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StallCard {
    pub stall_id: StallId,
    pub user_id: UserId,
    pub stall_name: String,
    pub stall_description: Option<String>,
    pub category: Option<String>,
    pub stall_address: Option<String>,
    pub stall_city: Option<String>,
    pub stall_state: Option<String>,
    pub stall_zip_code: Option<String>,
    pub business_name: Option<String>,
    pub vendor_contact: Option<String>,
    pub banner_url: Option<String>,
    pub icon_url: Option<String>,
    /// `None` until the stall has at least one review.
    pub rating: Option<f64>,
}
