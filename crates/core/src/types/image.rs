//! Image classification enums.

use serde::{Deserialize, Serialize};

/// Which kind of record an image is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "image_entity", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ImageEntity {
    /// A stall item (product).
    Item,
    /// A vendor stall.
    Stall,
    /// A user account.
    User,
}

/// How an image is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "image_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ImageType {
    /// Primary picture of an item, shown in listings.
    Thumbnail,
    /// Wide header picture of a stall.
    Banner,
    /// Small square logo of a stall.
    Icon,
    /// Additional pictures.
    Gallery,
}

impl ImageType {
    /// Stall images of these types are unique per stall; uploading a new one
    /// replaces the old one.
    #[must_use]
    pub const fn is_singular(self) -> bool {
        !matches!(self, Self::Gallery)
    }
}

impl std::str::FromStr for ImageEntity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "item" => Ok(Self::Item),
            "stall" => Ok(Self::Stall),
            "user" => Ok(Self::User),
            _ => Err(format!("invalid image entity: {s}")),
        }
    }
}

impl std::str::FromStr for ImageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "thumbnail" => Ok(Self::Thumbnail),
            "banner" => Ok(Self::Banner),
            "icon" => Ok(Self::Icon),
            "gallery" => Ok(Self::Gallery),
            _ => Err(format!("invalid image type: {s}")),
        }
    }
}
