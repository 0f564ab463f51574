//! Account roles.

use serde::{Deserialize, Serialize};

/// Error returned when a string is not a known [`Role`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role: {0}")]
pub struct RoleError(pub String);

/// Marketplace account role.
///
/// Chosen at registration and fixed afterwards. Every account carries exactly
/// one role profile row matching its role, and every vendor owns a stall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Sells items through a stall.
    Vendor,
    /// Browses stalls and buys items.
    Buyer,
}

impl Role {
    /// The wire and database spelling of this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vendor => "vendor",
            Self::Buyer => "buyer",
        }
    }

    /// Whether this role owns a stall.
    #[must_use]
    pub const fn is_vendor(self) -> bool {
        matches!(self, Self::Vendor)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vendor" => Ok(Self::Vendor),
            "buyer" => Ok(Self::Buyer),
            _ => Err(RoleError(s.to_owned())),
        }
    }
}
