//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stall_market_core::{Email, Role, UserId};

/// A marketplace account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login email, unique across all users.
    pub email: Email,
    /// Vendor or buyer; fixed at registration.
    pub role: Role,
    /// Display name.
    pub full_name: String,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

/// A user together with the stored password hash.
///
/// Only the credential store and the identity core ever see this type.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    /// Argon2 PHC string.
    pub password_hash: String,
}

/// The user shape returned to clients. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub full_name: String,
    pub email: Email,
    pub role: Role,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_serializes_public_fields_only() {
        let user = User {
            id: UserId::new(7),
            email: Email::parse("dom@x.com").unwrap(),
            role: Role::Vendor,
            full_name: "Dom".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(UserSummary::from(&user)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 7,
                "full_name": "Dom",
                "email": "dom@x.com",
                "role": "vendor",
            })
        );
    }
}
