//! Session token issuing and verification.
//!
//! Tokens are HS256 JWTs carrying `{id, email, role, iat, exp}`. They are not
//! stored anywhere; a token is valid exactly when its signature checks out
//! and `exp` has not passed.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stall_market_core::{Email, Role, UserId};

use crate::config::JwtConfig;
use crate::models::User;

/// Errors from issuing or verifying tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Bad signature, malformed token, or wrong algorithm.
    #[error("invalid token")]
    Invalid,

    /// The token's `exp` has passed.
    #[error("token expired")]
    Expired,

    /// Signing failed.
    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Who a token speaks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub email: Email,
    pub role: Role,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Decoded token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: UserId,
    pub email: Email,
    pub role: Role,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl Claims {
    /// The identity this token was issued for.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Signs and verifies session tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Build an issuer from configuration.
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl: config.expires_in,
        }
    }

    /// Issue a token for `identity`, valid from now for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue(&self, identity: &Identity) -> Result<String, TokenError> {
        self.issue_at(identity, Utc::now())
    }

    fn issue_at(&self, identity: &Identity, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let iat = issued_at.timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            id: identity.id,
            email: identity.email.clone(),
            role: identity.role,
            iat,
            exp: iat.saturating_add(ttl),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` once `exp` has passed and
    /// `TokenError::Invalid` for anything else wrong with the token.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    const SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%";

    fn issuer(secret: &str, ttl: Duration) -> TokenIssuer {
        TokenIssuer::new(&JwtConfig {
            secret: SecretString::from(secret),
            expires_in: ttl,
        })
    }

    fn identity() -> Identity {
        Identity {
            id: UserId::new(12),
            email: Email::parse("dom@x.com").unwrap(),
            role: Role::Vendor,
        }
    }

    #[test]
    fn test_secret_is_long_enough_for_startup() {
        assert!(SECRET.len() >= crate::config::MIN_JWT_SECRET_LENGTH);
    }

    #[test]
    fn test_round_trip_preserves_identity() {
        let tokens = issuer(SECRET, Duration::from_secs(7 * 24 * 3600));
        let token = tokens.issue(&identity()).unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.identity(), identity());
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = issuer(SECRET, Duration::from_secs(3600));
        let issued_at = Utc::now() - chrono::Duration::hours(2);
        let token = tokens.issue_at(&identity(), issued_at).unwrap();

        assert!(matches!(tokens.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_token_from_other_secret_is_invalid() {
        let token = issuer("zZ9@yY8#xX7$wW6%vV5^uU4&tT3*sS2(", Duration::from_secs(60))
            .issue(&identity())
            .unwrap();

        let tokens = issuer(SECRET, Duration::from_secs(60));
        assert!(matches!(tokens.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_tampered_payload_is_invalid() {
        let tokens = issuer(SECRET, Duration::from_secs(60));
        let token = tokens.issue(&identity()).unwrap();

        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        let other = issuer(SECRET, Duration::from_secs(60))
            .issue(&Identity {
                role: Role::Buyer,
                ..identity()
            })
            .unwrap();
        parts[1] = other.split('.').nth(1).unwrap().to_string();
        let forged = parts.join(".");

        assert!(matches!(tokens.verify(&forged), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let tokens = issuer(SECRET, Duration::from_secs(60));
        assert!(matches!(tokens.verify("not-a-token"), Err(TokenError::Invalid)));
        assert!(matches!(tokens.verify(""), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_debug_hides_keys() {
        let tokens = issuer(SECRET, Duration::from_secs(60));
        assert!(!format!("{tokens:?}").contains(SECRET));
    }
}
