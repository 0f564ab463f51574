//! Identity core: registration, login and the one-stall-per-vendor rule.
//!
//! Every vendor owns exactly one stall. Registration creates it in the same
//! transaction as the account; login recreates it if it has gone missing.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use stall_market_core::{Email, Role, UserId};

use crate::config::LoginRolePolicy;
use crate::db::RepositoryError;
use crate::models::{NewStall, Stall, StallSummary, User};
use crate::services::token::{Identity, TokenIssuer};
use crate::store::{CredentialStore, NewAccount};

/// Minimum password length, in characters.
const MIN_PASSWORD_LENGTH: usize = 6;

pub const MISSING_FIELDS: &str = "Missing Fields";
pub const INVALID_ROLE: &str = "Invalid role";
pub const PASSWORD_TOO_SHORT: &str = "Password too short";
pub const INVALID_EMAIL: &str = "Invalid email address";

/// Result of a successful registration.
#[derive(Debug)]
pub struct Registered {
    pub user: User,
    pub token: String,
    /// The vendor's new stall; `None` for buyers.
    pub stall: Option<StallSummary>,
}

/// Whether a vendor's stall could be confirmed during login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StallOutcome {
    /// The account is a buyer.
    NotApplicable,
    /// The stall exists (possibly just recreated).
    Ready(StallSummary),
    /// The stall could not be found or recreated. Login still succeeds.
    Degraded,
}

impl StallOutcome {
    /// The stall to embed in the response, if any.
    #[must_use]
    pub const fn summary(&self) -> Option<&StallSummary> {
        match self {
            Self::Ready(summary) => Some(summary),
            Self::NotApplicable | Self::Degraded => None,
        }
    }
}

/// Result of a successful login.
#[derive(Debug)]
pub struct LoggedIn {
    pub user: User,
    pub token: String,
    pub stall: StallOutcome,
}

/// Authentication service.
///
/// Cheap to build per request: it only borrows the store and the token issuer.
pub struct AuthService<'a> {
    store: &'a dyn CredentialStore,
    tokens: &'a TokenIssuer,
    role_policy: LoginRolePolicy,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(
        store: &'a dyn CredentialStore,
        tokens: &'a TokenIssuer,
        role_policy: LoginRolePolicy,
    ) -> Self {
        Self {
            store,
            tokens,
            role_policy,
        }
    }

    /// Register a new account and sign it in.
    ///
    /// Vendors get a default stall named after them in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for missing fields, an unknown role, a
    /// short password or a malformed email, checked in that order.
    /// Returns `AuthError::EmailTaken` if the email is already registered.
    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
        role: &str,
    ) -> Result<Registered, AuthError> {
        if [full_name, email, password, role]
            .iter()
            .any(|field| field.is_empty())
        {
            return Err(AuthError::Validation(MISSING_FIELDS));
        }
        let role: Role = role
            .parse()
            .map_err(|_| AuthError::Validation(INVALID_ROLE))?;
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::Validation(PASSWORD_TOO_SHORT));
        }
        let email = Email::parse(email).map_err(|_| AuthError::Validation(INVALID_EMAIL))?;

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password_blocking(password.to_owned()).await?;

        let account = self
            .store
            .create_account(NewAccount {
                email,
                password_hash,
                role,
                full_name: full_name.to_owned(),
                stall: role.is_vendor().then(|| NewStall::default_for(full_name)),
            })
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent registration for the same email.
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })?;

        let token = self.tokens.issue(&Identity::from(&account.user))?;

        tracing::info!(
            user_id = %account.user.id,
            role = %account.user.role,
            "Account registered"
        );

        Ok(Registered {
            stall: account.stall.as_ref().map(StallSummary::from),
            user: account.user,
            token,
        })
    }

    /// Verify credentials and issue a token.
    ///
    /// `role` is only consulted under [`LoginRolePolicy::RequireMatch`]; the
    /// token always carries the stored role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if email or password is empty.
    /// Returns `AuthError::UserNotFound` if no account matches.
    /// Returns `AuthError::InvalidPassword` if the password is wrong.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        role: Option<&str>,
    ) -> Result<LoggedIn, AuthError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(MISSING_FIELDS));
        }

        let email = Email::parse(email).map_err(|_| AuthError::UserNotFound)?;
        let record = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if self.role_policy == LoginRolePolicy::RequireMatch {
            let requested = role.and_then(|r| r.parse::<Role>().ok());
            if requested != Some(record.user.role) {
                return Err(AuthError::UserNotFound);
            }
        }

        verify_password_blocking(password.to_owned(), record.password_hash).await?;

        let user = record.user;
        let token = self.tokens.issue(&Identity::from(&user))?;

        let stall = if user.role.is_vendor() {
            match self.ensure_stall(&user).await {
                Ok(stall) => StallOutcome::Ready(StallSummary::from(&stall)),
                Err(e) => {
                    tracing::warn!(
                        user_id = %user.id,
                        error = %e,
                        "Could not ensure vendor stall during login"
                    );
                    StallOutcome::Degraded
                }
            }
        } else {
            StallOutcome::NotApplicable
        };

        Ok(LoggedIn { user, token, stall })
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the store fails.
    pub async fn get_user(&self, id: UserId) -> Result<Option<User>, AuthError> {
        Ok(self.store.find_user_by_id(id).await?)
    }

    /// Find the vendor's stall, creating the default one if it is missing.
    ///
    /// Concurrent callers converge on a single stall: the store rejects a
    /// second stall for the same owner, and the loser re-reads the winner.
    async fn ensure_stall(&self, user: &User) -> Result<Stall, RepositoryError> {
        if let Some(stall) = self.store.find_stall_by_owner(user.id).await? {
            return Ok(stall);
        }

        match self
            .store
            .insert_stall(user.id, &NewStall::default_for(&user.full_name))
            .await
        {
            Ok(stall) => {
                tracing::info!(user_id = %user.id, stall_id = %stall.id, "Recreated missing vendor stall");
                Ok(stall)
            }
            Err(RepositoryError::Conflict(_)) => self
                .store
                .find_stall_by_owner(user.id)
                .await?
                .ok_or(RepositoryError::NotFound),
            Err(e) => Err(e),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidPassword)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidPassword)
}

async fn hash_password_blocking(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|_| AuthError::PasswordHash)?
}

async fn verify_password_blocking(password: String, hash: String) -> Result<(), AuthError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|_| AuthError::PasswordHash)?
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use secrecy::SecretString;

    use super::*;
    use crate::config::JwtConfig;
    use crate::models::UserRecord;
    use crate::store::Account;
    use crate::store::memory::MemoryCredentialStore;

    fn tokens() -> TokenIssuer {
        TokenIssuer::new(&JwtConfig {
            secret: SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%"),
            expires_in: Duration::from_secs(7 * 24 * 3600),
        })
    }

    fn service<'a>(store: &'a dyn CredentialStore, tokens: &'a TokenIssuer) -> AuthService<'a> {
        AuthService::new(store, tokens, LoginRolePolicy::UseStored)
    }

    #[tokio::test]
    async fn test_vendor_registration_creates_stall() {
        let store = MemoryCredentialStore::new();
        let tokens = tokens();
        let auth = service(&store, &tokens);

        let registered = auth
            .register("Dom", "dom@x.com", "secret1", "vendor")
            .await
            .unwrap();

        let stall = registered.stall.unwrap();
        assert!(stall.stall_name.contains("Dom"));
        assert_eq!(store.stall_count(registered.user.id).await, 1);

        let claims = tokens.verify(&registered.token).unwrap();
        assert_eq!(claims.identity(), Identity::from(&registered.user));
    }

    #[tokio::test]
    async fn test_buyer_registration_has_no_stall() {
        let store = MemoryCredentialStore::new();
        let tokens = tokens();
        let auth = service(&store, &tokens);

        let registered = auth
            .register("Bea", "bea@x.com", "secret1", "buyer")
            .await
            .unwrap();

        assert!(registered.stall.is_none());
        assert_eq!(store.stall_count(registered.user.id).await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryCredentialStore::new();
        let tokens = tokens();
        let auth = service(&store, &tokens);

        auth.register("Dom", "dom@x.com", "secret1", "vendor")
            .await
            .unwrap();
        let err = auth
            .register("Other Dom", "dom@x.com", "secret2", "buyer")
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::EmailTaken));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_validation_order() {
        let store = MemoryCredentialStore::new();
        let tokens = tokens();
        let auth = service(&store, &tokens);

        let cases = [
            (("", "dom@x.com", "secret1", "vendor"), MISSING_FIELDS),
            (("Dom", "dom@x.com", "", "vendor"), MISSING_FIELDS),
            (("Dom", "dom@x.com", "   ", "vendor"), PASSWORD_TOO_SHORT),
            (("Dom", "dom@x.com", "123", "admin"), INVALID_ROLE),
            (("Dom", "dom@x.com", "123", "vendor"), PASSWORD_TOO_SHORT),
            (("Dom", "not-an-email", "secret1", "vendor"), INVALID_EMAIL),
        ];

        for ((name, email, password, role), expected) in cases {
            let err = auth.register(name, email, password, role).await.unwrap_err();
            assert!(
                matches!(err, AuthError::Validation(msg) if msg == expected),
                "expected {expected}, got {err:?}"
            );
        }

        // Nothing was written for any rejected request.
        assert_eq!(store.user_count().await, 0);
    }

    #[tokio::test]
    async fn test_blank_but_non_empty_fields_are_kept_as_sent() {
        let store = MemoryCredentialStore::new();
        let tokens = tokens();
        let auth = service(&store, &tokens);

        let registered = auth
            .register("  Dom  ", "dom@x.com", "      ", "vendor")
            .await
            .unwrap();
        assert_eq!(registered.user.full_name, "  Dom  ");

        let logged_in = auth.login("dom@x.com", "      ", None).await.unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);
        assert!(auth.login("dom@x.com", "", None).await.is_err());
    }

    #[tokio::test]
    async fn test_login_returns_registered_stall() {
        let store = MemoryCredentialStore::new();
        let tokens = tokens();
        let auth = service(&store, &tokens);

        let registered = auth
            .register("Dom", "dom@x.com", "secret1", "vendor")
            .await
            .unwrap();
        let logged_in = auth.login("dom@x.com", "secret1", None).await.unwrap();

        assert_eq!(logged_in.stall.summary(), registered.stall.as_ref());
        assert_eq!(store.stall_count(registered.user.id).await, 1);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let store = MemoryCredentialStore::new();
        let tokens = tokens();
        let auth = service(&store, &tokens);

        auth.register("Dom", "dom@x.com", "secret1", "vendor")
            .await
            .unwrap();
        let err = auth.login("dom@x.com", "secret2", None).await.unwrap_err();

        assert!(matches!(err, AuthError::InvalidPassword));
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let store = MemoryCredentialStore::new();
        let tokens = tokens();
        let auth = service(&store, &tokens);

        let err = auth.login("ghost@x.com", "secret1", None).await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));

        let err = auth.login("", "secret1", None).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(MISSING_FIELDS)));
    }

    #[tokio::test]
    async fn test_login_token_uses_stored_role() {
        let store = MemoryCredentialStore::new();
        let tokens = tokens();
        let auth = service(&store, &tokens);

        auth.register("Bea", "bea@x.com", "secret1", "buyer")
            .await
            .unwrap();
        let logged_in = auth
            .login("bea@x.com", "secret1", Some("vendor"))
            .await
            .unwrap();

        assert_eq!(tokens.verify(&logged_in.token).unwrap().role, Role::Buyer);
        assert_eq!(logged_in.stall, StallOutcome::NotApplicable);
    }

    #[tokio::test]
    async fn test_match_policy_requires_role() {
        let store = MemoryCredentialStore::new();
        let tokens = tokens();
        AuthService::new(&store, &tokens, LoginRolePolicy::UseStored)
            .register("Bea", "bea@x.com", "secret1", "buyer")
            .await
            .unwrap();

        let strict = AuthService::new(&store, &tokens, LoginRolePolicy::RequireMatch);
        assert!(matches!(
            strict.login("bea@x.com", "secret1", Some("vendor")).await,
            Err(AuthError::UserNotFound)
        ));
        assert!(matches!(
            strict.login("bea@x.com", "secret1", None).await,
            Err(AuthError::UserNotFound)
        ));
        assert!(
            strict
                .login("bea@x.com", "secret1", Some("buyer"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_login_recreates_missing_stall() {
        let store = MemoryCredentialStore::new();
        let tokens = tokens();
        let auth = service(&store, &tokens);

        let registered = auth
            .register("Dom", "dom@x.com", "secret1", "vendor")
            .await
            .unwrap();
        assert!(store.remove_stall(registered.user.id).await);

        let logged_in = auth.login("dom@x.com", "secret1", None).await.unwrap();

        let summary = logged_in.stall.summary().unwrap();
        assert_eq!(summary.stall_name, "Dom's Stall");
        assert_eq!(store.stall_count(registered.user.id).await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_logins_create_one_stall() {
        let store = Arc::new(MemoryCredentialStore::new());
        let tokens = Arc::new(tokens());

        let registered = service(store.as_ref(), &tokens)
            .register("Dom", "dom@x.com", "secret1", "vendor")
            .await
            .unwrap();
        store.remove_stall(registered.user.id).await;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let tokens = Arc::clone(&tokens);
                tokio::spawn(async move {
                    service(store.as_ref(), &tokens)
                        .login("dom@x.com", "secret1", None)
                        .await
                        .map(|l| l.stall)
                })
            })
            .collect();

        let mut stall_ids = Vec::new();
        for handle in handles {
            let outcome = handle.await.unwrap().unwrap();
            stall_ids.push(outcome.summary().unwrap().stall_id);
        }

        stall_ids.dedup();
        assert_eq!(stall_ids.len(), 1);
        assert_eq!(store.stall_count(registered.user.id).await, 1);
    }

    /// Store whose stall operations always fail.
    struct BrokenStalls(MemoryCredentialStore);

    #[async_trait]
    impl CredentialStore for BrokenStalls {
        async fn find_user_by_email(
            &self,
            email: &Email,
        ) -> Result<Option<UserRecord>, RepositoryError> {
            self.0.find_user_by_email(email).await
        }

        async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
            self.0.find_user_by_id(id).await
        }

        async fn create_account(&self, account: NewAccount) -> Result<Account, RepositoryError> {
            self.0.create_account(account).await
        }

        async fn find_stall_by_owner(&self, _: UserId) -> Result<Option<Stall>, RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn insert_stall(&self, _: UserId, _: &NewStall) -> Result<Stall, RepositoryError> {
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    #[tokio::test]
    async fn test_stall_failure_degrades_login() {
        let store = BrokenStalls(MemoryCredentialStore::new());
        let tokens = tokens();
        let auth = service(&store, &tokens);

        auth.register("Dom", "dom@x.com", "secret1", "vendor")
            .await
            .unwrap();
        let logged_in = auth.login("dom@x.com", "secret1", None).await.unwrap();

        assert_eq!(logged_in.stall, StallOutcome::Degraded);
        assert!(tokens.verify(&logged_in.token).is_ok());
    }
}
