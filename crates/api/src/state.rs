//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::MarketConfig;
use crate::db::PgCredentialStore;
use crate::services::auth::AuthService;
use crate::services::token::TokenIssuer;
use crate::services::uploads::UploadStore;
use crate::store::CredentialStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: MarketConfig,
    pool: PgPool,
    store: Arc<dyn CredentialStore>,
    tokens: TokenIssuer,
    uploads: UploadStore,
}

impl AppState {
    /// Create application state backed by `PostgreSQL`.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: MarketConfig, pool: PgPool) -> Self {
        let store = Arc::new(PgCredentialStore::new(pool.clone()));
        Self::with_store(config, pool, store)
    }

    /// Create application state with a specific credential store.
    ///
    /// Routes other than the identity ones still use `pool` directly.
    #[must_use]
    pub fn with_store(config: MarketConfig, pool: PgPool, store: Arc<dyn CredentialStore>) -> Self {
        let tokens = TokenIssuer::new(&config.jwt);
        let uploads = UploadStore::new(config.upload_dir.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                store,
                tokens,
                uploads,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &MarketConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the session token issuer.
    #[must_use]
    pub fn tokens(&self) -> &TokenIssuer {
        &self.inner.tokens
    }

    /// Get a reference to the upload store.
    #[must_use]
    pub fn uploads(&self) -> &UploadStore {
        &self.inner.uploads
    }

    /// Build the identity service over this state's store and token issuer.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(
            self.inner.store.as_ref(),
            &self.inner.tokens,
            self.inner.config.login_role_policy,
        )
    }
}
