//! Seed the database with a sample vendor, buyer, stall and items.
//!
//! Accounts are created through the same registration path the API uses, so
//! the vendor gets its stall the normal way before the sample details are
//! filled in. Running the command twice leaves the data unchanged.
//!
//! # Usage
//!
//! ```bash
//! sm-cli seed --password "password123"
//! ```

use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use stall_market_api::config::{ConfigError, MarketConfig};
use stall_market_api::db::{self, PgCredentialStore, ProductRepository, RepositoryError, StallRepository};
use stall_market_api::models::{NewProduct, NewStall, User};
use stall_market_api::services::auth::{AuthError, AuthService};
use stall_market_api::services::token::TokenIssuer;
use stall_market_api::store::CredentialStore;
use stall_market_core::{Email, EmailError, Price, PriceError, UserId};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A repository operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Registering a sample account failed.
    #[error("Registration failed: {0}")]
    Auth(#[from] AuthError),

    /// A sample email is malformed.
    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    /// A sample price is malformed.
    #[error("Invalid price: {0}")]
    Price(#[from] PriceError),

    /// An account reported as existing could not be read back.
    #[error("Account disappeared during seeding: {0}")]
    MissingAccount(&'static str),
}

const VENDOR_EMAIL: &str = "vendor@example.com";
const BUYER_EMAIL: &str = "buyer@example.com";

/// Sample items as `(name, price, stocks)`.
const ITEMS: &[(&str, &str, i32)] = &[("Mango", "50.00", 100), ("Banana", "20.00", 80)];

/// Seed sample data.
///
/// # Errors
///
/// Returns an error if configuration is missing or any database write fails.
pub async fn run(password: &str) -> Result<(), SeedError> {
    let config = MarketConfig::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;
    info!("Connected to database");

    let store = PgCredentialStore::new(pool.clone());
    let tokens = TokenIssuer::new(&config.jwt);
    let auth = AuthService::new(&store, &tokens, config.login_role_policy);

    let vendor = ensure_account(&auth, &store, "Vendor User", VENDOR_EMAIL, password, "vendor").await?;
    let buyer = ensure_account(&auth, &store, "Buyer User", BUYER_EMAIL, password, "buyer").await?;

    fill_profiles(&pool, vendor.id, buyer.id).await?;

    let stall = StallRepository::new(&pool)
        .upsert(
            vendor.id,
            &NewStall {
                stall_name: "Dom's Fruit Stall".to_string(),
                stall_description: Some("Locally sourced mangoes and bananas.".to_string()),
                category: Some("Fruits".to_string()),
                stall_address: Some("123 Mango Street".to_string()),
                stall_city: Some("Manila".to_string()),
                stall_state: Some("Metro Manila".to_string()),
                stall_zip_code: None,
            },
        )
        .await?;
    info!(stall_id = %stall.id, "Stall ready");

    let products = ProductRepository::new(&pool);
    if products.list(Some(stall.id)).await?.is_empty() {
        for (name, price, stocks) in ITEMS {
            let item_id = products
                .create(&NewProduct {
                    stall_id: stall.id,
                    item_name: (*name).to_string(),
                    item_description: None,
                    price: Price::parse(price)?,
                    item_stocks: *stocks,
                    category: Some("Fruits".to_string()),
                    image_url: None,
                })
                .await?;
            info!(item_id = %item_id, name, "Item created");
        }
    } else {
        info!("Stall already has items, skipping");
    }

    info!("Seed complete!");
    Ok(())
}

/// Register an account, or load it if the email is already taken.
async fn ensure_account(
    auth: &AuthService<'_>,
    store: &PgCredentialStore,
    full_name: &str,
    email: &'static str,
    password: &str,
    role: &str,
) -> Result<User, SeedError> {
    match auth.register(full_name, email, password, role).await {
        Ok(registered) => {
            info!(user_id = %registered.user.id, email, "Account created");
            Ok(registered.user)
        }
        Err(AuthError::EmailTaken) => {
            info!(email, "Account already exists, skipping");
            store
                .find_user_by_email(&Email::parse(email)?)
                .await?
                .map(|record| record.user)
                .ok_or(SeedError::MissingAccount(email))
        }
        Err(e) => Err(e.into()),
    }
}

/// Fill in the vendor and buyer profile rows created at registration.
async fn fill_profiles(pool: &PgPool, vendor: UserId, buyer: UserId) -> Result<(), SeedError> {
    sqlx::query(
        r"
        UPDATE vendors
        SET business_name = $2, vendor_contact = $3, vendor_description = $4
        WHERE user_id = $1
        ",
    )
    .bind(vendor)
    .bind("Dom's Fruits")
    .bind("09123456789")
    .bind("Fresh fruits and veggies.")
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        UPDATE buyers
        SET buyer_address = $2, buyer_city = $3, buyer_country = $4
        WHERE user_id = $1
        ",
    )
    .bind(buyer)
    .bind("123 Mango Street")
    .bind("Manila")
    .bind("Philippines")
    .execute(pool)
    .await?;

    Ok(())
}
