//! Data access for the record store.
//!
//! # Database: `record_store`
//!
//! ## Tables
//!
//! - `account` - Customer accounts (owned by the identity service)
//! - `user_profile` - Shop-side customer data, 1:1 with `account`
//! - `artist`, `genre`, `record_label`, `medium`, `tag` - Catalog lookups
//! - `product`, `product_tag` - Sellable records and their tags
//! - `review` - Product reviews, threaded through `parent_id`
//! - `shipping`, `payment` - Checkout options
//! - `customer_order`, `order_item` - Placed orders
//! - `bank_info` - Bank transfer recipient
//!
//! # Backends
//!
//! Handlers talk to the [`Store`] trait. [`PgStore`] is the production
//! backend; [`MemoryStore`] keeps everything in process and backs the HTTP
//! contract tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p record-store-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;
pub mod repository;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::{
    CatalogRepository, DeleteOutcome, OrderRepository, PlaceOrderError, ProductFilter,
    ProductOrdering, ProfileRepository, ReviewError, ReviewRepository, Store,
};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Integrity constraint violation (unique key, stock check, ...).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Classify a sqlx error, turning constraint violations into
    /// [`RepositoryError::Conflict`].
    #[must_use]
    pub fn from_write(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && (db_err.is_unique_violation()
                || db_err.is_check_violation()
                || db_err.is_foreign_key_violation())
        {
            return Self::Conflict(db_err.message().to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
