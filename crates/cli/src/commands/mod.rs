//! Subcommand implementations.
//!
//! Every command that touches the database goes through the storefront's
//! own [`PgStore`], so the CLI writes exactly what the API reads.

pub mod account;
pub mod migrate;
pub mod order;
pub mod seed;
pub mod token;

use thiserror::Error;
use tracing::info;

use record_store_storefront::config::{self, ConfigError};
use record_store_storefront::db::{self, PgStore, RepositoryError};
use record_store_storefront::services::auth::AuthError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Token error: {0}")]
    Auth(#[from] AuthError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Connect to the storefront database named by the environment.
pub async fn connect() -> Result<PgStore, CommandError> {
    let database_url = config::database_url_from_env()?;
    info!("Connecting to storefront database...");
    let pool = db::create_pool(&database_url).await?;
    Ok(PgStore::new(pool))
}
