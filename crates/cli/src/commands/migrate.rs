//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! rs-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! `crates/storefront/migrations/`, embedded at build time:
//! ```text
//! migrations/
//! ├── 20260301000001_accounts.sql
//! ├── 20260301000002_catalog.sql
//! └── 20260301000003_orders.sql
//! ```

use tracing::info;

use super::{CommandError, connect};

/// Run storefront database migrations.
pub async fn run() -> Result<(), CommandError> {
    let store = connect().await?;

    info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations")
        .run(store.pool())
        .await?;

    info!("Storefront migrations complete!");
    Ok(())
}
