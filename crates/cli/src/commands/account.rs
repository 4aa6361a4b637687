//! Account management for development and support.
//!
//! Production accounts come from the identity service. This command
//! creates one directly, e.g. to pair with `rs-cli token issue`.

use tracing::info;

use record_store_core::{AccountId, Email};
use record_store_storefront::db::{ProfileRepository, RepositoryError};
use record_store_storefront::models::NewAccount;

use super::{CommandError, connect};

/// Create an account and its (empty) profile.
pub async fn create(
    username: &str,
    email: &str,
    first_name: &str,
    last_name: &str,
) -> Result<AccountId, CommandError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(CommandError::InvalidArgument(
            "username must not be empty".to_owned(),
        ));
    }
    let email = Email::parse(email)
        .map_err(|e| CommandError::InvalidArgument(format!("{email}: {e}")))?;

    let store = connect().await?;

    let account = NewAccount {
        username: username.to_owned(),
        email: Some(email),
        first_name: first_name.trim().to_owned(),
        last_name: last_name.trim().to_owned(),
    };
    let id = match store.create_account(&account).await {
        Ok(id) => id,
        Err(RepositoryError::Conflict(msg)) => return Err(CommandError::InvalidArgument(msg)),
        Err(e) => return Err(e.into()),
    };
    store.get_or_create_profile(id).await?;

    info!(account_id = %id, username, "Account created");
    Ok(id)
}
