//! Development bearer tokens.
//!
//! Signs with `STOREFRONT_JWT_SECRET`, the key the storefront verifies
//! with, so the token is accepted exactly like one from the identity
//! service.

use chrono::Duration;
use tracing::info;

use record_store_core::AccountId;
use record_store_storefront::config;
use record_store_storefront::services::auth::TokenService;

use super::CommandError;

/// Issue a token for `account` valid for `hours`.
pub fn issue(account: AccountId, hours: i64) -> Result<String, CommandError> {
    if hours <= 0 {
        return Err(CommandError::InvalidArgument(
            "--hours must be positive".to_owned(),
        ));
    }
    let ttl = Duration::try_hours(hours)
        .ok_or_else(|| CommandError::InvalidArgument(format!("--hours {hours} is too large")))?;

    let secret = config::jwt_secret_from_env()?;
    let token = TokenService::new(&secret).issue(account, ttl)?;

    info!(account_id = %account, hours, "Token issued");
    Ok(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_non_positive_hours_rejected() {
        assert!(matches!(
            issue(AccountId::new(1), 0),
            Err(CommandError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_overflowing_hours_rejected() {
        let err = issue(AccountId::new(1), i64::MAX).unwrap_err();
        assert!(
            matches!(&err, CommandError::InvalidArgument(msg) if msg.contains("too large")),
            "{err}"
        );
    }
}
