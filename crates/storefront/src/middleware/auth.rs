//! Authentication extractors.
//!
//! Customers authenticate with `Authorization: Bearer <jwt>`. Every
//! rejection is a JSON 401.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::debug;

use record_store_core::AccountId;

use crate::db::{ProfileRepository, RepositoryError};
use crate::error::{AppError, set_sentry_user};
use crate::models::Profile;
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(account): RequireAuth) -> impl IntoResponse {
///     format!("Hello, account {account}!")
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireAuth(pub AccountId);

/// Extractor for the authenticated customer's profile, created on first
/// use.
#[derive(Debug, Clone)]
pub struct CurrentProfile(pub Profile);

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        debug!(error = %err, "Rejected bearer token");
        let message = match err {
            AuthError::MissingToken => "Authentication credentials were not provided.",
            AuthError::InvalidToken(_) | AuthError::InvalidSubject(_) => "Invalid token.",
            AuthError::UnknownAccount => "User not found.",
            AuthError::LifetimeOutOfRange => "Invalid token.",
        };
        Self::Unauthorized(message.to_owned())
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let account = state.tokens().verify(token)?;
        Ok(Self(account))
    }
}

impl FromRequestParts<AppState> for CurrentProfile {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(account) = RequireAuth::from_request_parts(parts, state).await?;

        let profile = match state.store().get_or_create_profile(account).await {
            Ok(profile) => profile,
            // Token signed for an account that has since been removed.
            Err(RepositoryError::NotFound) => return Err(AuthError::UnknownAccount.into()),
            Err(e) => return Err(e.into()),
        };

        set_sentry_user(&account, Some(&profile.user.username));
        Ok(Self(profile))
    }
}
