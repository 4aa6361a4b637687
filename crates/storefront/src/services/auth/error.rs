//! Authentication error types.

use thiserror::Error;

/// Errors that can occur while verifying or issuing bearer tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization: Bearer` header on the request.
    #[error("missing bearer token")]
    MissingToken,

    /// Signature, algorithm or expiry check failed.
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    /// The `sub` claim is not an account id.
    #[error("invalid subject claim: {0}")]
    InvalidSubject(String),

    /// The token names an account that does not exist.
    #[error("unknown account")]
    UnknownAccount,

    /// The requested lifetime puts the expiry outside the representable range.
    #[error("token lifetime out of range")]
    LifetimeOutOfRange,
}
