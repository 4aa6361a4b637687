//! Bearer token verification.
//!
//! Accounts are registered and logged in by the identity service, which
//! signs HS256 JWTs with a secret shared with this process. The storefront
//! only verifies them; [`TokenService::issue`] exists for the CLI and tests.

mod error;

pub use error::AuthError;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use record_store_core::AccountId;

/// JWT claims. `sub` carries the account id as a decimal string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// Signs and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &Algorithm::HS256)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let key = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify a token and return the account it was issued for.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for bad signatures, other
    /// algorithms or expired tokens, and `AuthError::InvalidSubject` when
    /// `sub` is not an account id.
    pub fn verify(&self, token: &str) -> Result<AccountId, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        data.claims
            .sub
            .parse()
            .map_err(|_| AuthError::InvalidSubject(data.claims.sub))
    }

    /// Sign a token for `account` valid for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::LifetimeOutOfRange` if `now + ttl` overflows and
    /// `AuthError::InvalidToken` if encoding fails.
    pub fn issue(&self, account: AccountId, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let expires = now
            .checked_add_signed(ttl)
            .ok_or(AuthError::LifetimeOutOfRange)?;
        let claims = Claims {
            sub: account.to_string(),
            exp: expires.timestamp(),
            iat: now.timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&SecretString::from(secret))
    }

    #[test]
    fn test_issued_token_verifies() {
        let tokens = service("q8!Zr4#Lm2@Xv7$Kp1^Nc5&Wb9*Td3%Hs");
        let token = tokens.issue(AccountId::new(42), Duration::hours(1)).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), AccountId::new(42));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = service("q8!Zr4#Lm2@Xv7$Kp1^Nc5&Wb9*Td3%Hs");
        let token = tokens.issue(AccountId::new(1), Duration::hours(-2)).unwrap();
        assert!(matches!(tokens.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_unrepresentable_lifetime_rejected() {
        let tokens = service("q8!Zr4#Lm2@Xv7$Kp1^Nc5&Wb9*Td3%Hs");
        assert!(matches!(
            tokens.issue(AccountId::new(1), Duration::MAX),
            Err(AuthError::LifetimeOutOfRange)
        ));
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let token = service("first-key-Zr4#Lm2@Xv7$Kp1^Nc5&Wb9")
            .issue(AccountId::new(1), Duration::hours(1))
            .unwrap();
        let other = service("second-key-Qa8!Pt3%Yw6&Ej0*Ru4^Io");
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_non_numeric_subject_rejected() {
        let tokens = service("q8!Zr4#Lm2@Xv7$Kp1^Nc5&Wb9*Td3%Hs");
        let claims = Claims {
            sub: "alice".to_owned(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
            iat: Utc::now().timestamp(),
        };
        let token = encode(&Header::default(), &claims, &tokens.encoding).unwrap();
        assert!(matches!(
            tokens.verify(&token),
            Err(AuthError::InvalidSubject(sub)) if sub == "alice"
        ));
    }
}
