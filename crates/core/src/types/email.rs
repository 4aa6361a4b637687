//! Customer email address.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why an address was rejected by [`Email::parse`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    #[error("email must contain exactly one @ symbol")]
    BadSeparator,
    #[error("email must have a non-empty mailbox and domain")]
    MissingPart,
}

/// A syntactically plausible email address.
///
/// Surrounding whitespace is trimmed and the domain is lowercased, so two
/// spellings of the same address compare equal. This is not RFC 5322
/// validation; the SMTP server gets the final word.
///
/// ```
/// use record_store_core::Email;
///
/// let email = Email::parse(" Jan@Example.PL ").unwrap();
/// assert_eq!(email.as_str(), "Jan@example.pl");
/// assert!(Email::parse("no-at-symbol").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an address (RFC 5321 path limit).
    pub const MAX_LENGTH: usize = 254;

    /// Parse and normalize an address.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] when the input is empty, too long, lacks a
    /// single `@`, or has an empty mailbox or domain.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let mut parts = s.split('@');
        let (Some(mailbox), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(EmailError::BadSeparator);
        };
        if mailbox.is_empty() || domain.is_empty() {
            return Err(EmailError::MissingPart);
        }

        Ok(Self(format!("{mailbox}@{}", domain.to_ascii_lowercase())))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_shapes() {
        assert!(Email::parse("user@example.com").is_ok());
        assert!(Email::parse("first.last+shop@mail.example.co.uk").is_ok());
        assert!(Email::parse("a@b").is_ok());
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("plain"), Err(EmailError::BadSeparator));
        assert_eq!(Email::parse("a@b@c"), Err(EmailError::BadSeparator));
        assert_eq!(Email::parse("@example.com"), Err(EmailError::MissingPart));
        assert_eq!(Email::parse("user@"), Err(EmailError::MissingPart));
    }

    #[test]
    fn test_too_long() {
        let long = format!("{}@example.com", "x".repeat(250));
        assert!(matches!(
            Email::parse(&long),
            Err(EmailError::TooLong { max: 254 })
        ));
    }

    #[test]
    fn test_domain_is_lowercased_mailbox_kept() {
        let email = Email::parse("Kasia@Sklep.PL").unwrap();
        assert_eq!(email.to_string(), "Kasia@sklep.pl");
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Email = serde_json::from_str("\"fan@records.test\"").unwrap();
        assert_eq!(ok.as_str(), "fan@records.test");
        assert!(serde_json::from_str::<Email>("\"not-an-email\"").is_err());
    }
}
