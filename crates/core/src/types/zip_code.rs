//! Postal code in the `NN-NNN` format used for delivery addresses.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a string is not a valid postal code.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid zip code format, expected NN-NNN")]
pub struct ZipCodeError;

/// A postal code: two digits, a hyphen, three digits (e.g. `00-950`).
///
/// ```
/// use record_store_core::ZipCode;
///
/// assert!(ZipCode::parse("31-042").is_ok());
/// assert!(ZipCode::parse("31042").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZipCode(String);

impl ZipCode {
    /// Length of a valid code, hyphen included.
    pub const LENGTH: usize = 6;

    /// Parse a postal code, ignoring surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ZipCodeError`] unless the input is exactly `NN-NNN`.
    pub fn parse(s: &str) -> Result<Self, ZipCodeError> {
        let s = s.trim();
        let bytes = s.as_bytes();
        if bytes.len() != Self::LENGTH {
            return Err(ZipCodeError);
        }

        let well_formed = bytes.iter().enumerate().all(|(i, b)| match i {
            2 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
        if !well_formed {
            return Err(ZipCodeError);
        }

        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ZipCode {
    type Error = ZipCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ZipCode> for String {
    fn from(zip: ZipCode) -> Self {
        zip.0
    }
}
