//! Customer accounts and profiles.

use serde::Serialize;

use record_store_core::{AccountId, Email, ProfileId, ZipCode};

/// The account fields exposed alongside a profile.
///
/// Accounts are created by the identity service. The store only reads
/// them, except for the customer's first and last name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountInfo {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<Email>,
}

/// Shop-side customer record, one per account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    #[serde(skip)]
    pub id: ProfileId,
    #[serde(skip)]
    pub account_id: AccountId,
    pub user: AccountInfo,
    pub address: Option<String>,
    pub zip_code: Option<ZipCode>,
    pub city: Option<String>,
    pub phone: Option<String>,
}

/// Input for registering an account locally (CLI and tests).
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: Option<Email>,
    pub first_name: String,
    pub last_name: String,
}

/// Partial profile update. `None` leaves a field untouched; an empty
/// string clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub zip_code: Option<Option<ZipCode>>,
    pub city: Option<String>,
    pub phone: Option<String>,
}

/// Map an empty string to `None` for nullable text columns.
#[must_use]
pub fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}
