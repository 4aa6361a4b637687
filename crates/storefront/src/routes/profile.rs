//! Customer profile handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::{info, instrument};
use validator::{Validate, ValidationError};

use record_store_core::ZipCode;

use crate::db::ProfileRepository;
use crate::error::Result;
use crate::middleware::CurrentProfile;
use crate::models::{Profile, ProfileUpdate};
use crate::state::AppState;
use crate::validation::{FieldErrors, ValidJson, validate_zip_code};

/// Body of `PATCH`/`PUT /api/profile`.
///
/// Absent fields are left alone. An empty string clears the optional
/// fields. `username` and `email` are read-only and silently ignored.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProfileUpdateRequest {
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub first_name: Option<String>,
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub last_name: Option<String>,
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub address: Option<String>,
    #[validate(custom(function = "validate_optional_zip_code"))]
    pub zip_code: Option<String>,
    #[validate(length(max = 128, message = "Ensure this field has no more than 128 characters."))]
    pub city: Option<String>,
    #[validate(length(max = 16, message = "Ensure this field has no more than 16 characters."))]
    pub phone: Option<String>,
}

fn validate_optional_zip_code(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Ok(());
    }
    validate_zip_code(value.trim())
}

impl ProfileUpdateRequest {
    fn into_update(self) -> std::result::Result<ProfileUpdate, FieldErrors> {
        let zip_code = match self.zip_code.as_deref().map(str::trim) {
            None => None,
            Some("") => Some(None),
            Some(raw) => Some(Some(
                ZipCode::parse(raw).map_err(|e| FieldErrors::single("zip_code", e.to_string()))?,
            )),
        };

        Ok(ProfileUpdate {
            first_name: self.first_name,
            last_name: self.last_name,
            address: self.address,
            zip_code,
            city: self.city,
            phone: self.phone,
        })
    }
}

/// `GET /api/profile`
pub async fn show(CurrentProfile(profile): CurrentProfile) -> Json<Profile> {
    Json(profile)
}

/// `PATCH /api/profile` and `PUT /api/profile`
#[instrument(skip_all, fields(account_id = %profile.account_id))]
pub async fn update(
    State(state): State<AppState>,
    CurrentProfile(profile): CurrentProfile,
    ValidJson(request): ValidJson<ProfileUpdateRequest>,
) -> Result<Json<Profile>> {
    let update = request.into_update()?;
    let updated = state
        .store()
        .update_profile(profile.account_id, &update)
        .await?;
    info!("Profile updated");
    Ok(Json(updated))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn request(body: serde_json::Value) -> ProfileUpdateRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_empty_zip_clears() {
        let req = request(json!({"zip_code": ""}));
        assert!(req.validate().is_ok());
        assert_eq!(req.into_update().unwrap().zip_code, Some(None));
    }

    #[test]
    fn test_absent_fields_untouched() {
        let update = request(json!({"city": "Kraków"})).into_update().unwrap();
        assert_eq!(update.city.as_deref(), Some("Kraków"));
        assert!(update.zip_code.is_none());
        assert!(update.first_name.is_none());
    }

    #[test]
    fn test_read_only_fields_ignored() {
        let update = request(json!({"username": "root", "email": "x@y.z", "last_name": "Nowak"}))
            .into_update()
            .unwrap();
        assert_eq!(update.last_name.as_deref(), Some("Nowak"));
    }

    #[test]
    fn test_bad_zip_and_long_phone_rejected() {
        let errors: FieldErrors = request(json!({"zip_code": "31000", "phone": "0".repeat(17)}))
            .validate()
            .unwrap_err()
            .into();
        assert_eq!(
            errors.get("zip_code"),
            Some(&["Enter a zip code in the format NN-NNN.".to_owned()][..])
        );
        assert!(errors.get("phone").is_some());
    }
}
