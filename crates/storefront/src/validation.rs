//! Request validation.
//!
//! Request bodies derive [`validator::Validate`]. Failures are flattened into
//! [`FieldErrors`], a `field -> [messages]` map that is returned verbatim as
//! the `errors` object of a `400` response. Nested fields use dotted paths
//! and list entries use brackets, e.g. `items[1].quantity`.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::Serialize;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use record_store_core::ZipCode;

use crate::error::AppError;

/// Field-level validation messages keyed by field path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A map holding one message for one field.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    fn collect(&mut self, prefix: &str, errors: &ValidationErrors) {
        for (field, kind) in errors.errors() {
            let path = if prefix.is_empty() {
                field.to_string()
            } else {
                format!("{prefix}.{field}")
            };
            match kind {
                ValidationErrorsKind::Field(list) => {
                    for error in list {
                        self.add(path.clone(), message_for(error));
                    }
                }
                ValidationErrorsKind::Struct(inner) => self.collect(&path, inner),
                ValidationErrorsKind::List(entries) => {
                    for (index, inner) in entries {
                        self.collect(&format!("{path}[{index}]"), inner);
                    }
                }
            }
        }
    }
}

fn message_for(error: &ValidationError) -> String {
    error.message.as_ref().map_or_else(
        || match error.code.as_ref() {
            "required" => "This field is required.".to_owned(),
            "length" => "Ensure this field has a valid length.".to_owned(),
            "range" => "Ensure this value is within the allowed range.".to_owned(),
            code => format!("Invalid value ({code})."),
        },
        ToString::to_string,
    )
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = Self::new();
        fields.collect("", &errors);
        fields
    }
}

/// `validator` custom check for `NN-NNN` postal codes.
///
/// # Errors
///
/// Returns a `zip_code` validation error for anything else.
pub fn validate_zip_code(value: &str) -> Result<(), ValidationError> {
    ZipCode::parse(value).map(|_| ()).map_err(|_| {
        let mut err = ValidationError::new("zip_code");
        err.message = Some("Enter a zip code in the format NN-NNN.".into());
        err
    })
}

/// JSON body extractor that runs `Validate` after deserializing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}
