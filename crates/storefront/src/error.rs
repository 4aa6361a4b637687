//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`.
//!
//! Response bodies are JSON: `{"errors": {field: [messages]}}` for
//! validation failures and `{"error": message}` for everything else.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::db::{PlaceOrderError, RepositoryError, ReviewError};
use crate::validation::FieldErrors;

/// Message returned when a customer tries to withdraw an order that has
/// moved past `ordered`.
pub const ORDER_LOCKED_MESSAGE: &str =
    "This order has already been paid and can no longer be deleted. Please contact us directly.";

/// Field error attached to `items` when an order has no lines.
pub const EMPTY_ORDER_MESSAGE: &str = "Cannot place an empty order.";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Request failed field validation.
    #[error("Validation failed on: {}", .0.fields().collect::<Vec<_>>().join(", "))]
    Validation(FieldErrors),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Generic 404 for an absent resource.
    #[must_use]
    pub fn not_found() -> Self {
        Self::NotFound("Not found.".to_owned())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let body = match self {
            Self::Validation(errors) => json!({ "errors": errors }),
            Self::Database(RepositoryError::NotFound) => json!({ "error": "Not found." }),
            Self::Database(_) | Self::Internal(_) => json!({ "error": "Internal server error" }),
            Self::NotFound(msg) | Self::Unauthorized(msg) | Self::BadRequest(msg) => {
                json!({ "error": msg })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors.into())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let text = rejection.body_text();
        let fields = match rejection {
            JsonRejection::JsonDataError(_) => data_error_fields(&text),
            _ => None,
        };
        fields.map_or_else(|| Self::BadRequest(text), Self::Validation)
    }
}

/// Turn a typed deserialization failure such as
/// `...target type: items[0].quantity: invalid type: ... at line 1 column 9`
/// into a one-field error map. Errors without a usable path stay plain.
fn data_error_fields(text: &str) -> Option<FieldErrors> {
    let detail = text.split_once("target type: ")?.1;
    let (path, message) = detail.split_once(": ")?;
    let is_path = !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'));
    if !is_path {
        return None;
    }
    let message = message
        .rfind(" at line ")
        .map_or(message, |at| &message[..at]);
    Some(FieldErrors::single(path, message))
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PlaceOrderError> for AppError {
    fn from(err: PlaceOrderError) -> Self {
        let missing = |value: &str| format!("Object with slug={value} does not exist.");
        match err {
            PlaceOrderError::EmptyOrder => {
                FieldErrors::single("items", EMPTY_ORDER_MESSAGE).into()
            }
            PlaceOrderError::UnknownShipping(slug) => {
                FieldErrors::single("shipping", missing(&slug)).into()
            }
            PlaceOrderError::UnknownPayment(slug) => {
                FieldErrors::single("payment", missing(&slug)).into()
            }
            PlaceOrderError::UnknownProduct { line, slug } => {
                FieldErrors::single(format!("items[{line}].product"), missing(&slug)).into()
            }
            // The order was committed but could not be read back.
            PlaceOrderError::Repository(RepositoryError::NotFound) => {
                Self::Internal("placed order could not be loaded".to_owned())
            }
            PlaceOrderError::Repository(err) => Self::Database(err),
        }
    }
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::ProductNotFound => Self::not_found(),
            ReviewError::InvalidParent(id) => FieldErrors::single(
                "parent",
                format!("Review {id} does not exist or belongs to another product."),
            )
            .into(),
            ReviewError::Repository(err) => Self::Database(err),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from an account ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: username.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, String)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_owned()),
        message: Some(message.to_owned()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb
            .data
            .insert((*key).to_owned(), serde_json::Value::String(value.clone()));
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use http_body_util::BodyExt;
    use serde_json::Value;

    use super::*;

    async fn render(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[derive(Debug, serde::Deserialize)]
    #[allow(dead_code)]
    struct Line {
        quantity: i32,
    }

    #[derive(Debug, serde::Deserialize)]
    #[allow(dead_code)]
    struct Body {
        #[serde(default)]
        items: Vec<Line>,
    }

    async fn reject(body: &'static str) -> AppError {
        use axum::extract::FromRequest;

        let request = axum::http::Request::builder()
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body))
            .unwrap();
        Json::<Body>::from_request(request, &()).await.unwrap_err().into()
    }

    #[tokio::test]
    async fn test_json_data_error_becomes_field_error() {
        let (status, body) = render(reject(r#"{"items": [{"quantity": "two"}]}"#).await).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let message = body["errors"]["items[0].quantity"][0].as_str().unwrap();
        assert!(message.starts_with("invalid type"), "{message}");
        assert!(!message.contains("line"), "{message}");

        let (_, body) = render(reject(r#"{"items": null}"#).await).await;
        assert!(body["errors"]["items"].is_array(), "{body}");
    }

    #[tokio::test]
    async fn test_malformed_json_stays_plain_bad_request() {
        let (status, body) = render(reject(r#"{"items": ["#).await).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
        assert!(body.get("errors").is_none());
    }

    #[test]
    fn test_data_error_without_path_stays_plain() {
        assert!(data_error_fields(
            "Failed to deserialize the JSON body into the target type: invalid type: null, expected a map at line 1 column 4"
        )
        .is_none());
        let errors = data_error_fields(
            "Failed to deserialize the JSON body into the target type: rate: invalid digit at line 1 column 9",
        )
        .unwrap();
        assert_eq!(errors.get("rate"), Some(&["invalid digit".to_owned()][..]));
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order 12".to_owned());
        assert_eq!(err.to_string(), "Not found: order 12");

        let err = AppError::Validation(FieldErrors::single("city", "required"));
        assert_eq!(err.to_string(), "Validation failed on: city");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(get_status(AppError::not_found()), StatusCode::NOT_FOUND);
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_owned())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_owned())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict(
                "stock_non_negative".to_owned()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_empty_order_is_field_error() {
        let (status, body) = render(PlaceOrderError::EmptyOrder.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"]["items"][0], EMPTY_ORDER_MESSAGE);
    }

    #[tokio::test]
    async fn test_unknown_product_names_the_line() {
        let err = PlaceOrderError::UnknownProduct {
            line: 2,
            slug: "ghost".to_owned(),
        };
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["errors"]["items[2].product"][0],
            "Object with slug=ghost does not exist."
        );
    }

    #[tokio::test]
    async fn test_integrity_conflict_hides_details() {
        let err = PlaceOrderError::Repository(RepositoryError::Conflict(
            "violates check constraint \"product_stock_check\"".to_owned(),
        ));
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Internal server error"}));
    }

    #[tokio::test]
    async fn test_locked_order_message() {
        let (status, body) = render(AppError::BadRequest(ORDER_LOCKED_MESSAGE.to_owned())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], ORDER_LOCKED_MESSAGE);
    }
}
