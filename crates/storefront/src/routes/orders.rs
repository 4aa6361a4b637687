//! Order route handlers.
//!
//! Orders are only ever visible to the customer who placed them. Asking
//! for somebody else's order is indistinguishable from asking for one
//! that does not exist.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use validator::Validate;

use record_store_core::{OrderId, ZipCode};

use crate::db::{DeleteOutcome, OrderRepository};
use crate::error::{AppError, EMPTY_ORDER_MESSAGE, ORDER_LOCKED_MESSAGE, Result};
use crate::middleware::CurrentProfile;
use crate::models::{NewOrder, NewOrderLine, OrderDetail, OrderSummary};
use crate::services::ordering::{OrderingService, PlacedOrder};
use crate::state::AppState;
use crate::validation::{FieldErrors, validate_zip_code};

/// One requested line of `POST /api/orders`.
#[derive(Debug, Deserialize, Validate)]
pub struct OrderLineRequest {
    /// Product slug.
    #[serde(default)]
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub product: String,
    #[serde(default)]
    #[validate(range(
        min = 1,
        max = 32767,
        message = "Ensure this value is between 1 and 32767."
    ))]
    pub quantity: i32,
}

/// Body of `POST /api/orders`.
#[derive(Debug, Deserialize, Validate)]
pub struct PlaceOrderRequest {
    /// Shipping method slug.
    #[serde(default)]
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub shipping: String,
    /// Payment method slug.
    #[serde(default)]
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub payment: String,
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 255,
        message = "Enter between 1 and 255 characters."
    ))]
    pub address: String,
    #[serde(default)]
    #[validate(custom(function = "validate_zip_code"))]
    pub zip_code: String,
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 128,
        message = "Enter between 1 and 128 characters."
    ))]
    pub city: String,
    #[validate(length(max = 16, message = "Ensure this field has no more than 16 characters."))]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<OrderLineRequest>,
}

impl PlaceOrderRequest {
    /// Validate every field, reporting an empty item list alongside any
    /// other field errors.
    fn into_new_order(self) -> std::result::Result<NewOrder, FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };
        if self.items.is_empty() {
            errors.add("items", EMPTY_ORDER_MESSAGE);
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let zip_code = ZipCode::parse(&self.zip_code)
            .map_err(|e| FieldErrors::single("zip_code", e.to_string()))?;

        Ok(NewOrder {
            shipping: self.shipping,
            payment: self.payment,
            address: self.address,
            zip_code,
            city: self.city,
            phone: self
                .phone
                .map(|p| p.trim().to_owned())
                .filter(|p| !p.is_empty()),
            items: self
                .items
                .into_iter()
                .map(|line| NewOrderLine {
                    product: line.product,
                    quantity: line.quantity,
                })
                .collect(),
        })
    }
}

/// Order ids arrive as raw path text; anything that is not an id is
/// simply an order that does not exist.
fn parse_order_id(raw: &str) -> Result<OrderId> {
    raw.parse().map_err(|_| AppError::not_found())
}

/// `GET /api/orders`
#[instrument(skip_all, fields(profile_id = %profile.id))]
pub async fn index(
    State(state): State<AppState>,
    CurrentProfile(profile): CurrentProfile,
) -> Result<Json<Vec<OrderSummary>>> {
    Ok(Json(state.store().list_orders(profile.id).await?))
}

/// `POST /api/orders`
#[instrument(skip_all, fields(profile_id = %profile.id))]
pub async fn create(
    State(state): State<AppState>,
    CurrentProfile(profile): CurrentProfile,
    body: std::result::Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PlacedOrder>)> {
    let Json(request) = body?;
    let order = request.into_new_order()?;

    let placed = OrderingService::from_state(&state)
        .place(&profile, &order)
        .await?;

    info!(
        order_id = %placed.order().id,
        total = %placed.order().total_price,
        "Order created"
    );
    Ok((StatusCode::CREATED, Json(placed)))
}

/// `GET /api/orders/{id}`
#[instrument(skip(state, profile), fields(profile_id = %profile.id))]
pub async fn show(
    State(state): State<AppState>,
    CurrentProfile(profile): CurrentProfile,
    Path(id): Path<String>,
) -> Result<Json<OrderDetail>> {
    let id = parse_order_id(&id)?;
    state
        .store()
        .get_order(profile.id, id)
        .await?
        .map(Json)
        .ok_or_else(AppError::not_found)
}

/// `DELETE /api/orders/{id}`
///
/// Customers may withdraw an order only while it is still `ordered`.
#[instrument(skip(state, profile), fields(profile_id = %profile.id))]
pub async fn destroy(
    State(state): State<AppState>,
    CurrentProfile(profile): CurrentProfile,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = parse_order_id(&id)?;
    match state.store().delete_order(profile.id, id).await? {
        DeleteOutcome::Deleted => {
            info!(order_id = %id, "Order deleted by customer");
            Ok(StatusCode::NO_CONTENT)
        }
        DeleteOutcome::NotFound => Err(AppError::not_found()),
        DeleteOutcome::Locked(current) => {
            warn!(order_id = %id, state = %current, "Refused to delete order");
            Err(AppError::BadRequest(ORDER_LOCKED_MESSAGE.to_owned()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    const BLANK: &str = "This field may not be blank.";

    fn request(body: serde_json::Value) -> PlaceOrderRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_valid_request_converts() {
        let order = request(json!({
            "shipping": "courier",
            "payment": "bank-transfer",
            "address": "Długa 5",
            "zip_code": "80-831",
            "city": "Gdańsk",
            "phone": "  ",
            "items": [{"product": "kind-of-blue", "quantity": 2}]
        }))
        .into_new_order()
        .unwrap();

        assert_eq!(order.zip_code.as_str(), "80-831");
        assert_eq!(order.phone, None);
        assert_eq!(order.items[0].quantity, 2);
    }

    #[test]
    fn test_empty_items_reported_with_other_errors() {
        let errors = request(json!({
            "shipping": "courier",
            "payment": "bank-transfer",
            "address": "",
            "zip_code": "80831",
            "city": "Gdańsk",
            "items": []
        }))
        .into_new_order()
        .unwrap_err();

        assert_eq!(errors.get("items"), Some(&[EMPTY_ORDER_MESSAGE.to_owned()][..]));
        assert!(errors.get("address").is_some());
        assert!(errors.get("zip_code").is_some());
        assert!(errors.get("city").is_none());
    }

    #[test]
    fn test_missing_fields_are_blank() {
        let errors = request(json!({})).into_new_order().unwrap_err();
        for field in ["shipping", "payment", "address", "zip_code", "city", "items"] {
            assert!(errors.get(field).is_some(), "expected error on {field}");
        }
        assert_eq!(errors.get("shipping"), Some(&[BLANK.to_owned()][..]));
    }

    #[test]
    fn test_line_quantity_is_indexed() {
        let errors = request(json!({
            "shipping": "courier",
            "payment": "cash",
            "address": "Długa 5",
            "zip_code": "80-831",
            "city": "Gdańsk",
            "items": [
                {"product": "kind-of-blue", "quantity": 1},
                {"product": "a-love-supreme", "quantity": 0}
            ]
        }))
        .into_new_order()
        .unwrap_err();

        assert!(errors.get("items[1].quantity").is_some());
        assert!(errors.get("items[0].quantity").is_none());
    }
}
