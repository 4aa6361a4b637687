//! Checkout option lookups.

use axum::{Json, extract::State};

use crate::db::CatalogRepository;
use crate::error::Result;
use crate::models::{PaymentMethod, ShippingMethod};
use crate::state::AppState;

/// `GET /api/shipping`
pub async fn shipping(State(state): State<AppState>) -> Result<Json<Vec<ShippingMethod>>> {
    Ok(Json(state.store().list_shipping().await?))
}

/// `GET /api/payments`
pub async fn payments(State(state): State<AppState>) -> Result<Json<Vec<PaymentMethod>>> {
    Ok(Json(state.store().list_payments().await?))
}
