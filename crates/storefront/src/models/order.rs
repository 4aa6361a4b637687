//! Orders and order lines.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use record_store_core::{OrderId, OrderState, ZipCode};

use super::catalog::{NamedRef, ProductDetail};
use super::profile::Profile;

/// Row of the order history list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub shipping: NamedRef,
    /// Payment method name.
    pub payment: String,
    pub total_price: Decimal,
    pub state: OrderState,
    pub created: DateTime<Utc>,
}

/// One product line of an order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderLine {
    pub product: ProductDetail,
    pub quantity: i32,
}

/// Complete order as returned to its owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetail {
    pub id: OrderId,
    /// Public reference, used as the bank transfer title.
    pub code: Uuid,
    pub user: Profile,
    pub shipping: NamedRef,
    pub payment: String,
    #[serde(skip)]
    pub payment_slug: String,
    pub total_price: Decimal,
    pub address: String,
    pub zip_code: ZipCode,
    pub city: String,
    pub phone: Option<String>,
    pub state: OrderState,
    pub created: DateTime<Utc>,
    pub items: Vec<OrderLine>,
}

impl OrderDetail {
    #[must_use]
    pub fn summary(&self) -> OrderSummary {
        OrderSummary {
            id: self.id,
            shipping: self.shipping.clone(),
            payment: self.payment.clone(),
            total_price: self.total_price,
            state: self.state,
            created: self.created,
        }
    }
}

/// A requested order line: product slug and quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub product: String,
    pub quantity: i32,
}

/// A validated checkout submission.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub shipping: String,
    pub payment: String,
    pub address: String,
    pub zip_code: ZipCode,
    pub city: String,
    pub phone: Option<String>,
    pub items: Vec<NewOrderLine>,
}
