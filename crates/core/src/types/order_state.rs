//! Order fulfillment state.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where an order is in its fulfillment lifecycle.
///
/// Orders start as [`OrderState::Ordered`]. Staff move them to `Paid` once
/// money arrives and to `Shipped` once the parcel leaves. Only an `Ordered`
/// order may be withdrawn by the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_state", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    #[default]
    Ordered,
    Paid,
    Shipped,
}

impl OrderState {
    /// Whether the customer may still delete the order themselves.
    #[must_use]
    pub const fn is_deletable(self) -> bool {
        matches!(self, Self::Ordered)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ordered => "ordered",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
        }
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown order state name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid order state: {0} (expected ordered, paid or shipped)")]
pub struct OrderStateParseError(pub String);

impl FromStr for OrderState {
    type Err = OrderStateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ordered" => Ok(Self::Ordered),
            "paid" => Ok(Self::Paid),
            "shipped" => Ok(Self::Shipped),
            other => Err(OrderStateParseError(other.to_owned())),
        }
    }
}
