//! Core domain types for the record store.

pub mod email;
pub mod id;
pub mod money;
pub mod order_state;
pub mod rating;
pub mod zip_code;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{line_total, order_total};
pub use order_state::{OrderState, OrderStateParseError};
pub use rating::{Rating, RatingError};
pub use zip_code::{ZipCode, ZipCodeError};
