//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from the database row
//! types in [`crate::db`]. Read models derive `Serialize` and double as the
//! JSON representations returned by the API.

pub mod catalog;
pub mod order;
pub mod profile;
pub mod review;

pub use catalog::{
    BankInfo, NamedRef, NewProduct, PaymentMethod, ProductDetail, ProductSummary, ShippingMethod,
};
pub use order::{NewOrder, NewOrderLine, OrderDetail, OrderLine, OrderSummary};
pub use profile::{AccountInfo, NewAccount, Profile, ProfileUpdate};
pub use review::{NewReview, Review};
