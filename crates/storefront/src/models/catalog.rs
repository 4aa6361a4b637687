//! Catalog domain types: products and the lookups they reference.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use record_store_core::{ArtistId, GenreId, LabelId, MediumId, PaymentId, ShippingId};

/// Short `{name, slug}` reference used for genres, artists, labels and
/// shipping methods inside larger payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedRef {
    pub name: String,
    pub slug: String,
}

impl NamedRef {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
        }
    }
}

/// Product as shown in catalog listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSummary {
    pub genre: NamedRef,
    pub artist: Option<NamedRef>,
    pub title: String,
    pub slug: String,
    /// Name of the media type, e.g. "CD" or "Vinyl".
    pub medium_type: String,
    pub release_date: NaiveDate,
    pub image: Option<String>,
    pub price: Decimal,
    pub stock: i32,
}

/// Full product record, returned by the detail endpoint and embedded in
/// order lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDetail {
    pub genre: NamedRef,
    pub artist: Option<NamedRef>,
    pub title: String,
    pub slug: String,
    pub medium_type: String,
    pub medium_count: i32,
    pub release_date: NaiveDate,
    pub image: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    /// Running time in minutes.
    pub length: Option<i32>,
    pub label: Option<NamedRef>,
    pub tags: Vec<String>,
    pub stock: i32,
}

impl From<ProductDetail> for ProductSummary {
    fn from(detail: ProductDetail) -> Self {
        Self {
            genre: detail.genre,
            artist: detail.artist,
            title: detail.title,
            slug: detail.slug,
            medium_type: detail.medium_type,
            release_date: detail.release_date,
            image: detail.image,
            price: detail.price,
            stock: detail.stock,
        }
    }
}

/// Input for creating or refreshing a product (seeding and tests).
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub genre: GenreId,
    pub artist: Option<ArtistId>,
    pub title: String,
    pub slug: String,
    pub medium: MediumId,
    pub medium_count: i32,
    pub release_date: NaiveDate,
    pub image: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub length: Option<i32>,
    pub label: Option<LabelId>,
    pub tags: Vec<String>,
    pub stock: i32,
}

/// A delivery option offered at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingMethod {
    pub id: ShippingId,
    pub name: String,
    pub slug: String,
    pub price: Decimal,
}

/// A payment option offered at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentMethod {
    pub id: PaymentId,
    pub name: String,
    pub slug: String,
}

/// Recipient details customers need to pay by bank transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BankInfo {
    pub account: String,
    pub name: String,
    pub address: String,
}
