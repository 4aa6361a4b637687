//! Repository traits shared by every storage backend.

use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use record_store_core::{
    AccountId, ArtistId, GenreId, LabelId, MediumId, OrderId, OrderState, PaymentId, ProductId,
    ProfileId, ReviewId, ShippingId,
};

use super::RepositoryError;
use crate::models::{
    BankInfo, NewAccount, NewOrder, NewProduct, NewReview, OrderDetail, OrderSummary,
    PaymentMethod, ProductDetail, ProductSummary, Profile, ProfileUpdate, Review, ShippingMethod,
};

// =============================================================================
// Catalog
// =============================================================================

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductOrdering {
    PriceAsc,
    PriceDesc,
    CreatedAsc,
    #[default]
    CreatedDesc,
}

impl ProductOrdering {
    /// Query-string spelling (`price`, `-price`, `created`, `-created`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PriceAsc => "price",
            Self::PriceDesc => "-price",
            Self::CreatedAsc => "created",
            Self::CreatedDesc => "-created",
        }
    }
}

impl FromStr for ProductOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "price" => Ok(Self::PriceAsc),
            "-price" => Ok(Self::PriceDesc),
            "created" => Ok(Self::CreatedAsc),
            "-created" => Ok(Self::CreatedDesc),
            other => Err(format!(
                "unknown ordering '{other}', expected one of: price, -price, created, -created"
            )),
        }
    }
}

/// Product listing filter. Every criterion is optional and they combine
/// with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Genre slug.
    pub genre: Option<String>,
    /// Artist slug.
    pub artist: Option<String>,
    /// Media type name, e.g. "CD".
    pub medium_type: Option<String>,
    /// Record label slug.
    pub label: Option<String>,
    /// Inclusive lower price bound.
    pub min_price: Option<Decimal>,
    /// Inclusive upper price bound.
    pub max_price: Option<Decimal>,
    /// Match products carrying any of these tag names.
    pub tags: Vec<String>,
    pub ordering: ProductOrdering,
}

impl ProductFilter {
    /// Whether a product satisfies every criterion.
    #[must_use]
    pub fn matches(&self, product: &ProductDetail) -> bool {
        let slug_eq = |wanted: &Option<String>, actual: Option<&str>| {
            wanted
                .as_deref()
                .is_none_or(|wanted| actual == Some(wanted))
        };

        slug_eq(&self.genre, Some(&product.genre.slug))
            && slug_eq(&self.artist, product.artist.as_ref().map(|a| a.slug.as_str()))
            && slug_eq(&self.medium_type, Some(&product.medium_type))
            && slug_eq(&self.label, product.label.as_ref().map(|l| l.slug.as_str()))
            && self.min_price.is_none_or(|min| product.price >= min)
            && self.max_price.is_none_or(|max| product.price <= max)
            && (self.tags.is_empty() || product.tags.iter().any(|t| self.tags.contains(t)))
    }
}

/// Catalog reads plus the writers used to seed it.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// List products matching `filter`, in the filter's ordering.
    async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<ProductSummary>, RepositoryError>;

    async fn get_product(&self, slug: &str) -> Result<Option<ProductDetail>, RepositoryError>;

    async fn list_shipping(&self) -> Result<Vec<ShippingMethod>, RepositoryError>;

    async fn list_payments(&self) -> Result<Vec<PaymentMethod>, RepositoryError>;

    /// The bank transfer recipient (first configured row), if any.
    async fn bank_info(&self) -> Result<Option<BankInfo>, RepositoryError>;

    async fn upsert_genre(&self, name: &str, slug: &str) -> Result<GenreId, RepositoryError>;

    async fn upsert_artist(&self, name: &str, slug: &str) -> Result<ArtistId, RepositoryError>;

    async fn upsert_label(
        &self,
        name: &str,
        slug: &str,
        description: Option<&str>,
    ) -> Result<LabelId, RepositoryError>;

    async fn upsert_medium(&self, name: &str) -> Result<MediumId, RepositoryError>;

    /// Insert a product, or refresh every field of the one with the same
    /// slug. Tags are replaced.
    async fn upsert_product(&self, product: &NewProduct) -> Result<ProductId, RepositoryError>;

    async fn upsert_shipping(
        &self,
        name: &str,
        slug: &str,
        price: Decimal,
    ) -> Result<ShippingId, RepositoryError>;

    async fn upsert_payment(&self, name: &str, slug: &str) -> Result<PaymentId, RepositoryError>;

    async fn set_bank_info(&self, info: &BankInfo) -> Result<(), RepositoryError>;
}

// =============================================================================
// Reviews
// =============================================================================

/// Why a review could not be posted.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("product not found")]
    ProductNotFound,

    /// The parent review does not exist or belongs to another product.
    #[error("review {0} is not a review of this product")]
    InvalidParent(ReviewId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Active reviews of a product, oldest first. Unknown slugs yield an
    /// empty list.
    async fn list_reviews(&self, product_slug: &str) -> Result<Vec<Review>, RepositoryError>;

    async fn create_review(&self, review: &NewReview) -> Result<Review, ReviewError>;
}

// =============================================================================
// Orders
// =============================================================================

/// Result of a customer's attempt to delete an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// No such order for this customer.
    NotFound,
    /// The order has moved past `ordered` and was left in place.
    Locked(OrderState),
}

/// Why an order could not be placed. Nothing is persisted in any case.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    #[error("cannot place an empty order")]
    EmptyOrder,

    #[error("unknown shipping method: {0}")]
    UnknownShipping(String),

    #[error("unknown payment method: {0}")]
    UnknownPayment(String),

    #[error("unknown product '{slug}' in line {line}")]
    UnknownProduct { line: usize, slug: String },

    /// Storage failure, including integrity conflicts such as stock
    /// dropping below zero.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// A customer's orders, newest first.
    async fn list_orders(&self, profile: ProfileId) -> Result<Vec<OrderSummary>, RepositoryError>;

    /// One order, only if it belongs to `profile`.
    async fn get_order(
        &self,
        profile: ProfileId,
        id: OrderId,
    ) -> Result<Option<OrderDetail>, RepositoryError>;

    /// Delete an order and its lines if it belongs to `profile` and is
    /// still in the `ordered` state.
    async fn delete_order(
        &self,
        profile: ProfileId,
        id: OrderId,
    ) -> Result<DeleteOutcome, RepositoryError>;

    /// Persist an order, its lines and the stock decrements in one
    /// transaction. Returns the committed order.
    async fn place_order(
        &self,
        profile: ProfileId,
        order: &NewOrder,
    ) -> Result<OrderDetail, PlaceOrderError>;

    /// Staff-side state change.
    async fn set_order_state(&self, id: OrderId, state: OrderState)
    -> Result<(), RepositoryError>;
}

// =============================================================================
// Profiles
// =============================================================================

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Register an account. Fails with `Conflict` on a taken username.
    async fn create_account(&self, account: &NewAccount) -> Result<AccountId, RepositoryError>;

    /// The profile of an account, created empty on first use. Fails with
    /// `NotFound` if the account does not exist.
    async fn get_or_create_profile(&self, account: AccountId) -> Result<Profile, RepositoryError>;

    async fn update_profile(
        &self,
        account: AccountId,
        update: &ProfileUpdate,
    ) -> Result<Profile, RepositoryError>;
}

// =============================================================================
// Store
// =============================================================================

/// Everything the HTTP layer needs from storage.
#[async_trait]
pub trait Store: CatalogRepository + ReviewRepository + OrderRepository + ProfileRepository {
    /// Cheap connectivity check for the readiness endpoint.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::NamedRef;

    fn product(price: Decimal, tags: &[&str]) -> ProductDetail {
        ProductDetail {
            genre: NamedRef::new("Jazz", "jazz"),
            artist: Some(NamedRef::new("Miles Davis", "miles-davis")),
            title: "Kind of Blue".to_owned(),
            slug: "kind-of-blue".to_owned(),
            medium_type: "Vinyl".to_owned(),
            medium_count: 1,
            release_date: NaiveDate::from_ymd_opt(1959, 8, 17).unwrap(),
            image: None,
            description: None,
            price,
            length: Some(46),
            label: None,
            tags: tags.iter().map(|t| (*t).to_owned()).collect(),
            stock: 3,
        }
    }

    #[test]
    fn test_ordering_parse() {
        assert_eq!("price".parse(), Ok(ProductOrdering::PriceAsc));
        assert_eq!("-price".parse(), Ok(ProductOrdering::PriceDesc));
        assert_eq!("-created".parse(), Ok(ProductOrdering::CreatedDesc));
        assert!("title".parse::<ProductOrdering>().is_err());
        assert_eq!(ProductOrdering::default().as_str(), "-created");
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(ProductFilter::default().matches(&product(Decimal::new(5999, 2), &[])));
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let filter = ProductFilter {
            min_price: Some(Decimal::new(50, 0)),
            max_price: Some(Decimal::new(60, 0)),
            ..ProductFilter::default()
        };
        assert!(filter.matches(&product(Decimal::new(50, 0), &[])));
        assert!(filter.matches(&product(Decimal::new(60, 0), &[])));
        assert!(!filter.matches(&product(Decimal::new(4999, 2), &[])));
        assert!(!filter.matches(&product(Decimal::new(6001, 2), &[])));
    }

    #[test]
    fn test_label_filter_excludes_unlabelled() {
        let filter = ProductFilter {
            label: Some("blue-note".to_owned()),
            ..ProductFilter::default()
        };
        assert!(!filter.matches(&product(Decimal::ONE, &[])));
    }

    #[test]
    fn test_tags_match_any() {
        let filter = ProductFilter {
            tags: vec!["modal".to_owned(), "bebop".to_owned()],
            ..ProductFilter::default()
        };
        assert!(filter.matches(&product(Decimal::ONE, &["classic", "modal"])));
        assert!(!filter.matches(&product(Decimal::ONE, &["fusion"])));
    }

    #[test]
    fn test_slug_filters() {
        let p = product(Decimal::ONE, &[]);
        let by_artist = ProductFilter {
            artist: Some("miles-davis".to_owned()),
            genre: Some("jazz".to_owned()),
            medium_type: Some("Vinyl".to_owned()),
            ..ProductFilter::default()
        };
        assert!(by_artist.matches(&p));

        let wrong_medium = ProductFilter {
            medium_type: Some("CD".to_owned()),
            ..ProductFilter::default()
        };
        assert!(!wrong_medium.matches(&p));
    }
}
