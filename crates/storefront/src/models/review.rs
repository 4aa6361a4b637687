//! Product reviews.

use chrono::{DateTime, Utc};
use serde::Serialize;

use record_store_core::{ProfileId, Rating, ReviewId};

use super::profile::Profile;

/// A customer review, possibly a reply to another review of the same
/// product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub author: Profile,
    /// Slug of the reviewed product.
    pub product: String,
    pub parent: Option<ReviewId>,
    pub text: String,
    pub rate: Rating,
    pub created: DateTime<Utc>,
}

/// Input for posting a review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub author: ProfileId,
    pub product_slug: String,
    pub parent: Option<ReviewId>,
    pub text: String,
    pub rate: Rating,
}
