//! Product review handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::{info, instrument};
use validator::Validate;

use record_store_core::{Rating, ReviewId};

use crate::db::ReviewRepository;
use crate::error::Result;
use crate::middleware::CurrentProfile;
use crate::models::{NewReview, Review};
use crate::state::AppState;
use crate::validation::{FieldErrors, ValidJson};

/// Body of `POST /api/products/{slug}/reviews`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 255,
        message = "Enter between 1 and 255 characters."
    ))]
    pub text: String,
    #[serde(default)]
    #[validate(range(min = 1, max = 5, message = "Ensure this value is between 1 and 5."))]
    pub rate: i64,
    /// Review this one replies to.
    pub parent: Option<ReviewId>,
}

/// `GET /api/products/{slug}/reviews`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<Review>>> {
    Ok(Json(state.store().list_reviews(&slug).await?))
}

/// `POST /api/products/{slug}/reviews`
#[instrument(skip(state, profile, request), fields(profile_id = %profile.id))]
pub async fn create(
    State(state): State<AppState>,
    CurrentProfile(profile): CurrentProfile,
    Path(slug): Path<String>,
    ValidJson(request): ValidJson<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>)> {
    let rate = Rating::new(request.rate)
        .map_err(|e| FieldErrors::single("rate", e.to_string()))?;

    let review = state
        .store()
        .create_review(&NewReview {
            author: profile.id,
            product_slug: slug,
            parent: request.parent,
            text: request.text,
            rate,
        })
        .await?;

    info!(review_id = %review.id, product = %review.product, "Review posted");
    Ok((StatusCode::CREATED, Json(review)))
}
