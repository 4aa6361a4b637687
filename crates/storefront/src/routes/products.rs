//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use crate::db::{CatalogRepository, ProductFilter, ProductOrdering};
use crate::error::{AppError, Result};
use crate::models::{ProductDetail, ProductSummary};
use crate::state::AppState;
use crate::validation::FieldErrors;

/// Query parameters accepted by the product listing.
///
/// Everything arrives as text so that malformed values become field
/// errors instead of a generic query rejection. Empty values are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub genre: Option<String>,
    pub artist: Option<String>,
    pub medium_type: Option<String>,
    pub label: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    /// Comma-separated tag names.
    pub tags: Option<String>,
    pub ordering: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn price(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
) -> Option<Decimal> {
    let raw = present(value)?;
    match raw.parse::<Decimal>() {
        Ok(price) => Some(price),
        Err(_) => {
            errors.add(field, "Enter a number.");
            None
        }
    }
}

impl ProductQuery {
    /// Convert to a repository filter.
    ///
    /// # Errors
    ///
    /// Returns field errors for unparseable prices or an unknown ordering.
    pub fn into_filter(self) -> std::result::Result<ProductFilter, FieldErrors> {
        let mut errors = FieldErrors::new();

        let min_price = price(&mut errors, "min_price", self.min_price);
        let max_price = price(&mut errors, "max_price", self.max_price);
        let ordering = match present(self.ordering) {
            None => ProductOrdering::default(),
            Some(raw) => raw.parse().unwrap_or_else(|msg: String| {
                errors.add("ordering", msg);
                ProductOrdering::default()
            }),
        };
        let tags = present(self.tags)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ProductFilter {
            genre: present(self.genre),
            artist: present(self.artist),
            medium_type: present(self.medium_type),
            label: present(self.label),
            min_price,
            max_price,
            tags,
            ordering,
        })
    }
}

/// `GET /api/products`
#[instrument(skip(state, query))]
pub async fn index(
    State(state): State<AppState>,
    query: std::result::Result<Query<ProductQuery>, QueryRejection>,
) -> Result<Json<Vec<ProductSummary>>> {
    let Query(query) = query?;
    let filter = query.into_filter()?;
    let products = state.store().list_products(&filter).await?;
    Ok(Json(products))
}

/// `GET /api/products/{slug}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetail>> {
    state
        .store()
        .get_product(&slug)
        .await?
        .map(Json)
        .ok_or_else(AppError::not_found)
}
