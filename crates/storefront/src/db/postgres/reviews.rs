//! Product reviews.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use record_store_core::{ProductId, Rating, ReviewId};

use super::{PgStore, ProfileRow, profile_columns};
use crate::db::RepositoryError;
use crate::db::repository::{ReviewError, ReviewRepository};
use crate::models::{NewReview, Profile, Review};

macro_rules! review_select {
    ($where:literal) => {
        concat!(
            r"
            SELECT r.id, pr.slug AS product_slug, r.parent_id, r.text, r.rate,
                   r.created_at,
            ",
            profile_columns!(),
            r"
            FROM review r
            JOIN product pr ON pr.id = r.product_id
            JOIN user_profile up ON up.id = r.author_id
            JOIN account ac ON ac.id = up.account_id
            ",
            $where
        )
    };
}

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    product_slug: String,
    parent_id: Option<ReviewId>,
    text: String,
    rate: i16,
    created_at: DateTime<Utc>,
    #[sqlx(flatten)]
    author: ProfileRow,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rate = Rating::new(i64::from(row.rate)).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid rating in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            author: Profile::try_from(row.author)?,
            product: row.product_slug,
            parent: row.parent_id,
            text: row.text,
            rate,
            created: row.created_at,
        })
    }
}

async fn review_by_id(conn: &mut PgConnection, id: ReviewId) -> Result<Review, RepositoryError> {
    let row = sqlx::query_as::<_, ReviewRow>(review_select!("WHERE r.id = $1"))
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    Review::try_from(row)
}

#[async_trait]
impl ReviewRepository for PgStore {
    async fn list_reviews(&self, product_slug: &str) -> Result<Vec<Review>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewRow>(review_select!(
            "WHERE pr.slug = $1 AND r.is_active ORDER BY r.created_at, r.id"
        ))
        .bind(product_slug)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Review::try_from).collect()
    }

    async fn create_review(&self, review: &NewReview) -> Result<Review, ReviewError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let product: ProductId = sqlx::query_scalar("SELECT id FROM product WHERE slug = $1")
            .bind(&review.product_slug)
            .fetch_optional(&mut *tx)
            .await
            .map_err(RepositoryError::from)?
            .ok_or(ReviewError::ProductNotFound)?;

        if let Some(parent) = review.parent {
            let same_product: Option<bool> =
                sqlx::query_scalar("SELECT product_id = $2 FROM review WHERE id = $1")
                    .bind(parent)
                    .bind(product)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(RepositoryError::from)?;
            if same_product != Some(true) {
                return Err(ReviewError::InvalidParent(parent));
            }
        }

        let id: ReviewId = sqlx::query_scalar(
            r"
            INSERT INTO review (author_id, product_id, parent_id, text, rate)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(review.author)
        .bind(product)
        .bind(review.parent)
        .bind(&review.text)
        .bind(i16::from(review.rate))
        .fetch_one(&mut *tx)
        .await
        .map_err(RepositoryError::from_write)?;

        let created = review_by_id(&mut tx, id).await?;
        tx.commit().await.map_err(RepositoryError::from)?;
        Ok(created)
    }
}
