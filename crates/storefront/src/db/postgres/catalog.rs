//! Catalog queries: products, checkout options and bank details.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::instrument;

use record_store_core::{ArtistId, GenreId, LabelId, MediumId, PaymentId, ProductId, ShippingId};

use super::{PgStore, ProductRow, product_columns, product_joins};
use crate::db::RepositoryError;
use crate::db::repository::{CatalogRepository, ProductFilter};
use crate::models::{
    BankInfo, NewProduct, PaymentMethod, ProductDetail, ProductSummary, ShippingMethod,
};

#[async_trait]
impl CatalogRepository for PgStore {
    #[instrument(skip(self), fields(ordering = filter.ordering.as_str()))]
    async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<ProductSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(concat!(
            "SELECT ",
            product_columns!(),
            product_joins!(),
            r"
            WHERE ($1::text IS NULL OR g.slug = $1)
              AND ($2::text IS NULL OR a.slug = $2)
              AND ($3::text IS NULL OR m.name = $3)
              AND ($4::text IS NULL OR l.slug = $4)
              AND ($5::numeric IS NULL OR p.price >= $5)
              AND ($6::numeric IS NULL OR p.price <= $6)
              AND (
                  cardinality($7::text[]) = 0
                  OR EXISTS (
                      SELECT 1 FROM product_tag pt
                      JOIN tag t ON t.id = pt.tag_id
                      WHERE pt.product_id = p.id AND t.name = ANY($7)
                  )
              )
            ORDER BY
                CASE WHEN $8 = 'price' THEN p.price END ASC,
                CASE WHEN $8 = '-price' THEN p.price END DESC,
                CASE WHEN $8 = 'created' THEN p.created_at END ASC,
                p.created_at DESC,
                p.id DESC
            "
        ))
        .bind(filter.genre.as_deref())
        .bind(filter.artist.as_deref())
        .bind(filter.medium_type.as_deref())
        .bind(filter.label.as_deref())
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(&filter.tags)
        .bind(filter.ordering.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ProductSummary::from(ProductDetail::from(row)))
            .collect())
    }

    async fn get_product(&self, slug: &str) -> Result<Option<ProductDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(concat!(
            "SELECT ",
            product_columns!(),
            product_joins!(),
            "WHERE p.slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ProductDetail::from))
    }

    async fn list_shipping(&self) -> Result<Vec<ShippingMethod>, RepositoryError> {
        let rows: Vec<(ShippingId, String, String, Decimal)> =
            sqlx::query_as("SELECT id, name, slug, price FROM shipping ORDER BY price, id")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, slug, price)| ShippingMethod {
                id,
                name,
                slug,
                price,
            })
            .collect())
    }

    async fn list_payments(&self) -> Result<Vec<PaymentMethod>, RepositoryError> {
        let rows: Vec<(PaymentId, String, String)> =
            sqlx::query_as("SELECT id, name, slug FROM payment ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, slug)| PaymentMethod { id, name, slug })
            .collect())
    }

    async fn bank_info(&self) -> Result<Option<BankInfo>, RepositoryError> {
        let row: Option<(String, String, String)> =
            sqlx::query_as("SELECT account, name, address FROM bank_info ORDER BY id LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(account, name, address)| BankInfo {
            account,
            name,
            address,
        }))
    }

    async fn upsert_genre(&self, name: &str, slug: &str) -> Result<GenreId, RepositoryError> {
        sqlx::query_scalar(
            r"
            INSERT INTO genre (name, slug) VALUES ($1, $2)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            ",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from_write)
    }

    async fn upsert_artist(&self, name: &str, slug: &str) -> Result<ArtistId, RepositoryError> {
        sqlx::query_scalar(
            r"
            INSERT INTO artist (name, slug) VALUES ($1, $2)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            ",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from_write)
    }

    async fn upsert_label(
        &self,
        name: &str,
        slug: &str,
        description: Option<&str>,
    ) -> Result<LabelId, RepositoryError> {
        sqlx::query_scalar(
            r"
            INSERT INTO record_label (name, slug, description) VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO UPDATE
                SET name = EXCLUDED.name, description = EXCLUDED.description
            RETURNING id
            ",
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from_write)
    }

    async fn upsert_medium(&self, name: &str) -> Result<MediumId, RepositoryError> {
        sqlx::query_scalar(
            r"
            INSERT INTO medium (name) VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            ",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from_write)
    }

    #[instrument(skip(self, product), fields(slug = %product.slug))]
    async fn upsert_product(&self, product: &NewProduct) -> Result<ProductId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: ProductId = sqlx::query_scalar(
            r"
            INSERT INTO product (
                genre_id, artist_id, title, slug, medium_id, medium_count,
                release_date, image, description, price, length, label_id, stock
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (slug) DO UPDATE SET
                genre_id = EXCLUDED.genre_id,
                artist_id = EXCLUDED.artist_id,
                title = EXCLUDED.title,
                medium_id = EXCLUDED.medium_id,
                medium_count = EXCLUDED.medium_count,
                release_date = EXCLUDED.release_date,
                image = EXCLUDED.image,
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                length = EXCLUDED.length,
                label_id = EXCLUDED.label_id,
                stock = EXCLUDED.stock
            RETURNING id
            ",
        )
        .bind(product.genre)
        .bind(product.artist)
        .bind(&product.title)
        .bind(&product.slug)
        .bind(product.medium)
        .bind(product.medium_count)
        .bind(product.release_date)
        .bind(product.image.as_deref())
        .bind(product.description.as_deref())
        .bind(product.price)
        .bind(product.length)
        .bind(product.label)
        .bind(product.stock)
        .fetch_one(&mut *tx)
        .await
        .map_err(RepositoryError::from_write)?;

        sqlx::query("DELETE FROM product_tag WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for tag in &product.tags {
            sqlx::query(
                r"
                WITH t AS (
                    INSERT INTO tag (name) VALUES ($2)
                    ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                    RETURNING id
                )
                INSERT INTO product_tag (product_id, tag_id)
                SELECT $1, t.id FROM t
                ON CONFLICT DO NOTHING
                ",
            )
            .bind(id)
            .bind(tag)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::from_write)?;
        }

        tx.commit().await?;
        Ok(id)
    }

    async fn upsert_shipping(
        &self,
        name: &str,
        slug: &str,
        price: Decimal,
    ) -> Result<ShippingId, RepositoryError> {
        sqlx::query_scalar(
            r"
            INSERT INTO shipping (name, slug, price) VALUES ($1, $2, $3)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name, price = EXCLUDED.price
            RETURNING id
            ",
        )
        .bind(name)
        .bind(slug)
        .bind(price)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from_write)
    }

    async fn upsert_payment(&self, name: &str, slug: &str) -> Result<PaymentId, RepositoryError> {
        sqlx::query_scalar(
            r"
            INSERT INTO payment (name, slug) VALUES ($1, $2)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            ",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(&self.pool)
        .await
        .map_err(RepositoryError::from_write)
    }

    async fn set_bank_info(&self, info: &BankInfo) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM bank_info").execute(&mut *tx).await?;
        sqlx::query("INSERT INTO bank_info (account, name, address) VALUES ($1, $2, $3)")
            .bind(&info.account)
            .bind(&info.name)
            .bind(&info.address)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
