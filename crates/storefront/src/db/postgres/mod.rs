//! `PostgreSQL` implementation of the repository traits.
//!
//! Queries are runtime `sqlx::query_as` calls mapped through `FromRow` row
//! structs, so the crate builds without a live database or an offline
//! query cache. Row structs stay private to this module; callers only see
//! the domain models.

mod catalog;
mod orders;
mod profiles;
mod reviews;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

use record_store_core::{AccountId, Email, ProfileId, ZipCode};

use super::RepositoryError;
use super::repository::Store;
use crate::models::{AccountInfo, NamedRef, ProductDetail, Profile};

/// Column list shared by every query that returns a full product.
///
/// Pair with [`product_joins!`], which defines the `p`, `g`, `m`, `a` and
/// `l` aliases used here.
macro_rules! product_columns {
    () => {
        r"
        g.name AS genre_name, g.slug AS genre_slug,
        a.name AS artist_name, a.slug AS artist_slug,
        p.title, p.slug, m.name AS medium_type, p.medium_count,
        p.release_date, p.image, p.description, p.price, p.length,
        l.name AS label_name, l.slug AS label_slug,
        ARRAY(
            SELECT t.name FROM tag t
            JOIN product_tag pt ON pt.tag_id = t.id
            WHERE pt.product_id = p.id
            ORDER BY t.name
        ) AS tags,
        p.stock
        "
    };
}

macro_rules! product_joins {
    () => {
        r"
        FROM product p
        JOIN genre g ON g.id = p.genre_id
        JOIN medium m ON m.id = p.medium_id
        LEFT JOIN artist a ON a.id = p.artist_id
        LEFT JOIN record_label l ON l.id = p.label_id
        "
    };
}

/// Profile columns, aliased so they can be flattened into order rows
/// without clashing with the order's own address columns. Requires
/// `user_profile up JOIN account ac`.
macro_rules! profile_columns {
    () => {
        r"
        up.id AS profile_id, ac.id AS account_id, ac.username,
        ac.first_name, ac.last_name, ac.email,
        up.address AS profile_address, up.zip_code AS profile_zip_code,
        up.city AS profile_city, up.phone AS profile_phone
        "
    };
}

pub(crate) use {product_columns, product_joins, profile_columns};

/// `PostgreSQL`-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// =============================================================================
// Shared rows
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    genre_name: String,
    genre_slug: String,
    artist_name: Option<String>,
    artist_slug: Option<String>,
    title: String,
    slug: String,
    medium_type: String,
    medium_count: i32,
    release_date: NaiveDate,
    image: Option<String>,
    description: Option<String>,
    price: Decimal,
    length: Option<i32>,
    label_name: Option<String>,
    label_slug: Option<String>,
    tags: Vec<String>,
    stock: i32,
}

fn named(name: Option<String>, slug: Option<String>) -> Option<NamedRef> {
    match (name, slug) {
        (Some(name), Some(slug)) => Some(NamedRef { name, slug }),
        _ => None,
    }
}

impl From<ProductRow> for ProductDetail {
    fn from(row: ProductRow) -> Self {
        Self {
            genre: NamedRef::new(row.genre_name, row.genre_slug),
            artist: named(row.artist_name, row.artist_slug),
            title: row.title,
            slug: row.slug,
            medium_type: row.medium_type,
            medium_count: row.medium_count,
            release_date: row.release_date,
            image: row.image,
            description: row.description,
            price: row.price,
            length: row.length,
            label: named(row.label_name, row.label_slug),
            tags: row.tags,
            stock: row.stock,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProfileRow {
    profile_id: ProfileId,
    account_id: AccountId,
    username: String,
    first_name: String,
    last_name: String,
    email: Option<String>,
    profile_address: Option<String>,
    profile_zip_code: Option<String>,
    profile_city: Option<String>,
    profile_phone: Option<String>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = RepositoryError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        // Identity-service rows may carry an empty string instead of NULL.
        let email = row
            .email
            .filter(|e| !e.trim().is_empty())
            .map(|e| Email::parse(&e))
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?;
        let zip_code = row
            .profile_zip_code
            .map(|z| ZipCode::parse(&z))
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid zip code in database: {e}"))
            })?;

        Ok(Self {
            id: row.profile_id,
            account_id: row.account_id,
            user: AccountInfo {
                username: row.username,
                first_name: row.first_name,
                last_name: row.last_name,
                email,
            },
            address: row.profile_address,
            zip_code,
            city: row.profile_city,
            phone: row.profile_phone,
        })
    }
}
