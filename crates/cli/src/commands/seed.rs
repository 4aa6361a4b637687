//! Seed the database with a small demo catalog.
//!
//! Every writer is an upsert keyed by slug or name, so running the command
//! again refreshes the rows instead of duplicating them. Stock levels are
//! reset to the values below.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use record_store_storefront::config::DEFAULT_BANK_TRANSFER_SLUG;
use record_store_storefront::db::{CatalogRepository, PgStore};
use record_store_storefront::models::{BankInfo, NewProduct};

use super::{CommandError, connect};

struct DemoRecord {
    title: &'static str,
    slug: &'static str,
    artist: &'static str,
    genre: &'static str,
    medium: &'static str,
    label: Option<&'static str>,
    released: (i32, u32, u32),
    /// Price in grosze.
    price: i64,
    length: i32,
    stock: i32,
    tags: &'static [&'static str],
}

const GENRES: &[(&str, &str)] = &[("Rock", "rock"), ("Jazz", "jazz"), ("Electronic", "electronic")];

const ARTISTS: &[(&str, &str)] = &[
    ("Nirvana", "nirvana"),
    ("Miles Davis", "miles-davis"),
    ("John Coltrane", "john-coltrane"),
    ("Daft Punk", "daft-punk"),
];

const LABELS: &[(&str, &str, &str)] = &[
    ("DGC Records", "dgc-records", "Geffen imprint behind the Seattle sound."),
    ("Columbia", "columbia", "One of the oldest surviving brand names in recorded sound."),
    ("Impulse!", "impulse", "\"The new wave of jazz is on Impulse!\""),
];

const MEDIA: &[&str] = &["CD", "Vinyl"];

const RECORDS: &[DemoRecord] = &[
    DemoRecord {
        title: "Nevermind",
        slug: "nirvana-nevermind-cd",
        artist: "nirvana",
        genre: "rock",
        medium: "CD",
        label: Some("dgc-records"),
        released: (1991, 9, 24),
        price: 5_999,
        length: 49,
        stock: 25,
        tags: &["grunge", "90s"],
    },
    DemoRecord {
        title: "In Utero",
        slug: "nirvana-in-utero-vinyl",
        artist: "nirvana",
        genre: "rock",
        medium: "Vinyl",
        label: Some("dgc-records"),
        released: (1993, 9, 21),
        price: 12_900,
        length: 41,
        stock: 8,
        tags: &["grunge", "90s"],
    },
    DemoRecord {
        title: "Kind of Blue",
        slug: "miles-davis-kind-of-blue-vinyl",
        artist: "miles-davis",
        genre: "jazz",
        medium: "Vinyl",
        label: Some("columbia"),
        released: (1959, 8, 17),
        price: 11_500,
        length: 46,
        stock: 12,
        tags: &["modal", "classic"],
    },
    DemoRecord {
        title: "A Love Supreme",
        slug: "john-coltrane-a-love-supreme-cd",
        artist: "john-coltrane",
        genre: "jazz",
        medium: "CD",
        label: Some("impulse"),
        released: (1965, 1, 1),
        price: 4_599,
        length: 33,
        stock: 15,
        tags: &["spiritual", "classic"],
    },
    DemoRecord {
        title: "Discovery",
        slug: "daft-punk-discovery-cd",
        artist: "daft-punk",
        genre: "electronic",
        medium: "CD",
        label: None,
        released: (2001, 3, 12),
        price: 4_999,
        length: 61,
        stock: 0,
        tags: &["house", "french-touch"],
    },
];

const SHIPPING: &[(&str, &str, i64)] = &[
    ("Personal pickup", "pickup", 0),
    ("Standard post", "post", 1_200),
    ("Courier", "courier", 1_999),
];

const PAYMENTS: &[(&str, &str)] = &[
    ("Bank transfer", DEFAULT_BANK_TRANSFER_SLUG),
    ("Cash on delivery", "cash-on-delivery"),
];

fn lookup<T: Copy>(table: &[(&str, T)], key: &str) -> Result<T, CommandError> {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, id)| *id)
        .ok_or_else(|| CommandError::InvalidArgument(format!("unknown seed reference {key}")))
}

async fn seed_catalog(store: &PgStore) -> Result<usize, CommandError> {
    let mut genres = Vec::with_capacity(GENRES.len());
    for (name, slug) in GENRES {
        genres.push((*slug, store.upsert_genre(name, slug).await?));
    }
    let mut artists = Vec::with_capacity(ARTISTS.len());
    for (name, slug) in ARTISTS {
        artists.push((*slug, store.upsert_artist(name, slug).await?));
    }
    let mut labels = Vec::with_capacity(LABELS.len());
    for (name, slug, description) in LABELS {
        labels.push((*slug, store.upsert_label(name, slug, Some(*description)).await?));
    }
    let mut media = Vec::with_capacity(MEDIA.len());
    for name in MEDIA {
        media.push((*name, store.upsert_medium(name).await?));
    }

    for record in RECORDS {
        let (year, month, day) = record.released;
        let release_date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            CommandError::InvalidArgument(format!("bad release date for {}", record.slug))
        })?;
        let label = record.label.map(|l| lookup(&labels, l)).transpose()?;

        store
            .upsert_product(&NewProduct {
                genre: lookup(&genres, record.genre)?,
                artist: Some(lookup(&artists, record.artist)?),
                title: record.title.to_owned(),
                slug: record.slug.to_owned(),
                medium: lookup(&media, record.medium)?,
                medium_count: 1,
                release_date,
                image: None,
                description: None,
                price: Decimal::new(record.price, 2),
                length: Some(record.length),
                label,
                tags: record.tags.iter().map(|t| (*t).to_owned()).collect(),
                stock: record.stock,
            })
            .await?;
    }

    Ok(RECORDS.len())
}

async fn seed_checkout(store: &PgStore) -> Result<(), CommandError> {
    for (name, slug, price) in SHIPPING {
        store
            .upsert_shipping(name, slug, Decimal::new(*price, 2))
            .await?;
    }
    for (name, slug) in PAYMENTS {
        store.upsert_payment(name, slug).await?;
    }
    store
        .set_bank_info(&BankInfo {
            account: "PL61 1090 1014 0000 0712 1981 2874".to_owned(),
            name: "Music Shop Sp. z o.o.".to_owned(),
            address: "ul. Winylowa 33, 00-950 Warszawa".to_owned(),
        })
        .await?;
    Ok(())
}

/// Seed the demo catalog, checkout options and bank details.
pub async fn run() -> Result<(), CommandError> {
    let store = connect().await?;

    let products = seed_catalog(&store).await?;
    info!(products, "Catalog seeded");

    seed_checkout(&store).await?;
    info!(
        shipping = SHIPPING.len(),
        payments = PAYMENTS.len(),
        "Checkout options seeded"
    );

    Ok(())
}
