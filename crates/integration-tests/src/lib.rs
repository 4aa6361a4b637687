//! HTTP contract tests for the record store API.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p record-store-integration-tests
//! ```
//!
//! No database or SMTP server is needed. [`TestApp`] builds the real
//! router over a [`MemoryStore`] seeded with a small catalog, and a
//! [`RecordingMailer`] that keeps every email instead of sending it.
//! Requests go through `tower::ServiceExt::oneshot`.
//!
//! # Test Categories
//!
//! - `catalog` - Product listing, filters, detail, reviews, checkout options
//! - `orders` - Placement, stock, ownership, deletion rules
//! - `notifications` - Bank transfer payment instructions
//! - `profile` - Lazy profile creation, updates, authentication

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use chrono::{Duration, NaiveDate};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use record_store_core::{AccountId, Email, GenreId, MediumId, OrderId, OrderState};
use record_store_storefront::config::{DEFAULT_BANK_TRANSFER_SLUG, StorefrontConfig};
use record_store_storefront::db::{
    CatalogRepository, MemoryStore, OrderRepository, ProfileRepository,
};
use record_store_storefront::models::{BankInfo, NewAccount, NewProduct};
use record_store_storefront::routes;
use record_store_storefront::services::auth::TokenService;
use record_store_storefront::services::email::{EmailError, OrderMailer, PaymentInstructions};
use record_store_storefront::state::AppState;

/// Signing key shared by the test app and the tokens it hands out.
pub const TEST_JWT_SECRET: &str = "t3st-K3y!9vQ#r2Lm&8zX@4tB^7wN*1pF$6hJ";

/// One email the app tried to send.
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: Email,
    pub instructions: PaymentInstructions,
}

/// Mailer that records instead of sending. Can be switched to fail.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    #[must_use]
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().expect("mailer lock poisoned").clone()
    }

    /// Make every following send fail with a transport-style error.
    pub fn fail_from_now_on(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderMailer for RecordingMailer {
    async fn send_payment_instructions(
        &self,
        to: &Email,
        instructions: &PaymentInstructions,
    ) -> Result<(), EmailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EmailError::InvalidAddress(to.to_string()));
        }
        self.sent
            .lock()
            .expect("mailer lock poisoned")
            .push(SentEmail {
                to: to.clone(),
                instructions: instructions.clone(),
            });
        Ok(())
    }
}

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON body, `Value::Null` when the body is empty, or the raw
    /// text as a `Value::String` when it is not JSON.
    pub body: Value,
}

/// An account with a valid bearer token.
#[derive(Debug, Clone)]
pub struct Customer {
    pub account: AccountId,
    pub token: String,
}

/// The application under test.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub tokens: TokenService,
    router: Router,
}

/// Seeded product slugs.
pub mod products {
    /// Rock CD, 59.99, stock 10, tags grunge + 90s.
    pub const NEVERMIND: &str = "nevermind";
    /// Rock vinyl, 129.00, stock 3, tag grunge.
    pub const IN_UTERO: &str = "in-utero";
    /// Jazz vinyl, 45.00, stock 5, tag classic.
    pub const KIND_OF_BLUE: &str = "kind-of-blue";
    /// Jazz CD, 19.99, out of stock.
    pub const A_LOVE_SUPREME: &str = "a-love-supreme";
}

fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://unused"),
        host: [127, 0, 0, 1].into(),
        port: 0,
        jwt_secret: SecretString::from(TEST_JWT_SECRET),
        bank_transfer_slug: DEFAULT_BANK_TRANSFER_SLUG.to_owned(),
        store_name: "Music Shop".to_owned(),
        email: None,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

#[allow(clippy::too_many_arguments)]
fn record(
    genre: GenreId,
    medium: MediumId,
    title: &str,
    slug: &str,
    released: (i32, u32, u32),
    price: Decimal,
    stock: i32,
    tags: &[&str],
) -> NewProduct {
    NewProduct {
        genre,
        artist: None,
        title: title.to_owned(),
        slug: slug.to_owned(),
        medium,
        medium_count: 1,
        release_date: NaiveDate::from_ymd_opt(released.0, released.1, released.2)
            .expect("valid date"),
        image: None,
        description: None,
        price,
        length: None,
        label: None,
        tags: tags.iter().map(|t| (*t).to_owned()).collect(),
        stock,
    }
}

async fn seed(store: &MemoryStore) {
    let rock = store.upsert_genre("Rock", "rock").await.expect("genre");
    let jazz = store.upsert_genre("Jazz", "jazz").await.expect("genre");
    let cd = store.upsert_medium("CD").await.expect("medium");
    let vinyl = store.upsert_medium("Vinyl").await.expect("medium");

    let catalog = [
        record(
            rock,
            cd,
            "Nevermind",
            products::NEVERMIND,
            (1991, 9, 24),
            Decimal::new(5999, 2),
            10,
            &["grunge", "90s"],
        ),
        record(
            rock,
            vinyl,
            "In Utero",
            products::IN_UTERO,
            (1993, 9, 21),
            Decimal::new(12900, 2),
            3,
            &["grunge"],
        ),
        record(
            jazz,
            vinyl,
            "Kind of Blue",
            products::KIND_OF_BLUE,
            (1959, 8, 17),
            Decimal::new(4500, 2),
            5,
            &["classic"],
        ),
        record(
            jazz,
            cd,
            "A Love Supreme",
            products::A_LOVE_SUPREME,
            (1965, 1, 1),
            Decimal::new(1999, 2),
            0,
            &["classic"],
        ),
    ];
    for product in &catalog {
        store.upsert_product(product).await.expect("product");
    }

    store
        .upsert_shipping("Standard post", "post", Decimal::new(1500, 2))
        .await
        .expect("shipping");
    store
        .upsert_shipping("Personal pickup", "pickup", Decimal::ZERO)
        .await
        .expect("shipping");
    store
        .upsert_payment("Bank transfer", DEFAULT_BANK_TRANSFER_SLUG)
        .await
        .expect("payment");
    store
        .upsert_payment("Cash on delivery", "cash-on-delivery")
        .await
        .expect("payment");
    store
        .set_bank_info(&BankInfo {
            account: "PL61 1090 1014 0000 0712 1981 2874".to_owned(),
            name: "Music Shop Sp. z o.o.".to_owned(),
            address: "ul. Winylowa 33, 00-950 Warszawa".to_owned(),
        })
        .await
        .expect("bank info");
}

impl TestApp {
    /// A fresh app over a freshly seeded store.
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        seed(&store).await;
        let mailer = Arc::new(RecordingMailer::default());

        let config = test_config();
        let tokens = TokenService::new(&config.jwt_secret);
        let state = AppState::new(config, store.clone(), mailer.clone());

        Self {
            store,
            mailer,
            tokens,
            router: routes::app(state),
        }
    }

    /// Register an account and sign a token for it.
    pub async fn customer(&self, username: &str) -> Customer {
        let account = self
            .store
            .create_account(&NewAccount {
                username: username.to_owned(),
                email: Some(Email::parse(&format!("{username}@example.com")).expect("email")),
                first_name: String::new(),
                last_name: String::new(),
            })
            .await
            .expect("account");
        let token = self
            .tokens
            .issue(account, Duration::hours(1))
            .expect("token");
        Customer { account, token }
    }

    /// Stock of a seeded product, read straight from the store.
    pub async fn stock(&self, slug: &str) -> i32 {
        self.store
            .get_product(slug)
            .await
            .expect("store")
            .expect("product exists")
            .stock
    }

    /// Number of orders a customer has, read straight from the store.
    pub async fn order_count(&self, customer: &Customer) -> usize {
        let profile = self
            .store
            .get_or_create_profile(customer.account)
            .await
            .expect("profile");
        self.store
            .list_orders(profile.id)
            .await
            .expect("orders")
            .len()
    }

    /// Staff-side state change.
    pub async fn set_order_state(&self, id: OrderId, state: OrderState) {
        self.store
            .set_order_state(id, state)
            .await
            .expect("state change");
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }
}

/// A valid checkout body for `items` of `(slug, quantity)`.
#[must_use]
pub fn order_body(payment: &str, items: &[(&str, i32)]) -> Value {
    serde_json::json!({
        "shipping": "post",
        "payment": payment,
        "address": "ul. Długa 5",
        "zip_code": "80-831",
        "city": "Gdańsk",
        "phone": "600100200",
        "items": items
            .iter()
            .map(|(product, quantity)| {
                serde_json::json!({"product": product, "quantity": quantity})
            })
            .collect::<Vec<_>>(),
    })
}

/// Read a decimal serialized as a JSON string.
#[must_use]
pub fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .expect("decimal string")
}

/// Order id from a placement response.
#[must_use]
pub fn order_id(placed: &Value) -> OrderId {
    let order = placed.get("order").unwrap_or(placed);
    let raw = order["id"].as_i64().expect("order id");
    OrderId::new(i32::try_from(raw).expect("id fits i32"))
}
