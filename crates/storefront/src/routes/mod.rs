//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                        - Liveness
//! GET    /health/ready                  - Readiness (store reachable)
//!
//! # Catalog
//! GET    /api/products                  - Product listing (filterable)
//! GET    /api/products/{slug}           - Product detail
//! GET    /api/products/{slug}/reviews   - Active reviews
//! POST   /api/products/{slug}/reviews   - Post a review (auth)
//!
//! # Checkout options
//! GET    /api/shipping                  - Shipping methods
//! GET    /api/payments                  - Payment methods
//!
//! # Orders (auth)
//! GET    /api/orders                    - Order history
//! POST   /api/orders                    - Place an order
//! GET    /api/orders/{id}               - Order detail
//! DELETE /api/orders/{id}               - Withdraw an unpaid order
//!
//! # Profile (auth)
//! GET    /api/profile                   - Current profile
//! PATCH  /api/profile                   - Update profile
//! PUT    /api/profile                   - Update profile
//! ```

pub mod checkout;
pub mod health;
pub mod orders;
pub mod products;
pub mod profile;
pub mod reviews;

use axum::{Router, extract::Request, middleware, routing::get};
use tower_http::trace::TraceLayer;
use tracing::{field, info_span};

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
        .route("/{slug}/reviews", get(reviews::index).post(reviews::create))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/{id}", get(orders::show).delete(orders::destroy))
}

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .nest("/orders", order_routes())
        .route("/shipping", get(checkout::shipping))
        .route("/payments", get(checkout::payments))
        .route(
            "/profile",
            get(profile::show)
                .patch(profile::update)
                .put(profile::update),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes())
}

/// The complete application with state and request tracing applied.
///
/// Sentry layers are added by the binary, on top of this.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = field::Empty,
                )
            }),
        )
        .with_state(state)
}
