//! HTTP middleware and extractors for the storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//!
//! Authentication is per handler, through the [`RequireAuth`] and
//! [`CurrentProfile`] extractors.

pub mod auth;
pub mod request_id;

pub use auth::{CurrentProfile, RequireAuth};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
