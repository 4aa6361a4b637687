//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::db::Store;
use crate::services::auth::TokenService;
use crate::services::email::OrderMailer;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the store and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: Arc<dyn Store>,
    mailer: Arc<dyn OrderMailer>,
    tokens: TokenService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `store` - Storage backend (`PgStore` in production)
    /// * `mailer` - Outgoing mail for order notifications
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        store: Arc<dyn Store>,
        mailer: Arc<dyn OrderMailer>,
    ) -> Self {
        let tokens = TokenService::new(&config.jwt_secret);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                mailer,
                tokens,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the storage backend.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    #[must_use]
    pub fn mailer(&self) -> &dyn OrderMailer {
        self.inner.mailer.as_ref()
    }

    /// Bearer token verifier.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }
}
