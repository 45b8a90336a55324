//! Application state shared by whatever drives the storefront.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::cart::{CartPersistence, CartStore};
use crate::config::StorefrontConfig;
use crate::storage::FileStore;

/// Application state: configuration plus the content-store client.
///
/// This struct is cheaply cloneable via `Arc`. The cart is not part of it;
/// [`AppState::open_cart`] hands out an owned [`CartStore`] so exactly one
/// caller mutates it.
#[derive(Clone, Debug)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

#[derive(Debug)]
struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the content-store client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config.api)?;
        Ok(Self {
            inner: Arc::new(AppStateInner { config, api }),
        })
    }

    /// Get the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the content-store client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Open the durable cart configured for this storefront.
    #[must_use]
    pub fn open_cart(&self) -> CartStore<FileStore> {
        let cart = &self.inner.config.cart;
        let storage = FileStore::new(&cart.data_dir);
        CartStore::open(CartPersistence::from_config(storage, cart))
    }
}
