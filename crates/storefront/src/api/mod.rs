//! Content-store REST API client.
//!
//! Uses `reqwest` 0.13 for HTTP. Catalog reads (products and categories) are
//! cached with `moka` for the configured TTL; orders and subscriptions are
//! never cached.
//!
//! # Example
//!
//! ```rust,ignore
//! use shopfront_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api)?;
//! let product = client.get_product(&ProductId::new("66a1")).await?;
//! cart.add_item(product.to_cart_line())?;
//! ```

mod cache;
pub mod types;

use std::sync::Arc;

use chrono::Utc;
use moka::future::Cache;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use shopfront_core::{Email, ProductId};
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::checkout::Order;
use crate::config::{ApiConfig, bearer};

pub use cache::{CacheKey, CacheValue};
pub use types::{Category, OrderReceipt, Product, Subscription};

use types::{CreatedResponse, ListResponse};

/// How much of an error body is kept for logs and error messages.
const ERROR_BODY_LIMIT: usize = 200;

/// Errors that can occur when talking to the content store.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The content store answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the content store.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured base URL cannot carry a path.
    #[error("Invalid base URL: {0}")]
    BaseUrl(String),

    /// The configured token is not a valid header value.
    #[error("API token contains characters not allowed in a header")]
    InvalidToken,
}

impl ApiError {
    /// Whether the content store rejected the request itself (4xx), as
    /// opposed to failing or being unreachable.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Status { status, .. } => *status >= 400 && *status < 500,
            _ => false,
        }
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the content-store API.
///
/// Cheap to clone; clones share the connection pool and cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new content-store client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidToken` if the token cannot be sent as a
    /// header, or `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.token {
            let mut value =
                HeaderValue::from_str(&bearer(token)).map_err(|_| ApiError::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    /// Build an endpoint URL under the base URL, percent-encoding each
    /// segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::BaseUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and return the body of a successful response.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        resource: &str,
    ) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(resource.to_string()));
        }

        // Read the body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %truncate(&body, 500),
                "Content store returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: truncate(&body, ERROR_BODY_LIMIT),
            });
        }

        Ok(body)
    }

    /// Parse a response body, logging what failed to parse.
    fn parse<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(body, 500),
                "Failed to parse content store response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List all products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the response is not a
    /// product list.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let url = self.endpoint(&["products"])?;
        let body = self.execute(self.inner.client.get(url), "products").await?;
        let products = Self::parse::<ListResponse<Product>>(&body)?.into_items();
        debug!(count = products.len(), "Fetched products");

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the content store has no such product,
    /// or another error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id.clone());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&["products", id.as_str()])?;
        let body = self
            .execute(self.inner.client.get(url), &format!("product {id}"))
            .await?;
        let product: Product = Self::parse(&body)?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// List all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the response is not a
    /// category list.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let url = self.endpoint(&["categories"])?;
        let body = self
            .execute(self.inner.client.get(url), "categories")
            .await?;
        let categories = Self::parse::<ListResponse<Category>>(&body)?.into_items();

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;

        Ok(categories)
    }

    // =========================================================================
    // Orders and newsletter (not cached)
    // =========================================================================

    /// Submit an order.
    ///
    /// A success body that is empty, `null`, or unreadable yields a default
    /// receipt.
    ///
    /// # Errors
    ///
    /// Returns an error if the content store rejects the order or cannot be
    /// reached.
    #[instrument(skip(self, order), fields(items = order.items.len(), total = %order.total))]
    pub async fn create_order(&self, order: &Order) -> Result<OrderReceipt, ApiError> {
        let url = self.endpoint(&["orders"])?;
        let body = self
            .execute(self.inner.client.post(url).json(order), "orders")
            .await?;

        if body.trim().is_empty() {
            return Ok(OrderReceipt::default());
        }
        // The order exists once the store answers 2xx, readable receipt or not
        let receipt = match serde_json::from_str::<Option<CreatedResponse>>(&body) {
            Ok(created) => created.map(OrderReceipt::from).unwrap_or_default(),
            Err(e) => {
                warn!(
                    error = %e,
                    body = %truncate(&body, 500),
                    "Order accepted but receipt could not be parsed"
                );
                OrderReceipt::default()
            }
        };
        debug!(order_id = ?receipt.id, "Order created");
        Ok(receipt)
    }

    /// Subscribe an email address to the newsletter.
    ///
    /// # Errors
    ///
    /// Returns an error if the content store rejects the subscription or
    /// cannot be reached.
    #[instrument(skip(self, email), fields(domain = %email.domain()))]
    pub async fn subscribe(&self, email: &Email) -> Result<(), ApiError> {
        let url = self.endpoint(&["subscribers"])?;
        let subscription = Subscription {
            email: email.clone(),
            subscribed_at: Utc::now(),
        };
        self.execute(self.inner.client.post(url).json(&subscription), "subscribers")
            .await?;
        Ok(())
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate a cached product.
    pub async fn invalidate_product(&self, id: &ProductId) {
        self.inner
            .cache
            .invalidate(&CacheKey::Product(id.clone()))
            .await;
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

fn truncate(body: &str, limit: usize) -> String {
    body.chars().take(limit).collect()
}
