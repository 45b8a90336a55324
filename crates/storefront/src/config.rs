//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `SHOP_API_URL` - Content-store API base URL (default: `http://localhost:3000/api`)
//! - `SHOP_API_TOKEN` - Bearer token sent to the content store
//! - `SHOP_HTTP_TIMEOUT_SECS` - Request timeout (default: 10)
//! - `SHOP_CATALOG_CACHE_TTL_SECS` - Product/category cache lifetime (default: 300)
//! - `SHOP_DATA_DIR` - Directory for durable cart storage (default: `.shopfront`)
//! - `SHOP_CART_KEY` - Storage key for the cart (default: `cart`)
//! - `SHOP_LEGACY_CART_KEY` - Older storage key migrated on first load
//!   (default: `cart-storage`, empty string disables migration)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

/// Default content-store API URL.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

/// Default storage key for the cart.
pub const DEFAULT_CART_KEY: &str = "cart";

/// Storage key used by older builds that wrapped the cart in a state envelope.
pub const DEFAULT_LEGACY_CART_KEY: &str = "cart-storage";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Content-store API settings
    pub api: ApiConfig,
    /// Durable cart storage settings
    pub cart: CartConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Content-store API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL, always ending in `/` so relative paths join under it
    pub base_url: Url,
    /// Optional bearer token
    pub token: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
    /// How long catalog reads stay cached
    pub catalog_cache_ttl: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("catalog_cache_ttl", &self.catalog_cache_ttl)
            .finish()
    }
}

impl ApiConfig {
    /// Configuration pointing at `base_url` with default timeouts and no token.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not an absolute
    /// http(s) URL.
    pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("SHOP_API_URL", base_url)?,
            token: None,
            timeout: Duration::from_secs(10),
            catalog_cache_ttl: Duration::from_secs(300),
        })
    }
}

/// Durable cart storage configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Directory holding one file per storage key
    pub data_dir: PathBuf,
    /// Key the cart is stored under
    pub key: String,
    /// Older key to migrate from, if any
    pub legacy_key: Option<String>,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".shopfront"),
            key: DEFAULT_CART_KEY.to_string(),
            legacy_key: Some(DEFAULT_LEGACY_CART_KEY.to_string()),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value or the
    /// API token looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_env`].
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = var("SHOP_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let token = match var("SHOP_API_TOKEN").filter(|t| !t.is_empty()) {
            Some(token) => {
                validate_token(&token, "SHOP_API_TOKEN")?;
                Some(SecretString::from(token))
            }
            None => None,
        };

        let api = ApiConfig {
            base_url: parse_base_url("SHOP_API_URL", &base_url)?,
            token,
            timeout: parse_secs(&var, "SHOP_HTTP_TIMEOUT_SECS", 10)?,
            catalog_cache_ttl: parse_secs(&var, "SHOP_CATALOG_CACHE_TTL_SECS", 300)?,
        };

        let defaults = CartConfig::default();
        let key = var("SHOP_CART_KEY").unwrap_or(defaults.key);
        parse_storage_key("SHOP_CART_KEY", &key)?;
        let legacy_key = match var("SHOP_LEGACY_CART_KEY") {
            Some(legacy) if legacy.is_empty() => None,
            Some(legacy) => Some(legacy),
            None => defaults.legacy_key,
        };
        if let Some(legacy) = &legacy_key {
            parse_storage_key("SHOP_LEGACY_CART_KEY", legacy)?;
        }
        let cart = CartConfig {
            data_dir: var("SHOP_DATA_DIR").map_or(defaults.data_dir, PathBuf::from),
            key,
            legacy_key,
        };

        Ok(Self {
            api,
            cart,
            sentry_dsn: var("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: var("SENTRY_ENVIRONMENT").filter(|env| !env.is_empty()),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Reject keys the cart storage would refuse on every write.
fn parse_storage_key(var_name: &str, key: &str) -> Result<(), ConfigError> {
    crate::storage::validate_key(key)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))
}

/// Parse an absolute http(s) URL and make sure it ends with a slash.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Parse a whole number of seconds, falling back to `default` when unset.
fn parse_secs(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<Duration, ConfigError> {
    var(key).map_or(Ok(Duration::from_secs(default)), |raw| {
        raw.trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Reject tokens that are obviously copied from a template.
fn validate_token(token: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = token.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }
    Ok(())
}

/// Format the bearer header value for a token.
pub(crate) fn bearer(token: &SecretString) -> String {
    format!("Bearer {}", token.expose_secret())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.api.base_url.as_str(), "http://localhost:3000/api/");
        assert!(config.api.token.is_none());
        assert_eq!(config.api.timeout, Duration::from_secs(10));
        assert_eq!(config.api.catalog_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.cart.key, "cart");
        assert_eq!(config.cart.legacy_key.as_deref(), Some("cart-storage"));
        assert_eq!(config.cart.data_dir, PathBuf::from(".shopfront"));
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = load(&[("SHOP_API_URL", "https://shop.example.tt/api/v2")]).unwrap();
        assert_eq!(config.api.base_url.as_str(), "https://shop.example.tt/api/v2/");
        assert_eq!(
            config.api.base_url.join("orders").unwrap().as_str(),
            "https://shop.example.tt/api/v2/orders"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            load(&[("SHOP_API_URL", "not a url")]),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(matches!(
            load(&[("SHOP_API_URL", "ftp://example.com")]),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_invalid_timeout() {
        let err = load(&[("SHOP_HTTP_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "SHOP_HTTP_TIMEOUT_SECS")
        );
    }

    #[test]
    fn test_placeholder_token_rejected() {
        let err = load(&[("SHOP_API_TOKEN", "your-token-here")]).unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_token_is_redacted_in_debug() {
        let config = load(&[("SHOP_API_TOKEN", "k7Hq9vLw2Zp4Rt8m")]).unwrap();
        let debug = format!("{:?}", config.api);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("k7Hq9vLw2Zp4Rt8m"));
    }

    #[test]
    fn test_empty_legacy_key_disables_migration() {
        let config = load(&[("SHOP_LEGACY_CART_KEY", "")]).unwrap();
        assert!(config.cart.legacy_key.is_none());
    }

    #[test]
    fn test_empty_cart_key_rejected() {
        assert!(load(&[("SHOP_CART_KEY", " ")]).is_err());
    }

    #[test]
    fn test_unstorable_cart_keys_rejected() {
        let err = load(&[("SHOP_CART_KEY", "guest cart")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "SHOP_CART_KEY"));

        let err = load(&[("SHOP_LEGACY_CART_KEY", "../cart-storage")]).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "SHOP_LEGACY_CART_KEY")
        );

        let config = load(&[("SHOP_CART_KEY", "guest_cart.v2")]).unwrap();
        assert_eq!(config.cart.key, "guest_cart.v2");
    }
}
