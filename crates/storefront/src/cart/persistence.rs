//! Cart persistence adapter.
//!
//! Mirrors a [`CartState`] to a [`KeyValueStore`] under a fixed key as a plain
//! JSON object mapping product id to line:
//!
//! ```json
//! {"A": {"id": "A", "title": "Mug", "price": 10, "image": "u", "quantity": 2}}
//! ```
//!
//! Loading also accepts the two envelope shapes older builds wrote:
//! `{"version": 1, "items": {...}}` and
//! `{"state": {"items": {...}}, "version": 0}`. Loading never fails: missing,
//! unreadable, or unparsable data yields an empty cart.

use serde_json::{Map, Value};
use shopfront_core::{CartLine, CartState};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{CartConfig, DEFAULT_CART_KEY, DEFAULT_LEGACY_CART_KEY};
use crate::storage::{KeyValueStore, StorageError};

/// Errors raised while writing the cart.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The storage backend failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The cart could not be encoded.
    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors raised while decoding a stored cart.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes are not JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON is not one of the accepted cart shapes.
    #[error("unexpected cart shape: {0}")]
    Shape(&'static str),
}

/// Reads and writes the cart under a fixed storage key.
#[derive(Debug, Clone)]
pub struct CartPersistence<S> {
    storage: S,
    key: String,
    legacy_key: Option<String>,
}

impl<S: KeyValueStore> CartPersistence<S> {
    /// Persist under the default `cart` key, migrating from `cart-storage`.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            key: DEFAULT_CART_KEY.to_string(),
            legacy_key: Some(DEFAULT_LEGACY_CART_KEY.to_string()),
        }
    }

    /// Persist using the keys from configuration.
    pub fn from_config(storage: S, config: &CartConfig) -> Self {
        Self {
            storage,
            key: config.key.clone(),
            legacy_key: config.legacy_key.clone(),
        }
    }

    /// Use a different primary key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Use a different legacy key, or `None` to disable migration.
    #[must_use]
    pub fn with_legacy_key(mut self, legacy_key: Option<String>) -> Self {
        self.legacy_key = legacy_key;
        self
    }

    /// The key the cart is written under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying storage backend.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Write the full cart, replacing whatever was stored.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if encoding or the storage write fails.
    pub fn save(&self, state: &CartState) -> Result<(), PersistenceError> {
        let bytes = serde_json::to_vec(state)?;
        self.storage.put(&self.key, &bytes)?;
        debug!(key = %self.key, lines = state.len(), "Cart saved");
        Ok(())
    }

    /// Read the stored cart, falling back to an empty one.
    ///
    /// When nothing is stored under the primary key but a legacy key holds a
    /// cart, that cart is moved to the primary key.
    pub fn load(&self) -> CartState {
        match self.storage.get(&self.key) {
            Ok(Some(bytes)) => decode_cart(&bytes).unwrap_or_else(|e| {
                warn!(key = %self.key, error = %e, "Stored cart is unreadable, starting empty");
                CartState::new()
            }),
            Ok(None) => self.migrate_legacy().unwrap_or_default(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read stored cart, starting empty");
                CartState::new()
            }
        }
    }

    fn migrate_legacy(&self) -> Option<CartState> {
        let legacy_key = self.legacy_key.as_deref()?;
        if legacy_key == self.key {
            return None;
        }

        let bytes = match self.storage.get(legacy_key) {
            Ok(bytes) => bytes?,
            Err(e) => {
                warn!(key = %legacy_key, error = %e, "Failed to read legacy cart");
                return None;
            }
        };

        let state = match decode_cart(&bytes) {
            Ok(state) => state,
            Err(e) => {
                warn!(key = %legacy_key, error = %e, "Legacy cart is unreadable, ignoring it");
                return None;
            }
        };

        match self.save(&state) {
            Ok(()) => {
                if let Err(e) = self.storage.delete(legacy_key) {
                    warn!(key = %legacy_key, error = %e, "Failed to remove legacy cart");
                }
                info!(
                    from = %legacy_key,
                    to = %self.key,
                    lines = state.len(),
                    "Migrated legacy cart"
                );
            }
            Err(e) => {
                warn!(
                    key = %self.key,
                    error = %e,
                    "Failed to write migrated cart, legacy copy kept"
                );
            }
        }
        Some(state)
    }
}

/// Decode a stored cart in any of the accepted shapes.
///
/// Individual lines that fail to parse or break a cart invariant are dropped
/// with a warning rather than failing the whole cart. A line stored under a
/// key that differs from its `id` is re-keyed by `id`.
///
/// # Errors
///
/// Returns `DecodeError` if the bytes are not JSON or not a JSON object.
pub fn decode_cart(bytes: &[u8]) -> Result<CartState, DecodeError> {
    let value: Value = serde_json::from_slice(bytes)?;
    let items = extract_items(value)?;

    let mut state = CartState::new();
    for (key, raw) in items {
        let line = match serde_json::from_value::<CartLine>(raw) {
            Ok(line) => line,
            Err(e) => {
                warn!(key = %key, error = %e, "Dropping malformed cart line");
                continue;
            }
        };

        if line.id.as_str() != key {
            warn!(key = %key, id = %line.id, "Cart line stored under a different key, re-keying");
        }

        let id = line.id.clone();
        if let Err(e) = state.restore(line) {
            warn!(id = %id, error = %e, "Dropping invalid cart line");
        }
    }
    Ok(state)
}

/// Pull the `id -> line` map out of whichever shape was stored.
fn extract_items(value: Value) -> Result<Map<String, Value>, DecodeError> {
    let Value::Object(mut root) = value else {
        return Err(DecodeError::Shape("expected a JSON object"));
    };

    // {"state": {"items": {...}}, "version": n}
    if let Some(Value::Object(state)) = root.get_mut("state")
        && !state.contains_key("id")
        && let Some(Value::Object(items)) = state.remove("items")
    {
        return Ok(items);
    }

    // {"version": n, "items": {...}}
    if root.get("version").is_some_and(Value::is_number)
        && let Some(Value::Object(items)) = root.remove("items")
    {
        return Ok(items);
    }

    Ok(root)
}
