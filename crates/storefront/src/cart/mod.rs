//! The cart store.
//!
//! [`CartStore`] owns the in-memory [`CartState`] and a [`CartPersistence`]
//! adapter. Every mutation is applied in memory first and then written
//! through to storage before the call returns. A failed write is logged and
//! reported but never undoes or blocks the mutation.
//!
//! There is one store per running process. It is constructed explicitly and
//! passed to whatever drives it; nothing here is global. Two processes pointed
//! at the same storage are not coordinated: whichever writes last wins.
//!
//! # Example
//!
//! ```rust
//! use shopfront_core::{NewCartLine, Price};
//! use shopfront_storefront::cart::{CartPersistence, CartStore};
//! use shopfront_storefront::storage::MemoryStore;
//!
//! let mut cart = CartStore::open(CartPersistence::new(MemoryStore::new()));
//! let mug = NewCartLine::new("A", "Mug", Price::from_cents(1000).unwrap(), "u");
//! cart.add_item(mug.clone()).unwrap();
//! cart.add_item(mug).unwrap();
//!
//! assert_eq!(cart.total_items(), 2);
//! assert_eq!(cart.total_price().to_string(), "20.00");
//! ```

mod persistence;

pub use persistence::{CartPersistence, DecodeError, PersistenceError, decode_cart};

use std::borrow::Borrow;

use rust_decimal::Decimal;
use shopfront_core::{
    CartLine, CartState, NewCartLine, ProductId, QuantityUpdate, ValidationError,
};
use tracing::{debug, info, warn};

use crate::error::add_breadcrumb;
use crate::storage::KeyValueStore;

/// Persisted, write-through cart.
#[derive(Debug)]
pub struct CartStore<S> {
    state: CartState,
    persistence: CartPersistence<S>,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Open the cart, hydrating it from storage.
    ///
    /// Missing or unreadable stored data gives an empty cart.
    pub fn open(persistence: CartPersistence<S>) -> Self {
        let state = persistence.load();
        info!(
            key = %persistence.key(),
            lines = state.len(),
            total_items = state.total_items(),
            "Cart loaded"
        );
        Self { state, persistence }
    }

    /// Add one unit of a product. See [`CartState::add_item`].
    ///
    /// Returns a copy of the line as it is after the add.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the line is rejected; nothing is written.
    pub fn add_item(&mut self, line: NewCartLine) -> Result<CartLine, ValidationError> {
        self.add_items(line, 1)
    }

    /// Add `count` units of a product. See [`CartState::add_items`].
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the line or count is rejected; nothing is
    /// written.
    pub fn add_items(
        &mut self,
        line: NewCartLine,
        count: u32,
    ) -> Result<CartLine, ValidationError> {
        let added = self.state.add_items(line, count)?.clone();
        debug!(product_id = %added.id, count, quantity = added.quantity, "Added to cart");
        add_breadcrumb(
            "cart",
            "Added item",
            Some(&[("product_id", added.id.as_str())]),
        );
        self.persist();
        Ok(added)
    }

    /// Remove a line; a no-op when the id is not in the cart.
    ///
    /// Storage is only written when a line was actually removed.
    pub fn remove_item<Q>(&mut self, id: &Q) -> Option<CartLine>
    where
        ProductId: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let removed = self.state.remove_item(id)?;
        debug!(product_id = %removed.id, "Removed from cart");
        add_breadcrumb(
            "cart",
            "Removed item",
            Some(&[("product_id", removed.id.as_str())]),
        );
        self.persist();
        Some(removed)
    }

    /// Set a line's quantity. See [`CartState::update_quantity`].
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::QuantityTooLarge` for quantities that do not
    /// fit in a line and `ValidationError::TotalTooLarge` when the cart total
    /// would overflow; nothing is written.
    pub fn update_quantity<Q>(
        &mut self,
        id: &Q,
        quantity: i64,
    ) -> Result<QuantityUpdate, ValidationError>
    where
        ProductId: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let update = self.state.update_quantity(id, quantity)?;
        match &update {
            QuantityUpdate::Set { previous, quantity } => {
                debug!(previous, quantity, "Updated cart quantity");
            }
            QuantityUpdate::Removed(line) => {
                debug!(product_id = %line.id, "Quantity dropped to zero, line removed");
            }
            QuantityUpdate::Absent => {
                debug!(quantity, "Quantity update for a product not in the cart ignored");
            }
        }
        if update.changed() {
            add_breadcrumb("cart", "Updated quantity", None);
            self.persist();
        }
        Ok(update)
    }

    /// Empty the cart. Always written, so storage is empty afterwards too.
    pub fn clear(&mut self) -> usize {
        let removed = self.state.clear();
        info!(removed, "Cart cleared");
        add_breadcrumb("cart", "Cleared cart", None);
        self.persist();
        removed
    }

    /// Replace the in-memory cart with what is currently stored.
    ///
    /// Picks up writes made by another process sharing the same storage.
    pub fn reload(&mut self) {
        self.state = self.persistence.load();
        debug!(lines = self.state.len(), "Cart reloaded from storage");
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.state.total_items()
    }

    /// Sum of `price * quantity` across all lines, unrounded.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.state.total_price()
    }

    /// Look up a line by product id.
    #[must_use]
    pub fn get<Q>(&self, id: &Q) -> Option<&CartLine>
    where
        ProductId: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.state.get(id)
    }

    /// Iterate over the lines in id order.
    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.state.lines()
    }

    /// Number of distinct products in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Read-only view of the whole cart.
    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    fn persist(&self) {
        if let Err(e) = self.persistence.save(&self.state) {
            let event_id = sentry::capture_error(&e);
            warn!(
                error = %e,
                key = %self.persistence.key(),
                sentry_event_id = %event_id,
                "Failed to persist cart, in-memory cart kept"
            );
        }
    }
}
