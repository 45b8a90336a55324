//! Cart lines and the cart state they live in.
//!
//! [`CartState`] is a map from product id to [`CartLine`]. All mutation goes
//! through the methods here, which keep three invariants:
//!
//! - every key equals the `id` of its line
//! - every line has `quantity >= 1` (lines that would drop to zero are removed)
//! - `title`, `price` and `image` are fixed when a line is first created;
//!   adding the same product again only bumps the quantity
//! - the sum of `price * quantity` over all lines fits in a [`Decimal`], so
//!   the totals never overflow
//!
//! The state is pure data. Persisting it is the storefront crate's job.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{Price, PriceError, ProductId};

/// Rejected cart input. The cart is left unchanged when one is returned.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The product id is empty or whitespace.
    #[error("product id cannot be empty")]
    EmptyId,
    /// The unit price is invalid (e.g. negative).
    #[error(transparent)]
    Price(#[from] PriceError),
    /// A positive quantity was required.
    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(i64),
    /// The resulting quantity does not fit in a cart line.
    #[error("quantity {requested} exceeds the maximum of {max}")]
    QuantityTooLarge {
        /// Quantity that was asked for.
        requested: u64,
        /// Largest quantity a line can hold.
        max: u32,
    },
    /// The cart total would no longer fit in a decimal amount.
    #[error("cart total would exceed the largest supported amount")]
    TotalTooLarge,
}

/// A product being added to the cart, before it has a quantity.
///
/// The fields are the snapshot that the cart keeps for as long as the line
/// exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCartLine {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub image: String,
}

impl NewCartLine {
    /// Create a new line snapshot.
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        title: impl Into<String>,
        price: Price,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price,
            image: image.into(),
        }
    }
}

/// One product entry in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Stable product identifier, also the line's key in the cart.
    pub id: ProductId,
    /// Display name captured when the line was created.
    pub title: String,
    /// Unit price captured when the line was created.
    pub price: Price,
    /// Image URL captured when the line was created.
    pub image: String,
    /// Always at least 1.
    pub quantity: u32,
}

impl CartLine {
    fn from_new(line: NewCartLine, quantity: u32) -> Self {
        Self {
            id: line.id,
            title: line.title,
            price: line.price,
            image: line.image,
            quantity,
        }
    }

    /// Unit price times quantity.
    ///
    /// Lines held by a [`CartState`] never overflow here. A hand-built line
    /// that does saturates at [`Decimal::MAX`].
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.checked_times(self.quantity).unwrap_or(Decimal::MAX)
    }

    /// Check the invariants a stored line must satisfy.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyId`] for a blank id and
    /// [`ValidationError::NonPositiveQuantity`] for a zero quantity.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_blank() {
            return Err(ValidationError::EmptyId);
        }
        if self.quantity == 0 {
            return Err(ValidationError::NonPositiveQuantity(0));
        }
        Ok(())
    }
}

/// Outcome of [`CartState::update_quantity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityUpdate {
    /// The line's quantity was set.
    Set {
        /// Quantity before the update.
        previous: u32,
        /// Quantity after the update.
        quantity: u32,
    },
    /// A non-positive quantity removed the line.
    Removed(CartLine),
    /// No line with that id exists, nothing changed.
    Absent,
}

impl QuantityUpdate {
    /// Whether the cart was modified.
    #[must_use]
    pub const fn changed(&self) -> bool {
        match self {
            Self::Set { previous, quantity } => *previous != *quantity,
            Self::Removed(_) => true,
            Self::Absent => false,
        }
    }
}

/// The full set of cart lines, keyed by product id.
///
/// Iteration order is by id. Totals do not depend on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CartState {
    lines: BTreeMap<ProductId, CartLine>,
}

impl CartState {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of a product.
    ///
    /// If the product is already in the cart its quantity goes up by one and
    /// the stored snapshot is kept; the snapshot in `line` is ignored.
    /// Otherwise a new line with quantity 1 is created from `line`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyId`] for a blank id,
    /// [`ValidationError::QuantityTooLarge`] if the line is already full and
    /// [`ValidationError::TotalTooLarge`] if the cart total would overflow.
    pub fn add_item(&mut self, line: NewCartLine) -> Result<&CartLine, ValidationError> {
        self.add_items(line, 1)
    }

    /// Add `count` units of a product, as if calling [`Self::add_item`]
    /// `count` times.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add_item`], plus
    /// [`ValidationError::NonPositiveQuantity`] when `count` is zero.
    pub fn add_items(
        &mut self,
        line: NewCartLine,
        count: u32,
    ) -> Result<&CartLine, ValidationError> {
        if line.id.is_blank() {
            return Err(ValidationError::EmptyId);
        }
        if count == 0 {
            return Err(ValidationError::NonPositiveQuantity(0));
        }

        let (price, quantity) = match self.lines.get(&line.id) {
            Some(existing) => {
                let quantity = existing.quantity.checked_add(count).ok_or(
                    ValidationError::QuantityTooLarge {
                        requested: u64::from(existing.quantity) + u64::from(count),
                        max: u32::MAX,
                    },
                )?;
                (existing.price, quantity)
            }
            None => (line.price, count),
        };
        self.check_total(&line.id, price, quantity)?;

        match self.lines.entry(line.id.clone()) {
            Entry::Occupied(entry) => {
                let existing = entry.into_mut();
                existing.quantity = quantity;
                Ok(existing)
            }
            Entry::Vacant(entry) => Ok(entry.insert(CartLine::from_new(line, quantity))),
        }
    }

    /// Remove a line. Removing an id that is not in the cart is a no-op.
    ///
    /// Returns the removed line, if there was one.
    pub fn remove_item<Q>(&mut self, id: &Q) -> Option<CartLine>
    where
        ProductId: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.lines.remove(id)
    }

    /// Set a line's quantity.
    ///
    /// - `quantity <= 0` removes the line, like [`Self::remove_item`].
    /// - A positive quantity replaces the line's quantity (not a delta).
    /// - A positive quantity for an id that is not in the cart does nothing;
    ///   lines can only be created through [`Self::add_item`], which carries
    ///   the snapshot fields.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::QuantityTooLarge`] if `quantity` does not fit
    /// in a line and [`ValidationError::TotalTooLarge`] if the cart total
    /// would overflow. The cart is unchanged. An absent id is checked first,
    /// so it is a no-op whatever the quantity.
    pub fn update_quantity<Q>(
        &mut self,
        id: &Q,
        quantity: i64,
    ) -> Result<QuantityUpdate, ValidationError>
    where
        ProductId: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if quantity <= 0 {
            return Ok(self
                .lines
                .remove(id)
                .map_or(QuantityUpdate::Absent, QuantityUpdate::Removed));
        }

        let Some(existing) = self.lines.get(id) else {
            return Ok(QuantityUpdate::Absent);
        };
        let (line_id, price) = (existing.id.clone(), existing.price);
        let quantity = u32::try_from(quantity).map_err(|_| ValidationError::QuantityTooLarge {
            requested: quantity.unsigned_abs(),
            max: u32::MAX,
        })?;
        self.check_total(&line_id, price, quantity)?;

        Ok(self
            .lines
            .get_mut::<ProductId>(&line_id)
            .map_or(QuantityUpdate::Absent, |line| {
                let previous = line.quantity;
                line.quantity = quantity;
                QuantityUpdate::Set { previous, quantity }
            }))
    }

    /// Remove every line. Returns how many lines were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.lines.len();
        self.lines.clear();
        removed
    }

    /// Put back a previously stored line.
    ///
    /// Used when hydrating from storage. An existing line with the same id is
    /// replaced.
    ///
    /// # Errors
    ///
    /// Returns the violated invariant if the line is invalid.
    pub fn restore(&mut self, line: CartLine) -> Result<(), ValidationError> {
        line.validate()?;
        self.check_total(&line.id, line.price, line.quantity)?;
        self.lines.insert(line.id.clone(), line);
        Ok(())
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.lines.values().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of `price * quantity` across all lines, unrounded.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.lines
            .values()
            .fold(Decimal::ZERO, |total, line| total.saturating_add(line.line_total()))
    }

    /// Fail unless the total stays representable with line `id` set to
    /// `quantity` units at `price`.
    fn check_total(
        &self,
        id: &ProductId,
        price: Price,
        quantity: u32,
    ) -> Result<(), ValidationError> {
        let first = price
            .checked_times(quantity)
            .ok_or(ValidationError::TotalTooLarge)?;
        self.lines
            .values()
            .filter(|line| line.id != *id)
            .try_fold(first, |total, line| {
                line.price
                    .checked_times(line.quantity)
                    .and_then(|amount| total.checked_add(amount))
            })
            .map(|_| ())
            .ok_or(ValidationError::TotalTooLarge)
    }

    /// Look up a line by product id.
    #[must_use]
    pub fn get<Q>(&self, id: &Q) -> Option<&CartLine>
    where
        ProductId: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.lines.get(id)
    }

    /// Whether a product is in the cart.
    #[must_use]
    pub fn contains<Q>(&self, id: &Q) -> bool
    where
        ProductId: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.lines.contains_key(id)
    }

    /// Iterate over the lines in id order.
    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.values()
    }

    /// Number of distinct products in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl<'de> Deserialize<'de> for CartState {
    /// Strict decoding: any invalid line fails the whole state. Keys are
    /// ignored in favour of each line's own `id`.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, CartLine>::deserialize(deserializer)?;
        let mut state = Self::new();
        for line in raw.into_values() {
            state.restore(line).map_err(serde::de::Error::custom)?;
        }
        Ok(state)
    }
}

impl<'a> IntoIterator for &'a CartState {
    type Item = &'a CartLine;
    type IntoIter = std::collections::btree_map::Values<'a, ProductId, CartLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.values()
    }
}
