//! Type-safe price representation using decimal arithmetic.
//!
//! Prices travel as plain JSON numbers (`10`, `19.99`) in both the persisted
//! cart and the order payload, but are held as [`Decimal`] in memory so cart
//! totals add up exactly.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative: {0}")]
    Negative(Decimal),
    /// The input is not a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
    /// The amount has more precision than a JSON number carries.
    #[error("price has too many significant digits: {0}")]
    TooPrecise(Decimal),
}

/// A non-negative unit price.
///
/// There is no currency attached: the storefront sells in a single currency
/// and display formatting is left to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero and
    /// [`PriceError::TooPrecise`] if it would not read back unchanged after
    /// being written as a JSON number.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        if !as_number::is_exact(amount) {
            return Err(PriceError::TooPrecise(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from an amount in cents.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `cents` is below zero.
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, 2))
    }

    /// The amount in the currency's standard unit.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price multiplied by a quantity, or `None` if the product overflows.
    #[must_use]
    pub fn checked_times(&self, quantity: u32) -> Option<Decimal> {
        self.0.checked_mul(Decimal::from(quantity))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount =
            Decimal::from_str(s.trim()).map_err(|_| PriceError::Invalid(s.to_string()))?;
        Self::new(amount)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        as_number::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = as_number::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter writing a [`Decimal`] as a JSON number.
///
/// Whole amounts are written as integers (`10`, not `10.0`). Reading accepts
/// numbers and numeric strings.
///
/// ```rust
/// use rust_decimal::Decimal;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Summary {
///     #[serde(with = "shopfront_core::types::price::as_number")]
///     total: Decimal,
/// }
///
/// let json = serde_json::to_string(&Summary { total: Decimal::new(2050, 2) }).unwrap();
/// assert_eq!(json, r#"{"total":20.5}"#);
/// ```
pub mod as_number {
    use core::str::FromStr;

    use rust_decimal::Decimal;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::ToPrimitive;

    /// Whether `value` reads back unchanged after [`serialize`].
    ///
    /// Whole amounts that fit in an `i64` always do. Anything else goes
    /// through an `f64`, which keeps roughly 16 significant digits.
    #[must_use]
    pub fn is_exact(value: Decimal) -> bool {
        let normalized = value.normalize();
        if normalized.scale() == 0 && normalized.to_i64().is_some() {
            return true;
        }
        normalized
            .to_f64()
            .and_then(|float| Decimal::from_str(&float.to_string()).ok())
            .is_some_and(|back| back == value)
    }

    /// Serialize a decimal as a JSON number.
    ///
    /// # Errors
    ///
    /// Fails if the amount does not fit in an `f64`.
    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        let value = value.normalize();
        if value.scale() == 0
            && let Some(whole) = value.to_i64()
        {
            return serializer.serialize_i64(whole);
        }
        value
            .to_f64()
            .map_or_else(
                || Err(S::Error::custom(format!("amount out of range: {value}"))),
                |float| serializer.serialize_f64(float),
            )
    }

    /// Deserialize a decimal from a JSON number or numeric string.
    ///
    /// # Errors
    ///
    /// Fails if the value is not numeric.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer)
    }
}
