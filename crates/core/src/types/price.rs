//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are held as [`Decimal`] so that subtotals never accumulate binary
//! floating point error. On the wire they are plain JSON numbers, because that
//! is what the catalog hands us and what previously persisted carts contain.
//! The number is written with the decimal's exact digits, never through
//! `f64`, so every price reads back unchanged.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Unit price of a product, in the store's currency.
///
/// Deserializes from a JSON number or a numeric string; serializes as a JSON
/// number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Price(Decimal);

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The price amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units of this product.
    ///
    /// Negative quantities yield negative totals; quantities are not
    /// validated here. Saturates at the bounds of [`Decimal`].
    #[must_use]
    pub fn line_total(&self, quantity: i64) -> Decimal {
        self.0.saturating_mul(Decimal::from(quantity))
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::arbitrary_precision::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        rust_decimal::serde::arbitrary_precision::deserialize(deserializer).map(Self)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<i32> for Price {
    fn from(amount: i32) -> Self {
        Self(Decimal::from(amount))
    }
}

impl From<i64> for Price {
    fn from(amount: i64) -> Self {
        Self(Decimal::from(amount))
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Self)
    }
}
