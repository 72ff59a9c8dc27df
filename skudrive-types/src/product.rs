//! Synthetic product records written by the seed driver.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::Sku;

/// The type label attached to every seeded product.
pub const PRODUCT_TYPE: &str = "Regular";

/// A price in whole cents.
///
/// Rendered as a decimal with exactly two fractional digits, e.g. `1234.05`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(u64);

impl Price {
    /// Lowest price the generator produces: `10.00`.
    pub const MIN: Price = Price(1_000);
    /// Highest price the generator produces: `10010.00`.
    pub const MAX: Price = Price(1_001_000);

    /// Creates a price from an amount in cents.
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents.
    pub const fn cents(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0 as f64 / 100.0)
    }
}

/// A product record as stored in the products table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Product {
    /// Hash key of the record.
    #[serde(rename = "SKU")]
    pub sku: Sku,
    /// Randomized price.
    #[serde(rename = "Price")]
    pub price: Price,
    /// Always [`PRODUCT_TYPE`] for seeded records.
    #[serde(rename = "Type")]
    pub kind: String,
}

impl Product {
    /// Creates a product of the default [`PRODUCT_TYPE`].
    pub fn regular(sku: Sku, price: Price) -> Self {
        Self {
            sku,
            price,
            kind: PRODUCT_TYPE.to_owned(),
        }
    }
}
