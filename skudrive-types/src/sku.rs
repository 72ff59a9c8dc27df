//! Synthetic stock-keeping-unit identifiers.
//!
//! A [`Sku`] is the prefix [`SKU_PREFIX`] followed by a decimal number zero-padded to exactly
//! [`SKU_DIGITS`] digits, e.g. `THING-00000042`. The padding width is fixed, so the largest
//! representable number is [`MAX_SKU_NUMBER`]. Larger numbers are rejected with
//! [`SkuError::Overflow`] instead of producing a wider identifier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Fixed prefix of every identifier.
pub const SKU_PREFIX: &str = "THING-";

/// Width of the zero-padded numeric suffix.
pub const SKU_DIGITS: usize = 8;

/// Largest number that fits into the numeric suffix.
pub const MAX_SKU_NUMBER: u64 = 99_999_999;

/// Number of distinct identifiers, i.e. the exclusive upper bound of the numeric suffix.
pub const SKU_SPACE: u64 = MAX_SKU_NUMBER + 1;

/// Length of the string form of every identifier.
pub const SKU_LEN: usize = SKU_PREFIX.len() + SKU_DIGITS;

/// Errors that can occur when constructing or parsing a [`Sku`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkuError {
    /// The number does not fit into the fixed-width suffix.
    #[error("sku number {0} exceeds maximum of {MAX_SKU_NUMBER}")]
    Overflow(u64),

    /// The string does not start with [`SKU_PREFIX`].
    #[error("sku must start with `{SKU_PREFIX}`")]
    MissingPrefix,

    /// The suffix is not exactly [`SKU_DIGITS`] ASCII digits.
    #[error("sku suffix must be exactly {SKU_DIGITS} digits, got {0:?}")]
    InvalidSuffix(String),
}

/// A product identifier with a fixed-width numeric suffix.
///
/// See the [module docs](self) for the format.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sku(u32);

impl Sku {
    /// Creates an identifier for the given number.
    pub fn new(number: u64) -> Result<Self, SkuError> {
        if number > MAX_SKU_NUMBER {
            return Err(SkuError::Overflow(number));
        }
        // MAX_SKU_NUMBER < u32::MAX
        Ok(Self(number as u32))
    }

    /// Returns the numeric suffix.
    pub fn number(&self) -> u64 {
        u64::from(self.0)
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SKU_PREFIX}{:0width$}", self.0, width = SKU_DIGITS)
    }
}

impl fmt::Debug for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sku({self})")
    }
}

impl FromStr for Sku {
    type Err = SkuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let suffix = s.strip_prefix(SKU_PREFIX).ok_or(SkuError::MissingPrefix)?;
        if suffix.len() != SKU_DIGITS || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SkuError::InvalidSuffix(suffix.to_owned()));
        }

        let number = suffix
            .parse()
            .map_err(|_| SkuError::InvalidSuffix(suffix.to_owned()))?;
        Self::new(number)
    }
}

impl Serialize for Sku {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Sku {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
