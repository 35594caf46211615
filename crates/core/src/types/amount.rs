//! Monetary amount of an order.
//!
//! Uses decimal arithmetic so that `9.98` stays `9.98`. On the wire the amount
//! is a plain JSON number, matching what the web client sends.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Errors that can occur when constructing an [`Amount`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// Negative totals are never valid.
    #[error("amount must not be negative (got {0})")]
    Negative(Decimal),
    /// More decimal places than the currency has.
    #[error("amount must have at most {max} decimal places (got {value})")]
    TooPrecise {
        /// Rejected value.
        value: Decimal,
        /// Maximum allowed decimal places.
        max: u32,
    },
    /// Larger than the orders table can hold.
    #[error("amount must be at most {max} (got {value})")]
    TooLarge {
        /// Rejected value.
        value: Decimal,
        /// Largest storable amount.
        max: Decimal,
    },
}

/// A non-negative order total in the store's currency.
///
/// Fits the `NUMERIC(12, 2)` column exactly: at most two decimal places and
/// at most [`Amount::MAX`], so nothing is rounded or overflows on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Amount(Decimal);

impl Amount {
    /// Decimal places kept by the store.
    pub const MAX_SCALE: u32 = 2;

    /// Largest storable amount, `9999999999.99`.
    pub const MAX: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

    /// Create an amount.
    ///
    /// Trailing zeros do not count as decimal places, so `9.980` is accepted
    /// as `9.98`.
    ///
    /// # Errors
    ///
    /// Returns `AmountError::Negative` if `value` is below zero,
    /// `AmountError::TooPrecise` if it has more than two decimal places and
    /// `AmountError::TooLarge` if it exceeds [`Amount::MAX`].
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative(value));
        }
        let value = value.normalize();
        if value.scale() > Self::MAX_SCALE {
            return Err(AmountError::TooPrecise {
                value,
                max: Self::MAX_SCALE,
            });
        }
        if value > Self::MAX {
            return Err(AmountError::TooLarge {
                value,
                max: Self::MAX,
            });
        }
        Ok(Self(value))
    }

    /// Get the underlying decimal.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(value).map_err(de::Error::custom)
    }
}
