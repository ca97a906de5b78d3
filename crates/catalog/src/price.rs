use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, ValueObject};

/// Unit price held in the smallest currency unit (cents).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(u64);

impl ValueObject for Price {}

impl Price {
    /// Smallest price an article may carry (0.01).
    pub const MIN_CENTS: u64 = 1;

    /// Largest price any backend can store (signed 64-bit cents).
    pub const MAX_CENTS: u64 = i64::MAX as u64;

    pub const ZERO: Price = Price(0);

    pub fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub fn cents(&self) -> u64 {
        self.0
    }

    /// Parse a decimal amount such as `"12.5"` into a price, rounded to the
    /// nearest cent. Amounts below 0.01 are rejected.
    pub fn parse_positive(input: &str) -> DomainResult<Self> {
        let value: f64 = input
            .trim()
            .parse()
            .map_err(|_| DomainError::validation(format!("not a number: {input:?}")))?;

        if !value.is_finite() || value < 0.01 {
            return Err(DomainError::validation(format!(
                "price must be at least 0.01 (got {input:?})"
            )));
        }

        let cents = (value * 100.0).round();
        if cents >= Self::MAX_CENTS as f64 {
            return Err(DomainError::validation("price is too large"));
        }

        Ok(Self((cents as u64).max(Self::MIN_CENTS)))
    }

    /// Value of `quantity` units at this price.
    pub fn times(self, quantity: u32) -> Price {
        Price(self.0.saturating_mul(u64::from(quantity)))
    }
}

impl core::ops::Add for Price {
    type Output = Price;

    fn add(self, rhs: Price) -> Price {
        Price(self.0.saturating_add(rhs.0))
    }
}

impl core::iter::Sum for Price {
    fn sum<I: Iterator<Item = Price>>(iter: I) -> Price {
        iter.fold(Price::ZERO, |acc, p| acc + p)
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}
