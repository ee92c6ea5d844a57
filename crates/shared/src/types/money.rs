//! Fixed-scale monetary amount.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! `Amount` wraps `rust_decimal::Decimal` and always carries exactly two
//! fractional digits, matching the `NUMERIC(18, 2)` columns it is stored in.

use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when building an [`Amount`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// Input is not a decimal number.
    #[error("Invalid amount '{0}'")]
    Invalid(String),

    /// Input has more than two fractional digits.
    #[error("Amount {0} has more than 2 decimal places")]
    TooManyDecimalPlaces(Decimal),

    /// Input does not fit into `NUMERIC(18, 2)`.
    #[error("Amount {0} is out of range")]
    OutOfRange(Decimal),
}

/// A signed monetary value with exactly two decimal places.
///
/// Arithmetic is exact: adding or subtracting two amounts never rounds.
/// Construction rejects values that would need rounding.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Number of fractional digits carried by every amount.
    pub const SCALE: u32 = 2;

    /// Zero, rendered as `0.00`.
    pub const ZERO: Self = Self(Decimal::from_parts(0, 0, 0, false, Self::SCALE));

    /// Largest magnitude storable in `NUMERIC(18, 2)`.
    fn max_magnitude() -> Decimal {
        Decimal::new(999_999_999_999_999_999, Self::SCALE)
    }

    /// Creates an amount from a count of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, Self::SCALE))
    }

    /// Creates an amount from a decimal, rejecting values that need rounding.
    ///
    /// # Errors
    ///
    /// Returns an error if the value has more than two significant fractional
    /// digits or exceeds the storable range.
    pub fn from_decimal(value: Decimal) -> Result<Self, AmountError> {
        if value.normalize().scale() > Self::SCALE {
            return Err(AmountError::TooManyDecimalPlaces(value));
        }
        if value.abs() > Self::max_magnitude() {
            return Err(AmountError::OutOfRange(value));
        }
        let mut scaled = value;
        scaled.rescale(Self::SCALE);
        Ok(Self(scaled))
    }

    /// Parses an exact decimal string such as `"50.00"` or `"-3.5"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a decimal or needs rounding.
    pub fn parse(input: &str) -> Result<Self, AmountError> {
        let trimmed = input.trim();
        let value = Decimal::from_str_exact(trimmed)
            .map_err(|_| AmountError::Invalid(trimmed.to_string()))?;
        Self::from_decimal(value)
    }

    /// Returns the underlying decimal.
    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly less than zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Multiplies by a count, e.g. the total value of `n` equal cards.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if the product does not fit.
    pub fn checked_times(self, n: u32) -> Result<Self, AmountError> {
        let product = self
            .0
            .checked_mul(Decimal::from(n))
            .ok_or(AmountError::OutOfRange(self.0))?;
        Self::from_decimal(product)
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl std::str::FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
