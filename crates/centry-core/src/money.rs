//! # Money Module
//!
//! Exact currency amounts as integer cents.
//!
//! All amounts are `i64` cents; there is no floating point anywhere in
//! the crate. Parsing and formatting use the plain `dollars.cents`
//! shape with at most two fraction digits. Arithmetic is explicit:
//! callers choose checked or saturating, nothing overloads `+`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing or combining amounts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Input is not a recognizable amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    /// More than two fraction digits.
    #[error("amounts carry at most two decimal places: {0}")]
    TooManyDecimals(String),
    /// The amount does not fit in 64-bit cents.
    #[error("amount out of range")]
    OutOfRange,
}

/// An exact amount in cents.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero cents.
    pub const ZERO: Money = Money(0);

    /// Construct from raw cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Raw cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Whether the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Whether the amount is strictly negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Add, failing on overflow.
    #[must_use]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Subtract, failing on overflow.
    #[must_use]
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Add, clamping at the range ends.
    #[must_use]
    pub fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }

    /// Subtract, clamping at the range ends.
    #[must_use]
    pub fn saturating_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }

    /// Negate, clamping `i64::MIN` to `i64::MAX`.
    #[must_use]
    pub fn saturating_neg(self) -> Money {
        Money(self.0.checked_neg().unwrap_or(i64::MAX))
    }

    /// Absolute value, clamping `i64::MIN` to `i64::MAX`.
    #[must_use]
    pub fn saturating_abs(self) -> Money {
        if self.0 < 0 {
            self.saturating_neg()
        } else {
            self
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        let dollars = magnitude / 100;
        let cents = magnitude % 100;
        if self.0 < 0 {
            write!(f, "-{dollars}.{cents:02}")
        } else {
            write!(f, "{dollars}.{cents:02}")
        }
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (whole, fraction) = match unsigned.split_once('.') {
            Some((w, f)) => (w, f),
            None => (unsigned, ""),
        };
        let has_dot = unsigned.contains('.');

        if whole.is_empty() && fraction.is_empty() {
            return Err(MoneyError::InvalidAmount(s.to_owned()));
        }
        if has_dot && fraction.is_empty() {
            return Err(MoneyError::InvalidAmount(s.to_owned()));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(MoneyError::InvalidAmount(s.to_owned()));
        }
        if !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(MoneyError::InvalidAmount(s.to_owned()));
        }
        if fraction.len() > 2 {
            return Err(MoneyError::TooManyDecimals(s.to_owned()));
        }

        let dollars: i128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| MoneyError::OutOfRange)?
        };
        let cents: i128 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i128>().map_err(|_| MoneyError::OutOfRange)? * 10,
            _ => fraction.parse().map_err(|_| MoneyError::OutOfRange)?,
        };

        let magnitude = dollars
            .checked_mul(100)
            .and_then(|d| d.checked_add(cents))
            .ok_or(MoneyError::OutOfRange)?;
        let signed = if negative { -magnitude } else { magnitude };
        let cents = i64::try_from(signed).map_err(|_| MoneyError::OutOfRange)?;
        Ok(Money(cents))
    }
}

// =============================================================================
// TESTS
// =============================================================================
