//! # Money Module
//!
//! Provides the `Money` type for invoice prices, ledger amounts and salaries.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Amounts are stored as DECIMAL(15,2) in the books, so we keep them as  │
//! │  an integer count of hundredths (minor units).                         │
//! │                                                                         │
//! │    "1500000.50"  ──parse──►  Money(150000050)                          │
//! │    Money(150000050)  ──display──►  "1,500,000.50"                      │
//! │                                                                         │
//! │  Report totals are plain integer sums: no rounding drift.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use daftar_core::money::Money;
//!
//! let price = Money::parse("2500000.50").unwrap();
//! assert_eq!(price.minor(), 250_000_050);
//! assert_eq!(price.to_string(), "2,500,000.50");
//!
//! let total: Money = [price, Money::from_major(1)].into_iter().sum();
//! assert_eq!(total.minor(), 250_000_150);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;

/// Minor units per major unit (two decimal places).
const MINOR_PER_MAJOR: i64 = 100;

/// Largest amount a DECIMAL(15,2) column can hold, in minor units.
pub const MAX_MINOR: i64 = 999_999_999_999_999;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in minor units (hundredths).
///
/// Serialized as a bare integer of minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from whole units.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * MINOR_PER_MAJOR)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / MINOR_PER_MAJOR
    }

    /// Fractional portion (always 0-99), for display.
    #[inline]
    const fn fraction(&self) -> i64 {
        (self.0 % MINOR_PER_MAJOR).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Parses a decimal string such as `"1500000"`, `"1500000.5"` or
    /// `"1,500,000.50"`.
    ///
    /// ## Rules
    /// - Optional leading `-`
    /// - Comma group separators are ignored
    /// - At most two fractional digits
    /// - Must fit in DECIMAL(15,2)
    pub fn parse(input: &str) -> Result<Money, ValidationError> {
        let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
        let (negative, digits) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, cleaned.as_str()),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::invalid("amount", "must be a decimal number"));
        }
        if frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::invalid(
                "amount",
                "at most two decimal places are allowed",
            ));
        }

        let whole: i64 = whole
            .parse()
            .map_err(|_| ValidationError::invalid("amount", "value is too large"))?;
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().unwrap_or(0) * 10,
            _ => frac.parse::<i64>().unwrap_or(0),
        };

        let minor = whole
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|m| m.checked_add(frac))
            .filter(|m| *m <= MAX_MINOR)
            .ok_or_else(|| ValidationError::invalid("amount", "value is too large"))?;

        Ok(Money(if negative { -minor } else { minor }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders with comma group separators and two decimals: `1,500,000.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let whole = self.major().abs().to_string();

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        write!(f, "{}{}.{:02}", sign, grouped, self.fraction())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor() {
        let money = Money::from_minor(1099);
        assert_eq!(money.minor(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.fraction(), 99);
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_minor(150_000_050).to_string(), "1,500,000.50");
        assert_eq!(Money::from_minor(99_900).to_string(), "999.00");
        assert_eq!(Money::from_minor(100_000).to_string(), "1,000.00");
        assert_eq!(Money::from_minor(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_parse() {
        assert_eq!(Money::parse("1500000").unwrap().minor(), 150_000_000);
        assert_eq!(Money::parse("12.5").unwrap().minor(), 1250);
        assert_eq!(Money::parse("1,250.75").unwrap().minor(), 125_075);
        assert_eq!(Money::parse(" -3.05 ").unwrap().minor(), -305);

        assert!(Money::parse("").is_err());
        assert!(Money::parse("abc").is_err());
        assert!(Money::parse("1.234").is_err());
        assert!(Money::parse(".5").is_err());
        assert!(Money::parse("99999999999999999").is_err());
    }

    #[test]
    fn test_sum_and_arithmetic() {
        let amounts = [Money::from_major(10), Money::from_minor(250), Money::from_minor(-50)];
        let total: Money = amounts.iter().sum();
        assert_eq!(total.minor(), 1200);

        let mut running = Money::zero();
        running += Money::from_major(3);
        running -= Money::from_major(1);
        assert_eq!(running, Money::from_major(2));
        assert!(running.is_positive());
        assert_eq!((Money::zero() - running).to_string(), "-2.00");
    }
}
