//! # Money Module
//!
//! Provides the `Money` type for unit costs on transaction lines.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    unit_cost = 1099 cents, line cost = cents × quantity, rounded once  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockflow_core::money::Money;
//! use stockflow_core::quantity::Quantity;
//!
//! let unit_cost = Money::from_cents(250); // 2.50 per kg
//! let line = unit_cost.checked_times_quantity("1.5".parse::<Quantity>().unwrap());
//! assert_eq!(line, Some(Money::from_cents(375)));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

use crate::quantity::{Quantity, QUANTITY_SCALE};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a fractional quantity.
    ///
    /// ## Rounding
    /// Half away from zero, applied once on the final product:
    /// `(cents × milli ± 500) / 1000`. The product is formed in i128.
    ///
    /// Returns `None` when the rounded result does not fit in i64 cents.
    pub fn checked_times_quantity(&self, quantity: Quantity) -> Option<Money> {
        let product = self.0 as i128 * quantity.milli() as i128;
        let half = (QUANTITY_SCALE / 2) as i128;
        let rounded = if product >= 0 {
            (product + half) / QUANTITY_SCALE as i128
        } else {
            (product - half) / QUANTITY_SCALE as i128
        };
        i64::try_from(rounded).ok().map(Money)
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display is for logs only; screens format with the tenant's locale.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
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

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_times_whole_quantity() {
        let unit = Money::from_cents(299);
        assert_eq!(unit.checked_times_quantity(Quantity::from_units(3)), Some(Money::from_cents(897)));
    }

    #[test]
    fn test_times_fractional_quantity_rounds_half_up() {
        // 0.99 × 0.5 = 0.495 → 0.50
        let unit = Money::from_cents(99);
        assert_eq!(unit.checked_times_quantity(Quantity::from_milli(500)), Some(Money::from_cents(50)));

        // 1.00 × 0.333 = 0.333 → 0.33
        let unit = Money::from_cents(100);
        assert_eq!(unit.checked_times_quantity(Quantity::from_milli(333)), Some(Money::from_cents(33)));
    }

    #[test]
    fn test_times_quantity_out_of_range() {
        // 10^11 units of cost × 10^9 units is 10^22 cents
        let unit = Money::from_cents(10_000_000_000_000);
        assert_eq!(unit.checked_times_quantity(Quantity::from_units(1_000_000_000)), None);

        let unit = Money::from_cents(i64::MAX);
        assert_eq!(unit.checked_times_quantity(Quantity::from_units(1)), Some(unit));
        assert_eq!(unit.checked_times_quantity(Quantity::from_units(2)), None);
    }

    #[test]
    fn test_checked_add() {
        assert_eq!(
            Money::from_cents(1).checked_add(Money::from_cents(2)),
            Some(Money::from_cents(3))
        );
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
    }

    #[test]
    fn test_arithmetic() {
        let mut total = Money::from_cents(1000);
        total += Money::from_cents(250);
        assert_eq!(total.cents(), 1250);
        assert_eq!((total - Money::from_cents(1250)).cents(), 0);
        assert_eq!((Money::from_cents(1) + Money::from_cents(2)).cents(), 3);
    }
}
