//! # Quantity Module
//!
//! Provides the `Quantity` type for stock amounts.
//!
//! ## Why Fixed-Point Quantity?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM, AGAIN                                      │
//! │                                                                         │
//! │  Warehouses stock things by the piece AND by the kilogram:             │
//! │    0.1 kg + 0.2 kg = 0.30000000000000004 kg  ❌                         │
//! │                                                                         │
//! │  A ledger that drifts by 0.00000000000004 can never reach exactly 0,   │
//! │  so "empty" rows stop being empty and non-negativity checks flap.      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer thousandths                                      │
//! │    1 unit   = 1000                                                      │
//! │    2.5 kg   = 2500                                                      │
//! │    0.001    = 1  (smallest representable amount)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockflow_core::quantity::Quantity;
//!
//! let received = Quantity::from_units(10);
//! let issued: Quantity = "2.5".parse().unwrap();
//!
//! assert_eq!((received - issued).to_string(), "7.5");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

/// Number of stored steps per whole unit.
pub const QUANTITY_SCALE: i64 = 1000;

// =============================================================================
// Quantity Type
// =============================================================================

/// A stock amount stored as integer thousandths of a unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: ledger deltas are signed; on-hand stock never is
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Transparent in SQL**: stored as a plain INTEGER column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Quantity(i64);

impl Quantity {
    /// Creates a quantity from thousandths of a unit.
    ///
    /// ## Example
    /// ```rust
    /// use stockflow_core::quantity::Quantity;
    ///
    /// let q = Quantity::from_milli(2500);
    /// assert_eq!(q.to_string(), "2.5");
    /// ```
    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        Quantity(milli)
    }

    /// Creates a quantity from whole units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * QUANTITY_SCALE)
    }

    /// Returns the raw value in thousandths.
    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit part (truncated toward zero).
    #[inline]
    pub const fn whole_units(&self) -> i64 {
        self.0 / QUANTITY_SCALE
    }

    /// Zero quantity.
    #[inline]
    pub const fn zero() -> Self {
        Quantity(0)
    }

    /// Checks if the quantity is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the quantity is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the quantity is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Quantity(self.0.abs())
    }

    /// Adds two quantities, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Quantity(v)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders the shortest exact decimal form: `10`, `2.5`, `0.125`, `-3`.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = QUANTITY_SCALE as u64;
        let whole = abs / scale;
        let frac = abs % scale;

        if frac == 0 {
            return write!(f, "{}{}", sign, whole);
        }

        let digits = format!("{:03}", frac);
        write!(f, "{}{}.{}", sign, whole, digits.trim_end_matches('0'))
    }
}

/// Parses decimal text with at most three fractional digits.
///
/// ## Example
/// ```rust
/// use stockflow_core::quantity::Quantity;
///
/// assert_eq!("12".parse::<Quantity>().unwrap().milli(), 12_000);
/// assert_eq!("0.75".parse::<Quantity>().unwrap().milli(), 750);
/// assert!("1.2345".parse::<Quantity>().is_err());
/// ```
impl FromStr for Quantity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (whole_str, frac_str) = match body.split_once('.') {
            Some((w, f)) => (w, f),
            None => (body, ""),
        };

        if whole_str.is_empty() && frac_str.is_empty() {
            return Err(invalid("empty value"));
        }
        if frac_str.len() > 3 {
            return Err(invalid("at most 3 decimal places are supported"));
        }
        if !whole_str.chars().all(|c| c.is_ascii_digit())
            || !frac_str.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("must be a decimal number"));
        }

        let whole: i64 = if whole_str.is_empty() {
            0
        } else {
            whole_str.parse().map_err(|_| invalid("value too large"))?
        };
        let frac: i64 = if frac_str.is_empty() {
            0
        } else {
            format!("{:0<3}", frac_str)
                .parse()
                .map_err(|_| invalid("must be a decimal number"))?
        };

        let milli = whole
            .checked_mul(QUANTITY_SCALE)
            .and_then(|w| w.checked_add(frac))
            .ok_or_else(|| invalid("value too large"))?;

        Ok(Quantity(if negative { -milli } else { milli }))
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Quantity::zero()
    }
}

impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0 + other.0)
    }
}

impl AddAssign for Quantity {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Quantity {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Quantity(self.0 - other.0)
    }
}

impl SubAssign for Quantity {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Negation turns a receipt-shaped delta into an issue-shaped one.
impl Neg for Quantity {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Quantity(-self.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_units() {
        let q = Quantity::from_units(10);
        assert_eq!(q.milli(), 10_000);
        assert_eq!(q.whole_units(), 10);
    }

    #[test]
    fn test_display() {
        assert_eq!(Quantity::from_units(10).to_string(), "10");
        assert_eq!(Quantity::from_milli(2500).to_string(), "2.5");
        assert_eq!(Quantity::from_milli(125).to_string(), "0.125");
        assert_eq!(Quantity::from_milli(-3000).to_string(), "-3");
        assert_eq!(Quantity::from_milli(-50).to_string(), "-0.05");
        assert_eq!(Quantity::zero().to_string(), "0");
    }

    #[test]
    fn test_parse() {
        assert_eq!("7".parse::<Quantity>().unwrap(), Quantity::from_units(7));
        assert_eq!("7.25".parse::<Quantity>().unwrap().milli(), 7250);
        assert_eq!(".5".parse::<Quantity>().unwrap().milli(), 500);
        assert_eq!("-1.5".parse::<Quantity>().unwrap().milli(), -1500);
        assert_eq!(" 3 ".parse::<Quantity>().unwrap(), Quantity::from_units(3));

        assert!("".parse::<Quantity>().is_err());
        assert!("abc".parse::<Quantity>().is_err());
        assert!("1.2345".parse::<Quantity>().is_err());
        assert!("1,5".parse::<Quantity>().is_err());
    }

    #[test]
    fn test_display_parse_agree() {
        for milli in [0, 1, 10, 999, 1000, 1001, 123_456, -42_500] {
            let q = Quantity::from_milli(milli);
            assert_eq!(q.to_string().parse::<Quantity>().unwrap(), q);
        }
    }

    #[test]
    fn test_arithmetic() {
        let a = Quantity::from_units(10);
        let b = Quantity::from_units(4);

        assert_eq!(a - b, Quantity::from_units(6));
        assert_eq!(a + b, Quantity::from_units(14));
        assert_eq!(-b, Quantity::from_units(-4));
        assert!((b - a).is_negative());
    }

    #[test]
    fn test_checked_add_overflow() {
        let max = Quantity::from_milli(i64::MAX);
        assert!(max.checked_add(Quantity::from_milli(1)).is_none());
        assert_eq!(
            Quantity::from_units(1).checked_add(Quantity::from_units(2)),
            Some(Quantity::from_units(3))
        );
    }
}
