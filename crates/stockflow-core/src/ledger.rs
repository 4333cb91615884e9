//! # Ledger Arithmetic
//!
//! Computes the next on-hand quantity of one `(product, warehouse)` row.
//! Reading and writing the row is the engine's job; the rule lives here.
//!
//! ```text
//!   current row     op            result
//!   ───────────     ──────────    ──────────────────────────────
//!   Some(c)         Adjust(d)     c + d        (error if < 0)
//!   None            Adjust(d>0)   d            (row is created)
//!   None            Adjust(d≤0)   InsufficientStock, available 0
//!   any             Set(q≥0)      q            (row may be created at 0)
//! ```

use crate::effects::LedgerOp;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::quantity::Quantity;

/// Resolves the quantity a row must hold after `op`.
///
/// `current` is `None` when no row exists for the key yet.
///
/// ## Errors
/// - `InsufficientStock` when the result would be negative, or when a
///   non-positive adjustment hits a key that was never recorded
/// - `QuantityOverflow` when the sum leaves the i64 range
/// - `Validation` for a negative absolute count
///
/// ## Example
/// ```rust
/// use stockflow_core::effects::LedgerOp;
/// use stockflow_core::ledger::resolve;
/// use stockflow_core::Quantity;
///
/// let next = resolve(Some(Quantity::from_units(10)), LedgerOp::Adjust(Quantity::from_units(-4)), "p-1", "w-1");
/// assert_eq!(next.unwrap(), Quantity::from_units(6));
/// ```
pub fn resolve(
    current: Option<Quantity>,
    op: LedgerOp,
    product_id: &str,
    warehouse_id: &str,
) -> CoreResult<Quantity> {
    let insufficient = |available: Quantity, delta: Quantity| CoreError::InsufficientStock {
        product_id: product_id.to_string(),
        warehouse_id: warehouse_id.to_string(),
        available,
        requested: -delta,
    };

    match (current, op) {
        (_, LedgerOp::Set(q)) => {
            if q.is_negative() {
                return Err(ValidationError::MustNotBeNegative {
                    field: "quantity".to_string(),
                }
                .into());
            }
            Ok(q)
        }
        (Some(c), LedgerOp::Adjust(d)) => {
            let next = c.checked_add(d).ok_or_else(|| CoreError::QuantityOverflow {
                product_id: product_id.to_string(),
                warehouse_id: warehouse_id.to_string(),
            })?;
            if next.is_negative() {
                return Err(insufficient(c, d));
            }
            Ok(next)
        }
        (None, LedgerOp::Adjust(d)) => {
            if d.is_positive() {
                Ok(d)
            } else {
                Err(insufficient(Quantity::zero(), d))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn units(n: i64) -> Quantity {
        Quantity::from_units(n)
    }

    #[test]
    fn test_adjust_existing_row() {
        assert_eq!(resolve(Some(units(10)), LedgerOp::Adjust(units(-4)), "p", "w").unwrap(), units(6));
        assert_eq!(resolve(Some(units(6)), LedgerOp::Adjust(units(3)), "p", "w").unwrap(), units(9));
        assert_eq!(resolve(Some(units(3)), LedgerOp::Adjust(units(-3)), "p", "w").unwrap(), units(0));
    }

    #[test]
    fn test_adjust_below_zero_reports_available_and_requested() {
        let err = resolve(Some(units(6)), LedgerOp::Adjust(units(-20)), "p-1", "w-1").unwrap_err();
        match err {
            CoreError::InsufficientStock { available, requested, product_id, warehouse_id } => {
                assert_eq!(available, units(6));
                assert_eq!(requested, units(20));
                assert_eq!(product_id, "p-1");
                assert_eq!(warehouse_id, "w-1");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_row() {
        assert_eq!(resolve(None, LedgerOp::Adjust(units(10)), "p", "w").unwrap(), units(10));
        assert!(matches!(
            resolve(None, LedgerOp::Adjust(units(-1)), "p", "w"),
            Err(CoreError::InsufficientStock { .. })
        ));
        assert!(matches!(
            resolve(None, LedgerOp::Adjust(units(0)), "p", "w"),
            Err(CoreError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn test_set_is_absolute() {
        assert_eq!(resolve(Some(units(5)), LedgerOp::Set(units(5)), "p", "w").unwrap(), units(5));
        assert_eq!(resolve(Some(units(0)), LedgerOp::Set(units(5)), "p", "w").unwrap(), units(5));
        assert_eq!(resolve(Some(units(10)), LedgerOp::Set(units(0)), "p", "w").unwrap(), units(0));
        assert_eq!(resolve(None, LedgerOp::Set(units(0)), "p", "w").unwrap(), units(0));
        assert!(matches!(
            resolve(Some(units(1)), LedgerOp::Set(units(-1)), "p", "w"),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_overflow() {
        let err = resolve(
            Some(Quantity::from_milli(i64::MAX)),
            LedgerOp::Adjust(Quantity::from_milli(1)),
            "p",
            "w",
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::QuantityOverflow { .. }));
    }

    proptest! {
        /// No sequence of adjustments ever yields a negative row; rejected
        /// steps leave the running value untouched.
        #[test]
        fn prop_never_negative(deltas in prop::collection::vec(-50_000i64..50_000, 0..40)) {
            let mut row: Option<Quantity> = None;
            for d in deltas {
                match resolve(row, LedgerOp::Adjust(Quantity::from_milli(d)), "p", "w") {
                    Ok(next) => {
                        prop_assert!(!next.is_negative());
                        row = Some(next);
                    }
                    Err(CoreError::InsufficientStock { available, .. }) => {
                        prop_assert_eq!(available, row.unwrap_or_default());
                    }
                    Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                }
            }
        }
    }
}
