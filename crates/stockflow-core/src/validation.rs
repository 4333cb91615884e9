//! # Validation Module
//!
//! Input validation for transaction create and update.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Screens / API (outside this workspace)                       │
//! │  └── Basic format checks, immediate feedback                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine call                                                  │
//! │  └── THIS MODULE: actor, targets per type, line quantities             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK (quantity >= 0)                                  │
//! │  └── UNIQUE (tenant_id, number), UNIQUE (product_id, warehouse_id)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every check here runs before the first write, so a rejected request
//! never leaves a trace in the store.
//!
//! ## Usage
//! ```rust
//! use stockflow_core::validation::validate_targets;
//! use stockflow_core::{TransactionType, WarehouseTargets};
//!
//! assert!(validate_targets(TransactionType::Transfer, &WarehouseTargets::transfer("w-1", "w-2")).is_ok());
//! assert!(validate_targets(TransactionType::Transfer, &WarehouseTargets::single("w-1")).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{Actor, NewTransaction, NewTransactionItem, TransactionType, WarehouseTargets};
use crate::{MAX_NOTES_LEN, MAX_REFERENCE_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Context Validators
// =============================================================================

/// The caller must carry both a user and a tenant.
pub fn validate_actor(actor: &Actor) -> ValidationResult<()> {
    if actor.tenant_id.trim().is_empty() {
        return Err(ValidationError::required("tenant_id"));
    }
    if actor.user_id.trim().is_empty() {
        return Err(ValidationError::required("user_id"));
    }
    Ok(())
}

/// Checks the warehouse references a type needs.
///
/// ## Rules
/// - receipt, issue, count: `warehouse_id` required
/// - transfer: `from_warehouse_id` and `to_warehouse_id` both required,
///   and they must differ
pub fn validate_targets(
    transaction_type: TransactionType,
    targets: &WarehouseTargets,
) -> ValidationResult<()> {
    let missing = |field: &str| ValidationError::MissingTarget {
        transaction_type,
        field: field.to_string(),
    };
    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());

    match transaction_type {
        TransactionType::Receipt | TransactionType::Issue | TransactionType::Count => {
            if !present(&targets.warehouse_id) {
                return Err(missing("warehouse_id"));
            }
        }
        TransactionType::Transfer => {
            if !present(&targets.from_warehouse_id) {
                return Err(missing("from_warehouse_id"));
            }
            if !present(&targets.to_warehouse_id) {
                return Err(missing("to_warehouse_id"));
            }
            if targets.from_warehouse_id == targets.to_warehouse_id {
                return Err(ValidationError::Conflicting {
                    field: "to_warehouse_id".to_string(),
                    reason: "must differ from from_warehouse_id".to_string(),
                });
            }
        }
    }

    Ok(())
}

// =============================================================================
// Line Validators
// =============================================================================

/// Validates one line.
///
/// ## Rules
/// - `product_id`, `product_name`, `unit` must not be blank
/// - movement quantity must be > 0; a count may be 0 (shelf found empty)
///   but never negative
/// - `unit_cost`, when given, must not be negative
pub fn validate_item(
    transaction_type: TransactionType,
    index: usize,
    item: &NewTransactionItem,
) -> ValidationResult<()> {
    let field = |name: &str| format!("items[{}].{}", index, name);

    if item.product_id.trim().is_empty() {
        return Err(ValidationError::required(field("product_id")));
    }
    if item.product_name.trim().is_empty() {
        return Err(ValidationError::required(field("product_name")));
    }
    if item.unit.trim().is_empty() {
        return Err(ValidationError::required(field("unit")));
    }

    match transaction_type {
        TransactionType::Count => {
            if item.quantity.is_negative() {
                return Err(ValidationError::MustNotBeNegative {
                    field: field("quantity"),
                });
            }
        }
        TransactionType::Receipt | TransactionType::Issue | TransactionType::Transfer => {
            if !item.quantity.is_positive() {
                return Err(ValidationError::MustBePositive {
                    field: field("quantity"),
                });
            }
        }
    }

    if item.unit_cost.is_some_and(|c| c.is_negative()) {
        return Err(ValidationError::MustNotBeNegative {
            field: field("unit_cost"),
        });
    }

    validate_text(&field("notes"), item.notes.as_deref(), MAX_NOTES_LEN)
}

/// Validates all lines. An empty list is accepted.
pub fn validate_items(
    transaction_type: TransactionType,
    items: &[NewTransactionItem],
) -> ValidationResult<()> {
    items
        .iter()
        .enumerate()
        .try_for_each(|(i, item)| validate_item(transaction_type, i, item))
}

// =============================================================================
// Text Validators
// =============================================================================

/// Optional free text must fit in `max` characters.
pub fn validate_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

/// Validates a whole create request.
pub fn validate_new_transaction(tx: &NewTransaction) -> ValidationResult<()> {
    validate_targets(tx.transaction_type, &tx.targets)?;
    validate_text("reference_number", tx.reference_number.as_deref(), MAX_REFERENCE_LEN)?;
    validate_text("notes", tx.notes.as_deref(), MAX_NOTES_LEN)?;
    validate_items(tx.transaction_type, &tx.items)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::quantity::Quantity;
    use chrono::Utc;

    fn line(units: i64) -> NewTransactionItem {
        NewTransactionItem::new("p-1", "Bolts", Quantity::from_units(units), "pcs")
    }

    #[test]
    fn test_validate_actor() {
        assert!(validate_actor(&Actor::new("u-1", "t-1")).is_ok());
        assert!(validate_actor(&Actor::new("u-1", " ")).is_err());
        assert!(validate_actor(&Actor::new("", "t-1")).is_err());
    }

    #[test]
    fn test_single_warehouse_types_need_warehouse() {
        for t in [TransactionType::Receipt, TransactionType::Issue, TransactionType::Count] {
            assert!(validate_targets(t, &WarehouseTargets::single("w-1")).is_ok());
            let err = validate_targets(t, &WarehouseTargets::default()).unwrap_err();
            assert!(matches!(err, ValidationError::MissingTarget { .. }));
        }
    }

    #[test]
    fn test_transfer_needs_both_distinct_ends() {
        let ok = WarehouseTargets::transfer("w-1", "w-2");
        assert!(validate_targets(TransactionType::Transfer, &ok).is_ok());

        let missing_to = WarehouseTargets {
            from_warehouse_id: Some("w-1".into()),
            ..Default::default()
        };
        let err = validate_targets(TransactionType::Transfer, &missing_to).unwrap_err();
        assert_eq!(err.to_string(), "transfer transactions require to_warehouse_id");

        let same = WarehouseTargets::transfer("w-1", "w-1");
        assert!(matches!(
            validate_targets(TransactionType::Transfer, &same),
            Err(ValidationError::Conflicting { .. })
        ));
    }

    #[test]
    fn test_item_quantities_per_type() {
        assert!(validate_item(TransactionType::Receipt, 0, &line(1)).is_ok());
        assert!(validate_item(TransactionType::Issue, 0, &line(0)).is_err());
        assert!(validate_item(TransactionType::Transfer, 0, &line(-2)).is_err());

        assert!(validate_item(TransactionType::Count, 0, &line(0)).is_ok());
        assert!(validate_item(TransactionType::Count, 0, &line(-1)).is_err());
    }

    #[test]
    fn test_item_field_names_carry_index() {
        let mut bad = line(1);
        bad.unit = String::new();
        let err = validate_items(TransactionType::Receipt, &[line(1), bad]).unwrap_err();
        assert_eq!(err.to_string(), "items[1].unit is required");
    }

    #[test]
    fn test_negative_unit_cost_rejected() {
        let item = line(1).with_unit_cost(Money::from_cents(-1));
        assert!(validate_item(TransactionType::Receipt, 0, &item).is_err());
    }

    #[test]
    fn test_validate_new_transaction() {
        let mut tx = NewTransaction {
            transaction_type: TransactionType::Receipt,
            targets: WarehouseTargets::single("w-1"),
            date: Utc::now(),
            reference_number: Some("PO-77".into()),
            notes: None,
            items: vec![],
        };
        assert!(validate_new_transaction(&tx).is_ok());

        tx.reference_number = Some("R".repeat(MAX_REFERENCE_LEN + 1));
        assert!(matches!(
            validate_new_transaction(&tx),
            Err(ValidationError::TooLong { .. })
        ));
    }

}
