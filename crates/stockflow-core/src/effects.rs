//! # Effect Calculator
//!
//! Maps a transaction's type, lines and warehouse targets to the ledger
//! operations approval must perform, and to the inverse operations a delete
//! of a completed transaction must perform.
//!
//! ## Effects per Type
//! ```text
//! ┌──────────┬─────────────────────────────────────┬──────────────────────────┐
//! │ type     │ apply                               │ reverse                  │
//! ├──────────┼─────────────────────────────────────┼──────────────────────────┤
//! │ receipt  │ +q @ warehouse                      │ -q @ warehouse           │
//! │ issue    │ -q @ warehouse                      │ +q @ warehouse           │
//! │ transfer │ -q @ from, then +q @ to             │ -q @ to, then +q @ from  │
//! │ count    │ set q @ warehouse                   │ none (CountNotReversible)│
//! └──────────┴─────────────────────────────────────┴──────────────────────────┘
//! ```
//!
//! A line whose type needs a warehouse reference that is absent produces
//! no operations. It is listed in [`EffectPlan::skipped`] so the caller can
//! warn about it.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::quantity::Quantity;
use crate::types::{StockLine, TransactionType};

pub use crate::types::WarehouseTargets;

// =============================================================================
// Ledger Operations
// =============================================================================

/// One change to one `(product, warehouse)` ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "quantity", rename_all = "snake_case")]
pub enum LedgerOp {
    /// Signed change; the row must not end up negative.
    Adjust(Quantity),
    /// Absolute overwrite from a physical count.
    Set(Quantity),
}

/// A ledger operation bound to its key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDelta {
    pub product_id: String,
    /// Carried for error messages and logs.
    pub product_name: String,
    pub warehouse_id: String,
    pub op: LedgerOp,
}

/// A line that produced no operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    /// Zero-based index in the line list.
    pub index: usize,
    pub product_id: String,
    /// Name of the missing reference.
    pub missing: &'static str,
}

/// Ordered operations for a whole transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectPlan {
    /// In line order; a transfer line contributes its two operations
    /// back to back.
    pub deltas: Vec<LedgerDelta>,
    pub skipped: Vec<SkippedLine>,
}

impl EffectPlan {
    /// Sum of signed adjustments for one key. `Set` operations are ignored.
    pub fn net_adjustment(&self, product_id: &str, warehouse_id: &str) -> Quantity {
        self.deltas
            .iter()
            .filter(|d| d.product_id == product_id && d.warehouse_id == warehouse_id)
            .filter_map(|d| match d.op {
                LedgerOp::Adjust(q) => Some(q),
                LedgerOp::Set(_) => None,
            })
            .fold(Quantity::zero(), |acc, q| acc + q)
    }

    fn push<S: StockLine>(&mut self, line: &S, warehouse_id: &str, op: LedgerOp) {
        self.deltas.push(LedgerDelta {
            product_id: line.product_id().to_string(),
            product_name: line.product_name().to_string(),
            warehouse_id: warehouse_id.to_string(),
            op,
        });
    }

    fn skip<S: StockLine>(&mut self, index: usize, line: &S, missing: &'static str) {
        self.skipped.push(SkippedLine {
            index,
            product_id: line.product_id().to_string(),
            missing,
        });
    }
}

// =============================================================================
// Apply
// =============================================================================

/// Operations that approving a transaction performs, in line order.
pub fn compute_effects<S: StockLine>(
    transaction_type: TransactionType,
    items: &[S],
    targets: &WarehouseTargets,
) -> EffectPlan {
    let mut plan = EffectPlan::default();

    for (index, line) in items.iter().enumerate() {
        let q = line.quantity();
        match transaction_type {
            TransactionType::Receipt => match targets.warehouse_id.as_deref() {
                Some(w) => plan.push(line, w, LedgerOp::Adjust(q)),
                None => plan.skip(index, line, "warehouse_id"),
            },
            TransactionType::Issue => match targets.warehouse_id.as_deref() {
                Some(w) => plan.push(line, w, LedgerOp::Adjust(-q)),
                None => plan.skip(index, line, "warehouse_id"),
            },
            TransactionType::Count => match targets.warehouse_id.as_deref() {
                Some(w) => plan.push(line, w, LedgerOp::Set(q)),
                None => plan.skip(index, line, "warehouse_id"),
            },
            TransactionType::Transfer => {
                match (
                    targets.from_warehouse_id.as_deref(),
                    targets.to_warehouse_id.as_deref(),
                ) {
                    (Some(from), Some(to)) => {
                        plan.push(line, from, LedgerOp::Adjust(-q));
                        plan.push(line, to, LedgerOp::Adjust(q));
                    }
                    (None, _) => plan.skip(index, line, "from_warehouse_id"),
                    (Some(_), None) => plan.skip(index, line, "to_warehouse_id"),
                }
            }
        }
    }

    plan
}

// =============================================================================
// Reverse
// =============================================================================

/// Operations that undo a completed transaction.
///
/// A reversed transfer first takes the goods back out of the destination,
/// so a destination that has since been drained fails before the source
/// is credited.
///
/// ## Errors
/// `CountNotReversible` for count transactions.
pub fn compute_reversal<S: StockLine>(
    number: &str,
    transaction_type: TransactionType,
    items: &[S],
    targets: &WarehouseTargets,
) -> CoreResult<EffectPlan> {
    let mut plan = EffectPlan::default();

    for (index, line) in items.iter().enumerate() {
        let q = line.quantity();
        match transaction_type {
            TransactionType::Receipt => match targets.warehouse_id.as_deref() {
                Some(w) => plan.push(line, w, LedgerOp::Adjust(-q)),
                None => plan.skip(index, line, "warehouse_id"),
            },
            TransactionType::Issue => match targets.warehouse_id.as_deref() {
                Some(w) => plan.push(line, w, LedgerOp::Adjust(q)),
                None => plan.skip(index, line, "warehouse_id"),
            },
            TransactionType::Transfer => {
                match (
                    targets.from_warehouse_id.as_deref(),
                    targets.to_warehouse_id.as_deref(),
                ) {
                    (Some(from), Some(to)) => {
                        plan.push(line, to, LedgerOp::Adjust(-q));
                        plan.push(line, from, LedgerOp::Adjust(q));
                    }
                    (None, _) => plan.skip(index, line, "from_warehouse_id"),
                    (Some(_), None) => plan.skip(index, line, "to_warehouse_id"),
                }
            }
            TransactionType::Count => {
                return Err(CoreError::CountNotReversible {
                    number: number.to_string(),
                })
            }
        }
    }

    Ok(plan)
}

// =============================================================================
// Unit Tests
// =============================================================================
