//! # Lifecycle Rules
//!
//! Which status transitions a transaction may take. The engine asks these
//! guards before touching anything, so a rejected transition leaves the
//! ledger and the store exactly as they were.
//!
//! ## State Machine
//! ```text
//!                 approve (apply effects)
//!   ┌─────────┐ ─────────────────────────► ┌───────────┐
//!   │ pending │                            │ completed │──delete──► reverse, remove
//!   └─────────┘ ─────────┐                 └───────────┘            (count: rejected)
//!        │               │ cancel
//!        │ update        ▼
//!        └──►      ┌───────────┐
//!                  │ cancelled │──delete──► remove (nothing to reverse)
//!                  └───────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::types::{TransactionStatus, TransactionType};

/// A state-changing request on an existing transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Approve,
    Cancel,
    Delete,
    Update,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Approve => "approve",
            Action::Cancel => "cancel",
            Action::Delete => "delete",
            Action::Update => "update",
        })
    }
}

/// What a delete has to do before rows are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePlan {
    /// Effects were applied; reverse them first.
    ReverseThenRemove,
    /// No effects exist; remove rows only.
    RemoveOnly,
}

fn reject(number: &str, status: TransactionStatus, action: Action) -> CoreError {
    CoreError::InvalidTransition {
        number: number.to_string(),
        status,
        action,
    }
}

/// Approve is legal only from `pending`.
pub fn ensure_can_approve(number: &str, status: TransactionStatus) -> CoreResult<()> {
    match status {
        TransactionStatus::Pending => Ok(()),
        TransactionStatus::Completed | TransactionStatus::Cancelled => {
            Err(reject(number, status, Action::Approve))
        }
    }
}

/// Cancel is legal only from `pending`.
///
/// A completed transaction must not lose its effects silently, and
/// cancelling twice is reported rather than ignored.
pub fn ensure_can_cancel(number: &str, status: TransactionStatus) -> CoreResult<()> {
    match status {
        TransactionStatus::Pending => Ok(()),
        TransactionStatus::Completed | TransactionStatus::Cancelled => {
            Err(reject(number, status, Action::Cancel))
        }
    }
}

/// Header and item edits are legal only while `pending`.
pub fn ensure_can_update(number: &str, status: TransactionStatus) -> CoreResult<()> {
    match status {
        TransactionStatus::Pending => Ok(()),
        TransactionStatus::Completed | TransactionStatus::Cancelled => {
            Err(reject(number, status, Action::Update))
        }
    }
}

/// Decides how a delete proceeds.
///
/// ## Errors
/// `CountNotReversible` for a completed count: the overwritten quantity
/// is gone, so no reversal exists.
pub fn plan_delete(
    number: &str,
    transaction_type: TransactionType,
    status: TransactionStatus,
) -> CoreResult<DeletePlan> {
    match (status, transaction_type) {
        (TransactionStatus::Completed, TransactionType::Count) => {
            Err(CoreError::CountNotReversible {
                number: number.to_string(),
            })
        }
        (TransactionStatus::Completed, _) => Ok(DeletePlan::ReverseThenRemove),
        (TransactionStatus::Pending | TransactionStatus::Cancelled, _) => {
            Ok(DeletePlan::RemoveOnly)
        }
    }
}
