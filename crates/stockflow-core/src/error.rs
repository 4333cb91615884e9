//! # Error Types
//!
//! Domain-specific error types for stockflow-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockflow-core errors (this file)                                     │
//! │  ├── CoreError        - Ledger and state-machine rule violations       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockflow-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  stockflow-engine errors                                               │
//! │  ├── EngineError      - Everything a lifecycle call can fail with      │
//! │  └── ApiError         - What a screen sees (serialized)                │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → ApiError            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::lifecycle::Action;
use crate::quantity::Quantity;
use crate::types::{TransactionStatus, TransactionType};

// =============================================================================
// Core Error
// =============================================================================

/// Core business rule errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A signed delta would drive a stock row below zero.
    ///
    /// ## When This Occurs
    /// - Issuing more than is on hand
    /// - Transferring out of a warehouse that never received the product
    /// - Reversing a receipt whose stock was already issued elsewhere
    ///
    /// `available` is the quantity found before the delta; `requested` is
    /// the amount the delta tried to take out.
    #[error(
        "Insufficient stock for product {product_id} in warehouse {warehouse_id}: \
         available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: String,
        warehouse_id: String,
        available: Quantity,
        requested: Quantity,
    },

    /// The transaction's status does not allow the requested action.
    ///
    /// ## When This Occurs
    /// - Approving a completed or cancelled transaction
    /// - Cancelling a completed transaction (effects must be reversed first)
    /// - Editing anything that is no longer pending
    #[error("Transaction {number} is {status}, cannot {action}")]
    InvalidTransition {
        number: String,
        status: TransactionStatus,
        action: Action,
    },

    /// A completed physical count cannot be deleted.
    ///
    /// The value the count overwrote is not kept anywhere, so there is
    /// nothing to restore. Post a new count with the corrected quantity.
    #[error(
        "Count transaction {number} is completed and cannot be deleted; \
         post a correcting count transaction instead"
    )]
    CountNotReversible { number: String },

    /// Ledger arithmetic left the i64 range.
    #[error("Quantity overflow for product {product_id} in warehouse {warehouse_id}")]
    QuantityOverflow {
        product_id: String,
        warehouse_id: String,
    },

    /// Quantity × unit cost, or a sum of line costs, left the i64 range.
    #[error("Cost overflow for product {product_id}")]
    CostOverflow { product_id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True for the errors that reject a state transition.
    pub fn is_invalid_transition(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidTransition { .. } | CoreError::CountNotReversible { .. }
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any write happens; state is never touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, unparseable quantity).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A warehouse reference the transaction type needs is missing.
    #[error("{transaction_type} transactions require {field}")]
    MissingTarget {
        transaction_type: TransactionType,
        field: String,
    },

    /// Two fields hold values that may not go together.
    #[error("{field}: {reason}")]
    Conflicting { field: String, reason: String },
}

impl ValidationError {
    /// Creates a Required error.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
