//! # Engine Error Types
//!
//! Everything a lifecycle call can fail with, plus the serializable shape
//! handed to a UI or API layer.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Stockflow                              │
//! │                                                                         │
//! │  ValidationError ──► CoreError ──┐                                     │
//! │                                  │                                      │
//! │  sqlx::Error ──► DbError ────────┼──► EngineError ──► kind()           │
//! │                                  │         │                            │
//! │  tenant / lookup / retries ──────┘         ▼                            │
//! │                                        ApiError { code, message }      │
//! │                                                                         │
//! │  Storage failures are logged here and replaced with a generic message; │
//! │  everything else keeps its text, which names the failing product and   │
//! │  warehouse when there is one.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use stockflow_core::{CoreError, ValidationError};
use stockflow_db::DbError;

// =============================================================================
// Failure Stage
// =============================================================================

/// Step of a multi-step operation at which a partial failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Applying approval deltas.
    Apply,
    /// Applying reversal deltas before a delete.
    Reverse,
    /// Flipping the status after all deltas landed.
    Finalize,
    /// Removing the header after its items were removed.
    Delete,
    /// Inserting replacement items after the old ones were removed.
    ItemReplace,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureStage::Apply => "apply",
            FailureStage::Reverse => "reverse",
            FailureStage::Finalize => "finalize",
            FailureStage::Delete => "delete",
            FailureStage::ItemReplace => "item replace",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Engine Error
// =============================================================================

/// Errors returned by [`crate::InventoryEngine`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// A business rule rejected the call (validation, stock, transition).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The record exists but belongs to another tenant.
    #[error("{entity} {id} belongs to another tenant")]
    Forbidden { entity: &'static str, id: String },

    /// The status moved underneath us between load and write.
    ///
    /// ## When This Occurs
    /// - Two callers approve (or cancel) the same transaction at once
    /// - A transaction is approved while someone edits it
    #[error("Transaction {number} changed status concurrently")]
    StatusChanged { number: String },

    /// Another request holds the transaction for approve, update or delete.
    ///
    /// ## When This Occurs
    /// - A double-clicked approve or delete; the first click wins
    /// - Cancelling or editing while an approval is being applied
    #[error("Transaction {number} is being modified by another request")]
    InProgress { number: String },

    /// Some but not all steps of an operation took effect.
    ///
    /// No compensation is attempted: the ledger and the transaction's
    /// status now disagree and need manual reconciliation. `applied` of
    /// `total` counts ledger deltas for `Apply`/`Reverse` and the deltas
    /// already in effect for `Finalize`/`Delete`; for `ItemReplace` it
    /// counts lines written.
    #[error(
        "Transaction {number} NOT fully applied ({stage}: {applied} of {total} done), \
         ledger partially mutated: {cause}"
    )]
    PartialFailure {
        number: String,
        stage: FailureStage,
        applied: usize,
        total: usize,
        product_id: Option<String>,
        warehouse_id: Option<String>,
        cause: Box<EngineError>,
    },

    /// A stock row kept changing under the compare-and-swap.
    #[error(
        "Stock for product {product_id} in warehouse {warehouse_id} changed concurrently \
         {attempts} times, giving up"
    )]
    ConcurrentModification {
        product_id: String,
        warehouse_id: String,
        attempts: u32,
    },

    /// Every allocated number was taken before the insert landed.
    #[error("Could not allocate a transaction number under {prefix} after {attempts} attempts")]
    NumberConflict { prefix: String, attempts: u32 },

    /// The store call itself failed.
    #[error("Storage error: {0}")]
    Storage(#[from] DbError),
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Core(CoreError::Validation(err))
    }
}

/// Coarse error categories callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    InvalidStateTransition,
    InsufficientStock,
    PartialApplyFailure,
    Conflict,
    Upstream,
}

impl EngineError {
    /// Creates a NotFound error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates a Forbidden error.
    pub fn forbidden(entity: &'static str, id: impl Into<String>) -> Self {
        EngineError::Forbidden {
            entity,
            id: id.into(),
        }
    }

    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Core(CoreError::InsufficientStock { .. }) => ErrorKind::InsufficientStock,
            EngineError::Core(e) if e.is_invalid_transition() => ErrorKind::InvalidStateTransition,
            EngineError::Core(_) => ErrorKind::Validation,
            EngineError::NotFound { .. } => ErrorKind::NotFound,
            EngineError::Forbidden { .. } => ErrorKind::Forbidden,
            EngineError::StatusChanged { .. } => ErrorKind::InvalidStateTransition,
            EngineError::PartialFailure { .. } => ErrorKind::PartialApplyFailure,
            EngineError::InProgress { .. }
            | EngineError::ConcurrentModification { .. }
            | EngineError::NumberConflict { .. } => ErrorKind::Conflict,
            EngineError::Storage(DbError::NotFound { .. }) => ErrorKind::NotFound,
            EngineError::Storage(_) => ErrorKind::Upstream,
        }
    }

    /// True when the ledger may already differ from the transaction status.
    pub fn is_partial(&self) -> bool {
        matches!(self, EngineError::PartialFailure { .. })
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// API Error
// =============================================================================

/// Error shape handed to a UI or API layer.
///
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for product p-1 in warehouse w-1: available 6, requested 20"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Resource not found (404)
    NotFound,

    /// Resource belongs to another tenant (403)
    Forbidden,

    /// Status does not allow the action (409)
    InvalidState,

    /// Not enough stock for a movement (422)
    InsufficientStock,

    /// Ledger partially mutated, needs reconciliation (500)
    PartialFailure,

    /// Lost a race, safe to retry (409)
    Conflict,

    /// Database operation failed (503)
    DatabaseError,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let code = match err.kind() {
            ErrorKind::Validation => ErrorCode::ValidationError,
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::Forbidden => ErrorCode::Forbidden,
            ErrorKind::InvalidStateTransition => ErrorCode::InvalidState,
            ErrorKind::InsufficientStock => ErrorCode::InsufficientStock,
            ErrorKind::PartialApplyFailure => ErrorCode::PartialFailure,
            ErrorKind::Conflict => ErrorCode::Conflict,
            ErrorKind::Upstream => ErrorCode::DatabaseError,
        };

        match err {
            EngineError::Storage(e) if code == ErrorCode::DatabaseError => {
                // Log the actual error but return a generic message
                tracing::error!("Database operation failed: {}", e);
                ApiError::new(code, "Database operation failed")
            }
            EngineError::PartialFailure { .. } => {
                tracing::error!("{}", err);
                ApiError::new(code, err.to_string())
            }
            other => ApiError::new(code, other.to_string()),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use stockflow_core::lifecycle::Action;
    use stockflow_core::{Quantity, TransactionStatus};

    fn insufficient() -> EngineError {
        EngineError::Core(CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            warehouse_id: "w-1".to_string(),
            available: Quantity::from_units(6),
            requested: Quantity::from_units(20),
        })
    }

    #[test]
    fn test_kinds() {
        assert_eq!(insufficient().kind(), ErrorKind::InsufficientStock);
        assert_eq!(
            EngineError::from(ValidationError::required("tenant_id")).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            EngineError::Core(CoreError::InvalidTransition {
                number: "STG-2026-0001".to_string(),
                status: TransactionStatus::Completed,
                action: Action::Approve,
            })
            .kind(),
            ErrorKind::InvalidStateTransition
        );
        assert_eq!(
            EngineError::Core(CoreError::CountNotReversible {
                number: "STS-2026-0001".to_string()
            })
            .kind(),
            ErrorKind::InvalidStateTransition
        );
        assert_eq!(EngineError::forbidden("Transaction", "x").kind(), ErrorKind::Forbidden);
        assert_eq!(
            EngineError::InProgress {
                number: "STG-2026-0001".to_string()
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(EngineError::Storage(DbError::PoolExhausted).kind(), ErrorKind::Upstream);
        assert_eq!(
            EngineError::Storage(DbError::not_found("Warehouse", "w")).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_partial_failure_message_keeps_cause() {
        let err = EngineError::PartialFailure {
            number: "STC-2026-0003".to_string(),
            stage: FailureStage::Apply,
            applied: 1,
            total: 2,
            product_id: Some("p-1".to_string()),
            warehouse_id: Some("w-1".to_string()),
            cause: Box::new(insufficient()),
        };
        assert!(err.is_partial());
        assert_eq!(err.kind(), ErrorKind::PartialApplyFailure);

        let msg = err.to_string();
        assert!(msg.contains("NOT fully applied"));
        assert!(msg.contains("1 of 2"));
        assert!(msg.contains("warehouse w-1"));
    }

    #[test]
    fn test_api_error_hides_storage_details() {
        let api: ApiError = EngineError::Storage(DbError::QueryFailed("no such column: x".into())).into();
        assert_eq!(api.code, ErrorCode::DatabaseError);
        assert_eq!(api.message, "Database operation failed");

        let json = serde_json::to_value(ApiError::from(insufficient())).unwrap();
        assert_eq!(json["code"], "INSUFFICIENT_STOCK");
        assert!(json["message"].as_str().unwrap().contains("p-1"));
    }

    #[test]
    fn test_api_error_display() {
        let api = ApiError::new(ErrorCode::Conflict, "try again");
        assert_eq!(api.to_string(), "[Conflict] try again");
    }
}
