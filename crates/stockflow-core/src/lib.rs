//! # stockflow-core: Pure Inventory Logic
//!
//! This crate is the **heart** of the inventory transaction engine. It holds
//! every business rule as a pure function with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Stockflow Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                Back-office screens / API layer                  │   │
//! │  │   Receipt ─► Issue ─► Transfer ─► Count ─► Approve / Delete     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                stockflow-engine (orchestration)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockflow-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  effects  │  │  ledger   │  │ numbering │  │   │
//! │  │   │Transaction│  │ Delta per │  │ next qty  │  │ STG-2026- │  │   │
//! │  │   │   Stock   │  │   line    │  │  ≥ 0 rule │  │   0001    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                stockflow-db (Database Layer)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (transactions, items, warehouse stock)
//! - [`quantity`] - Fixed-point stock quantity (no floating point!)
//! - [`money`] - Integer-cent unit costs
//! - [`effects`] - Effect Calculator: transaction lines → ledger deltas
//! - [`ledger`] - Ledger arithmetic and the non-negativity rule
//! - [`lifecycle`] - Which status transitions are legal
//! - [`numbering`] - Transaction number prefixes and suffix parsing
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use stockflow_core::effects::{compute_effects, LedgerOp, WarehouseTargets};
//! use stockflow_core::{Quantity, TransactionType};
//! use stockflow_core::types::NewTransactionItem;
//!
//! let items = vec![NewTransactionItem::new("p-1", "Bolts", Quantity::from_units(10), "pcs")];
//! let targets = WarehouseTargets::single("w-1");
//!
//! let plan = compute_effects(TransactionType::Receipt, &items, &targets);
//! assert_eq!(plan.deltas.len(), 1);
//! assert_eq!(plan.deltas[0].op, LedgerOp::Adjust(Quantity::from_units(10)));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod effects;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod money;
pub mod numbering;
pub mod quantity;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use quantity::Quantity;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Width of the zero-padded numeric suffix of a transaction number.
pub const NUMBER_SUFFIX_WIDTH: usize = 4;

/// Maximum length of a reference number.
pub const MAX_REFERENCE_LEN: usize = 100;

/// Maximum length of free-text notes on headers and lines.
pub const MAX_NOTES_LEN: usize = 1000;
