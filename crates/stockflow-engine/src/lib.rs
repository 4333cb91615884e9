//! # stockflow-engine: Inventory Transaction Engine
//!
//! Turns logical stock movements into consistent per-warehouse quantities.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        stockflow-engine                                 │
//! │                                                                         │
//! │  UI / API layer ── Actor { user_id, tenant_id } ──┐                    │
//! │                                                   ▼                     │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                   InventoryEngine                                │  │
//! │  │                                                                  │  │
//! │  │  lifecycle ─► create / update / approve / cancel / delete        │  │
//! │  │  query ─────► list / stats / stock / warehouses                  │  │
//! │  │       │                     │                                    │  │
//! │  │       ▼                     ▼                                    │  │
//! │  │  numbering            ledger (StockLedger)                       │  │
//! │  │  NumberAllocator      version-checked, one key at a time         │  │
//! │  └───────┬─────────────────────┬────────────────────────────────────┘  │
//! │          │                     │                                        │
//! │          ▼                     ▼                                        │
//! │  stockflow-core (effects, ledger rules)   stockflow-db (SQLite)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust,ignore
//! use stockflow_core::{Actor, NewTransaction, NewTransactionItem, Quantity, TransactionType, WarehouseTargets};
//! use stockflow_engine::{EngineConfig, InventoryEngine};
//!
//! let engine = InventoryEngine::connect(&EngineConfig::load()?).await?;
//! let actor = Actor::new("user-1", "tenant-1");
//!
//! let tx = engine
//!     .create_transaction(&actor, NewTransaction {
//!         transaction_type: TransactionType::Receipt,
//!         targets: WarehouseTargets::single(&main.id),
//!         date: chrono::Utc::now(),
//!         reference_number: Some("PO-4471".into()),
//!         notes: None,
//!         items: vec![NewTransactionItem::new("p-1", "Bolts", Quantity::from_units(10), "pcs")],
//!     })
//!     .await?;
//! engine.approve_transaction(&actor, &tx.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod numbering;
pub mod query;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, EngineConfig};
pub use error::{ApiError, EngineError, EngineResult, ErrorCode, ErrorKind, FailureStage};
pub use ledger::{LedgerEntry, StockLedger};
pub use lifecycle::InventoryEngine;
pub use numbering::NumberAllocator;
