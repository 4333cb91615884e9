//! # Repository Module
//!
//! Database repository implementations for the inventory engine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories and their tables                        │
//! │                                                                         │
//! │  stockflow-engine                                                      │
//! │       │                                                                 │
//! │       │  db.transactions().get_by_id(id)                               │
//! │       │  db.stock().compare_and_set(row, version, qty, at)             │
//! │       ▼                                                                 │
//! │  TransactionRepository ── inventory_transactions                       │
//! │                       └── inventory_transaction_items                  │
//! │  StockRepository ──────── warehouse_stock                              │
//! │  WarehouseRepository ──── warehouses                                   │
//! │                                                                         │
//! │  Repositories hold no rules: no status checks beyond the               │
//! │  `WHERE status = 'pending'` guards, no quantity arithmetic.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod stock;
pub mod transaction;
pub mod warehouse;
