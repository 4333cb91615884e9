//! # stockflow-db: Database Layer
//!
//! SQLite storage for inventory transactions, their items, warehouses and
//! the per-warehouse stock ledger, using sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockflow Data Flow                              │
//! │                                                                         │
//! │  InventoryEngine::approve_transaction                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockflow-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌──────────────────┐   ┌──────────────┐ │   │
//! │  │   │   Database    │    │   Repositories   │   │  Migrations  │ │   │
//! │  │   │   (pool.rs)   │◄───│ TransactionRepo  │   │  (embedded)  │ │   │
//! │  │   │  SqlitePool   │    │ StockRepo        │   │ 001_initial_ │ │   │
//! │  │   │  WAL, FKs on  │    │ WarehouseRepo    │   │   schema.sql │ │   │
//! │  │   └───────────────┘    └──────────────────┘   └──────────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (or :memory: in tests)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockflow_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("stockflow.db")).await?;
//! let main = db.warehouses().create("tenant-1", "MAIN", "Main Warehouse").await?;
//! let rows = db.stock().list_for_warehouse("tenant-1", &main.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::stock::StockRepository;
pub use repository::transaction::TransactionRepository;
pub use repository::warehouse::WarehouseRepository;
