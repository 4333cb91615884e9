//! # Stock Ledger
//!
//! The only writer of `warehouse_stock`. One call applies one
//! [`LedgerDelta`] to one `(product, warehouse)` key; keys are never
//! updated together.
//!
//! ## Apply Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apply(delta)                                                           │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  read row ──► ledger::resolve(current, op)  ── InsufficientStock ──► ✗ │
//! │     │                    │                                              │
//! │     │ no row             │ row at version v                             │
//! │     ▼                    ▼                                              │
//! │  insert (v0)         compare_and_set(v → v+1)                           │
//! │     │                    │                                              │
//! │     ├─ UNIQUE ──┐        ├─ 0 rows ──┐                                  │
//! │     ✓           └────────┴───────────┴──► re-read (bounded attempts)   │
//! │                                              │                          │
//! │                                  exhausted ──► ConcurrentModification   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A rejected delta leaves the row exactly as it was.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use stockflow_core::effects::LedgerDelta;
use stockflow_core::{ledger, Quantity, WarehouseStock};
use stockflow_db::{Database, StockRepository};

/// What one successful apply did to its row.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub product_id: String,
    pub warehouse_id: String,
    /// Quantity before the write; `None` when the row was created.
    pub previous: Option<Quantity>,
    pub quantity: Quantity,
}

impl LedgerEntry {
    /// Signed change, treating a missing row as zero.
    pub fn difference(&self) -> Quantity {
        self.quantity - self.previous.unwrap_or_default()
    }
}

/// Version-checked writer over [`StockRepository`].
#[derive(Debug, Clone)]
pub struct StockLedger {
    stock: StockRepository,
    max_attempts: u32,
}

impl StockLedger {
    /// Creates a ledger that gives up after `max_attempts` lost races per
    /// delta.
    pub fn new(db: &Database, max_attempts: u32) -> Self {
        StockLedger {
            stock: db.stock(),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Current row for a key, if the pair was ever tracked.
    pub async fn get(&self, product_id: &str, warehouse_id: &str) -> EngineResult<Option<WarehouseStock>> {
        Ok(self.stock.get(product_id, warehouse_id).await?)
    }

    /// Applies one delta.
    ///
    /// ## Errors
    /// - `InsufficientStock` when a signed delta would go below zero,
    ///   including any non-positive delta on a key with no row
    /// - `ConcurrentModification` after `max_attempts` lost races
    pub async fn apply(
        &self,
        tenant_id: &str,
        delta: &LedgerDelta,
        at: DateTime<Utc>,
    ) -> EngineResult<LedgerEntry> {
        let product_id = delta.product_id.as_str();
        let warehouse_id = delta.warehouse_id.as_str();

        for attempt in 1..=self.max_attempts {
            let current = self.stock.get(product_id, warehouse_id).await?;
            let previous = current.as_ref().map(|row| row.quantity);
            let next = ledger::resolve(previous, delta.op, product_id, warehouse_id)?;

            let written = match current {
                None => match self
                    .stock
                    .insert(tenant_id, product_id, warehouse_id, next, at)
                    .await
                {
                    Ok(_) => true,
                    Err(e) if e.is_unique_violation_on("warehouse_stock") => false,
                    Err(e) => return Err(e.into()),
                },
                Some(row) => {
                    self.stock
                        .compare_and_set(&row.id, row.version, next, at)
                        .await?
                }
            };

            if written {
                debug!(
                    product_id = %product_id,
                    warehouse_id = %warehouse_id,
                    quantity = %next,
                    attempt,
                    "Ledger delta applied"
                );
                return Ok(LedgerEntry {
                    product_id: product_id.to_string(),
                    warehouse_id: warehouse_id.to_string(),
                    previous,
                    quantity: next,
                });
            }

            warn!(
                product_id = %product_id,
                warehouse_id = %warehouse_id,
                attempt,
                "Stock row changed concurrently, retrying"
            );
        }

        Err(EngineError::ConcurrentModification {
            product_id: product_id.to_string(),
            warehouse_id: warehouse_id.to_string(),
            attempts: self.max_attempts,
        })
    }
}
