//! # Number Allocator
//!
//! Picks the next `PPP-YYYY-NNNN` number from the highest one already stored
//! for the tenant. Two creators can read the same "highest" number; the
//! unique key on `(tenant_id, transaction_number)` catches that and the
//! lifecycle retries with a fresh allocation.

use tracing::debug;

use crate::error::EngineResult;
use stockflow_core::numbering::{next_number, number_prefix};
use stockflow_core::TransactionType;
use stockflow_db::{Database, TransactionRepository};

/// Derives transaction numbers from the transaction store.
#[derive(Debug, Clone)]
pub struct NumberAllocator {
    transactions: TransactionRepository,
}

impl NumberAllocator {
    /// Creates an allocator over the database's transactions.
    pub fn new(db: &Database) -> Self {
        NumberAllocator {
            transactions: db.transactions(),
        }
    }

    /// Next number for a tenant, type and year.
    ///
    /// An unparseable latest number restarts at `0001`; only a failing
    /// store lookup is an error.
    pub async fn allocate(
        &self,
        tenant_id: &str,
        transaction_type: TransactionType,
        year: i32,
    ) -> EngineResult<String> {
        let prefix = number_prefix(transaction_type, year);
        let latest = self.transactions.latest_number(tenant_id, &prefix).await?;
        let number = next_number(&prefix, latest.as_deref());

        debug!(
            tenant_id = %tenant_id,
            latest = ?latest,
            number = %number,
            "Allocated transaction number"
        );
        Ok(number)
    }
}
