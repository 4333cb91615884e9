//! # Warehouse Stock Repository
//!
//! Row access for the on-hand ledger. This file knows nothing about
//! deltas or non-negativity; it reads rows, inserts first rows, and swaps
//! quantities under a version check.
//!
//! ## Compare-and-Swap Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Writer A                          Writer B                             │
//! │  get → qty 10, version 4           get → qty 10, version 4              │
//! │  cas(v4 → qty 6)  ✓ version 5                                          │
//! │                                    cas(v4 → qty 7)  ✗ 0 rows           │
//! │                                    get → qty 6, version 5   (retry)     │
//! │                                    cas(v5 → qty 3)  ✓ version 6         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use stockflow_core::{Quantity, WarehouseStock};

const STOCK_COLUMNS: &str = r#"
    id, tenant_id, product_id, warehouse_id,
    quantity, reserved_quantity, last_transaction_date,
    version, created_at, updated_at
"#;

/// Repository for `warehouse_stock` rows.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Reads the row for one `(product, warehouse)` key.
    pub async fn get(&self, product_id: &str, warehouse_id: &str) -> DbResult<Option<WarehouseStock>> {
        let sql = format!(
            "SELECT {} FROM warehouse_stock WHERE product_id = ?1 AND warehouse_id = ?2",
            STOCK_COLUMNS
        );

        let row = sqlx::query_as::<_, WarehouseStock>(&sql)
            .bind(product_id)
            .bind(warehouse_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// Inserts the first row for a key at version 0.
    ///
    /// ## Errors
    /// `UniqueViolation` when a concurrent writer created the row first;
    /// the caller re-reads and goes down the update path.
    pub async fn insert(
        &self,
        tenant_id: &str,
        product_id: &str,
        warehouse_id: &str,
        quantity: Quantity,
        at: DateTime<Utc>,
    ) -> DbResult<WarehouseStock> {
        debug!(
            product_id = %product_id,
            warehouse_id = %warehouse_id,
            quantity = %quantity,
            "Creating stock row"
        );

        let row = WarehouseStock {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            product_id: product_id.to_string(),
            warehouse_id: warehouse_id.to_string(),
            quantity,
            reserved_quantity: Quantity::zero(),
            last_transaction_date: Some(at),
            version: 0,
            created_at: at,
            updated_at: at,
        };

        sqlx::query(
            r#"
            INSERT INTO warehouse_stock (
                id, tenant_id, product_id, warehouse_id,
                quantity, reserved_quantity, last_transaction_date,
                version, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&row.id)
        .bind(&row.tenant_id)
        .bind(&row.product_id)
        .bind(&row.warehouse_id)
        .bind(row.quantity)
        .bind(row.reserved_quantity)
        .bind(row.last_transaction_date)
        .bind(row.version)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(row)
    }

    /// Writes `quantity` if the row still carries `expected_version`.
    ///
    /// ## Returns
    /// `true` when the swap happened (version is now `expected_version + 1`),
    /// `false` when another writer got there first.
    pub async fn compare_and_set(
        &self,
        id: &str,
        expected_version: i64,
        quantity: Quantity,
        at: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE warehouse_stock
            SET
                quantity = ?3,
                last_transaction_date = ?4,
                updated_at = ?4,
                version = version + 1
            WHERE id = ?1 AND version = ?2
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(quantity)
        .bind(at)
        .execute(&self.pool)
        .await?;

        let swapped = result.rows_affected() == 1;
        debug!(id = %id, expected_version, swapped, "Stock compare-and-set");
        Ok(swapped)
    }

    /// All rows of one warehouse for a tenant, by product.
    pub async fn list_for_warehouse(
        &self,
        tenant_id: &str,
        warehouse_id: &str,
    ) -> DbResult<Vec<WarehouseStock>> {
        let sql = format!(
            "SELECT {} FROM warehouse_stock \
             WHERE tenant_id = ?1 AND warehouse_id = ?2 \
             ORDER BY product_id",
            STOCK_COLUMNS
        );

        let rows = sqlx::query_as::<_, WarehouseStock>(&sql)
            .bind(tenant_id)
            .bind(warehouse_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// All rows of one product across a tenant's warehouses.
    pub async fn list_for_product(
        &self,
        tenant_id: &str,
        product_id: &str,
    ) -> DbResult<Vec<WarehouseStock>> {
        let sql = format!(
            "SELECT {} FROM warehouse_stock \
             WHERE tenant_id = ?1 AND product_id = ?2 \
             ORDER BY warehouse_id",
            STOCK_COLUMNS
        );

        let rows = sqlx::query_as::<_, WarehouseStock>(&sql)
            .bind(tenant_id)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}
