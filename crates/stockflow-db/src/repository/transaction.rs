//! # Transaction Repository
//!
//! Headers and line items of inventory transactions.
//!
//! ## Transaction Lifecycle (storage view)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Inventory Transaction Rows                           │
//! │                                                                         │
//! │  1. CREATE                                                              │
//! │     └── insert()        → header, status 'pending'                      │
//! │     └── insert_items()  → all lines in one batch                        │
//! │                                                                         │
//! │  2. CLAIM (approve, edit, delete)                                       │
//! │     └── claim()         → WHERE status = ? AND claim_token IS NULL      │
//! │     └── release_claim() when the operation stops early                  │
//! │                                                                         │
//! │  3. EDIT (pending, claimed)                                             │
//! │     └── update_header() → WHERE claim_token = ?                         │
//! │     └── delete_items() + insert_items()   (replace, never diff)         │
//! │                                                                         │
//! │  4. STATUS                                                              │
//! │     └── mark_completed() → WHERE status='pending' AND claim_token = ?   │
//! │     └── mark_cancelled() → WHERE status='pending', unclaimed            │
//! │                                                                         │
//! │  5. DELETE (claimed)                                                    │
//! │     └── delete_items() then delete_header()                             │
//! │                                                                         │
//! │  Every call is its own statement; the engine decides the order and      │
//! │  reports what happened when a later step fails.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;
use tracing::debug;

use crate::error::DbResult;
use stockflow_core::{
    InventoryTransaction, InventoryTransactionItem, TransactionFilters, TransactionStatus,
    TransactionType,
};

// =============================================================================
// Row Shapes
// =============================================================================

/// Header columns plus joined warehouse names.
const HEADER_SELECT: &str = r#"
    SELECT
        t.id,
        t.tenant_id,
        t.transaction_number AS number,
        t.transaction_type,
        t.status,
        t.warehouse_id,
        t.from_warehouse_id,
        t.to_warehouse_id,
        w.name AS warehouse_name,
        fw.name AS from_warehouse_name,
        tw.name AS to_warehouse_name,
        t.transaction_date AS date,
        t.reference_number,
        t.notes,
        t.approved_by,
        t.approved_at,
        t.created_by,
        t.created_at,
        t.updated_at
    FROM inventory_transactions t
    LEFT JOIN warehouses w ON w.id = t.warehouse_id
    LEFT JOIN warehouses fw ON fw.id = t.from_warehouse_id
    LEFT JOIN warehouses tw ON tw.id = t.to_warehouse_id
"#;

const ITEM_COLUMNS: &str = r#"
    id, transaction_id, line_no, product_id, product_name,
    quantity, unit, unit_cost, notes, created_at
"#;

/// A header row as read back from the join.
#[derive(Debug, Clone, sqlx::FromRow)]
struct TransactionRecord {
    id: String,
    tenant_id: String,
    number: String,
    transaction_type: TransactionType,
    status: TransactionStatus,
    warehouse_id: Option<String>,
    from_warehouse_id: Option<String>,
    to_warehouse_id: Option<String>,
    warehouse_name: Option<String>,
    from_warehouse_name: Option<String>,
    to_warehouse_name: Option<String>,
    date: DateTime<Utc>,
    reference_number: Option<String>,
    notes: Option<String>,
    approved_by: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransactionRecord {
    fn with_items(self, items: Vec<InventoryTransactionItem>) -> InventoryTransaction {
        InventoryTransaction {
            id: self.id,
            tenant_id: self.tenant_id,
            number: self.number,
            transaction_type: self.transaction_type,
            status: self.status,
            warehouse_id: self.warehouse_id,
            from_warehouse_id: self.from_warehouse_id,
            to_warehouse_id: self.to_warehouse_id,
            warehouse_name: self.warehouse_name,
            from_warehouse_name: self.from_warehouse_name,
            to_warehouse_name: self.to_warehouse_name,
            date: self.date,
            reference_number: self.reference_number,
            notes: self.notes,
            approved_by: self.approved_by,
            approved_at: self.approved_at,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        }
    }
}

/// Escapes LIKE wildcards and wraps the term for a substring match.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for inventory transaction headers and items.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Gets a transaction with its items, regardless of tenant.
    ///
    /// Tenant checks belong to the caller, which needs to tell "missing"
    /// apart from "someone else's".
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<InventoryTransaction>> {
        let sql = format!("{} WHERE t.id = ?1", HEADER_SELECT);

        let record = sqlx::query_as::<_, TransactionRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match record {
            Some(record) => {
                let items = self.get_items(id).await?;
                Ok(Some(record.with_items(items)))
            }
            None => Ok(None),
        }
    }

    /// Gets the lines of one transaction in line order.
    pub async fn get_items(&self, transaction_id: &str) -> DbResult<Vec<InventoryTransactionItem>> {
        let sql = format!(
            "SELECT {} FROM inventory_transaction_items WHERE transaction_id = ?1 ORDER BY line_no",
            ITEM_COLUMNS
        );

        let items = sqlx::query_as::<_, InventoryTransactionItem>(&sql)
            .bind(transaction_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Highest existing number under `prefix` for a tenant.
    ///
    /// Longer numbers sort first so `STG-2026-10000` beats `STG-2026-9999`.
    pub async fn latest_number(&self, tenant_id: &str, prefix: &str) -> DbResult<Option<String>> {
        let number: Option<String> = sqlx::query_scalar(
            r#"
            SELECT transaction_number
            FROM inventory_transactions
            WHERE tenant_id = ?1 AND transaction_number LIKE ?2
            ORDER BY LENGTH(transaction_number) DESC, transaction_number DESC
            LIMIT 1
            "#,
        )
        .bind(tenant_id)
        .bind(format!("{}%", prefix))
        .fetch_optional(&self.pool)
        .await?;

        Ok(number)
    }

    /// Ids of a tenant's transactions that have a line for `product_id`.
    pub async fn ids_with_product(&self, tenant_id: &str, product_id: &str) -> DbResult<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT i.transaction_id
            FROM inventory_transaction_items i
            JOIN inventory_transactions t ON t.id = i.transaction_id
            WHERE t.tenant_id = ?1 AND i.product_id = ?2
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Lists a tenant's transactions, newest first, with items.
    ///
    /// `id_scope` narrows the result to the given ids (the product filter
    /// resolves those first). `filters.product_id` itself is ignored here.
    pub async fn list(
        &self,
        tenant_id: &str,
        filters: &TransactionFilters,
        id_scope: Option<&[String]>,
    ) -> DbResult<Vec<InventoryTransaction>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(HEADER_SELECT);
        qb.push(" WHERE t.tenant_id = ").push_bind(tenant_id);

        if let Some(t) = filters.transaction_type {
            qb.push(" AND t.transaction_type = ").push_bind(t);
        }
        if let Some(s) = filters.status {
            qb.push(" AND t.status = ").push_bind(s);
        }
        if let Some(w) = filters.warehouse_id.as_deref() {
            qb.push(" AND (t.warehouse_id = ")
                .push_bind(w)
                .push(" OR t.from_warehouse_id = ")
                .push_bind(w)
                .push(" OR t.to_warehouse_id = ")
                .push_bind(w)
                .push(")");
        }
        if let Some(term) = filters.search_term() {
            let pattern = like_pattern(term);
            qb.push(" AND (LOWER(t.transaction_number) LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR LOWER(COALESCE(t.reference_number, '')) LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR LOWER(COALESCE(t.notes, '')) LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        let (from, until) = filters.date_bounds();
        if let Some(from) = from {
            qb.push(" AND t.transaction_date >= ").push_bind(from);
        }
        if let Some(until) = until {
            qb.push(" AND t.transaction_date < ").push_bind(until);
        }

        if let Some(ids) = id_scope {
            qb.push(" AND t.id IN (");
            let mut separated = qb.separated(", ");
            for id in ids {
                separated.push_bind(id.as_str());
            }
            separated.push_unseparated(")");
        }

        qb.push(" ORDER BY t.created_at DESC, t.rowid DESC");
        if let Some(limit) = filters.limit {
            qb.push(" LIMIT ").push_bind(i64::from(limit));
        }

        let records: Vec<TransactionRecord> = qb.build_query_as().fetch_all(&self.pool).await?;
        debug!(tenant_id = %tenant_id, count = records.len(), "Listed transactions");

        let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
        let mut items = self.items_for(&ids).await?;

        Ok(records
            .into_iter()
            .map(|r| {
                let lines = items.remove(&r.id).unwrap_or_default();
                r.with_items(lines)
            })
            .collect())
    }

    /// Lines of many transactions, grouped by transaction id.
    async fn items_for(
        &self,
        transaction_ids: &[String],
    ) -> DbResult<HashMap<String, Vec<InventoryTransactionItem>>> {
        let mut grouped: HashMap<String, Vec<InventoryTransactionItem>> = HashMap::new();
        if transaction_ids.is_empty() {
            return Ok(grouped);
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        qb.push(ITEM_COLUMNS)
            .push(" FROM inventory_transaction_items WHERE transaction_id IN (");
        let mut separated = qb.separated(", ");
        for id in transaction_ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(") ORDER BY transaction_id, line_no");

        let rows: Vec<InventoryTransactionItem> = qb.build_query_as().fetch_all(&self.pool).await?;
        for item in rows {
            grouped.entry(item.transaction_id.clone()).or_default().push(item);
        }

        Ok(grouped)
    }

    /// `(status, type, count)` groups for a tenant.
    pub async fn count_by_status_and_type(
        &self,
        tenant_id: &str,
    ) -> DbResult<Vec<(TransactionStatus, TransactionType, i64)>> {
        let rows = sqlx::query_as::<_, (TransactionStatus, TransactionType, i64)>(
            r#"
            SELECT status, transaction_type, COUNT(*)
            FROM inventory_transactions
            WHERE tenant_id = ?1
            GROUP BY status, transaction_type
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Inserts a header. Items are inserted separately.
    ///
    /// ## Errors
    /// `UniqueViolation` on `transaction_number` when the number was taken
    /// in the meantime.
    pub async fn insert(&self, tx: &InventoryTransaction) -> DbResult<()> {
        debug!(id = %tx.id, number = %tx.number, transaction_type = %tx.transaction_type, "Inserting transaction");

        sqlx::query(
            r#"
            INSERT INTO inventory_transactions (
                id, tenant_id, transaction_number, transaction_type, status,
                warehouse_id, from_warehouse_id, to_warehouse_id,
                transaction_date, reference_number, notes,
                approved_by, approved_at, created_by, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8,
                ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16
            )
            "#,
        )
        .bind(&tx.id)
        .bind(&tx.tenant_id)
        .bind(&tx.number)
        .bind(tx.transaction_type)
        .bind(tx.status)
        .bind(&tx.warehouse_id)
        .bind(&tx.from_warehouse_id)
        .bind(&tx.to_warehouse_id)
        .bind(tx.date)
        .bind(&tx.reference_number)
        .bind(&tx.notes)
        .bind(&tx.approved_by)
        .bind(tx.approved_at)
        .bind(&tx.created_by)
        .bind(tx.created_at)
        .bind(tx.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts lines as one batch: either all land or none do.
    pub async fn insert_items(&self, items: &[InventoryTransactionItem]) -> DbResult<()> {
        if items.is_empty() {
            return Ok(());
        }

        let mut batch = self.pool.begin().await?;
        for item in items {
            sqlx::query(
                r#"
                INSERT INTO inventory_transaction_items (
                    id, transaction_id, line_no, product_id, product_name,
                    quantity, unit, unit_cost, notes, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(&item.id)
            .bind(&item.transaction_id)
            .bind(item.line_no)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(&item.unit)
            .bind(item.unit_cost)
            .bind(&item.notes)
            .bind(item.created_at)
            .execute(&mut *batch)
            .await?;
        }
        batch.commit().await?;

        debug!(count = items.len(), "Inserted transaction items");
        Ok(())
    }

    /// Marks a transaction as held by one request.
    ///
    /// ## Returns
    /// `false` when the row is gone, its status is no longer `status`, or
    /// another request already holds it.
    pub async fn claim(&self, id: &str, status: TransactionStatus, token: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE inventory_transactions SET claim_token = ?3
            WHERE id = ?1 AND status = ?2 AND claim_token IS NULL
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(token)
        .execute(&self.pool)
        .await?;

        let claimed = result.rows_affected() == 1;
        debug!(transaction_id = %id, claimed, "Transaction claim");
        Ok(claimed)
    }

    /// Drops a claim taken with `token`. `false` when it was not held.
    pub async fn release_claim(&self, id: &str, token: &str) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE inventory_transactions SET claim_token = NULL WHERE id = ?1 AND claim_token = ?2",
        )
        .bind(id)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Writes the editable header fields of a pending transaction held
    /// under `token`.
    ///
    /// ## Returns
    /// `false` when the row is gone, no longer pending, or not held.
    pub async fn update_header(&self, tx: &InventoryTransaction, token: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE inventory_transactions SET
                warehouse_id = ?2,
                from_warehouse_id = ?3,
                to_warehouse_id = ?4,
                transaction_date = ?5,
                reference_number = ?6,
                notes = ?7,
                updated_at = ?8
            WHERE id = ?1 AND status = 'pending' AND claim_token = ?9
            "#,
        )
        .bind(&tx.id)
        .bind(&tx.warehouse_id)
        .bind(&tx.from_warehouse_id)
        .bind(&tx.to_warehouse_id)
        .bind(tx.date)
        .bind(&tx.reference_number)
        .bind(&tx.notes)
        .bind(tx.updated_at)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Flips `pending → completed`, stamps the approver and drops the claim.
    ///
    /// ## Returns
    /// `false` when the transaction was not pending any more or is not
    /// held under `token`.
    pub async fn mark_completed(
        &self,
        id: &str,
        approved_by: &str,
        at: DateTime<Utc>,
        token: &str,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE inventory_transactions SET
                status = 'completed',
                approved_by = ?2,
                approved_at = ?3,
                updated_at = ?3,
                claim_token = NULL
            WHERE id = ?1 AND status = 'pending' AND claim_token = ?4
            "#,
        )
        .bind(id)
        .bind(approved_by)
        .bind(at)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Flips `pending → cancelled` unless another request holds the row.
    pub async fn mark_cancelled(&self, id: &str, at: DateTime<Utc>) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE inventory_transactions SET
                status = 'cancelled',
                updated_at = ?2
            WHERE id = ?1 AND status = 'pending' AND claim_token IS NULL
            "#,
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Removes all lines of a transaction. Returns how many went.
    pub async fn delete_items(&self, transaction_id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM inventory_transaction_items WHERE transaction_id = ?1")
            .bind(transaction_id)
            .execute(&self.pool)
            .await?;

        debug!(transaction_id = %transaction_id, removed = result.rows_affected(), "Deleted transaction items");
        Ok(result.rows_affected())
    }

    /// Removes a header. Its items must already be gone.
    pub async fn delete_header(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM inventory_transactions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use chrono::{NaiveDate, TimeZone};
    use stockflow_core::{Quantity, Warehouse};

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for (id, code, name) in [("w-1", "MAIN", "Main"), ("w-2", "AUX", "Overflow")] {
            db.warehouses()
                .insert(&Warehouse {
                    id: id.to_string(),
                    tenant_id: "t-1".to_string(),
                    code: code.to_string(),
                    name: name.to_string(),
                    is_active: true,
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        db
    }

    fn header(id: &str, number: &str, t: TransactionType) -> InventoryTransaction {
        let now = Utc::now();
        let (warehouse_id, from, to) = match t {
            TransactionType::Transfer => (None, Some("w-1".to_string()), Some("w-2".to_string())),
            _ => (Some("w-1".to_string()), None, None),
        };
        InventoryTransaction {
            id: id.to_string(),
            tenant_id: "t-1".to_string(),
            number: number.to_string(),
            transaction_type: t,
            status: TransactionStatus::Pending,
            warehouse_id,
            from_warehouse_id: from,
            to_warehouse_id: to,
            warehouse_name: None,
            from_warehouse_name: None,
            to_warehouse_name: None,
            date: now,
            reference_number: None,
            notes: None,
            approved_by: None,
            approved_at: None,
            created_by: Some("u-1".to_string()),
            created_at: now,
            updated_at: now,
            items: vec![],
        }
    }

    fn item(tx_id: &str, line_no: i64, product: &str) -> InventoryTransactionItem {
        InventoryTransactionItem {
            id: format!("{tx_id}-{line_no}"),
            transaction_id: tx_id.to_string(),
            line_no,
            product_id: product.to_string(),
            product_name: format!("Product {product}"),
            quantity: Quantity::from_units(line_no),
            unit: "pcs".to_string(),
            unit_cost: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_with_joined_names() {
        let db = setup().await;
        let repo = db.transactions();

        repo.insert(&header("tx-1", "STT-2026-0001", TransactionType::Transfer))
            .await
            .unwrap();
        repo.insert_items(&[item("tx-1", 2, "p-2"), item("tx-1", 1, "p-1")])
            .await
            .unwrap();

        let tx = repo.get_by_id("tx-1").await.unwrap().unwrap();
        assert_eq!(tx.number, "STT-2026-0001");
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.from_warehouse_name.as_deref(), Some("Main"));
        assert_eq!(tx.to_warehouse_name.as_deref(), Some("Overflow"));
        assert_eq!(tx.warehouse_name, None);
        assert_eq!(tx.items.len(), 2);
        assert_eq!(tx.items[0].product_id, "p-1");

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_number_is_unique_violation() {
        let db = setup().await;
        let repo = db.transactions();

        repo.insert(&header("tx-1", "STG-2026-0001", TransactionType::Receipt))
            .await
            .unwrap();
        let err = repo
            .insert(&header("tx-2", "STG-2026-0001", TransactionType::Receipt))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation_on("transaction_number"));
    }

    #[tokio::test]
    async fn test_latest_number_orders_by_length() {
        let db = setup().await;
        let repo = db.transactions();

        repo.insert(&header("a", "STG-2026-9999", TransactionType::Receipt)).await.unwrap();
        repo.insert(&header("b", "STG-2026-10000", TransactionType::Receipt)).await.unwrap();
        repo.insert(&header("c", "STC-2026-0500", TransactionType::Issue)).await.unwrap();

        assert_eq!(
            repo.latest_number("t-1", "STG-2026-").await.unwrap().as_deref(),
            Some("STG-2026-10000")
        );
        assert_eq!(repo.latest_number("t-1", "STS-2026-").await.unwrap(), None);
        assert_eq!(repo.latest_number("t-2", "STG-2026-").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_status_flips_only_from_pending() {
        let db = setup().await;
        let repo = db.transactions();
        repo.insert(&header("tx-1", "STG-2026-0001", TransactionType::Receipt))
            .await
            .unwrap();

        // completing needs the claim
        assert!(!repo.mark_completed("tx-1", "u-9", Utc::now(), "k-1").await.unwrap());
        assert!(repo.claim("tx-1", TransactionStatus::Pending, "k-1").await.unwrap());
        assert!(repo.mark_completed("tx-1", "u-9", Utc::now(), "k-1").await.unwrap());
        assert!(!repo.mark_completed("tx-1", "u-9", Utc::now(), "k-1").await.unwrap());
        assert!(!repo.mark_cancelled("tx-1", Utc::now()).await.unwrap());

        let tx = repo.get_by_id("tx-1").await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.approved_by.as_deref(), Some("u-9"));
        assert!(tx.approved_at.is_some());
    }

    #[tokio::test]
    async fn test_claim_is_exclusive() {
        let db = setup().await;
        let repo = db.transactions();
        repo.insert(&header("tx-1", "STG-2026-0001", TransactionType::Receipt))
            .await
            .unwrap();

        assert!(!repo.claim("tx-1", TransactionStatus::Completed, "k-1").await.unwrap());
        assert!(repo.claim("tx-1", TransactionStatus::Pending, "k-1").await.unwrap());
        assert!(!repo.claim("tx-1", TransactionStatus::Pending, "k-2").await.unwrap());

        // held rows cannot be cancelled or edited by someone else
        assert!(!repo.mark_cancelled("tx-1", Utc::now()).await.unwrap());
        let tx = repo.get_by_id("tx-1").await.unwrap().unwrap();
        assert!(!repo.update_header(&tx, "k-2").await.unwrap());
        assert!(repo.update_header(&tx, "k-1").await.unwrap());

        assert!(!repo.release_claim("tx-1", "k-2").await.unwrap());
        assert!(repo.release_claim("tx-1", "k-1").await.unwrap());
        assert!(repo.claim("tx-1", TransactionStatus::Pending, "k-2").await.unwrap());
        assert!(repo.release_claim("tx-1", "k-2").await.unwrap());
        assert!(repo.mark_cancelled("tx-1", Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_header_delete_needs_items_gone() {
        let db = setup().await;
        let repo = db.transactions();
        repo.insert(&header("tx-1", "STG-2026-0001", TransactionType::Receipt))
            .await
            .unwrap();
        repo.insert_items(&[item("tx-1", 1, "p-1")]).await.unwrap();

        let err = repo.delete_header("tx-1").await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        assert_eq!(repo.delete_items("tx-1").await.unwrap(), 1);
        assert!(repo.delete_header("tx-1").await.unwrap());
        assert!(repo.get_by_id("tx-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = setup().await;
        let repo = db.transactions();

        let mut receipt = header("r", "STG-2026-0001", TransactionType::Receipt);
        receipt.reference_number = Some("PO-4471".to_string());
        receipt.date = Utc.with_ymd_and_hms(2026, 3, 31, 22, 0, 0).unwrap();
        let mut transfer = header("x", "STT-2026-0001", TransactionType::Transfer);
        transfer.notes = Some("Move 100% of pallets".to_string());
        transfer.date = Utc.with_ymd_and_hms(2026, 4, 2, 8, 0, 0).unwrap();

        repo.insert(&receipt).await.unwrap();
        repo.insert(&transfer).await.unwrap();
        repo.insert_items(&[item("r", 1, "p-1")]).await.unwrap();
        repo.insert_items(&[item("x", 1, "p-2")]).await.unwrap();

        let all = repo.list("t-1", &TransactionFilters::default(), None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all.iter().map(|t| t.items.len()).sum::<usize>(), 2);

        // warehouse filter matches both single and transfer columns
        let by_w2 = TransactionFilters {
            warehouse_id: Some("w-2".to_string()),
            ..Default::default()
        };
        let found = repo.list("t-1", &by_w2, None).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "x");

        let search = TransactionFilters {
            search: Some("po-44".to_string()),
            ..Default::default()
        };
        assert_eq!(repo.list("t-1", &search, None).await.unwrap()[0].id, "r");

        // literal percent sign, not a wildcard
        let pct = TransactionFilters {
            search: Some("100%".to_string()),
            ..Default::default()
        };
        let found = repo.list("t-1", &pct, None).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "x");

        let march = TransactionFilters {
            date_from: NaiveDate::from_ymd_opt(2026, 3, 1),
            date_to: NaiveDate::from_ymd_opt(2026, 3, 31),
            ..Default::default()
        };
        let found = repo.list("t-1", &march, None).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "r");

        let scoped = repo
            .list("t-1", &TransactionFilters::default(), Some(&["x".to_string()]))
            .await
            .unwrap();
        assert_eq!(scoped.len(), 1);

        assert!(repo.list("t-2", &TransactionFilters::default(), None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ids_with_product_and_counts() {
        let db = setup().await;
        let repo = db.transactions();

        repo.insert(&header("r", "STG-2026-0001", TransactionType::Receipt)).await.unwrap();
        repo.insert(&header("i", "STC-2026-0001", TransactionType::Issue)).await.unwrap();
        repo.insert_items(&[item("r", 1, "p-1"), item("r", 2, "p-1")]).await.unwrap();
        repo.insert_items(&[item("i", 1, "p-2")]).await.unwrap();
        repo.claim("r", TransactionStatus::Pending, "k-1").await.unwrap();
        repo.mark_completed("r", "u-1", Utc::now(), "k-1").await.unwrap();

        assert_eq!(repo.ids_with_product("t-1", "p-1").await.unwrap(), vec!["r".to_string()]);

        let mut groups = repo.count_by_status_and_type("t-1").await.unwrap();
        groups.sort_by_key(|(_, t, _)| t.as_str());
        assert_eq!(
            groups,
            vec![
                (TransactionStatus::Pending, TransactionType::Issue, 1),
                (TransactionStatus::Completed, TransactionType::Receipt, 1),
            ]
        );
    }
}
