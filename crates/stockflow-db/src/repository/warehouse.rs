//! # Warehouse Repository
//!
//! Stock locations. Transactions reference them by id; list and detail
//! reads join their names.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stockflow_core::Warehouse;

/// Repository for `warehouses` rows.
#[derive(Debug, Clone)]
pub struct WarehouseRepository {
    pool: SqlitePool,
}

impl WarehouseRepository {
    /// Creates a new WarehouseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        WarehouseRepository { pool }
    }

    /// Creates an active warehouse with a fresh id.
    ///
    /// ## Errors
    /// `UniqueViolation` when the tenant already has a warehouse with `code`.
    pub async fn create(&self, tenant_id: &str, code: &str, name: &str) -> DbResult<Warehouse> {
        let warehouse = Warehouse {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            code: code.to_string(),
            name: name.to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        self.insert(&warehouse).await?;
        Ok(warehouse)
    }

    /// Inserts a fully built warehouse.
    pub async fn insert(&self, warehouse: &Warehouse) -> DbResult<()> {
        debug!(id = %warehouse.id, code = %warehouse.code, "Inserting warehouse");

        sqlx::query(
            r#"
            INSERT INTO warehouses (id, tenant_id, code, name, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&warehouse.id)
        .bind(&warehouse.tenant_id)
        .bind(&warehouse.code)
        .bind(&warehouse.name)
        .bind(warehouse.is_active)
        .bind(warehouse.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a warehouse by id, regardless of tenant.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Warehouse>> {
        let row = sqlx::query_as::<_, Warehouse>(
            r#"
            SELECT id, tenant_id, code, name, is_active, created_at
            FROM warehouses
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Lists a tenant's warehouses by code.
    pub async fn list(&self, tenant_id: &str, include_inactive: bool) -> DbResult<Vec<Warehouse>> {
        let rows = sqlx::query_as::<_, Warehouse>(
            r#"
            SELECT id, tenant_id, code, name, is_active, created_at
            FROM warehouses
            WHERE tenant_id = ?1 AND (?2 OR is_active = 1)
            ORDER BY code
            "#,
        )
        .bind(tenant_id)
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Activates or deactivates a warehouse. Rows are never deleted because
    /// transactions and stock keep referencing them.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE warehouses SET is_active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Warehouse", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_create_and_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.warehouses();

        let main = repo.create("t-1", "MAIN", "Main Warehouse").await.unwrap();
        repo.create("t-1", "AUX", "Overflow").await.unwrap();
        repo.create("t-2", "MAIN", "Other tenant").await.unwrap();

        let listed = repo.list("t-1", false).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].code, "AUX");

        let fetched = repo.get_by_id(&main.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Main Warehouse");
        assert!(fetched.is_active);
    }

    #[tokio::test]
    async fn test_duplicate_code_per_tenant() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.warehouses();

        repo.create("t-1", "MAIN", "Main").await.unwrap();
        let err = repo.create("t-1", "MAIN", "Again").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_deactivate_hides_from_default_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.warehouses();

        let w = repo.create("t-1", "OLD", "Old Depot").await.unwrap();
        repo.set_active(&w.id, false).await.unwrap();

        assert!(repo.list("t-1", false).await.unwrap().is_empty());
        assert_eq!(repo.list("t-1", true).await.unwrap().len(), 1);
        assert!(matches!(
            repo.set_active("missing", true).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
