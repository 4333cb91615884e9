//! # Query Facade
//!
//! Read-side calls: filtered lists, summary counts, stock levels, and the
//! warehouse registry. Nothing here writes stock.

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::lifecycle::InventoryEngine;
use stockflow_core::validation::{validate_actor, validate_text};
use stockflow_core::{
    Actor, InventoryTransaction, TransactionFilters, TransactionStats, ValidationError,
    Warehouse, WarehouseStock,
};

/// Longest accepted warehouse code.
const MAX_WAREHOUSE_CODE_LEN: usize = 32;

/// Longest accepted warehouse name.
const MAX_WAREHOUSE_NAME_LEN: usize = 200;

impl InventoryEngine {
    // =========================================================================
    // Transactions
    // =========================================================================

    /// Lists the tenant's transactions, newest first.
    ///
    /// A product filter first resolves the ids of transactions with a line
    /// for that product, then narrows the header query to them.
    pub async fn list_transactions(
        &self,
        actor: &Actor,
        filters: &TransactionFilters,
    ) -> EngineResult<Vec<InventoryTransaction>> {
        validate_actor(actor)?;
        let repo = self.db.transactions();

        let scope = match filters.product_id.as_deref() {
            Some(product_id) => {
                let ids = repo.ids_with_product(&actor.tenant_id, product_id).await?;
                if ids.is_empty() {
                    debug!(product_id = %product_id, "No transactions for product");
                    return Ok(Vec::new());
                }
                Some(ids)
            }
            None => None,
        };

        Ok(repo
            .list(&actor.tenant_id, filters, scope.as_deref())
            .await?)
    }

    /// Counts by status and by type for the tenant.
    pub async fn get_stats(&self, actor: &Actor) -> EngineResult<TransactionStats> {
        validate_actor(actor)?;
        let groups = self
            .db
            .transactions()
            .count_by_status_and_type(&actor.tenant_id)
            .await?;

        let mut stats = TransactionStats::default();
        for (status, transaction_type, n) in groups {
            stats.add_status(status, n);
            stats.add_type(transaction_type, n);
        }
        Ok(stats)
    }

    // =========================================================================
    // Stock
    // =========================================================================

    /// Stock row for one key, if tracked and the tenant's.
    pub async fn get_stock(
        &self,
        actor: &Actor,
        product_id: &str,
        warehouse_id: &str,
    ) -> EngineResult<Option<WarehouseStock>> {
        validate_actor(actor)?;
        let row = self.ledger.get(product_id, warehouse_id).await?;
        Ok(row.filter(|r| r.tenant_id == actor.tenant_id))
    }

    /// All tracked products of one warehouse.
    pub async fn list_warehouse_stock(
        &self,
        actor: &Actor,
        warehouse_id: &str,
    ) -> EngineResult<Vec<WarehouseStock>> {
        validate_actor(actor)?;
        Ok(self
            .db
            .stock()
            .list_for_warehouse(&actor.tenant_id, warehouse_id)
            .await?)
    }

    /// One product across the tenant's warehouses.
    pub async fn list_product_stock(
        &self,
        actor: &Actor,
        product_id: &str,
    ) -> EngineResult<Vec<WarehouseStock>> {
        validate_actor(actor)?;
        Ok(self
            .db
            .stock()
            .list_for_product(&actor.tenant_id, product_id)
            .await?)
    }

    // =========================================================================
    // Warehouses
    // =========================================================================

    /// Registers a warehouse for the tenant.
    pub async fn create_warehouse(&self, actor: &Actor, code: &str, name: &str) -> EngineResult<Warehouse> {
        validate_actor(actor)?;
        let code = code.trim();
        let name = name.trim();
        if code.is_empty() {
            return Err(ValidationError::required("code").into());
        }
        if name.is_empty() {
            return Err(ValidationError::required("name").into());
        }
        validate_text("code", Some(code), MAX_WAREHOUSE_CODE_LEN)?;
        validate_text("name", Some(name), MAX_WAREHOUSE_NAME_LEN)?;

        let warehouse = match self.db.warehouses().create(&actor.tenant_id, code, name).await {
            Ok(w) => w,
            Err(e) if e.is_unique_violation_on("warehouses") => {
                return Err(ValidationError::Conflicting {
                    field: "code".to_string(),
                    reason: format!("warehouse code {} already exists", code),
                }
                .into())
            }
            Err(e) => return Err(e.into()),
        };
        debug!(warehouse_id = %warehouse.id, code = %warehouse.code, "Warehouse created");
        Ok(warehouse)
    }

    /// The tenant's warehouses by code.
    pub async fn list_warehouses(&self, actor: &Actor, include_inactive: bool) -> EngineResult<Vec<Warehouse>> {
        validate_actor(actor)?;
        Ok(self
            .db
            .warehouses()
            .list(&actor.tenant_id, include_inactive)
            .await?)
    }

    /// Activates or deactivates one of the tenant's warehouses. Inactive
    /// warehouses keep their stock but cannot be used by new or edited
    /// transactions.
    pub async fn set_warehouse_active(&self, actor: &Actor, warehouse_id: &str, active: bool) -> EngineResult<()> {
        validate_actor(actor)?;
        let repo = self.db.warehouses();
        repo.get_by_id(warehouse_id)
            .await?
            .filter(|w| w.tenant_id == actor.tenant_id)
            .ok_or_else(|| EngineError::not_found("Warehouse", warehouse_id))?;

        repo.set_active(warehouse_id, active).await?;
        debug!(warehouse_id = %warehouse_id, active, "Warehouse activity changed");
        Ok(())
    }
}
