//! Shared setup for engine integration tests.

#![allow(dead_code)]

use chrono::Utc;

use stockflow_core::{
    Actor, NewTransaction, NewTransactionItem, Quantity, TransactionType, WarehouseTargets,
};
use stockflow_db::{Database, DbConfig};
use stockflow_engine::{EngineConfig, InventoryEngine};

/// An engine over a fresh in-memory database with two warehouses.
pub struct Harness {
    pub engine: InventoryEngine,
    pub actor: Actor,
    pub w1: String,
    pub w2: String,
}

pub async fn harness() -> Harness {
    harness_with(EngineConfig::default()).await
}

pub async fn harness_with(config: EngineConfig) -> Harness {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let engine = InventoryEngine::new(db, &config);
    let actor = Actor::new("user-1", "tenant-1");

    let w1 = engine.create_warehouse(&actor, "W1", "Main Warehouse").await.unwrap();
    let w2 = engine.create_warehouse(&actor, "W2", "Overflow Depot").await.unwrap();

    Harness {
        engine,
        actor,
        w1: w1.id,
        w2: w2.id,
    }
}

pub fn units(n: i64) -> Quantity {
    Quantity::from_units(n)
}

pub fn line(product_id: &str, n: i64) -> NewTransactionItem {
    NewTransactionItem::new(product_id, format!("Product {product_id}"), units(n), "pcs")
}

pub fn new_tx(
    transaction_type: TransactionType,
    targets: WarehouseTargets,
    items: Vec<NewTransactionItem>,
) -> NewTransaction {
    NewTransaction {
        transaction_type,
        targets,
        date: Utc::now(),
        reference_number: None,
        notes: None,
        items,
    }
}

impl Harness {
    /// Creates a transaction and returns its id.
    pub async fn create(
        &self,
        transaction_type: TransactionType,
        targets: WarehouseTargets,
        items: Vec<NewTransactionItem>,
    ) -> String {
        self.engine
            .create_transaction(&self.actor, new_tx(transaction_type, targets, items))
            .await
            .unwrap()
            .id
    }

    /// Creates and approves a transaction, returning its id.
    pub async fn post(
        &self,
        transaction_type: TransactionType,
        targets: WarehouseTargets,
        items: Vec<NewTransactionItem>,
    ) -> String {
        let id = self.create(transaction_type, targets, items).await;
        self.engine.approve_transaction(&self.actor, &id).await.unwrap();
        id
    }

    /// On-hand quantity, zero when the key was never tracked.
    pub async fn stock(&self, product_id: &str, warehouse_id: &str) -> Quantity {
        self.engine
            .get_stock(&self.actor, product_id, warehouse_id)
            .await
            .unwrap()
            .map(|row| row.quantity)
            .unwrap_or_default()
    }

    /// Installs a trigger that aborts every `event` (`INSERT`, `DELETE`)
    /// on `table`, to force a storage failure mid-operation.
    pub async fn reject_on(&self, event: &str, table: &str) {
        let sql = format!(
            "CREATE TRIGGER reject_{event}_{table} BEFORE {event} ON {table} \
             BEGIN SELECT RAISE(ABORT, 'rejected by test trigger'); END"
        );
        sqlx::query(&sql)
            .execute(self.engine.database().pool())
            .await
            .unwrap();
    }

    pub fn single(&self, warehouse_id: &str) -> WarehouseTargets {
        WarehouseTargets::single(warehouse_id)
    }

    pub fn w1_to_w2(&self) -> WarehouseTargets {
        WarehouseTargets::transfer(self.w1.as_str(), self.w2.as_str())
    }
}
