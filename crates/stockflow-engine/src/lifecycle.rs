//! # Lifecycle Controller
//!
//! Moves inventory transactions through their states and drives the
//! ledger while doing so.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   create ──► PENDING ──approve──► COMPLETED ──delete──► (gone)         │
//! │                 │   (apply effects)     (reverse effects first;         │
//! │                 │                        count: rejected)               │
//! │                 ├──cancel──► CANCELLED ──delete──► (gone)               │
//! │                 │                                                       │
//! │                 └──delete──► (gone)                                     │
//! │                                                                         │
//! │   update: PENDING only, header fields plus optional wholesale item     │
//! │   replacement. Status only moves through approve / cancel.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Partial Failure
//! The store commits each row on its own. Deltas are applied strictly in
//! line order, one at a time. When a later step fails after earlier ones
//! landed, nothing is rolled back: the caller gets
//! [`EngineError::PartialFailure`] naming the stage, how far it got, and
//! the first failing product/warehouse pair.
//!
//! ## Claims
//! Approve, update and delete first claim the header, conditional on the
//! status they loaded. A second request on the same transaction gets
//! [`EngineError::InProgress`] and writes nothing, so a double-clicked
//! approve or delete moves stock once.
//!
//! Every call carries an explicit [`Actor`]; there is no ambient tenant.

use chrono::{DateTime, Datelike, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult, FailureStage};
use crate::ledger::StockLedger;
use crate::numbering::NumberAllocator;
use stockflow_core::effects::{compute_effects, compute_reversal, EffectPlan, LedgerOp};
use stockflow_core::lifecycle::{
    ensure_can_approve, ensure_can_cancel, ensure_can_update, plan_delete, DeletePlan,
};
use stockflow_core::numbering::number_prefix;
use stockflow_core::validation::{
    validate_actor, validate_items, validate_new_transaction, validate_targets, validate_text,
};
use stockflow_core::{
    Actor, InventoryTransaction, InventoryTransactionItem, NewTransaction, NewTransactionItem,
    TransactionPatch, TransactionStatus, ValidationError, WarehouseTargets, MAX_NOTES_LEN,
    MAX_REFERENCE_LEN,
};
use stockflow_db::Database;

// =============================================================================
// Engine
// =============================================================================

/// Entry point for every inventory operation.
///
/// Cloning is cheap; clones share the connection pool.
///
/// ## Usage
/// ```rust,ignore
/// let engine = InventoryEngine::connect(&EngineConfig::load()?).await?;
/// let actor = Actor::new("user-1", "tenant-1");
///
/// let tx = engine.create_transaction(&actor, receipt).await?;
/// engine.approve_transaction(&actor, &tx.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct InventoryEngine {
    pub(crate) db: Database,
    pub(crate) ledger: StockLedger,
    numbers: NumberAllocator,
    number_retries: u32,
}

impl InventoryEngine {
    /// Creates an engine over an open database.
    pub fn new(db: Database, config: &EngineConfig) -> Self {
        InventoryEngine {
            ledger: StockLedger::new(&db, config.engine.stock_cas_retries),
            numbers: NumberAllocator::new(&db),
            number_retries: config.engine.number_retries.max(1),
            db,
        }
    }

    /// Opens the configured database (running migrations) and creates an
    /// engine over it.
    pub async fn connect(config: &EngineConfig) -> EngineResult<Self> {
        let db = Database::new(config.db_config()).await?;
        Ok(Self::new(db, config))
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    // =========================================================================
    // Create / Read
    // =========================================================================

    /// Creates a pending transaction. No ledger interaction.
    ///
    /// Warehouse references the type does not use are dropped; the ones it
    /// needs must exist, be active, and belong to the actor's tenant.
    pub async fn create_transaction(
        &self,
        actor: &Actor,
        mut input: NewTransaction,
    ) -> EngineResult<InventoryTransaction> {
        validate_actor(actor)?;
        input.targets = input.targets.clone().normalized_for(input.transaction_type);
        validate_new_transaction(&input)?;
        self.ensure_warehouses(actor, &input.targets).await?;

        let now = Utc::now();
        let mut header = InventoryTransaction {
            id: Uuid::new_v4().to_string(),
            tenant_id: actor.tenant_id.clone(),
            number: String::new(),
            transaction_type: input.transaction_type,
            status: TransactionStatus::Pending,
            warehouse_id: input.targets.warehouse_id.clone(),
            from_warehouse_id: input.targets.from_warehouse_id.clone(),
            to_warehouse_id: input.targets.to_warehouse_id.clone(),
            warehouse_name: None,
            from_warehouse_name: None,
            to_warehouse_name: None,
            date: input.date,
            reference_number: input.reference_number.clone(),
            notes: input.notes.clone(),
            approved_by: None,
            approved_at: None,
            created_by: Some(actor.user_id.clone()),
            created_at: now,
            updated_at: now,
            items: Vec::new(),
        };

        self.insert_with_number(&mut header, now.year()).await?;

        let repo = self.db.transactions();
        let items = build_items(&header.id, &input.items, now);
        if let Err(e) = repo.insert_items(&items).await {
            // lines are all-or-nothing, so only the bare header is left to undo
            if let Err(cleanup) = repo.delete_header(&header.id).await {
                error!(
                    transaction_id = %header.id,
                    number = %header.number,
                    error = %cleanup,
                    "Header without items left behind"
                );
            }
            return Err(e.into());
        }

        info!(
            transaction_id = %header.id,
            number = %header.number,
            transaction_type = %header.transaction_type,
            items = items.len(),
            "Transaction created"
        );

        self.fetch(&header.id).await
    }

    /// Gets a transaction with items and warehouse names.
    ///
    /// Another tenant's transaction reads as absent.
    pub async fn get_transaction(
        &self,
        actor: &Actor,
        id: &str,
    ) -> EngineResult<Option<InventoryTransaction>> {
        validate_actor(actor)?;
        let tx = self.db.transactions().get_by_id(id).await?;
        Ok(tx.filter(|t| t.tenant_id == actor.tenant_id))
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Patches header fields and optionally replaces all items.
    ///
    /// ## Errors
    /// - `InvalidTransition` unless the transaction is pending
    /// - `InProgress` while another request approves, edits or deletes it
    /// - `PartialFailure` (stage `ItemReplace`) when the old items were
    ///   removed but the new ones could not be written
    pub async fn update_transaction(
        &self,
        actor: &Actor,
        id: &str,
        patch: TransactionPatch,
    ) -> EngineResult<InventoryTransaction> {
        let tx = self.load_owned(actor, id).await?;
        ensure_can_update(&tx.number, tx.status)?;

        let targets = patch
            .merged_targets(&tx.targets())
            .normalized_for(tx.transaction_type);
        validate_targets(tx.transaction_type, &targets)?;
        validate_text(
            "reference_number",
            patch.reference_number.as_ref().and_then(|r| r.as_deref()),
            MAX_REFERENCE_LEN,
        )?;
        validate_text(
            "notes",
            patch.notes.as_ref().and_then(|n| n.as_deref()),
            MAX_NOTES_LEN,
        )?;
        if let Some(items) = &patch.items {
            validate_items(tx.transaction_type, items)?;
        }
        self.ensure_warehouses(actor, &targets).await?;

        let token = self.claim(&tx, TransactionStatus::Pending).await?;
        let result = self.write_update(tx, targets, patch, &token).await;
        self.release(id, &token).await;
        result?;

        info!(transaction_id = %id, "Transaction updated");
        self.fetch(id).await
    }

    /// Header and item writes of an update, under a held claim.
    async fn write_update(
        &self,
        mut tx: InventoryTransaction,
        targets: WarehouseTargets,
        patch: TransactionPatch,
        token: &str,
    ) -> EngineResult<()> {
        let now = Utc::now();
        tx.warehouse_id = targets.warehouse_id;
        tx.from_warehouse_id = targets.from_warehouse_id;
        tx.to_warehouse_id = targets.to_warehouse_id;
        if let Some(date) = patch.date {
            tx.date = date;
        }
        if let Some(reference) = patch.reference_number {
            tx.reference_number = reference;
        }
        if let Some(notes) = patch.notes {
            tx.notes = notes;
        }
        tx.updated_at = now;

        let repo = self.db.transactions();
        if !repo.update_header(&tx, token).await? {
            return Err(EngineError::StatusChanged { number: tx.number });
        }

        if let Some(items) = patch.items {
            let removed = repo.delete_items(&tx.id).await?;
            let rows = build_items(&tx.id, &items, now);
            if let Err(e) = repo.insert_items(&rows).await {
                if removed == 0 {
                    return Err(e.into());
                }
                error!(
                    number = %tx.number,
                    removed,
                    error = %e,
                    "Items removed but replacements not written"
                );
                return Err(EngineError::PartialFailure {
                    number: tx.number,
                    stage: FailureStage::ItemReplace,
                    applied: 0,
                    total: rows.len(),
                    product_id: None,
                    warehouse_id: None,
                    cause: Box::new(e.into()),
                });
            }
        }
        Ok(())
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// `pending → completed`: applies every line's effect, then flips the
    /// status and stamps the approver.
    ///
    /// ## Errors
    /// - `InvalidTransition` when not pending; nothing is applied
    /// - `InProgress` when another request already holds the transaction;
    ///   a double-clicked approve applies its effects once
    /// - the ledger error itself when the first delta fails; nothing applied
    /// - `PartialFailure` when a later delta (or the final status write)
    ///   fails; earlier deltas stay applied and the status stays pending
    pub async fn approve_transaction(&self, actor: &Actor, id: &str) -> EngineResult<()> {
        let tx = self.load_owned(actor, id).await?;
        ensure_can_approve(&tx.number, tx.status)?;
        let token = self.claim(&tx, TransactionStatus::Pending).await?;

        let plan = compute_effects(tx.transaction_type, &tx.items, &tx.targets());
        warn_skipped(&tx.number, &plan);

        let now = Utc::now();
        let applied = match self
            .apply_plan(&actor.tenant_id, &tx.number, FailureStage::Apply, &plan, now)
            .await
        {
            Ok(n) => n,
            Err(e) => {
                self.release(&tx.id, &token).await;
                return Err(e);
            }
        };

        let finalized = match self
            .db
            .transactions()
            .mark_completed(&tx.id, &actor.user_id, now, &token)
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => Err(EngineError::StatusChanged {
                number: tx.number.clone(),
            }),
            Err(e) => Err(e.into()),
        };
        if let Err(cause) = finalized {
            self.release(&tx.id, &token).await;
            return Err(after_effects(&tx.number, FailureStage::Finalize, applied, cause));
        }

        info!(
            transaction_id = %tx.id,
            number = %tx.number,
            deltas = applied,
            approved_by = %actor.user_id,
            "Transaction approved"
        );
        Ok(())
    }

    /// `pending → cancelled`. No ledger interaction.
    pub async fn cancel_transaction(&self, actor: &Actor, id: &str) -> EngineResult<()> {
        let tx = self.load_owned(actor, id).await?;
        ensure_can_cancel(&tx.number, tx.status)?;

        let repo = self.db.transactions();
        if !repo.mark_cancelled(&tx.id, Utc::now()).await? {
            let still_pending = repo
                .get_by_id(&tx.id)
                .await?
                .is_some_and(|t| t.status == TransactionStatus::Pending);
            return Err(if still_pending {
                EngineError::InProgress { number: tx.number }
            } else {
                EngineError::StatusChanged { number: tx.number }
            });
        }

        info!(transaction_id = %tx.id, number = %tx.number, "Transaction cancelled");
        Ok(())
    }

    /// Removes a transaction, reversing its effects first when completed.
    ///
    /// ## Errors
    /// - `CountNotReversible` for a completed count; nothing is touched
    /// - `InProgress` when another request already holds the transaction;
    ///   a double-clicked delete reverses once
    /// - `PartialFailure` (stage `Reverse`) when a later reversal delta fails
    /// - `PartialFailure` (stage `Delete`) when the items went but the
    ///   header could not be removed
    pub async fn delete_transaction(&self, actor: &Actor, id: &str) -> EngineResult<()> {
        let tx = self.load_owned(actor, id).await?;
        let plan = plan_delete(&tx.number, tx.transaction_type, tx.status)?;
        let token = self.claim(&tx, tx.status).await?;

        let result = self.remove(actor, &tx, plan).await;
        if result.is_err() {
            self.release(&tx.id, &token).await;
        }
        result
    }

    /// Reversal and row removal of a delete, under a held claim.
    async fn remove(&self, actor: &Actor, tx: &InventoryTransaction, plan: DeletePlan) -> EngineResult<()> {
        let reversed = match plan {
            DeletePlan::ReverseThenRemove => {
                let reversal =
                    compute_reversal(&tx.number, tx.transaction_type, &tx.items, &tx.targets())?;
                warn_skipped(&tx.number, &reversal);
                self.apply_plan(
                    &actor.tenant_id,
                    &tx.number,
                    FailureStage::Reverse,
                    &reversal,
                    Utc::now(),
                )
                .await?
            }
            DeletePlan::RemoveOnly => 0,
        };

        let repo = self.db.transactions();
        let removed = match repo.delete_items(&tx.id).await {
            Ok(n) => n,
            Err(e) => return Err(after_effects(&tx.number, FailureStage::Delete, reversed, e.into())),
        };

        let header = match repo.delete_header(&tx.id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(EngineError::not_found("Transaction", &tx.id)),
            Err(e) => Err(e.into()),
        };
        if let Err(cause) = header {
            if reversed == 0 && removed == 0 {
                return Err(cause);
            }
            error!(
                number = %tx.number,
                removed_items = removed,
                reversed,
                error = %cause,
                "Items removed but header still present"
            );
            return Err(EngineError::PartialFailure {
                number: tx.number.clone(),
                stage: FailureStage::Delete,
                applied: reversed,
                total: reversed,
                product_id: None,
                warehouse_id: None,
                cause: Box::new(cause),
            });
        }

        info!(
            transaction_id = %tx.id,
            number = %tx.number,
            reversed,
            "Transaction deleted"
        );
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Loads a transaction the actor's tenant owns.
    async fn load_owned(&self, actor: &Actor, id: &str) -> EngineResult<InventoryTransaction> {
        validate_actor(actor)?;
        let tx = self
            .db
            .transactions()
            .get_by_id(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Transaction", id))?;

        if tx.tenant_id != actor.tenant_id {
            warn!(
                transaction_id = %id,
                tenant_id = %actor.tenant_id,
                "Cross-tenant access rejected"
            );
            return Err(EngineError::forbidden("Transaction", id));
        }
        Ok(tx)
    }

    /// Takes the transaction for this request while it is still in
    /// `status`. Returns the token that releases it.
    async fn claim(&self, tx: &InventoryTransaction, status: TransactionStatus) -> EngineResult<String> {
        let repo = self.db.transactions();
        let token = Uuid::new_v4().to_string();
        if repo.claim(&tx.id, status, &token).await? {
            return Ok(token);
        }

        // lost to a concurrent request; report what it did
        match repo.get_by_id(&tx.id).await? {
            None => Err(EngineError::not_found("Transaction", &tx.id)),
            Some(current) if current.status != status => Err(EngineError::StatusChanged {
                number: tx.number.clone(),
            }),
            Some(_) => {
                debug!(transaction_id = %tx.id, number = %tx.number, "Transaction already claimed");
                Err(EngineError::InProgress {
                    number: tx.number.clone(),
                })
            }
        }
    }

    /// Drops a claim after the operation stopped early. A failed release
    /// is logged; the caller's own error is what gets reported.
    async fn release(&self, id: &str, token: &str) {
        if let Err(e) = self.db.transactions().release_claim(id, token).await {
            error!(transaction_id = %id, error = %e, "Transaction claim not released");
        }
    }

    async fn fetch(&self, id: &str) -> EngineResult<InventoryTransaction> {
        self.db
            .transactions()
            .get_by_id(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Transaction", id))
    }

    /// Every referenced warehouse must be the tenant's and active.
    async fn ensure_warehouses(&self, actor: &Actor, targets: &WarehouseTargets) -> EngineResult<()> {
        let repo = self.db.warehouses();
        let ids = [
            &targets.warehouse_id,
            &targets.from_warehouse_id,
            &targets.to_warehouse_id,
        ];

        for id in ids.into_iter().flatten() {
            let warehouse = repo
                .get_by_id(id)
                .await?
                .filter(|w| w.tenant_id == actor.tenant_id)
                .ok_or_else(|| EngineError::not_found("Warehouse", id.as_str()))?;

            if !warehouse.is_active {
                return Err(ValidationError::Conflicting {
                    field: "warehouse_id".to_string(),
                    reason: format!("warehouse {} is inactive", warehouse.code),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Inserts the header, allocating a fresh number per attempt.
    async fn insert_with_number(&self, header: &mut InventoryTransaction, year: i32) -> EngineResult<()> {
        let repo = self.db.transactions();

        for attempt in 1..=self.number_retries {
            header.number = self
                .numbers
                .allocate(&header.tenant_id, header.transaction_type, year)
                .await?;

            match repo.insert(header).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_unique_violation_on("transaction_number") => {
                    warn!(number = %header.number, attempt, "Transaction number taken, reallocating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(EngineError::NumberConflict {
            prefix: number_prefix(header.transaction_type, year),
            attempts: self.number_retries,
        })
    }

    /// Applies a plan in order. Returns how many deltas landed.
    async fn apply_plan(
        &self,
        tenant_id: &str,
        number: &str,
        stage: FailureStage,
        plan: &EffectPlan,
        at: DateTime<Utc>,
    ) -> EngineResult<usize> {
        let total = plan.deltas.len();

        for (applied, delta) in plan.deltas.iter().enumerate() {
            match self.ledger.apply(tenant_id, delta, at).await {
                Ok(entry) => {
                    if let LedgerOp::Set(_) = delta.op {
                        info!(
                            number = %number,
                            product_id = %entry.product_id,
                            warehouse_id = %entry.warehouse_id,
                            previous = %entry.previous.unwrap_or_default(),
                            counted = %entry.quantity,
                            difference = %entry.difference(),
                            "Count applied"
                        );
                    }
                }
                Err(cause) if applied == 0 => return Err(cause),
                Err(cause) => {
                    error!(
                        number = %number,
                        stage = %stage,
                        applied,
                        total,
                        product_id = %delta.product_id,
                        warehouse_id = %delta.warehouse_id,
                        error = %cause,
                        "Ledger partially mutated"
                    );
                    return Err(EngineError::PartialFailure {
                        number: number.to_string(),
                        stage,
                        applied,
                        total,
                        product_id: Some(delta.product_id.clone()),
                        warehouse_id: Some(delta.warehouse_id.clone()),
                        cause: Box::new(cause),
                    });
                }
            }
        }

        Ok(total)
    }
}

/// Wraps a failure that happened after `applied` deltas already landed.
fn after_effects(number: &str, stage: FailureStage, applied: usize, cause: EngineError) -> EngineError {
    if applied == 0 {
        return cause;
    }
    error!(number = %number, stage = %stage, applied, error = %cause, "Effects applied but step failed");
    EngineError::PartialFailure {
        number: number.to_string(),
        stage,
        applied,
        total: applied,
        product_id: None,
        warehouse_id: None,
        cause: Box::new(cause),
    }
}

fn warn_skipped(number: &str, plan: &EffectPlan) {
    for line in &plan.skipped {
        warn!(
            number = %number,
            line = line.index + 1,
            product_id = %line.product_id,
            missing = line.missing,
            "Line produced no ledger effect"
        );
    }
}

/// Stored rows for caller-supplied lines, numbered from 1.
fn build_items(
    transaction_id: &str,
    items: &[NewTransactionItem],
    at: DateTime<Utc>,
) -> Vec<InventoryTransactionItem> {
    items
        .iter()
        .zip(1_i64..)
        .map(|(item, line_no)| InventoryTransactionItem {
            id: Uuid::new_v4().to_string(),
            transaction_id: transaction_id.to_string(),
            line_no,
            product_id: item.product_id.clone(),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit: item.unit.clone(),
            unit_cost: item.unit_cost,
            notes: item.notes.clone(),
            created_at: at,
        })
        .collect()
}
