//! # Domain Types
//!
//! Core domain types of the inventory transaction engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────────┐      ┌──────────────────────────┐            │
//! │  │ InventoryTransaction │ 1──N │ InventoryTransactionItem │            │
//! │  │  ──────────────────  │      │  ──────────────────────  │            │
//! │  │  id (UUID)           │      │  transaction_id (FK)     │            │
//! │  │  number STG-2026-0001│      │  product_id / name       │            │
//! │  │  transaction_type    │      │  quantity (Quantity)     │            │
//! │  │  status              │      │  unit / unit_cost        │            │
//! │  │  warehouse targets   │      └──────────────────────────┘            │
//! │  └──────────────────────┘                                               │
//! │                                                                         │
//! │  ┌──────────────────────┐      ┌──────────────────────────┐            │
//! │  │   WarehouseStock     │      │        Warehouse         │            │
//! │  │  ──────────────────  │      │  ──────────────────────  │            │
//! │  │  (product, warehouse)│ N──1 │  id / code / name        │            │
//! │  │  quantity ≥ 0        │      └──────────────────────────┘            │
//! │  │  version (CAS)       │                                               │
//! │  └──────────────────────┘                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every transaction has:
//! - `id`: UUID v4 - immutable, used for relations
//! - `number`: human-readable sequence, assigned once at creation

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::quantity::Quantity;

// =============================================================================
// Transaction Type
// =============================================================================

/// The kind of stock movement a transaction records.
///
/// Adding a variant here is a compile error in every `match` of the
/// effect calculator and the numbering table until it is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Goods arriving into one warehouse.
    Receipt,
    /// Goods leaving one warehouse.
    Issue,
    /// Goods moving between two warehouses.
    Transfer,
    /// Physical count: the line quantity is the observed on-hand amount.
    Count,
}

impl TransactionType {
    /// All transaction types, in display order.
    pub const ALL: [TransactionType; 4] = [
        TransactionType::Receipt,
        TransactionType::Issue,
        TransactionType::Transfer,
        TransactionType::Count,
    ];

    /// Storage / wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Receipt => "receipt",
            TransactionType::Issue => "issue",
            TransactionType::Transfer => "transfer",
            TransactionType::Count => "count",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the canonical names plus the legacy Turkish codes
/// (`giris`, `cikis`, `sayim`) still found in imported data.
impl FromStr for TransactionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "receipt" | "giris" => Ok(TransactionType::Receipt),
            "issue" | "cikis" => Ok(TransactionType::Issue),
            "transfer" => Ok(TransactionType::Transfer),
            "count" | "sayim" => Ok(TransactionType::Count),
            other => Err(ValidationError::InvalidFormat {
                field: "transaction_type".to_string(),
                reason: format!(
                    "unknown type '{}'; expected receipt, issue, transfer or count",
                    other
                ),
            }),
        }
    }
}

// =============================================================================
// Transaction Status
// =============================================================================

/// Lifecycle status of a transaction.
///
/// ```text
///   pending ──approve──► completed ──delete (reverse)──► (gone)
///      │
///      └──cancel──► cancelled ──delete──► (gone)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Created, no ledger effect yet.
    #[default]
    Pending,
    /// Effects applied to the ledger.
    Completed,
    /// Abandoned before approval; never had effects.
    Cancelled,
}

impl TransactionStatus {
    /// All statuses, in display order.
    pub const ALL: [TransactionStatus; 3] = [
        TransactionStatus::Pending,
        TransactionStatus::Completed,
        TransactionStatus::Cancelled,
    ];

    /// Storage / wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(TransactionStatus::Pending),
            "completed" => Ok(TransactionStatus::Completed),
            "cancelled" | "canceled" => Ok(TransactionStatus::Cancelled),
            other => Err(ValidationError::InvalidFormat {
                field: "status".to_string(),
                reason: format!("unknown status '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Actor
// =============================================================================

/// The caller of an engine operation.
///
/// Resolved by the auth layer per request and passed into every call.
/// There is no process-wide "current tenant".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Actor {
    /// Authenticated user id.
    pub user_id: String,
    /// Organization the user acts for.
    pub tenant_id: String,
}

impl Actor {
    /// Creates an actor.
    pub fn new(user_id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Actor {
            user_id: user_id.into(),
            tenant_id: tenant_id.into(),
        }
    }
}

// =============================================================================
// Warehouse Targets
// =============================================================================

/// Warehouse references carried by a transaction header.
///
/// `warehouse_id` is used by receipt, issue and count; the `from`/`to`
/// pair only by transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WarehouseTargets {
    pub warehouse_id: Option<String>,
    pub from_warehouse_id: Option<String>,
    pub to_warehouse_id: Option<String>,
}

impl WarehouseTargets {
    /// Targets for a single-warehouse transaction.
    pub fn single(warehouse_id: impl Into<String>) -> Self {
        WarehouseTargets {
            warehouse_id: Some(warehouse_id.into()),
            ..Default::default()
        }
    }

    /// Targets for a transfer.
    pub fn transfer(from: impl Into<String>, to: impl Into<String>) -> Self {
        WarehouseTargets {
            warehouse_id: None,
            from_warehouse_id: Some(from.into()),
            to_warehouse_id: Some(to.into()),
        }
    }

    /// Drops the references the given type does not use.
    pub fn normalized_for(self, transaction_type: TransactionType) -> Self {
        match transaction_type {
            TransactionType::Transfer => WarehouseTargets {
                warehouse_id: None,
                ..self
            },
            TransactionType::Receipt | TransactionType::Issue | TransactionType::Count => {
                WarehouseTargets {
                    warehouse_id: self.warehouse_id,
                    from_warehouse_id: None,
                    to_warehouse_id: None,
                }
            }
        }
    }
}

// =============================================================================
// Stock Lines
// =============================================================================

/// Anything that names a product and a quantity: stored items as well as
/// items about to be inserted.
pub trait StockLine {
    fn product_id(&self) -> &str;
    fn product_name(&self) -> &str;
    fn quantity(&self) -> Quantity;
}

/// A line item as supplied by the caller on create/update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewTransactionItem {
    pub product_id: String,
    /// Product label, frozen on the line.
    pub product_name: String,
    pub quantity: Quantity,
    pub unit: String,
    pub unit_cost: Option<Money>,
    pub notes: Option<String>,
}

impl NewTransactionItem {
    /// Creates a line without cost or notes.
    pub fn new(
        product_id: impl Into<String>,
        product_name: impl Into<String>,
        quantity: Quantity,
        unit: impl Into<String>,
    ) -> Self {
        NewTransactionItem {
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            unit: unit.into(),
            unit_cost: None,
            notes: None,
        }
    }

    /// Sets the unit cost.
    pub fn with_unit_cost(mut self, cost: Money) -> Self {
        self.unit_cost = Some(cost);
        self
    }

    /// Sets line notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

impl StockLine for NewTransactionItem {
    fn product_id(&self) -> &str {
        &self.product_id
    }

    fn product_name(&self) -> &str {
        &self.product_name
    }

    fn quantity(&self) -> Quantity {
        self.quantity
    }
}

/// A stored line item. Owned by exactly one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryTransactionItem {
    pub id: String,
    pub transaction_id: String,
    /// Position within the transaction; effects are applied in this order.
    pub line_no: i64,
    pub product_id: String,
    pub product_name: String,
    /// Moved amount, or the observed amount for a count.
    pub quantity: Quantity,
    pub unit: String,
    pub unit_cost: Option<Money>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl InventoryTransactionItem {
    /// Quantity × unit cost, `None` when no cost is known.
    ///
    /// ## Errors
    /// `CostOverflow` when the product does not fit in i64 cents.
    pub fn line_cost(&self) -> CoreResult<Option<Money>> {
        let Some(cost) = self.unit_cost else {
            return Ok(None);
        };
        cost.checked_times_quantity(self.quantity)
            .map(Some)
            .ok_or_else(|| CoreError::CostOverflow {
                product_id: self.product_id.clone(),
            })
    }
}

impl StockLine for InventoryTransactionItem {
    fn product_id(&self) -> &str {
        &self.product_id
    }

    fn product_name(&self) -> &str {
        &self.product_name
    }

    fn quantity(&self) -> Quantity {
        self.quantity
    }
}

// =============================================================================
// Inventory Transaction
// =============================================================================

/// A transaction header with its items and resolved warehouse names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryTransaction {
    pub id: String,
    pub tenant_id: String,
    /// Human-readable sequence, e.g. `STG-2026-0001`. Immutable.
    pub number: String,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub warehouse_id: Option<String>,
    pub from_warehouse_id: Option<String>,
    pub to_warehouse_id: Option<String>,
    pub warehouse_name: Option<String>,
    pub from_warehouse_name: Option<String>,
    pub to_warehouse_name: Option<String>,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub approved_by: Option<String>,
    #[ts(as = "Option<String>")]
    pub approved_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    pub items: Vec<InventoryTransactionItem>,
}

impl InventoryTransaction {
    /// The warehouse references of this header.
    pub fn targets(&self) -> WarehouseTargets {
        WarehouseTargets {
            warehouse_id: self.warehouse_id.clone(),
            from_warehouse_id: self.from_warehouse_id.clone(),
            to_warehouse_id: self.to_warehouse_id.clone(),
        }
    }

    /// Sum of known line costs. Lines without a unit cost count as zero.
    ///
    /// ## Errors
    /// `CostOverflow` naming the first line whose cost, or the running
    /// total including it, leaves the i64 range.
    pub fn total_cost(&self) -> CoreResult<Money> {
        self.items.iter().try_fold(Money::zero(), |total, item| {
            let line = item.line_cost()?.unwrap_or_default();
            total.checked_add(line).ok_or_else(|| CoreError::CostOverflow {
                product_id: item.product_id.clone(),
            })
        })
    }
}

/// Input of `createTransaction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewTransaction {
    pub transaction_type: TransactionType,
    pub targets: WarehouseTargets,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<NewTransactionItem>,
}

/// Input of `updateTransaction`.
///
/// Outer `None` leaves a field untouched; `Some(None)` clears it.
/// `items: Some(..)` replaces all lines. Status is not patchable; it only
/// moves through approve/cancel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionPatch {
    pub warehouse_id: Option<Option<String>>,
    pub from_warehouse_id: Option<Option<String>>,
    pub to_warehouse_id: Option<Option<String>>,
    pub date: Option<DateTime<Utc>>,
    pub reference_number: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub items: Option<Vec<NewTransactionItem>>,
}

impl TransactionPatch {
    /// Applies the warehouse part of the patch over existing targets.
    pub fn merged_targets(&self, current: &WarehouseTargets) -> WarehouseTargets {
        WarehouseTargets {
            warehouse_id: self
                .warehouse_id
                .clone()
                .unwrap_or_else(|| current.warehouse_id.clone()),
            from_warehouse_id: self
                .from_warehouse_id
                .clone()
                .unwrap_or_else(|| current.from_warehouse_id.clone()),
            to_warehouse_id: self
                .to_warehouse_id
                .clone()
                .unwrap_or_else(|| current.to_warehouse_id.clone()),
        }
    }
}

// =============================================================================
// Warehouse Stock
// =============================================================================

/// On-hand quantity of one product in one warehouse.
///
/// At most one row per `(product_id, warehouse_id)`. Rows are created lazily
/// and never deleted; a zero row means "tracked, currently empty".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct WarehouseStock {
    pub id: String,
    pub tenant_id: String,
    pub product_id: String,
    pub warehouse_id: String,
    /// Always ≥ 0.
    pub quantity: Quantity,
    /// Owned by the reservation workflow; this engine never writes it.
    pub reserved_quantity: Quantity,
    #[ts(as = "Option<String>")]
    pub last_transaction_date: Option<DateTime<Utc>>,
    /// Compare-and-swap stamp, bumped on every write.
    pub version: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl WarehouseStock {
    /// Quantity not held by reservations.
    pub fn available(&self) -> Quantity {
        self.quantity - self.reserved_quantity
    }
}

// =============================================================================
// Warehouse
// =============================================================================

/// A stock location owned by a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Warehouse {
    pub id: String,
    pub tenant_id: String,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Query Types
// =============================================================================

/// Filters of the transaction list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionFilters {
    pub transaction_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
    /// Matches the single warehouse or either end of a transfer.
    pub warehouse_id: Option<String>,
    /// Case-insensitive match on number, reference number or notes.
    pub search: Option<String>,
    /// First day included.
    pub date_from: Option<NaiveDate>,
    /// Last day included (the whole day).
    pub date_to: Option<NaiveDate>,
    /// Only transactions with at least one line for this product.
    pub product_id: Option<String>,
    pub limit: Option<u32>,
}

impl TransactionFilters {
    /// Converts the day range into `[from, until)` instants.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use stockflow_core::TransactionFilters;
    ///
    /// let filters = TransactionFilters {
    ///     date_to: NaiveDate::from_ymd_opt(2026, 3, 31),
    ///     ..Default::default()
    /// };
    /// let (_, until) = filters.date_bounds();
    /// assert_eq!(until.unwrap().to_rfc3339(), "2026-04-01T00:00:00+00:00");
    /// ```
    pub fn date_bounds(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let start_of = |d: NaiveDate| d.and_time(NaiveTime::MIN).and_utc();
        let from = self.date_from.map(start_of);
        let until = self.date_to.map(|d| start_of(d) + Duration::days(1));
        (from, until)
    }

    /// Trimmed search text, `None` when blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StatusCounts {
    pub pending: i64,
    pub completed: i64,
    pub cancelled: i64,
}

/// Counts per transaction type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TypeCounts {
    pub receipt: i64,
    pub issue: i64,
    pub transfer: i64,
    pub count: i64,
}

/// Summary of a tenant's transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionStats {
    pub total: i64,
    pub by_status: StatusCounts,
    pub by_type: TypeCounts,
}

impl TransactionStats {
    /// Adds `n` transactions of the given status.
    pub fn add_status(&mut self, status: TransactionStatus, n: i64) {
        match status {
            TransactionStatus::Pending => self.by_status.pending += n,
            TransactionStatus::Completed => self.by_status.completed += n,
            TransactionStatus::Cancelled => self.by_status.cancelled += n,
        }
    }

    /// Adds `n` transactions of the given type. Also feeds `total`.
    pub fn add_type(&mut self, transaction_type: TransactionType, n: i64) {
        match transaction_type {
            TransactionType::Receipt => self.by_type.receipt += n,
            TransactionType::Issue => self.by_type.issue += n,
            TransactionType::Transfer => self.by_type.transfer += n,
            TransactionType::Count => self.by_type.count += n,
        }
        self.total += n;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
