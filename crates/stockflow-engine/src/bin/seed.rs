//! # Demo Scenario Runner
//!
//! Creates two warehouses for a fresh demo tenant and walks through the
//! receipt / issue / transfer / count lifecycle, printing stock after
//! every step.
//!
//! ## Usage
//! ```bash
//! # Uses STOCKFLOW_* variables / STOCKFLOW_CONFIG, default ./stockflow.db
//! cargo run -p stockflow-engine --bin seed
//!
//! # Specify database path
//! cargo run -p stockflow-engine --bin seed -- --db ./data/demo.db
//!
//! # More log output
//! RUST_LOG=stockflow_engine=debug,stockflow_db=debug cargo run -p stockflow-engine --bin seed
//! ```

use chrono::Utc;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use stockflow_core::{
    Actor, NewTransaction, NewTransactionItem, Quantity, TransactionType, WarehouseTargets,
};
use stockflow_engine::{EngineConfig, EngineResult, InventoryEngine};

const PRODUCT_ID: &str = "demo-bolt-m8";
const PRODUCT_NAME: &str = "Hex bolt M8x40";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut config = EngineConfig::load()?;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database.path = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockflow demo scenarios");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: from config)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => {
                eprintln!("Ignoring unknown argument {}", other);
            }
        }
        i += 1;
    }

    println!("Stockflow demo scenarios");
    println!("========================");
    println!("Database: {}", config.database.path.display());
    println!();

    let engine = InventoryEngine::connect(&config).await?;

    // fresh tenant per run so warehouse codes and numbers never collide
    let tenant = format!("demo-{}", &Uuid::new_v4().simple().to_string()[..8]);
    let actor = Actor::new("demo-user", tenant.as_str());

    let w1 = engine.create_warehouse(&actor, "W1", "Main Warehouse").await?;
    let w2 = engine.create_warehouse(&actor, "W2", "Overflow Depot").await?;
    println!("✓ Tenant {} with warehouses {} and {}", tenant, w1.code, w2.code);
    println!();

    // Receipt of 10 into W1, then delete it again
    let receipt = create(&engine, &actor, TransactionType::Receipt, WarehouseTargets::single(&w1.id), 10).await?;
    engine.approve_transaction(&actor, &receipt).await?;
    show(&engine, &actor, "receipt 10 approved", &[w1.id.as_str()]).await?;
    engine.delete_transaction(&actor, &receipt).await?;
    show(&engine, &actor, "receipt deleted", &[w1.id.as_str()]).await?;

    // Stock W1 back up to 10, issue 4
    let receipt = create(&engine, &actor, TransactionType::Receipt, WarehouseTargets::single(&w1.id), 10).await?;
    engine.approve_transaction(&actor, &receipt).await?;
    let issue = create(&engine, &actor, TransactionType::Issue, WarehouseTargets::single(&w1.id), 4).await?;
    engine.approve_transaction(&actor, &issue).await?;
    show(&engine, &actor, "issue 4 approved", &[w1.id.as_str()]).await?;

    // Issue more than is on hand
    let too_much = create(&engine, &actor, TransactionType::Issue, WarehouseTargets::single(&w1.id), 20).await?;
    match engine.approve_transaction(&actor, &too_much).await {
        Ok(()) => println!("✗ issue 20 unexpectedly approved"),
        Err(e) => println!("✓ issue 20 rejected: {}", e),
    }
    engine.cancel_transaction(&actor, &too_much).await?;
    show(&engine, &actor, "after rejected issue", &[w1.id.as_str()]).await?;

    // Transfer 3 from W1 to W2, then delete it
    let transfer = create(
        &engine,
        &actor,
        TransactionType::Transfer,
        WarehouseTargets::transfer(&w1.id, &w2.id),
        3,
    )
    .await?;
    engine.approve_transaction(&actor, &transfer).await?;
    show(&engine, &actor, "transfer 3 approved", &[w1.id.as_str(), w2.id.as_str()]).await?;
    engine.delete_transaction(&actor, &transfer).await?;
    show(&engine, &actor, "transfer deleted", &[w1.id.as_str(), w2.id.as_str()]).await?;

    // Move 3 again, then count W2 at 1
    let transfer = create(
        &engine,
        &actor,
        TransactionType::Transfer,
        WarehouseTargets::transfer(&w1.id, &w2.id),
        3,
    )
    .await?;
    engine.approve_transaction(&actor, &transfer).await?;
    let count = create(&engine, &actor, TransactionType::Count, WarehouseTargets::single(&w2.id), 1).await?;
    engine.approve_transaction(&actor, &count).await?;
    show(&engine, &actor, "count 1 on W2 approved", &[w1.id.as_str(), w2.id.as_str()]).await?;
    match engine.delete_transaction(&actor, &count).await {
        Ok(()) => println!("✗ completed count unexpectedly deleted"),
        Err(e) => println!("✓ count delete rejected: {}", e),
    }

    let stats = engine.get_stats(&actor).await?;
    println!();
    println!(
        "✓ {} transactions: {} pending, {} completed, {} cancelled",
        stats.total, stats.by_status.pending, stats.by_status.completed, stats.by_status.cancelled
    );

    engine.database().close().await;
    Ok(())
}

/// Creates a one-line transaction for the demo product and returns its id.
async fn create(
    engine: &InventoryEngine,
    actor: &Actor,
    transaction_type: TransactionType,
    targets: WarehouseTargets,
    units: i64,
) -> EngineResult<String> {
    let tx = engine
        .create_transaction(
            actor,
            NewTransaction {
                transaction_type,
                targets,
                date: Utc::now(),
                reference_number: None,
                notes: Some("demo".to_string()),
                items: vec![NewTransactionItem::new(
                    PRODUCT_ID,
                    PRODUCT_NAME,
                    Quantity::from_units(units),
                    "pcs",
                )],
            },
        )
        .await?;
    println!("  created {} ({})", tx.number, tx.transaction_type);
    Ok(tx.id)
}

async fn show(
    engine: &InventoryEngine,
    actor: &Actor,
    label: &str,
    warehouses: &[&str],
) -> EngineResult<()> {
    let mut parts = Vec::with_capacity(warehouses.len());
    for warehouse_id in warehouses {
        let qty = engine
            .get_stock(actor, PRODUCT_ID, warehouse_id)
            .await?
            .map(|row| row.quantity)
            .unwrap_or_default();
        parts.push(qty.to_string());
    }
    println!("✓ {:<24} stock: {}", label, parts.join(" / "));
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - Default: info, with sqlx quieted to warnings
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
