//! Read-side queries and the warehouse registry.

mod common;

use chrono::{NaiveDate, TimeZone, Utc};
use common::{harness, line, new_tx, units};
use stockflow_core::{TransactionFilters, TransactionStatus, TransactionType, WarehouseTargets};
use stockflow_engine::ErrorKind;

#[tokio::test]
async fn test_list_filters_by_type_status_and_warehouse() {
    let h = harness().await;

    h.post(TransactionType::Receipt, h.single(&h.w1), vec![line("P", 5)]).await;
    h.create(TransactionType::Issue, h.single(&h.w1), vec![line("P", 1)]).await;
    h.create(TransactionType::Transfer, h.w1_to_w2(), vec![line("P", 1)]).await;
    h.create(TransactionType::Receipt, h.single(&h.w2), vec![line("Q", 1)]).await;

    let all = h.engine.list_transactions(&h.actor, &TransactionFilters::default()).await.unwrap();
    assert_eq!(all.len(), 4);
    // newest first
    assert_eq!(all[0].warehouse_id.as_deref(), Some(h.w2.as_str()));

    let receipts = h
        .engine
        .list_transactions(
            &h.actor,
            &TransactionFilters {
                transaction_type: Some(TransactionType::Receipt),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(receipts.len(), 2);

    let completed = h
        .engine
        .list_transactions(
            &h.actor,
            &TransactionFilters {
                status: Some(TransactionStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(completed.len(), 1);

    // W2 matches its own receipt and the transfer destination
    let at_w2 = h
        .engine
        .list_transactions(
            &h.actor,
            &TransactionFilters {
                warehouse_id: Some(h.w2.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(at_w2.len(), 2);

    let limited = h
        .engine
        .list_transactions(
            &h.actor,
            &TransactionFilters {
                limit: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(limited.len(), 3);
}

#[tokio::test]
async fn test_list_by_product_and_search() {
    let h = harness().await;

    let mut tagged = new_tx(TransactionType::Receipt, h.single(&h.w1), vec![line("P", 1)]);
    tagged.reference_number = Some("PO-4471".to_string());
    let tagged = h.engine.create_transaction(&h.actor, tagged).await.unwrap();
    h.create(TransactionType::Receipt, h.single(&h.w1), vec![line("Q", 1), line("R", 1)]).await;

    let by_product = h
        .engine
        .list_transactions(
            &h.actor,
            &TransactionFilters {
                product_id: Some("R".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(by_product.len(), 1);
    assert_eq!(by_product[0].items.len(), 2);

    let none = h
        .engine
        .list_transactions(
            &h.actor,
            &TransactionFilters {
                product_id: Some("unknown".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(none.is_empty());

    let found = h
        .engine
        .list_transactions(
            &h.actor,
            &TransactionFilters {
                search: Some("po-44".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, tagged.id);

    let by_number = h
        .engine
        .list_transactions(
            &h.actor,
            &TransactionFilters {
                search: Some(tagged.number.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(by_number.len(), 1);
}

#[tokio::test]
async fn test_list_by_date_range_includes_last_day() {
    let h = harness().await;

    for day in [1, 15, 31] {
        let mut tx = new_tx(TransactionType::Receipt, h.single(&h.w1), vec![line("P", 1)]);
        tx.date = Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap();
        h.engine.create_transaction(&h.actor, tx).await.unwrap();
    }

    let range = h
        .engine
        .list_transactions(
            &h.actor,
            &TransactionFilters {
                date_from: NaiveDate::from_ymd_opt(2026, 3, 2),
                date_to: NaiveDate::from_ymd_opt(2026, 3, 31),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(range.len(), 2);
}

#[tokio::test]
async fn test_stats_count_by_status_and_type() {
    let h = harness().await;

    h.post(TransactionType::Receipt, h.single(&h.w1), vec![line("P", 5)]).await;
    h.post(TransactionType::Issue, h.single(&h.w1), vec![line("P", 1)]).await;
    let cancelled = h.create(TransactionType::Issue, h.single(&h.w1), vec![line("P", 1)]).await;
    h.engine.cancel_transaction(&h.actor, &cancelled).await.unwrap();
    h.create(TransactionType::Count, h.single(&h.w1), vec![line("P", 4)]).await;

    let stats = h.engine.get_stats(&h.actor).await.unwrap();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.by_status.completed, 2);
    assert_eq!(stats.by_status.cancelled, 1);
    assert_eq!(stats.by_status.pending, 1);
    assert_eq!(stats.by_type.receipt, 1);
    assert_eq!(stats.by_type.issue, 2);
    assert_eq!(stats.by_type.count, 1);
    assert_eq!(stats.by_type.transfer, 0);
}

#[tokio::test]
async fn test_stock_listings() {
    let h = harness().await;

    h.post(TransactionType::Receipt, h.single(&h.w1), vec![line("P", 5), line("Q", 2)]).await;
    h.post(TransactionType::Transfer, h.w1_to_w2(), vec![line("P", 3)]).await;

    let at_w1 = h.engine.list_warehouse_stock(&h.actor, &h.w1).await.unwrap();
    assert_eq!(at_w1.len(), 2);

    let p = h.engine.list_product_stock(&h.actor, "P").await.unwrap();
    assert_eq!(p.len(), 2);
    let total = p.iter().fold(units(0), |acc, row| acc + row.quantity);
    assert_eq!(total, units(5));
}

#[tokio::test]
async fn test_warehouse_registry() {
    let h = harness().await;

    let err = h.engine.create_warehouse(&h.actor, "W1", "Duplicate").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let err = h.engine.create_warehouse(&h.actor, "  ", "Blank").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    h.engine.set_warehouse_active(&h.actor, &h.w2, false).await.unwrap();
    let active = h.engine.list_warehouses(&h.actor, false).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].code, "W1");
    assert_eq!(h.engine.list_warehouses(&h.actor, true).await.unwrap().len(), 2);

    let err = h.engine.set_warehouse_active(&h.actor, "missing", true).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_inactive_warehouse_rejected_for_new_transactions() {
    let h = harness().await;
    h.post(TransactionType::Receipt, h.single(&h.w2), vec![line("P", 2)]).await;
    h.engine.set_warehouse_active(&h.actor, &h.w2, false).await.unwrap();

    let err = h
        .engine
        .create_transaction(
            &h.actor,
            new_tx(TransactionType::Transfer, h.w1_to_w2(), vec![line("P", 1)]),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    // stock stays readable
    assert_eq!(h.stock("P", &h.w2).await, units(2));
}

#[tokio::test]
async fn test_create_rejects_missing_or_equal_transfer_targets() {
    let h = harness().await;

    let err = h
        .engine
        .create_transaction(
            &h.actor,
            new_tx(
                TransactionType::Transfer,
                WarehouseTargets {
                    from_warehouse_id: Some(h.w1.clone()),
                    ..Default::default()
                },
                vec![line("P", 1)],
            ),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = h
        .engine
        .create_transaction(
            &h.actor,
            new_tx(
                TransactionType::Transfer,
                WarehouseTargets::transfer(h.w1.as_str(), h.w1.as_str()),
                vec![line("P", 1)],
            ),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = h
        .engine
        .create_transaction(
            &h.actor,
            new_tx(TransactionType::Receipt, h.single(&h.w1), vec![line("P", 0)]),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    // nothing was numbered or stored
    assert_eq!(h.engine.get_stats(&h.actor).await.unwrap().total, 0);
}

#[tokio::test]
async fn test_create_drops_unused_targets() {
    let h = harness().await;

    let tx = h
        .engine
        .create_transaction(
            &h.actor,
            new_tx(
                TransactionType::Receipt,
                WarehouseTargets {
                    warehouse_id: Some(h.w1.clone()),
                    from_warehouse_id: Some(h.w2.clone()),
                    to_warehouse_id: None,
                },
                vec![line("P", 1)],
            ),
        )
        .await
        .unwrap();

    assert_eq!(tx.warehouse_name.as_deref(), Some("Main Warehouse"));
    assert!(tx.from_warehouse_id.is_none());
    assert_eq!(tx.created_by.as_deref(), Some("user-1"));
    assert_eq!(tx.status, TransactionStatus::Pending);
}
