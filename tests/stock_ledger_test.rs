mod common;

use assert_matches::assert_matches;

use common::{seed_stock, setup, ACTOR};
use stockledger_api::{
    errors::ServiceError,
    models::{MovementKind, StockStatus},
    services::sales::CreateSale,
};

fn sale_input(stock_item_id: uuid::Uuid, quantity: i32) -> CreateSale {
    CreateSale {
        stock_item_id,
        buyer_name: "Walk-in".to_string(),
        buyer_contact: None,
        quantity,
    }
}

#[tokio::test]
async fn test_ledger_replay_matches_projection() {
    let app = setup().await;

    let (item, _) = seed_stock(&app.state, "Timber", 10).await;

    let sale = app
        .state
        .sales
        .create_sale(sale_input(item.id, 4), ACTOR)
        .await
        .unwrap();
    app.state.sales.cancel_sale(sale.id, ACTOR).await.unwrap();
    app.state
        .stock_items
        .adjust(item.id, -2, Some("damaged in storage".to_string()), ACTOR)
        .await
        .unwrap();
    app.state
        .stock_items
        .adjust(item.id, 5, Some("recount".to_string()), ACTOR)
        .await
        .unwrap();

    let item = app.state.stock_items.get(item.id).await.unwrap();
    assert_eq!(item.quantity_on_hand, 13);
    assert_eq!(item.total_received, 19);
    assert_eq!(item.total_dispatched, 6);
    assert_eq!(
        item.quantity_on_hand,
        item.total_received - item.total_dispatched
    );

    let replayed = app.state.reports.replay_quantity(item.id).await.unwrap();
    assert_eq!(replayed, item.quantity_on_hand);
}

#[tokio::test]
async fn test_every_entry_snapshot_is_consistent() {
    let app = setup().await;

    let (item, _) = seed_stock(&app.state, "Mortar", 10).await;
    let sale = app
        .state
        .sales
        .create_sale(sale_input(item.id, 6), ACTOR)
        .await
        .unwrap();
    app.state.sales.cancel_sale(sale.id, ACTOR).await.unwrap();
    app.state
        .stock_items
        .adjust(item.id, -3, None, ACTOR)
        .await
        .unwrap();

    let history = app.state.reports.movement_history(item.id).await.unwrap();
    assert_eq!(history.len(), 4);

    let mut previous_after = 0;
    for movement in &history {
        let kind: MovementKind = movement.kind.parse().unwrap();
        assert_eq!(
            movement.quantity_after,
            movement.quantity_before + kind.direction() * movement.quantity,
            "entry {} breaks snapshot arithmetic",
            movement.id
        );
        assert_eq!(
            movement.quantity_before, previous_after,
            "entry {} does not chain from its predecessor",
            movement.id
        );
        previous_after = movement.quantity_after;
    }
    assert_eq!(previous_after, 7);
}

#[tokio::test]
async fn test_decrease_never_overdraws() {
    let app = setup().await;

    let (item, _) = seed_stock(&app.state, "Washer", 4).await;

    for quantity in 5..=9 {
        let result = app
            .state
            .sales
            .create_sale(sale_input(item.id, quantity), ACTOR)
            .await;
        assert_matches!(result, Err(ServiceError::InsufficientStock(_)));

        let current = app.state.stock_items.get(item.id).await.unwrap();
        assert_eq!(current.quantity_on_hand, 4);
    }

    // Consuming exactly what is on hand succeeds.
    app.state
        .sales
        .create_sale(sale_input(item.id, 4), ACTOR)
        .await
        .unwrap();
    let current = app.state.stock_items.get(item.id).await.unwrap();
    assert_eq!(current.quantity_on_hand, 0);
}

#[tokio::test]
async fn test_delete_blocked_by_dispatch_history() {
    let app = setup().await;

    let (item, _) = seed_stock(&app.state, "Spare part", 10).await;
    let sale = app
        .state
        .sales
        .create_sale(sale_input(item.id, 1), ACTOR)
        .await
        .unwrap();

    let result = app.state.stock_items.delete(item.id).await;
    assert_matches!(result, Err(ServiceError::StockInUse(_)));

    // Cancelling the sale restores quantity but dispatch history remains.
    app.state.sales.cancel_sale(sale.id, ACTOR).await.unwrap();
    let result = app.state.stock_items.delete(item.id).await;
    assert_matches!(result, Err(ServiceError::StockInUse(_)));
}

#[tokio::test]
async fn test_delete_removes_item_and_its_ledger() {
    let app = setup().await;

    let (item, _) = seed_stock(&app.state, "Obsolete part", 10).await;
    assert_eq!(item.total_dispatched, 0);

    app.state.stock_items.delete(item.id).await.unwrap();

    let result = app.state.stock_items.get(item.id).await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));

    let history = app.state.reports.movement_history(item.id).await.unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_adjust_validation() {
    let app = setup().await;

    let (item, _) = seed_stock(&app.state, "Fuse", 3).await;

    let zero = app.state.stock_items.adjust(item.id, 0, None, ACTOR).await;
    assert_matches!(zero, Err(ServiceError::InvalidQuantity(_)));

    let below = app.state.stock_items.adjust(item.id, -4, None, ACTOR).await;
    assert_matches!(below, Err(ServiceError::InsufficientStock(_)));

    let drained = app
        .state
        .stock_items
        .adjust(item.id, -3, None, ACTOR)
        .await
        .unwrap();
    assert_eq!(drained.quantity_on_hand, 0);
    assert_eq!(drained.status, StockStatus::Depleted.to_string());
}

#[tokio::test]
async fn test_low_stock_report_and_status() {
    let app = setup().await;

    // Default reorder threshold in tests is 5.
    let (item, _) = seed_stock(&app.state, "Filter", 10).await;
    let (other, _) = seed_stock(&app.state, "Blade", 20).await;

    app.state
        .sales
        .create_sale(sale_input(item.id, 6), ACTOR)
        .await
        .unwrap();

    let current = app.state.stock_items.get(item.id).await.unwrap();
    assert_eq!(current.quantity_on_hand, 4);
    assert_eq!(current.status, StockStatus::Low.to_string());

    let low = app.state.reports.low_stock().await.unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].id, item.id);
    assert!(low.iter().all(|i| i.id != other.id));
}

#[tokio::test]
async fn test_product_codes_are_sequential_per_year() {
    let app = setup().await;

    let (first, _) = seed_stock(&app.state, "Anchor", 1).await;
    let (second, _) = seed_stock(&app.state, "Dowel", 1).await;

    let year = chrono::Utc::now().format("%Y").to_string();
    assert_eq!(first.product_code, format!("STK-{}-00001", year));
    assert_eq!(second.product_code, format!("STK-{}-00002", year));
}

#[tokio::test]
async fn test_product_codes_survive_deletion() {
    let app = setup().await;

    let (first, _) = seed_stock(&app.state, "Rivet", 1).await;
    let (second, _) = seed_stock(&app.state, "Washer", 1).await;

    // Deleting an earlier item must not cause the next code to collide
    // with a surviving one.
    app.state.stock_items.delete(first.id).await.unwrap();

    let (third, _) = seed_stock(&app.state, "Grommet", 1).await;

    let year = chrono::Utc::now().format("%Y").to_string();
    assert_eq!(second.product_code, format!("STK-{}-00002", year));
    assert_eq!(third.product_code, format!("STK-{}-00003", year));
}

#[tokio::test]
async fn test_stock_overview_totals() {
    let app = setup().await;

    let (a, _) = seed_stock(&app.state, "Brick", 10).await;
    let (b, _) = seed_stock(&app.state, "Block", 6).await;

    let overview = app.state.reports.stock_overview().await.unwrap();
    assert_eq!(overview.rows.len(), 2);
    assert_eq!(overview.total_quantity, 16);

    let expected = a.unit_price * rust_decimal::Decimal::from(10)
        + b.unit_price * rust_decimal::Decimal::from(6);
    assert_eq!(overview.total_retail_value, expected);
}
