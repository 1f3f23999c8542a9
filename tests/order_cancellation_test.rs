mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;
use uuid::Uuid;

use common::{drain_events, order_new_product, seed_stock, setup, ACTOR};
use stockledger_api::{
    errors::ServiceError,
    events::Event,
    models::{MovementKind, PurchaseOrderStatus, ReceiptStatus, StockStatus},
    services::{
        purchase_orders::{CreatePurchaseOrder, CreatePurchaseOrderLine},
        sales::CreateSale,
    },
};

#[tokio::test]
async fn test_cancel_reverses_untouched_receipts() {
    let app = setup().await;

    let (order, line) = order_new_product(&app.state, "Ply sheet", 10).await;
    let receipt = app
        .state
        .purchase_orders
        .record_receipt(line.id, 10, None, ACTOR)
        .await
        .unwrap();
    let item_id = receipt.stock_item.id;

    let (order, outcomes) = app
        .state
        .purchase_orders
        .cancel_order(order.id, ACTOR)
        .await
        .unwrap();

    assert_eq!(order.status, PurchaseOrderStatus::Cancelled.to_string());
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].reversed);
    assert_eq!(outcomes[0].contributed, 10);
    assert_eq!(outcomes[0].on_hand_before, 10);

    let item = app.state.stock_items.get(item_id).await.unwrap();
    assert_eq!(item.quantity_on_hand, 0);
    assert_eq!(item.status, StockStatus::Depleted.to_string());

    let history = app.state.reports.movement_history(item_id).await.unwrap();
    let reversal = history.last().unwrap();
    assert_eq!(reversal.kind, MovementKind::Outbound.to_string());
    assert_eq!(reversal.quantity, 10);
    assert_eq!(reversal.purchase_order_id, Some(order.id));

    let lines = app
        .state
        .purchase_orders
        .get_order_lines(order.id)
        .await
        .unwrap();
    assert!(lines
        .iter()
        .all(|l| l.status == ReceiptStatus::Cancelled.to_string()));
}

#[tokio::test]
async fn test_cancel_reverses_only_received_portion() {
    let app = setup().await;

    let (order, line) = order_new_product(&app.state, "Beam", 10).await;
    let receipt = app
        .state
        .purchase_orders
        .record_receipt(line.id, 4, None, ACTOR)
        .await
        .unwrap();

    let (_, outcomes) = app
        .state
        .purchase_orders
        .cancel_order(order.id, ACTOR)
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].reversed);
    assert_eq!(outcomes[0].contributed, 4);

    let item = app
        .state
        .stock_items
        .get(receipt.stock_item.id)
        .await
        .unwrap();
    assert_eq!(item.quantity_on_hand, 0);
}

#[tokio::test]
async fn test_cancel_skips_partly_consumed_stock() {
    let mut app = setup().await;

    let (item, line) = seed_stock(&app.state, "Panel", 10).await;
    let order_id = line.purchase_order_id;

    // Consume most of the received stock before cancelling.
    app.state
        .sales
        .create_sale(
            CreateSale {
                stock_item_id: item.id,
                buyer_name: "Site crew".to_string(),
                buyer_contact: None,
                quantity: 7,
            },
            ACTOR,
        )
        .await
        .unwrap();
    drain_events(&mut app);

    let (order, outcomes) = app
        .state
        .purchase_orders
        .cancel_order(order_id, ACTOR)
        .await
        .unwrap();

    // The reversal is skipped; the order still cancels.
    assert_eq!(order.status, PurchaseOrderStatus::Cancelled.to_string());
    assert_eq!(outcomes.len(), 1);
    assert!(!outcomes[0].reversed);
    assert_eq!(outcomes[0].contributed, 10);
    assert_eq!(outcomes[0].on_hand_before, 3);

    let current = app.state.stock_items.get(item.id).await.unwrap();
    assert_eq!(current.quantity_on_hand, 3);

    // No reversal entry was written.
    let history = app.state.reports.movement_history(item.id).await.unwrap();
    assert_eq!(history.len(), 2);

    let events = drain_events(&mut app);
    assert!(events.iter().any(|e| matches!(
        e,
        Event::ReversalSkipped {
            contributed: 10,
            on_hand: 3,
            ..
        }
    )));

    // Receiving against the cancelled order is rejected.
    let result = app
        .state
        .purchase_orders
        .record_receipt(line.id, 12, None, ACTOR)
        .await;
    assert_matches!(result, Err(ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn test_cancel_order_is_terminal() {
    let app = setup().await;

    let (order, _) = order_new_product(&app.state, "Joist", 5).await;
    app.state
        .purchase_orders
        .cancel_order(order.id, ACTOR)
        .await
        .unwrap();

    let again = app
        .state
        .purchase_orders
        .cancel_order(order.id, ACTOR)
        .await;
    assert_matches!(again, Err(ServiceError::InvalidOperation(_)));
}

#[tokio::test]
async fn test_cancelled_line_contributions_are_not_reversed() {
    let app = setup().await;

    let input = CreatePurchaseOrder {
        supplier_id: Uuid::new_v4(),
        notes: None,
        lines: vec![
            CreatePurchaseOrderLine {
                product_key: Uuid::new_v4(),
                product_name: "Stone".to_string(),
                quantity_ordered: 10,
                unit_price: dec!(2.00),
                expected_date: None,
            },
            CreatePurchaseOrderLine {
                product_key: Uuid::new_v4(),
                product_name: "Slate".to_string(),
                quantity_ordered: 6,
                unit_price: dec!(4.00),
                expected_date: None,
            },
        ],
    };
    let (order, lines) = app
        .state
        .purchase_orders
        .create_order(input, ACTOR)
        .await
        .unwrap();

    // Receive both lines, then cancel the first line individually. Its
    // stock stays in place through the later order cancellation.
    let stone = app
        .state
        .purchase_orders
        .record_receipt(lines[0].id, 10, None, ACTOR)
        .await
        .unwrap();
    let slate = app
        .state
        .purchase_orders
        .record_receipt(lines[1].id, 6, None, ACTOR)
        .await
        .unwrap();

    app.state
        .purchase_orders
        .cancel_line(lines[0].id, ACTOR)
        .await
        .unwrap();

    let (_, outcomes) = app
        .state
        .purchase_orders
        .cancel_order(order.id, ACTOR)
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].stock_item_id, slate.stock_item.id);
    assert!(outcomes[0].reversed);

    let stone_item = app
        .state
        .stock_items
        .get(stone.stock_item.id)
        .await
        .unwrap();
    assert_eq!(stone_item.quantity_on_hand, 10);

    let slate_item = app
        .state
        .stock_items
        .get(slate.stock_item.id)
        .await
        .unwrap();
    assert_eq!(slate_item.quantity_on_hand, 0);
}
