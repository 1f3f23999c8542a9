#![allow(dead_code)]

use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use stockledger_api::{
    config::AppConfig,
    db::{establish_connection, run_migrations},
    entities::{purchase_order_lines, purchase_orders, stock_items},
    events::{Event, EventSender},
    services::purchase_orders::{CreatePurchaseOrder, CreatePurchaseOrderLine},
    AppState,
};

pub const ACTOR: &str = "test-operator";

pub struct TestApp {
    pub state: AppState,
    pub events: mpsc::Receiver<Event>,
}

fn test_config(url: &str) -> AppConfig {
    AppConfig {
        database_url: url.to_string(),
        environment: "test".to_string(),
        log_level: "info".to_string(),
        log_json: false,
        default_reorder_threshold: 5,
        db_max_connections: 5,
        db_min_connections: 1,
        db_connect_timeout_secs: 30,
        db_idle_timeout_secs: 600,
        db_acquire_timeout_secs: 8,
    }
}

/// Boots an isolated in-memory database with migrations applied and the
/// full service graph wired over it.
pub async fn setup() -> TestApp {
    let url = format!(
        "sqlite:file:{}?mode=memory&cache=shared",
        Uuid::new_v4().simple()
    );
    let db = Arc::new(
        establish_connection(&url)
            .await
            .expect("Failed to create DB pool"),
    );
    run_migrations(db.as_ref())
        .await
        .expect("Failed to run migrations");

    let (tx, events) = mpsc::channel(256);
    let state = AppState::new(db, test_config(&url), EventSender::new(tx));

    TestApp { state, events }
}

/// Creates a one-line purchase order for a brand-new product.
pub async fn order_new_product(
    state: &AppState,
    product_name: &str,
    quantity_ordered: i32,
) -> (purchase_orders::Model, purchase_order_lines::Model) {
    let input = CreatePurchaseOrder {
        supplier_id: Uuid::new_v4(),
        notes: None,
        lines: vec![CreatePurchaseOrderLine {
            product_key: Uuid::new_v4(),
            product_name: product_name.to_string(),
            quantity_ordered,
            unit_price: dec!(25.00),
            expected_date: None,
        }],
    };

    let (order, mut lines) = state
        .purchase_orders
        .create_order(input, ACTOR)
        .await
        .expect("Failed to create purchase order");

    (order, lines.remove(0))
}

/// Orders and fully receives `quantity` units of a new product, returning
/// the stock item that receipt created.
pub async fn seed_stock(
    state: &AppState,
    product_name: &str,
    quantity: i32,
) -> (stock_items::Model, purchase_order_lines::Model) {
    let (_, line) = order_new_product(state, product_name, quantity).await;
    let result = state
        .purchase_orders
        .record_receipt(line.id, quantity, None, ACTOR)
        .await
        .expect("Failed to record receipt");
    (result.stock_item, result.line)
}

/// Drains every event currently buffered on the channel.
pub fn drain_events(app: &mut TestApp) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = app.events.try_recv() {
        events.push(event);
    }
    events
}
