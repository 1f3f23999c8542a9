//! Inventory ledger and purchase-receipt reconciliation engine.
//!
//! Tracks purchase-order lines through partial and complete receipt, turns
//! received quantities into stock level changes, records every stock
//! mutation as an immutable movement entry, and reconciles sales and
//! cancellations against that same ledger. HTTP routing, authentication,
//! reporting surfaces and document rendering are external collaborators
//! that call into these services and read their projections.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod migrator;
pub mod models;
pub mod services;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub stock_items: Arc<services::stock_items::StockItemService>,
    pub reconciliation: Arc<services::reconciliation::ReconciliationService>,
    pub purchase_orders: Arc<services::purchase_orders::PurchaseOrderService>,
    pub sales: Arc<services::sales::SaleService>,
    pub reports: Arc<services::reports::ReportService>,
}

impl AppState {
    /// Wires the service graph over one shared pool and event channel.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let stock_items = Arc::new(services::stock_items::StockItemService::new(
            db.clone(),
            Some(event_sender.clone()),
        ));
        let reconciliation = Arc::new(services::reconciliation::ReconciliationService::new(
            stock_items.clone(),
            config.default_reorder_threshold,
        ));
        let purchase_orders = Arc::new(services::purchase_orders::PurchaseOrderService::new(
            db.clone(),
            reconciliation.clone(),
            Some(event_sender.clone()),
        ));
        let sales = Arc::new(services::sales::SaleService::new(
            db.clone(),
            reconciliation.clone(),
            Some(event_sender.clone()),
        ));
        let reports = Arc::new(services::reports::ReportService::new(db.clone()));

        Self {
            db,
            config,
            event_sender,
            stock_items,
            reconciliation,
            purchase_orders,
            sales,
            reports,
        }
    }
}
