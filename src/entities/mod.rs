//! sea-orm entities for the ledger store.
//!
//! Statuses and movement kinds are persisted as strings; their canonical
//! values live in [`crate::models`].

pub mod purchase_order_lines;
pub mod purchase_orders;
pub mod sale_transactions;
pub mod stock_items;
pub mod stock_movements;
