// Ledger core
pub mod reconciliation;
pub mod stock_items;

// Workflow services calling into the ledger core
pub mod purchase_orders;
pub mod sales;

// Read-only projections
pub mod reports;
