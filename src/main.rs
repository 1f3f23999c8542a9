use anyhow::Context;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use stockledger_api::{
    config::{init_tracing, load_config},
    db::{establish_connection_from_app_config, run_migrations},
    events::EventSender,
    AppState,
};

/// Maintenance entry point: applies migrations and logs a low-stock
/// summary. The ledger services are consumed as a library by the
/// surrounding back-office collaborators.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = load_config().context("failed to load configuration")?;
    init_tracing(&cfg.log_level, cfg.log_json);

    info!(
        "stockledger-api {} starting (environment: {})",
        env!("CARGO_PKG_VERSION"),
        cfg.environment
    );

    let db = Arc::new(
        establish_connection_from_app_config(&cfg)
            .await
            .context("failed to connect to database")?,
    );
    run_migrations(&db).await.context("failed to run migrations")?;

    let (tx, mut rx) = mpsc::channel(256);
    let state = AppState::new(db, cfg, EventSender::new(tx));

    // Drain events emitted by any maintenance operations below.
    tokio::spawn(async move { while rx.recv().await.is_some() {} });

    let low = state.reports.low_stock().await?;
    if low.is_empty() {
        info!("No stock items at or below their reorder threshold");
    } else {
        for item in &low {
            warn!(
                "Low stock: {} ({}) {} on hand, threshold {}",
                item.product_code, item.name, item.quantity_on_hand, item.reorder_threshold
            );
        }
    }

    let overview = state.reports.stock_overview().await?;
    info!(
        "{} active stock items, {} units on hand, retail value {}",
        overview.rows.len(),
        overview.total_quantity,
        overview.total_retail_value
    );

    Ok(())
}
