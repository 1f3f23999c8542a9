use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        stock_items::{self, Entity as StockItemEntity},
        stock_movements::{self, Entity as StockMovementEntity},
    },
    errors::ServiceError,
    models::MovementKind,
};

/// One row of the stock overview projection.
#[derive(Debug, Clone)]
pub struct StockOverviewRow {
    pub stock_item_id: Uuid,
    pub product_code: String,
    pub name: String,
    pub quantity_on_hand: i32,
    pub status: String,
    pub unit_price: Decimal,
    pub retail_value: Decimal,
}

/// Stock overview totals.
#[derive(Debug, Clone)]
pub struct StockOverview {
    pub rows: Vec<StockOverviewRow>,
    pub total_quantity: i64,
    pub total_retail_value: Decimal,
}

/// Read-only projections over the ledger store. These queries run outside
/// any transaction and may observe slightly stale aggregates; the ledger
/// itself stays the reconciliation source of truth.
#[derive(Clone)]
pub struct ReportService {
    db: Arc<DbPool>,
}

impl ReportService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Per-item quantities and retail value, plus overall totals.
    pub async fn stock_overview(&self) -> Result<StockOverview, ServiceError> {
        let items = StockItemEntity::find()
            .filter(stock_items::Column::IsActive.eq(true))
            .order_by_asc(stock_items::Column::ProductCode)
            .all(&*self.db)
            .await?;

        let mut rows = Vec::with_capacity(items.len());
        let mut total_quantity: i64 = 0;
        let mut total_retail_value = Decimal::ZERO;

        for item in items {
            let retail_value = item.unit_price * Decimal::from(item.quantity_on_hand);
            total_quantity += i64::from(item.quantity_on_hand);
            total_retail_value += retail_value;
            rows.push(StockOverviewRow {
                stock_item_id: item.id,
                product_code: item.product_code,
                name: item.name,
                quantity_on_hand: item.quantity_on_hand,
                status: item.status,
                unit_price: item.unit_price,
                retail_value,
            });
        }

        Ok(StockOverview {
            rows,
            total_quantity,
            total_retail_value,
        })
    }

    /// Active items at or below their reorder threshold, depleted included.
    pub async fn low_stock(&self) -> Result<Vec<stock_items::Model>, ServiceError> {
        Ok(StockItemEntity::find()
            .filter(stock_items::Column::IsActive.eq(true))
            .filter(
                Expr::col(stock_items::Column::QuantityOnHand)
                    .lte(Expr::col(stock_items::Column::ReorderThreshold)),
            )
            .order_by_asc(stock_items::Column::QuantityOnHand)
            .all(&*self.db)
            .await?)
    }

    /// Full ledger of one stock item, oldest entry first.
    pub async fn movement_history(
        &self,
        stock_item_id: Uuid,
    ) -> Result<Vec<stock_movements::Model>, ServiceError> {
        Ok(StockMovementEntity::find()
            .filter(stock_movements::Column::StockItemId.eq(stock_item_id))
            .order_by_asc(stock_movements::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Replays the ledger of one stock item to recompute its quantity on
    /// hand. Used by audit checks: the result must equal the projection's
    /// current `quantity_on_hand`.
    pub async fn replay_quantity(&self, stock_item_id: Uuid) -> Result<i32, ServiceError> {
        let movements = self.movement_history(stock_item_id).await?;

        let mut quantity = 0i32;
        for movement in movements {
            let kind: MovementKind = movement.kind.parse().map_err(|_| {
                ServiceError::InternalError(format!(
                    "ledger entry {} has invalid kind '{}'",
                    movement.id, movement.kind
                ))
            })?;
            quantity += kind.direction() * movement.quantity;
        }

        Ok(quantity)
    }
}
