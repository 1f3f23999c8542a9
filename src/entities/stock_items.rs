use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current-state projection of a product lot. Mutated only through the
/// ledger services; `quantity_on_hand == total_received - total_dispatched`
/// at all times.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Human-readable code, sequential per year (e.g. `STK-2026-00017`).
    /// Immutable once assigned.
    #[sea_orm(unique)]
    pub product_code: String,

    /// Immutable product identity shared with purchase order lines.
    #[sea_orm(unique)]
    pub product_key: Uuid,

    pub name: String,
    pub quantity_on_hand: i32,
    pub reorder_threshold: i32,
    pub total_received: i32,
    pub total_dispatched: i32,
    pub unit_price: Decimal,
    pub status: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_movements::Entity")]
    StockMovements,
    #[sea_orm(has_many = "super::sale_transactions::Entity")]
    SaleTransactions,
}

impl Related<super::stock_movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockMovements.def()
    }
}

impl Related<super::sale_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SaleTransactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
