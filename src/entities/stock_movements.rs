use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One immutable ledger entry. Corrections are new entries, never edits;
/// rows are removed only when their owning stock item is deleted.
///
/// Invariant: `quantity_after == quantity_before + direction(kind) * quantity`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub stock_item_id: Uuid,

    /// Set for movements caused by a purchase receipt or its reversal;
    /// entries originating from sales or manual adjustment carry neither.
    pub purchase_order_id: Option<Uuid>,
    pub purchase_order_line_id: Option<Uuid>,

    pub kind: String,
    /// Positive magnitude, except `adjustment` entries which may be signed.
    pub quantity: i32,
    pub quantity_before: i32,
    pub quantity_after: i32,
    pub comment: Option<String>,
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::stock_items::Entity",
        from = "Column::StockItemId",
        to = "super::stock_items::Column::Id"
    )]
    StockItem,
    #[sea_orm(
        belongs_to = "super::purchase_order_lines::Entity",
        from = "Column::PurchaseOrderLineId",
        to = "super::purchase_order_lines::Column::Id"
    )]
    PurchaseOrderLine,
}

impl Related<super::stock_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockItem.def()
    }
}

impl Related<super::purchase_order_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrderLine.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
