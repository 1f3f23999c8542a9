use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::sale_transactions::{self, Entity as SaleTransactionEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{reconciliation::ReconciliationService, stock_items::StockItemService},
};

/// Input for a new sale.
#[derive(Debug, Clone, Validate)]
pub struct CreateSale {
    pub stock_item_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub buyer_name: String,
    pub buyer_contact: Option<String>,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

/// Sale lifecycle: creation consumes stock, quantity updates adjust it by
/// the delta, cancellation restores it exactly once.
#[derive(Clone)]
pub struct SaleService {
    db: Arc<DbPool>,
    reconciliation: Arc<ReconciliationService>,
    event_sender: Option<EventSender>,
}

impl SaleService {
    pub fn new(
        db: Arc<DbPool>,
        reconciliation: Arc<ReconciliationService>,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            db,
            reconciliation,
            event_sender,
        }
    }

    /// Creates a sale and consumes its quantity from stock in the same
    /// transaction. Fails with `InsufficientStock` when the stock item does
    /// not hold the requested quantity; no ledger entry is written then.
    #[instrument(skip(self, input))]
    pub async fn create_sale(
        &self,
        input: CreateSale,
        actor: &str,
    ) -> Result<sale_transactions::Model, ServiceError> {
        input.validate()?;

        let db = &*self.db;
        let txn = db.begin().await?;

        let item = StockItemService::find_in_txn(&txn, input.stock_item_id).await?;
        let sale_id = Uuid::new_v4();

        let (item, movement) = self
            .reconciliation
            .apply_sale_consumption(&txn, item, input.quantity, sale_id, actor)
            .await?;

        let total_price = item.unit_price * Decimal::from(input.quantity);
        let now = Utc::now();
        let sale = sale_transactions::ActiveModel {
            id: Set(sale_id),
            stock_item_id: Set(item.id),
            buyer_name: Set(input.buyer_name),
            buyer_contact: Set(input.buyer_contact),
            quantity: Set(input.quantity),
            total_price: Set(total_price),
            status: Set(crate::models::SaleStatus::Pending.to_string()),
            created_by: Set(actor.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(
            "Sale {} created: {} x {} for {}",
            sale.id, sale.quantity, item.product_code, sale.buyer_name
        );
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(Event::SaleCreated(sale.id)).await;
        }
        self.reconciliation
            .stock_items()
            .notify_quantity_change(&item, &movement)
            .await;

        Ok(sale)
    }

    /// Changes the sale quantity, adjusting stock by the delta. Increases
    /// validate stock sufficiency; a cancelled sale cannot be changed.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        sale_id: Uuid,
        new_quantity: i32,
        actor: &str,
    ) -> Result<sale_transactions::Model, ServiceError> {
        if new_quantity <= 0 {
            return Err(ServiceError::InvalidQuantity(format!(
                "sale quantity must be positive, got {}",
                new_quantity
            )));
        }

        let db = &*self.db;
        let txn = db.begin().await?;

        let sale = Self::find_in_txn(&txn, sale_id).await?;
        Self::ensure_not_cancelled(&sale)?;

        let delta = new_quantity - sale.quantity;
        if delta == 0 {
            return Ok(sale);
        }

        let item = StockItemService::find_in_txn(&txn, sale.stock_item_id).await?;

        let (item, movement) = if delta > 0 {
            self.reconciliation
                .apply_sale_consumption(&txn, item, delta, sale.id, actor)
                .await?
        } else {
            self.reconciliation
                .reverse_sale_consumption(&txn, item, -delta, sale.id, actor)
                .await?
        };

        let total_price = item.unit_price * Decimal::from(new_quantity);
        let mut active: sale_transactions::ActiveModel = sale.into();
        active.quantity = Set(new_quantity);
        active.total_price = Set(total_price);
        active.updated_at = Set(Utc::now());
        let sale = active.update(&txn).await?;

        txn.commit().await?;

        info!("Sale {} quantity changed by {} to {}", sale.id, delta, new_quantity);
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(Event::SaleUpdated(sale.id)).await;
        }
        self.reconciliation
            .stock_items()
            .notify_quantity_change(&item, &movement)
            .await;

        Ok(sale)
    }

    /// Marks a pending sale as paid.
    #[instrument(skip(self))]
    pub async fn mark_paid(&self, sale_id: Uuid) -> Result<sale_transactions::Model, ServiceError> {
        let db = &*self.db;

        let sale = self.get_sale(sale_id).await?;
        if sale.status != crate::models::SaleStatus::Pending.to_string() {
            return Err(ServiceError::InvalidOperation(format!(
                "sale {} is {}, only pending sales can be paid",
                sale_id, sale.status
            )));
        }

        let mut active: sale_transactions::ActiveModel = sale.into();
        active.status = Set(crate::models::SaleStatus::Paid.to_string());
        active.updated_at = Set(Utc::now());
        let sale = active.update(db).await?;

        if let Some(sender) = &self.event_sender {
            sender.send_or_log(Event::SalePaid(sale.id)).await;
        }

        Ok(sale)
    }

    /// Cancels a sale, restoring the consumed quantity exactly once.
    /// Terminal: cancelling twice is rejected, so the restore cannot be
    /// double-applied.
    #[instrument(skip(self))]
    pub async fn cancel_sale(
        &self,
        sale_id: Uuid,
        actor: &str,
    ) -> Result<sale_transactions::Model, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await?;

        let sale = Self::find_in_txn(&txn, sale_id).await?;
        Self::ensure_not_cancelled(&sale)?;

        let item = StockItemService::find_in_txn(&txn, sale.stock_item_id).await?;
        let (item, movement) = self
            .reconciliation
            .reverse_sale_consumption(&txn, item, sale.quantity, sale.id, actor)
            .await?;

        let mut active: sale_transactions::ActiveModel = sale.into();
        active.status = Set(crate::models::SaleStatus::Cancelled.to_string());
        active.updated_at = Set(Utc::now());
        let sale = active.update(&txn).await?;

        txn.commit().await?;

        info!("Sale {} cancelled, {} units restored", sale.id, sale.quantity);
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(Event::SaleCancelled(sale.id)).await;
        }
        self.reconciliation
            .stock_items()
            .notify_quantity_change(&item, &movement)
            .await;

        Ok(sale)
    }

    /// Deletes a sale record. A live sale is cancelled first so its stock
    /// consumption is restored before the record disappears.
    #[instrument(skip(self))]
    pub async fn delete_sale(&self, sale_id: Uuid, actor: &str) -> Result<(), ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await?;

        let sale = Self::find_in_txn(&txn, sale_id).await?;

        let mut restored = None;
        if sale.status != crate::models::SaleStatus::Cancelled.to_string() {
            let item = StockItemService::find_in_txn(&txn, sale.stock_item_id).await?;
            let (item, movement) = self
                .reconciliation
                .reverse_sale_consumption(&txn, item, sale.quantity, sale.id, actor)
                .await?;
            restored = Some((item, movement));
        }

        SaleTransactionEntity::delete_by_id(sale_id).exec(&txn).await?;

        txn.commit().await?;

        info!("Sale {} deleted", sale_id);
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(Event::SaleDeleted(sale_id)).await;
        }
        if let Some((item, movement)) = restored {
            self.reconciliation
                .stock_items()
                .notify_quantity_change(&item, &movement)
                .await;
        }

        Ok(())
    }

    pub async fn get_sale(&self, id: Uuid) -> Result<sale_transactions::Model, ServiceError> {
        SaleTransactionEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sale {} not found", id)))
    }

    pub async fn list_sales(
        &self,
        stock_item_id: Option<Uuid>,
    ) -> Result<Vec<sale_transactions::Model>, ServiceError> {
        let mut query = SaleTransactionEntity::find();
        if let Some(item_id) = stock_item_id {
            query = query.filter(sale_transactions::Column::StockItemId.eq(item_id));
        }
        Ok(query
            .order_by_asc(sale_transactions::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    async fn find_in_txn(
        txn: &sea_orm::DatabaseTransaction,
        id: Uuid,
    ) -> Result<sale_transactions::Model, ServiceError> {
        SaleTransactionEntity::find_by_id(id)
            .one(txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sale {} not found", id)))
    }

    fn ensure_not_cancelled(sale: &sale_transactions::Model) -> Result<(), ServiceError> {
        if sale.status == crate::models::SaleStatus::Cancelled.to_string() {
            return Err(ServiceError::InvalidOperation(format!(
                "sale {} is cancelled and cannot be changed",
                sale.id
            )));
        }
        Ok(())
    }
}
