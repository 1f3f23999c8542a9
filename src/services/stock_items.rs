use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        stock_items::{self, Entity as StockItemEntity},
        stock_movements::{self, Entity as StockMovementEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::{MovementKind, MovementSource, StockStatus},
};

/// Service owning every mutation of stock items.
///
/// The `apply_*` methods form the in-transaction layer: they take an open
/// transaction, mutate the item and write exactly one ledger entry, and
/// leave commit/rollback to the caller. Public operations wrap them in a
/// transaction of their own and emit events after commit.
#[derive(Clone)]
pub struct StockItemService {
    db: Arc<DbPool>,
    event_sender: Option<EventSender>,
}

impl StockItemService {
    pub fn new(db: Arc<DbPool>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Adds `quantity` to the item inside `txn`, writing one inbound-class
    /// ledger entry. Returns the updated item and the entry.
    pub async fn apply_increase(
        &self,
        txn: &DatabaseTransaction,
        item: stock_items::Model,
        quantity: i32,
        kind: MovementKind,
        source: MovementSource,
        comment: Option<String>,
        actor: &str,
    ) -> Result<(stock_items::Model, stock_movements::Model), ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::InvalidQuantity(format!(
                "increase quantity must be positive, got {}",
                quantity
            )));
        }
        if !kind.is_inbound_class() {
            return Err(ServiceError::InvalidOperation(format!(
                "movement kind {} is not inbound",
                kind
            )));
        }

        let before = item.quantity_on_hand;
        let after = before + quantity;
        let threshold = item.reorder_threshold;
        let total_received = item.total_received;

        let movement = self
            .write_movement(txn, &item, kind, quantity, before, after, source, comment, actor)
            .await?;

        let mut active: stock_items::ActiveModel = item.into();
        active.quantity_on_hand = Set(after);
        active.total_received = Set(total_received + quantity);
        active.status = Set(StockStatus::derive(after, threshold).to_string());
        active.updated_at = Set(Utc::now());
        let updated = active.update(txn).await?;

        Ok((updated, movement))
    }

    /// Subtracts `quantity` from the item inside `txn`, writing one
    /// `outbound` ledger entry. Fails with `InsufficientStock` when the
    /// quantity on hand would go negative.
    pub async fn apply_decrease(
        &self,
        txn: &DatabaseTransaction,
        item: stock_items::Model,
        quantity: i32,
        kind: MovementKind,
        source: MovementSource,
        comment: Option<String>,
        actor: &str,
    ) -> Result<(stock_items::Model, stock_movements::Model), ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::InvalidQuantity(format!(
                "decrease quantity must be positive, got {}",
                quantity
            )));
        }
        if kind.is_inbound_class() {
            return Err(ServiceError::InvalidOperation(format!(
                "movement kind {} is not outbound",
                kind
            )));
        }
        if quantity > item.quantity_on_hand {
            return Err(ServiceError::InsufficientStock(format!(
                "stock item {} has {} on hand, cannot dispatch {}",
                item.product_code, item.quantity_on_hand, quantity
            )));
        }

        let before = item.quantity_on_hand;
        let after = before - quantity;
        let threshold = item.reorder_threshold;
        let total_dispatched = item.total_dispatched;

        let movement = self
            .write_movement(txn, &item, kind, quantity, before, after, source, comment, actor)
            .await?;

        let mut active: stock_items::ActiveModel = item.into();
        active.quantity_on_hand = Set(after);
        active.total_dispatched = Set(total_dispatched + quantity);
        active.status = Set(StockStatus::derive(after, threshold).to_string());
        active.updated_at = Set(Utc::now());
        let updated = active.update(txn).await?;

        Ok((updated, movement))
    }

    /// Manual stock correction with a signed delta. Positive deltas count
    /// toward `total_received`, negative ones toward `total_dispatched`, so
    /// the `on_hand == received - dispatched` invariant is preserved.
    #[instrument(skip(self))]
    pub async fn adjust(
        &self,
        id: Uuid,
        delta: i32,
        comment: Option<String>,
        actor: &str,
    ) -> Result<stock_items::Model, ServiceError> {
        if delta == 0 {
            return Err(ServiceError::InvalidQuantity(
                "adjustment delta must be non-zero".into(),
            ));
        }

        let db = &*self.db;
        let txn = db.begin().await?;

        let item = Self::find_in_txn(&txn, id).await?;

        let before = item.quantity_on_hand;
        let after = before + delta;
        if after < 0 {
            return Err(ServiceError::InsufficientStock(format!(
                "stock item {} has {} on hand, adjustment of {} would go negative",
                item.product_code, before, delta
            )));
        }

        let threshold = item.reorder_threshold;
        let total_received = item.total_received;
        let total_dispatched = item.total_dispatched;

        // Adjustment entries carry the signed delta; replay applies them
        // with direction +1.
        let movement = self
            .write_movement(
                &txn,
                &item,
                MovementKind::Adjustment,
                delta,
                before,
                after,
                MovementSource::none(),
                comment,
                actor,
            )
            .await?;

        let mut active: stock_items::ActiveModel = item.into();
        active.quantity_on_hand = Set(after);
        if delta > 0 {
            active.total_received = Set(total_received + delta);
        } else {
            active.total_dispatched = Set(total_dispatched - delta);
        }
        active.status = Set(StockStatus::derive(after, threshold).to_string());
        active.updated_at = Set(Utc::now());
        let updated = active.update(&txn).await?;

        txn.commit().await?;

        info!(
            "Stock item {} adjusted by {}: {} -> {}",
            updated.product_code, delta, before, after
        );
        self.notify_quantity_change(&updated, &movement).await;

        Ok(updated)
    }

    /// Deletes a stock item and its ledger history. Blocked while the item
    /// has any dispatch history.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await?;

        let item = Self::find_in_txn(&txn, id).await?;

        if item.total_dispatched > 0 {
            return Err(ServiceError::StockInUse(format!(
                "stock item {} has dispatched {} units and cannot be deleted",
                item.product_code, item.total_dispatched
            )));
        }

        StockMovementEntity::delete_many()
            .filter(stock_movements::Column::StockItemId.eq(id))
            .exec(&txn)
            .await?;
        StockItemEntity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        info!("Stock item {} deleted with its ledger history", item.product_code);
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(Event::StockItemDeleted(id)).await;
        }

        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<stock_items::Model, ServiceError> {
        StockItemEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock item {} not found", id)))
    }

    pub async fn get_by_product_key(
        &self,
        product_key: Uuid,
    ) -> Result<Option<stock_items::Model>, ServiceError> {
        Ok(StockItemEntity::find()
            .filter(stock_items::Column::ProductKey.eq(product_key))
            .one(&*self.db)
            .await?)
    }

    pub async fn list(&self) -> Result<Vec<stock_items::Model>, ServiceError> {
        Ok(StockItemEntity::find()
            .order_by_asc(stock_items::Column::ProductCode)
            .all(&*self.db)
            .await?)
    }

    /// Next sequential product code for the current year, e.g.
    /// `STK-2026-00017`. Must be called inside the transaction that inserts
    /// the new item so conflicting writers are serialized by the store.
    ///
    /// The number comes from the highest existing suffix, not a row count:
    /// counts shrink when an item is deleted and would reissue a code still
    /// held by a surviving row. Zero-padding makes the lexicographic maximum
    /// the numeric one.
    pub async fn next_product_code(txn: &DatabaseTransaction) -> Result<String, ServiceError> {
        let year = Utc::now().format("%Y").to_string();
        let prefix = format!("STK-{}-", year);
        let latest = StockItemEntity::find()
            .filter(stock_items::Column::ProductCode.like(&format!("{}%", prefix)))
            .order_by_desc(stock_items::Column::ProductCode)
            .one(txn)
            .await?;
        let next = match latest {
            Some(item) => {
                item.product_code[prefix.len()..]
                    .parse::<u32>()
                    .map_err(|_| {
                        ServiceError::InternalError(format!(
                            "product code '{}' has a non-numeric suffix",
                            item.product_code
                        ))
                    })?
                    + 1
            }
            None => 1,
        };
        Ok(format!("{}{:05}", prefix, next))
    }

    /// Resolves the target of a stock mutation. Unlike the read-side `get`,
    /// a missing item here means the caller is trying to move stock that
    /// does not exist.
    pub(crate) async fn find_in_txn(
        txn: &DatabaseTransaction,
        id: Uuid,
    ) -> Result<stock_items::Model, ServiceError> {
        StockItemEntity::find_by_id(id)
            .one(txn)
            .await?
            .ok_or_else(|| ServiceError::UnknownStockItem(format!("Stock item {} not found", id)))
    }

    /// Emits quantity-change events for an already-committed mutation.
    pub async fn notify_quantity_change(
        &self,
        item: &stock_items::Model,
        movement: &stock_movements::Model,
    ) {
        let Some(sender) = &self.event_sender else {
            return;
        };

        let kind = movement
            .kind
            .parse::<MovementKind>()
            .unwrap_or(MovementKind::Adjustment);
        sender
            .send_or_log(Event::StockQuantityChanged {
                stock_item_id: item.id,
                kind,
                quantity_before: movement.quantity_before,
                quantity_after: movement.quantity_after,
            })
            .await;

        if item.quantity_on_hand <= item.reorder_threshold {
            warn!(
                "Stock item {} is low: {} on hand (threshold {})",
                item.product_code, item.quantity_on_hand, item.reorder_threshold
            );
            sender
                .send_or_log(Event::LowStock {
                    stock_item_id: item.id,
                    quantity: item.quantity_on_hand,
                    threshold: item.reorder_threshold,
                })
                .await;
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn write_movement(
        &self,
        txn: &DatabaseTransaction,
        item: &stock_items::Model,
        kind: MovementKind,
        quantity: i32,
        before: i32,
        after: i32,
        source: MovementSource,
        comment: Option<String>,
        actor: &str,
    ) -> Result<stock_movements::Model, ServiceError> {
        let movement = stock_movements::ActiveModel {
            id: Set(Uuid::new_v4()),
            stock_item_id: Set(item.id),
            purchase_order_id: Set(source.purchase_order_id),
            purchase_order_line_id: Set(source.purchase_order_line_id),
            kind: Set(kind.to_string()),
            quantity: Set(quantity),
            quantity_before: Set(before),
            quantity_after: Set(after),
            comment: Set(comment),
            actor: Set(actor.to_string()),
            created_at: Set(Utc::now()),
        };

        Ok(movement.insert(txn).await?)
    }
}
