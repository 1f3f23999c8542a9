use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{
        purchase_order_lines::{self, Entity as PurchaseOrderLineEntity},
        purchase_orders::{self, Entity as PurchaseOrderEntity},
        stock_items, stock_movements,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::{MovementKind, PurchaseOrderStatus, ReceiptStatus},
    services::reconciliation::{ReconciliationService, ReversalOutcome},
};

/// Input for one line of a new purchase order.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreatePurchaseOrderLine {
    /// Identity of the product being ordered. Pass the key of an existing
    /// stock item to replenish it; pass a fresh key for a new product.
    pub product_key: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub product_name: String,
    #[validate(range(min = 1))]
    pub quantity_ordered: i32,
    pub unit_price: Decimal,
    pub expected_date: Option<chrono::NaiveDate>,
}

/// Input for a new purchase order.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreatePurchaseOrder {
    pub supplier_id: Uuid,
    pub notes: Option<String>,
    #[validate(length(min = 1))]
    pub lines: Vec<CreatePurchaseOrderLine>,
}

/// Result of recording a receipt against one purchase order line.
#[derive(Debug, Clone)]
pub struct ReceiptResult {
    pub line: purchase_order_lines::Model,
    pub stock_item: stock_items::Model,
    pub movement: stock_movements::Model,
    pub order_status: PurchaseOrderStatus,
}

/// Receipt progress summary for one purchase order.
#[derive(Debug, Clone)]
pub struct ReceiptProgress {
    pub purchase_order_id: Uuid,
    pub total_ordered: i64,
    pub total_received: i64,
    pub remaining: i64,
    pub status: PurchaseOrderStatus,
}

/// Purchase order lifecycle: creation, the receipt state machine, and
/// terminal cancellation with ledger reversal.
#[derive(Clone)]
pub struct PurchaseOrderService {
    db: Arc<DbPool>,
    reconciliation: Arc<ReconciliationService>,
    event_sender: Option<EventSender>,
}

impl PurchaseOrderService {
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

    /// Creates a purchase order with its lines, numbered sequentially per
    /// year.
    #[instrument(skip(self, input))]
    pub async fn create_order(
        &self,
        input: CreatePurchaseOrder,
        actor: &str,
    ) -> Result<(purchase_orders::Model, Vec<purchase_order_lines::Model>), ServiceError> {
        input.validate()?;
        for line in &input.lines {
            line.validate()?;
        }

        let db = &*self.db;
        let txn = db.begin().await?;

        let order_number = Self::next_order_number(&txn).await?;
        let now = Utc::now();

        let order = purchase_orders::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_number: Set(order_number.clone()),
            supplier_id: Set(input.supplier_id),
            status: Set(PurchaseOrderStatus::Ordered.to_string()),
            notes: Set(input.notes),
            created_by: Set(actor.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let today = now.date_naive();
        let mut lines = Vec::with_capacity(input.lines.len());
        for line in input.lines {
            let line_total = line.unit_price * Decimal::from(line.quantity_ordered);
            let created = purchase_order_lines::ActiveModel {
                id: Set(Uuid::new_v4()),
                purchase_order_id: Set(order.id),
                product_key: Set(line.product_key),
                product_name: Set(line.product_name),
                quantity_ordered: Set(line.quantity_ordered),
                quantity_received: Set(0),
                unit_price: Set(line.unit_price),
                line_total: Set(line_total),
                status: Set(ReceiptStatus::Pending.to_string()),
                receiving_document: Set(None),
                ordered_date: Set(today),
                expected_date: Set(line.expected_date),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await?;
            lines.push(created);
        }

        txn.commit().await?;

        info!("Purchase order {} created with {} lines", order_number, lines.len());
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(Event::PurchaseOrderCreated(order.id)).await;
        }

        Ok((order, lines))
    }

    /// Records a receipt against one line, setting its cumulative received
    /// quantity. The positive delta against the previous value is reconciled
    /// into stock in the same transaction; the parent order status is
    /// recomputed afterwards. Over-receipt is tolerated and reported, never
    /// rejected.
    #[instrument(skip(self))]
    pub async fn record_receipt(
        &self,
        line_id: Uuid,
        received_total: i32,
        document: Option<String>,
        actor: &str,
    ) -> Result<ReceiptResult, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await?;

        let line = PurchaseOrderLineEntity::find_by_id(line_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Purchase order line {} not found", line_id))
            })?;

        let current_status: ReceiptStatus = line.status.parse().map_err(|_| {
            ServiceError::InternalError(format!(
                "purchase order line {} has invalid status '{}'",
                line.id, line.status
            ))
        })?;
        if current_status.is_terminal() {
            return Err(ServiceError::InvalidOperation(format!(
                "purchase order line {} is cancelled",
                line_id
            )));
        }

        let order = Self::find_order_in_txn(&txn, line.purchase_order_id).await?;
        let order_status: PurchaseOrderStatus = Self::parse_order_status(&order)?;
        if order_status.is_terminal() {
            return Err(ServiceError::InvalidOperation(format!(
                "purchase order {} is cancelled, no further receiving permitted",
                order.order_number
            )));
        }

        let delta = received_total - line.quantity_received;
        if delta <= 0 {
            return Err(ServiceError::InvalidQuantity(format!(
                "received total {} does not increase previous total {}",
                received_total, line.quantity_received
            )));
        }

        let ordered = line.quantity_ordered;
        let over_receipt = received_total > ordered;
        if over_receipt {
            warn!(
                "Over-receipt on line {}: ordered {}, received {}",
                line_id, ordered, received_total
            );
        }

        let new_status = ReceiptStatus::from_progress(received_total, ordered);

        let mut active: purchase_order_lines::ActiveModel = line.into();
        active.quantity_received = Set(received_total);
        active.status = Set(new_status.to_string());
        if document.is_some() {
            active.receiving_document = Set(document);
        }
        active.updated_at = Set(Utc::now());
        let line = active.update(&txn).await?;

        // The only path by which receipt state affects stock.
        let (stock_item, movement) = self
            .reconciliation
            .apply_receipt(&txn, &line, delta, actor)
            .await?;

        let order_status = Self::recompute_order_status(&txn, &order).await?;

        txn.commit().await?;

        info!(
            "Receipt recorded on line {}: +{} ({}/{}), order {} now {}",
            line.id, delta, received_total, ordered, order.order_number, order_status
        );

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::PurchaseReceiptRecorded {
                    purchase_order_line_id: line.id,
                    delta,
                    received_total,
                })
                .await;
            if over_receipt {
                sender
                    .send_or_log(Event::OverReceipt {
                        purchase_order_line_id: line.id,
                        ordered,
                        received: received_total,
                    })
                    .await;
            }
            if movement.kind == MovementKind::Creation.to_string() {
                sender
                    .send_or_log(Event::StockItemCreated {
                        stock_item_id: stock_item.id,
                        product_code: stock_item.product_code.clone(),
                    })
                    .await;
            }
        }
        self.reconciliation
            .stock_items()
            .notify_quantity_change(&stock_item, &movement)
            .await;

        Ok(ReceiptResult {
            line,
            stock_item,
            movement,
            order_status,
        })
    }

    /// Cancels one line. Terminal for the line; previously received stock
    /// stays in place (only order-level cancellation reverses stock).
    #[instrument(skip(self))]
    pub async fn cancel_line(
        &self,
        line_id: Uuid,
        actor: &str,
    ) -> Result<purchase_order_lines::Model, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await?;

        let line = PurchaseOrderLineEntity::find_by_id(line_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Purchase order line {} not found", line_id))
            })?;

        let status: ReceiptStatus = line.status.parse().map_err(|_| {
            ServiceError::InternalError(format!(
                "purchase order line {} has invalid status '{}'",
                line.id, line.status
            ))
        })?;
        if status.is_terminal() {
            return Err(ServiceError::InvalidOperation(format!(
                "purchase order line {} is already cancelled",
                line_id
            )));
        }

        let order = Self::find_order_in_txn(&txn, line.purchase_order_id).await?;

        let mut active: purchase_order_lines::ActiveModel = line.into();
        active.status = Set(ReceiptStatus::Cancelled.to_string());
        active.updated_at = Set(Utc::now());
        let line = active.update(&txn).await?;

        Self::recompute_order_status(&txn, &order).await?;

        txn.commit().await?;

        info!("Purchase order line {} cancelled by {}", line_id, actor);
        Ok(line)
    }

    /// Cancels a whole order: reverses the stock increases its receipts
    /// produced (skipping any stock item already partly consumed), then
    /// marks the order and its open lines cancelled. Terminal.
    #[instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        order_id: Uuid,
        actor: &str,
    ) -> Result<(purchase_orders::Model, Vec<ReversalOutcome>), ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await?;

        let order = Self::find_order_in_txn(&txn, order_id).await?;
        let status = Self::parse_order_status(&order)?;
        if status.is_terminal() {
            return Err(ServiceError::InvalidOperation(format!(
                "purchase order {} is already cancelled",
                order.order_number
            )));
        }

        let lines = PurchaseOrderLineEntity::find()
            .filter(purchase_order_lines::Column::PurchaseOrderId.eq(order_id))
            .all(&txn)
            .await?;

        let outcomes = self
            .reconciliation
            .reverse_for_cancelled_order(&txn, &order, &lines, actor)
            .await?;

        for line in lines {
            if line.status != ReceiptStatus::Cancelled.to_string() {
                let mut active: purchase_order_lines::ActiveModel = line.into();
                active.status = Set(ReceiptStatus::Cancelled.to_string());
                active.updated_at = Set(Utc::now());
                active.update(&txn).await?;
            }
        }

        let mut active: purchase_orders::ActiveModel = order.into();
        active.status = Set(PurchaseOrderStatus::Cancelled.to_string());
        active.updated_at = Set(Utc::now());
        let order = active.update(&txn).await?;

        txn.commit().await?;

        info!(
            "Purchase order {} cancelled: {} reversal(s), {} skipped",
            order.order_number,
            outcomes.iter().filter(|o| o.reversed).count(),
            outcomes.iter().filter(|o| !o.reversed).count()
        );

        if let Some(sender) = &self.event_sender {
            sender.send_or_log(Event::PurchaseOrderCancelled(order.id)).await;
            for outcome in outcomes.iter().filter(|o| !o.reversed) {
                sender
                    .send_or_log(Event::ReversalSkipped {
                        purchase_order_id: order.id,
                        stock_item_id: outcome.stock_item_id,
                        contributed: outcome.contributed,
                        on_hand: outcome.on_hand_before,
                    })
                    .await;
            }
        }

        Ok((order, outcomes))
    }

    pub async fn get_order(&self, id: Uuid) -> Result<purchase_orders::Model, ServiceError> {
        PurchaseOrderEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Purchase order {} not found", id)))
    }

    pub async fn get_order_lines(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<purchase_order_lines::Model>, ServiceError> {
        Ok(PurchaseOrderLineEntity::find()
            .filter(purchase_order_lines::Column::PurchaseOrderId.eq(order_id))
            .order_by_asc(purchase_order_lines::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    pub async fn list_orders(&self) -> Result<Vec<purchase_orders::Model>, ServiceError> {
        Ok(PurchaseOrderEntity::find()
            .order_by_asc(purchase_orders::Column::OrderNumber)
            .all(&*self.db)
            .await?)
    }

    /// Totals ordered/received/remaining across all lines of an order.
    pub async fn receipt_progress(&self, order_id: Uuid) -> Result<ReceiptProgress, ServiceError> {
        let order = self.get_order(order_id).await?;
        let lines = self.get_order_lines(order_id).await?;

        let mut total_ordered: i64 = 0;
        let mut total_received: i64 = 0;
        for line in &lines {
            total_ordered += i64::from(line.quantity_ordered);
            total_received += i64::from(line.quantity_received);
        }

        Ok(ReceiptProgress {
            purchase_order_id: order_id,
            total_ordered,
            total_received,
            remaining: total_ordered - total_received,
            status: Self::parse_order_status(&order)?,
        })
    }

    /// Next sequential order number for the current year, e.g. `PO-2026-0004`.
    /// Derived from the highest existing suffix; the zero-padded codes make
    /// the lexicographic maximum the numeric one.
    async fn next_order_number(txn: &DatabaseTransaction) -> Result<String, ServiceError> {
        let year = Utc::now().format("%Y").to_string();
        let prefix = format!("PO-{}-", year);
        let latest = PurchaseOrderEntity::find()
            .filter(purchase_orders::Column::OrderNumber.like(&format!("{}%", prefix)))
            .order_by_desc(purchase_orders::Column::OrderNumber)
            .one(txn)
            .await?;
        let next = match latest {
            Some(order) => {
                order.order_number[prefix.len()..]
                    .parse::<u32>()
                    .map_err(|_| {
                        ServiceError::InternalError(format!(
                            "purchase order number '{}' has a non-numeric suffix",
                            order.order_number
                        ))
                    })?
                    + 1
            }
            None => 1,
        };
        Ok(format!("{}{:04}", prefix, next))
    }

    /// Re-derives the order status from its lines and persists it when it
    /// changed. Cancellation is terminal and never overwritten here.
    async fn recompute_order_status(
        txn: &DatabaseTransaction,
        order: &purchase_orders::Model,
    ) -> Result<PurchaseOrderStatus, ServiceError> {
        let current = Self::parse_order_status(order)?;
        if current.is_terminal() {
            return Ok(current);
        }

        let lines = PurchaseOrderLineEntity::find()
            .filter(purchase_order_lines::Column::PurchaseOrderId.eq(order.id))
            .all(txn)
            .await?;

        let mut statuses = Vec::with_capacity(lines.len());
        for line in &lines {
            statuses.push(line.status.parse::<ReceiptStatus>().map_err(|_| {
                ServiceError::InternalError(format!(
                    "purchase order line {} has invalid status '{}'",
                    line.id, line.status
                ))
            })?);
        }

        let derived = PurchaseOrderStatus::derive(statuses);
        if derived != current {
            let mut active: purchase_orders::ActiveModel = order.clone().into();
            active.status = Set(derived.to_string());
            active.updated_at = Set(Utc::now());
            active.update(txn).await?;
        }

        Ok(derived)
    }

    async fn find_order_in_txn(
        txn: &DatabaseTransaction,
        id: Uuid,
    ) -> Result<purchase_orders::Model, ServiceError> {
        PurchaseOrderEntity::find_by_id(id)
            .one(txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Purchase order {} not found", id)))
    }

    fn parse_order_status(
        order: &purchase_orders::Model,
    ) -> Result<PurchaseOrderStatus, ServiceError> {
        order.status.parse().map_err(|_| {
            ServiceError::InternalError(format!(
                "purchase order {} has invalid status '{}'",
                order.id, order.status
            ))
        })
    }
}
