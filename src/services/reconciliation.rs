use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    entities::{
        purchase_order_lines,
        purchase_orders,
        stock_items::{self, Entity as StockItemEntity},
        stock_movements::{self, Entity as StockMovementEntity},
    },
    errors::ServiceError,
    models::{MovementKind, MovementSource, ReceiptStatus, StockStatus},
    services::stock_items::StockItemService,
};

/// Outcome of one per-stock-item reversal attempt during order cancellation.
#[derive(Debug, Clone)]
pub struct ReversalOutcome {
    pub stock_item_id: Uuid,
    /// Quantity this order contributed to the stock item, per its ledger.
    pub contributed: i32,
    pub on_hand_before: i32,
    /// False when the reversal was skipped because stock was already partly
    /// consumed.
    pub reversed: bool,
}

/// Translates purchase-receipt and sale events into stock mutations plus
/// ledger entries. Every method runs inside a caller-owned transaction so
/// the workflow mutation and the ledger write commit or roll back together.
#[derive(Clone)]
pub struct ReconciliationService {
    stock_items: Arc<StockItemService>,
    default_reorder_threshold: i32,
}

impl ReconciliationService {
    pub fn new(stock_items: Arc<StockItemService>, default_reorder_threshold: i32) -> Self {
        Self {
            stock_items,
            default_reorder_threshold,
        }
    }

    /// Applies one incremental receipt delta to stock.
    ///
    /// Looks up the stock item by the line's product key; replenishes it
    /// when found, otherwise creates it with a fresh yearly product code and
    /// seeds it through a `creation` entry (0 -> delta). Writes exactly one
    /// ledger entry per call; the caller passes incremental deltas only,
    /// never cumulative totals.
    pub async fn apply_receipt(
        &self,
        txn: &DatabaseTransaction,
        line: &purchase_order_lines::Model,
        delta: i32,
        actor: &str,
    ) -> Result<(stock_items::Model, stock_movements::Model), ServiceError> {
        if delta <= 0 {
            return Err(ServiceError::InvalidQuantity(format!(
                "receipt delta must be positive, got {}",
                delta
            )));
        }

        let source = MovementSource::purchase(line.purchase_order_id, line.id);
        let comment = Some(format!(
            "receipt of {} x {} (order line {})",
            delta, line.product_name, line.id
        ));

        let existing = StockItemEntity::find()
            .filter(stock_items::Column::ProductKey.eq(line.product_key))
            .one(txn)
            .await?;

        match existing {
            Some(item) => {
                info!(
                    "Replenishing stock item {} with {} units",
                    item.product_code, delta
                );
                self.stock_items
                    .apply_increase(
                        txn,
                        item,
                        delta,
                        MovementKind::Replenishment,
                        source,
                        comment,
                        actor,
                    )
                    .await
            }
            None => {
                let product_code = StockItemService::next_product_code(txn).await?;
                info!(
                    "Creating stock item {} for product '{}' with {} units",
                    product_code, line.product_name, delta
                );

                let item = stock_items::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    product_code: Set(product_code),
                    product_key: Set(line.product_key),
                    name: Set(line.product_name.clone()),
                    quantity_on_hand: Set(0),
                    reorder_threshold: Set(self.default_reorder_threshold),
                    total_received: Set(0),
                    total_dispatched: Set(0),
                    unit_price: Set(line.unit_price),
                    status: Set(StockStatus::Depleted.to_string()),
                    is_active: Set(true),
                    created_at: Set(Utc::now()),
                    updated_at: Set(Utc::now()),
                }
                .insert(txn)
                .await?;

                self.stock_items
                    .apply_increase(
                        txn,
                        item,
                        delta,
                        MovementKind::Creation,
                        source,
                        comment,
                        actor,
                    )
                    .await
            }
        }
    }

    /// Reverses the stock increases attributable to a cancelled order.
    ///
    /// For every non-cancelled line, the quantity it contributed to each
    /// stock item is recomputed from the ledger's inbound entries. A
    /// compensating `outbound` decrease is issued only while the stock item
    /// still holds at least that quantity; otherwise the reversal is skipped
    /// so cancellation never drives stock negative or fails outright.
    pub async fn reverse_for_cancelled_order(
        &self,
        txn: &DatabaseTransaction,
        order: &purchase_orders::Model,
        lines: &[purchase_order_lines::Model],
        actor: &str,
    ) -> Result<Vec<ReversalOutcome>, ServiceError> {
        // Contribution per stock item, summed over all of this order's
        // inbound ledger entries.
        let mut contributions: BTreeMap<Uuid, i32> = BTreeMap::new();

        for line in lines {
            let status: ReceiptStatus = line
                .status
                .parse()
                .map_err(|_| ServiceError::InternalError(format!(
                    "purchase order line {} has invalid status '{}'",
                    line.id, line.status
                )))?;
            if status.is_terminal() {
                continue;
            }

            let movements = StockMovementEntity::find()
                .filter(stock_movements::Column::PurchaseOrderLineId.eq(line.id))
                .all(txn)
                .await?;

            for movement in movements {
                let kind: MovementKind = movement.kind.parse().map_err(|_| {
                    ServiceError::InternalError(format!(
                        "ledger entry {} has invalid kind '{}'",
                        movement.id, movement.kind
                    ))
                })?;
                if kind.is_inbound_class() {
                    *contributions.entry(movement.stock_item_id).or_insert(0) +=
                        movement.quantity;
                }
            }
        }

        let mut outcomes = Vec::with_capacity(contributions.len());

        for (stock_item_id, contributed) in contributions {
            if contributed <= 0 {
                continue;
            }

            let item = StockItemService::find_in_txn(txn, stock_item_id).await?;
            let on_hand_before = item.quantity_on_hand;

            if on_hand_before < contributed {
                // Part of the received stock was already sold; skipping
                // keeps the cancellation from driving quantity negative.
                warn!(
                    "Skipping reversal for stock item {}: order {} contributed {} but only {} on hand",
                    item.product_code, order.order_number, contributed, on_hand_before
                );
                outcomes.push(ReversalOutcome {
                    stock_item_id,
                    contributed,
                    on_hand_before,
                    reversed: false,
                });
                continue;
            }

            self.stock_items
                .apply_decrease(
                    txn,
                    item,
                    contributed,
                    MovementKind::Outbound,
                    MovementSource {
                        purchase_order_id: Some(order.id),
                        purchase_order_line_id: None,
                    },
                    Some(format!(
                        "reversal for cancelled order {}",
                        order.order_number
                    )),
                    actor,
                )
                .await?;

            outcomes.push(ReversalOutcome {
                stock_item_id,
                contributed,
                on_hand_before,
                reversed: true,
            });
        }

        Ok(outcomes)
    }

    /// Consumes stock for a sale: a thin wrapper over `apply_decrease` with
    /// kind `outbound`.
    pub async fn apply_sale_consumption(
        &self,
        txn: &DatabaseTransaction,
        item: stock_items::Model,
        quantity: i32,
        sale_id: Uuid,
        actor: &str,
    ) -> Result<(stock_items::Model, stock_movements::Model), ServiceError> {
        self.stock_items
            .apply_decrease(
                txn,
                item,
                quantity,
                MovementKind::Outbound,
                MovementSource::none(),
                Some(format!("sale {}", sale_id)),
                actor,
            )
            .await
    }

    /// Restores stock previously consumed by a sale: a thin wrapper over
    /// `apply_increase` with kind `inbound`.
    pub async fn reverse_sale_consumption(
        &self,
        txn: &DatabaseTransaction,
        item: stock_items::Model,
        quantity: i32,
        sale_id: Uuid,
        actor: &str,
    ) -> Result<(stock_items::Model, stock_movements::Model), ServiceError> {
        self.stock_items
            .apply_increase(
                txn,
                item,
                quantity,
                MovementKind::Inbound,
                MovementSource::none(),
                Some(format!("sale {} cancelled", sale_id)),
                actor,
            )
            .await
    }

    pub fn stock_items(&self) -> &Arc<StockItemService> {
        &self.stock_items
    }
}
