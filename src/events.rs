use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::error;
use uuid::Uuid;

use crate::models::MovementKind;

// Define the various events that can occur in the ledger engine. Events are
// emitted after the owning transaction commits, never from inside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Stock events
    StockItemCreated {
        stock_item_id: Uuid,
        product_code: String,
    },
    StockQuantityChanged {
        stock_item_id: Uuid,
        kind: MovementKind,
        quantity_before: i32,
        quantity_after: i32,
    },
    LowStock {
        stock_item_id: Uuid,
        quantity: i32,
        threshold: i32,
    },
    StockItemDeleted(Uuid),

    // Purchase events
    PurchaseOrderCreated(Uuid),
    PurchaseReceiptRecorded {
        purchase_order_line_id: Uuid,
        delta: i32,
        received_total: i32,
    },
    OverReceipt {
        purchase_order_line_id: Uuid,
        ordered: i32,
        received: i32,
    },
    PurchaseOrderCancelled(Uuid),
    ReversalSkipped {
        purchase_order_id: Uuid,
        stock_item_id: Uuid,
        contributed: i32,
        on_hand: i32,
    },

    // Sale events
    SaleCreated(Uuid),
    SaleUpdated(Uuid),
    SalePaid(Uuid),
    SaleCancelled(Uuid),
    SaleDeleted(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when no consumer is left.
    /// Event delivery is best-effort; ledger state is already committed.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            error!("Event delivery failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_channel() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        sender
            .send(Event::SaleCreated(Uuid::new_v4()))
            .await
            .unwrap();
        assert!(matches!(rx.recv().await, Some(Event::SaleCreated(_))));
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        // Must not panic or error out.
        sender.send_or_log(Event::SalePaid(Uuid::new_v4())).await;
    }
}
