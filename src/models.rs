//! Domain enums and the pure derivation rules behind them.
//!
//! Every status stored in the database is a string; these enums own the
//! canonical spelling (snake_case via strum) and the derivation logic that
//! services call after each mutation. Keeping the rules here, free of any
//! database handle, makes them trivially unit-testable.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

/// Kind of a stock movement ledger entry.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, EnumString, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// First inbound entry ever written for a stock item (0 -> seed).
    Creation,
    /// Generic inbound movement (e.g. a cancelled sale restoring stock).
    Inbound,
    /// Outbound movement (sale consumption, cancellation reversal).
    Outbound,
    /// Inbound movement replenishing an already-existing stock item.
    Replenishment,
    /// Manual correction; the movement quantity is signed for this kind.
    Adjustment,
}

impl MovementKind {
    /// Sign applied to the movement quantity when replaying the ledger:
    /// `quantity_after == quantity_before + direction * quantity`.
    pub fn direction(self) -> i32 {
        match self {
            Self::Outbound => -1,
            Self::Creation | Self::Inbound | Self::Replenishment | Self::Adjustment => 1,
        }
    }

    /// Inbound-class movements count toward `total_received`.
    pub fn is_inbound_class(self) -> bool {
        self.direction() > 0
    }
}

/// Derived availability status of a stock item.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, EnumString, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    Available,
    Low,
    Depleted,
}

impl StockStatus {
    /// Pure status derivation, run after every quantity mutation.
    pub fn derive(quantity: i32, threshold: i32) -> Self {
        if quantity == 0 {
            Self::Depleted
        } else if quantity <= threshold {
            Self::Low
        } else {
            Self::Available
        }
    }
}

/// Receipt state of one purchase order line.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, EnumString, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Pending,
    PartiallyReceived,
    Received,
    Cancelled,
}

impl ReceiptStatus {
    /// State machine rule for the receiving workflow. Never produces
    /// `Cancelled`; cancellation is sticky and handled by the caller.
    pub fn from_progress(received: i32, ordered: i32) -> Self {
        if received <= 0 {
            Self::Pending
        } else if received < ordered {
            Self::PartiallyReceived
        } else {
            Self::Received
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Cancelled
    }
}

/// Overall status of a purchase order, derived from its lines.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, EnumString, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    Ordered,
    PartiallyReceived,
    Received,
    Cancelled,
}

impl PurchaseOrderStatus {
    /// Folds line statuses into the order status. Cancelled lines are
    /// ignored; an order whose lines are all cancelled stays `Ordered`.
    pub fn derive<I>(line_statuses: I) -> Self
    where
        I: IntoIterator<Item = ReceiptStatus>,
    {
        let mut any_progress = false;
        let mut all_received = true;
        let mut saw_open_line = false;

        for status in line_statuses {
            match status {
                ReceiptStatus::Cancelled => continue,
                ReceiptStatus::Received => {
                    saw_open_line = true;
                    any_progress = true;
                }
                ReceiptStatus::PartiallyReceived => {
                    saw_open_line = true;
                    any_progress = true;
                    all_received = false;
                }
                ReceiptStatus::Pending => {
                    saw_open_line = true;
                    all_received = false;
                }
            }
        }

        if !saw_open_line {
            Self::Ordered
        } else if all_received {
            Self::Received
        } else if any_progress {
            Self::PartiallyReceived
        } else {
            Self::Ordered
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Cancelled
    }
}

/// Lifecycle status of a sale transaction.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, EnumString, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Pending,
    Paid,
    Cancelled,
}

impl SaleStatus {
    pub fn is_terminal(self) -> bool {
        self == Self::Cancelled
    }
}

/// Explicit target of a payment record, resolved by the payment-processing
/// collaborator. Replaces a late-bound `(payable_type, payable_id)` pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PaymentTarget {
    Sale(Uuid),
    Commission(Uuid),
}

/// Optional references carried on a ledger entry, pointing at the purchase
/// document that caused an inbound movement. Sales and manual adjustments
/// write entries with no source reference.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MovementSource {
    pub purchase_order_id: Option<Uuid>,
    pub purchase_order_line_id: Option<Uuid>,
}

impl MovementSource {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn purchase(order_id: Uuid, line_id: Uuid) -> Self {
        Self {
            purchase_order_id: Some(order_id),
            purchase_order_line_id: Some(line_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    #[test]
    fn movement_kind_round_trips_through_strings() {
        for kind in [
            MovementKind::Creation,
            MovementKind::Inbound,
            MovementKind::Outbound,
            MovementKind::Replenishment,
            MovementKind::Adjustment,
        ] {
            let parsed = MovementKind::from_str(&kind.to_string()).unwrap();
            assert_eq!(parsed, kind);
        }
        assert_eq!(MovementKind::Replenishment.to_string(), "replenishment");
    }

    #[test]
    fn outbound_is_the_only_negative_direction() {
        assert_eq!(MovementKind::Outbound.direction(), -1);
        assert_eq!(MovementKind::Creation.direction(), 1);
        assert_eq!(MovementKind::Adjustment.direction(), 1);
        assert!(!MovementKind::Outbound.is_inbound_class());
        assert!(MovementKind::Inbound.is_inbound_class());
    }

    #[test]
    fn stock_status_boundaries() {
        assert_eq!(StockStatus::derive(0, 5), StockStatus::Depleted);
        assert_eq!(StockStatus::derive(5, 5), StockStatus::Low);
        assert_eq!(StockStatus::derive(6, 5), StockStatus::Available);
        assert_eq!(StockStatus::derive(1, 0), StockStatus::Available);
    }

    #[test]
    fn receipt_status_state_machine() {
        assert_eq!(ReceiptStatus::from_progress(0, 10), ReceiptStatus::Pending);
        assert_eq!(
            ReceiptStatus::from_progress(4, 10),
            ReceiptStatus::PartiallyReceived
        );
        assert_eq!(ReceiptStatus::from_progress(10, 10), ReceiptStatus::Received);
        // Over-receipt still lands on received.
        assert_eq!(ReceiptStatus::from_progress(12, 10), ReceiptStatus::Received);
    }

    #[test]
    fn order_status_fold_rules() {
        use PurchaseOrderStatus as Po;
        use ReceiptStatus as Rs;

        assert_eq!(Po::derive([Rs::Pending, Rs::Pending]), Po::Ordered);
        assert_eq!(
            Po::derive([Rs::Pending, Rs::PartiallyReceived]),
            Po::PartiallyReceived
        );
        assert_eq!(Po::derive([Rs::Received, Rs::Pending]), Po::PartiallyReceived);
        assert_eq!(Po::derive([Rs::Received, Rs::Received]), Po::Received);
        // Cancelled lines are invisible to the fold.
        assert_eq!(Po::derive([Rs::Received, Rs::Cancelled]), Po::Received);
        assert_eq!(Po::derive([Rs::Cancelled, Rs::Cancelled]), Po::Ordered);
        assert_eq!(Po::derive([]), Po::Ordered);
    }

    #[test]
    fn payment_target_serializes_tagged() {
        let target = PaymentTarget::Sale(Uuid::nil());
        let json = serde_json::to_value(target).unwrap();
        assert_eq!(json["kind"], "sale");
        let back: PaymentTarget = serde_json::from_value(json).unwrap();
        assert_eq!(back, target);
    }

    proptest! {
        #[test]
        fn receipt_status_matches_progress_intervals(received in 0i32..1000, ordered in 1i32..1000) {
            let status = ReceiptStatus::from_progress(received, ordered);
            if received == 0 {
                prop_assert_eq!(status, ReceiptStatus::Pending);
            } else if received < ordered {
                prop_assert_eq!(status, ReceiptStatus::PartiallyReceived);
            } else {
                prop_assert_eq!(status, ReceiptStatus::Received);
            }
        }

        #[test]
        fn stock_status_never_available_at_zero(threshold in 0i32..100) {
            prop_assert_eq!(StockStatus::derive(0, threshold), StockStatus::Depleted);
        }

        #[test]
        fn order_never_received_while_a_line_is_open(
            pending in 0usize..4,
            partial in 0usize..4,
            received in 0usize..4,
        ) {
            let statuses: Vec<ReceiptStatus> = std::iter::repeat(ReceiptStatus::Pending).take(pending)
                .chain(std::iter::repeat(ReceiptStatus::PartiallyReceived).take(partial))
                .chain(std::iter::repeat(ReceiptStatus::Received).take(received))
                .collect();
            let derived = PurchaseOrderStatus::derive(statuses.iter().copied());
            if pending + partial > 0 {
                prop_assert_ne!(derived, PurchaseOrderStatus::Received);
            }
            if received + partial > 0 && pending + partial > 0 {
                prop_assert_eq!(derived, PurchaseOrderStatus::PartiallyReceived);
            }
        }
    }
}
