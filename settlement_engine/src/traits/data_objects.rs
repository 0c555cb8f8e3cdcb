use serde::{Deserialize, Serialize};

use crate::db_types::{EarningsRecord, NewEarningsRecord, Order, OrderStatusType, PaymentStatus};

/// The state an order was read in. A guarded update only applies if the stored order still has exactly this state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateGuard {
    pub id: i64,
    pub order_status: OrderStatusType,
    pub payment_status: PaymentStatus,
    pub gateway_order_id: Option<String>,
}

impl From<&Order> for StateGuard {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            order_status: order.order_status,
            payment_status: order.payment_status,
            gateway_order_id: order.gateway_order_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertEarningsResult {
    Inserted(EarningsRecord),
    AlreadyExists(EarningsRecord),
}

impl InsertEarningsResult {
    pub fn record(&self) -> &EarningsRecord {
        match self {
            Self::Inserted(r) | Self::AlreadyExists(r) => r,
        }
    }

    pub fn into_record(self) -> EarningsRecord {
        match self {
            Self::Inserted(r) | Self::AlreadyExists(r) => r,
        }
    }

    pub fn was_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

/// Everything a settlement writes, to be applied in one transaction.
#[derive(Debug, Clone)]
pub struct SettlementCommit {
    /// The guarded order update, if the order's state changes.
    pub transition: Option<(StateGuard, Order)>,
    pub earnings: Vec<NewEarningsRecord>,
}

#[derive(Debug, Clone)]
pub enum CommitOutcome {
    Committed { order: Option<Order>, earnings: Vec<InsertEarningsResult> },
    /// The guarded update lost a race. Nothing was written.
    StateConflict,
}
