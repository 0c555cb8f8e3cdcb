use serde::{Deserialize, Serialize};

use crate::db_types::{EarningsRecord, Order};

/// Published once an order's payment has been captured and its earnings have been written.
///
/// Only the caller whose commit changed the order publishes this event, so subscribers see it once per settlement
/// even when the gateway delivers the callback several times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSettledEvent {
    pub order: Order,
    /// The earnings records created by this settlement.
    pub earnings: Vec<EarningsRecord>,
}

impl OrderSettledEvent {
    pub fn new(order: Order, earnings: Vec<EarningsRecord>) -> Self {
        Self { order, earnings }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderSettled(OrderSettledEvent),
}
