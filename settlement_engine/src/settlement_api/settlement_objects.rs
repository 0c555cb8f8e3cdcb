use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, OrderId, OrderStatusType, PaymentStatus},
    settlement_api::earnings_allocator::{Allocation, SkippedLineItem},
};

/// The outcome of a successful settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementResult {
    pub order_id: OrderId,
    pub order_status: OrderStatusType,
    pub payment_status: PaymentStatus,
    /// Earnings records written by this call.
    pub earnings_created: usize,
    /// Earnings records that were already in the ledger.
    pub earnings_existing: usize,
    pub skipped: Vec<SkippedLineItem>,
    /// True if the order had been settled before this call, i.e. this was a duplicate delivery.
    pub already_settled: bool,
}

impl SettlementResult {
    pub fn new(order: &Order, allocation: &Allocation, already_settled: bool) -> Self {
        Self {
            order_id: order.order_id.clone(),
            order_status: order.order_status,
            payment_status: order.payment_status,
            earnings_created: allocation.created.len(),
            earnings_existing: allocation.existing.len(),
            skipped: allocation.skipped.clone(),
            already_settled,
        }
    }
}
