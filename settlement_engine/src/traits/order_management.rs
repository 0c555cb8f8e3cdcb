use crate::{
    db_types::{NewOrder, Order, OrderId},
    traits::{SettlementDbError, StateGuard},
};

/// The `OrderManagement` trait defines how the engine creates, reads and transitions orders.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a new order and its line items in a single atomic transaction, and returns the stored order with its
    /// line items. If an order with the same `order_id` already exists, it is returned unchanged instead.
    async fn create_order(&self, order: NewOrder) -> Result<Order, SettlementDbError>;

    /// Fetches the order, including its line items. If no order exists, `None` is returned.
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, SettlementDbError>;

    /// Fetches the order that the given gateway order was opened for, including its line items.
    async fn fetch_order_by_gateway_order_id(&self, gateway_order_id: &str)
        -> Result<Option<Order>, SettlementDbError>;

    /// Writes the state fields of `updated` (statuses, gateway ids, audit timestamps) to storage, but only if the
    /// stored order still matches `expected`.
    ///
    /// Returns the stored order after the update, or `None` if the guard did not match, i.e. another caller changed
    /// the order first.
    async fn update_order_status(
        &self,
        expected: &StateGuard,
        updated: &Order,
    ) -> Result<Option<Order>, SettlementDbError>;
}
