use futures::future::BoxFuture;
use log::*;
use pod_common::Money;
use razorpay_tools::{GatewayOrder, RazorpayApi, RazorpayApiError, WebhookEvent};
use settlement_engine::{
    db_types::OrderId,
    events::{EventHandlers, EventHooks, OrderSettledEvent},
};

/// The part of the payment gateway the server talks to. Route handlers are generic over it so that tests can stand in
/// for the gateway.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    async fn create_gateway_order(
        &self,
        order_id: &OrderId,
        amount: Money,
        currency: &str,
    ) -> Result<GatewayOrder, RazorpayApiError>;
}

impl PaymentGateway for RazorpayApi {
    async fn create_gateway_order(
        &self,
        order_id: &OrderId,
        amount: Money,
        currency: &str,
    ) -> Result<GatewayOrder, RazorpayApiError> {
        self.create_order(order_id.as_str(), amount, currency).await
    }
}

/// What a webhook delivery asks us to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAction {
    Settle { order_id: Option<OrderId>, gateway_order_id: String, payment_id: String },
    /// One payment attempt was declined. The buyer may retry on the same gateway order, so the order stays open.
    PaymentAttemptFailed { order_id: Option<OrderId>, gateway_order_id: Option<String>, payment_id: Option<String> },
    Refund { order_id: Option<OrderId>, gateway_order_id: Option<String> },
    Ignore(String),
}

impl WebhookAction {
    /// Interprets a webhook delivery.
    ///
    /// The storefront order id is taken from the entity notes, where `create_order` put it. If it is missing, the
    /// gateway order id is still carried so the order can be looked up by it.
    pub fn from_event(event: &WebhookEvent) -> Self {
        let order_id = event.storefront_order_id().map(OrderId::from);
        let gateway_order_id = event.gateway_order_id().map(String::from);
        match event.event.as_str() {
            "payment.captured" | "order.paid" => {
                let (Some(payment), Some(gateway_order_id)) = (event.payment(), gateway_order_id) else {
                    return Self::Ignore(format!("{} without a payment against a gateway order", event.event));
                };
                Self::Settle { order_id, gateway_order_id, payment_id: payment.id.clone() }
            },
            "payment.failed" => {
                let payment_id = event.payment().map(|p| p.id.clone());
                Self::PaymentAttemptFailed { order_id, gateway_order_id, payment_id }
            },
            "refund.processed" => Self::Refund { order_id, gateway_order_id },
            other => Self::Ignore(other.to_string()),
        }
    }
}

pub const SETTLEMENT_EVENT_BUFFER_SIZE: usize = 25;

/// Hooks that run after an order has been settled. For now they write the earnings to the audit log.
pub fn create_settlement_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_order_settled(|ev| {
        let OrderSettledEvent { order, earnings } = ev;
        if earnings.is_empty() {
            info!("🧾️ Order {} settled. No earnings were credited.", order.order_id);
            return no_op();
        }
        for record in &earnings {
            info!(
                "🧾️ Order {} credited {} with {} for line item {} (rate {})",
                order.order_id, record.artist_id, record.amount, record.line_item_id, record.commission_rate
            );
        }
        no_op()
    });
    EventHandlers::new(SETTLEMENT_EVENT_BUFFER_SIZE, hooks)
}

fn no_op() -> BoxFuture<'static, ()> {
    Box::pin(async {})
}
