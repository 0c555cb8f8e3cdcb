use std::fmt::Debug;

use chrono::Utc;
use log::*;
use pod_common::Secret;

use crate::{
    db_types::{EarningsRecord, Order, OrderId},
    events::{EventProducers, OrderSettledEvent},
    helpers::PaymentVerification,
    settlement_api::{
        earnings_allocator::{Allocation, AllocationPlan, EarningsAllocator},
        errors::SettlementError,
        order_state::{transition, OrderEvent, OrderStage, Transition},
        settlement_objects::SettlementResult,
    },
    traits::{CommitOutcome, SettlementCommit, SettlementDatabase, StateGuard},
};

/// How many times a guarded update is retried after losing a race before giving up.
const MAX_ATTEMPTS: usize = 3;

/// `SettlementApi` is the primary API for moving orders through payment and into the earnings ledger, in response to
/// gateway callbacks and storefront events.
///
/// A settlement verifies the callback, marks the order as paid and confirmed, and writes one earnings record per
/// attributable line item. The state change and the earnings are committed together or not at all. Every flow is
/// safe to repeat: a duplicate callback returns the same result without writing anything new.
pub struct SettlementApi<B> {
    db: B,
    allocator: EarningsAllocator<B>,
    secret: Secret<String>,
    producers: EventProducers,
}

impl<B> Debug for SettlementApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi")
    }
}

impl<B> SettlementApi<B>
where B: SettlementDatabase
{
    /// `secret` is the merchant secret that payment signatures are checked against.
    pub fn new(db: B, secret: Secret<String>, producers: EventProducers) -> Self {
        let allocator = EarningsAllocator::new(db.clone());
        Self { db, allocator, secret, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }

    pub fn allocator(&self) -> &EarningsAllocator<B> {
        &self.allocator
    }

    /// Settles an order from a buyer's payment callback.
    ///
    /// 1. The callback signature is checked. An inauthentic callback fails with
    ///    [`SettlementError::InvalidSignature`] and the order is not read or touched.
    /// 2. The order is loaded. ([`SettlementError::OrderNotFound`])
    /// 3. The order moves to paid, then confirmed. If it was already settled, this is a no-op.
    /// 4. Earnings are computed for every line item without a record.
    /// 5. The state change and the new earnings records are committed in one transaction.
    pub async fn settle(&self, verification: &PaymentVerification) -> Result<SettlementResult, SettlementError> {
        let order_id = &verification.order_id;
        trace!("🧾️ Verifying payment {} for order {order_id}", verification.payment_id);
        if !verification.is_authentic(&self.secret)? {
            warn!(
                "🧾️ Rejected payment callback for order {order_id}: the signature over {}|{} is not authentic",
                verification.gateway_order_id, verification.payment_id
            );
            return Err(SettlementError::InvalidSignature(order_id.clone()));
        }
        self.settle_authenticated(order_id, Some(&verification.gateway_order_id), &verification.payment_id).await
    }

    /// Settles an order from a gateway webhook. The caller has already authenticated the delivery (the webhook body
    /// carries its own HMAC), so this runs steps 2 to 5 of [`Self::settle`].
    pub async fn settle_webhook(
        &self,
        order_id: &OrderId,
        gateway_order_id: &str,
        payment_id: &str,
    ) -> Result<SettlementResult, SettlementError> {
        self.settle_authenticated(order_id, Some(gateway_order_id), payment_id).await
    }

    async fn settle_authenticated(
        &self,
        order_id: &OrderId,
        gateway_order_id: Option<&str>,
        payment_id: &str,
    ) -> Result<SettlementResult, SettlementError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let order = self.fetch_existing_order(order_id).await?;
            if let (Some(expected), Some(received)) = (order.gateway_order_id.as_deref(), gateway_order_id) {
                if expected != received {
                    warn!("🧾️ Payment for order {order_id} names gateway order {received}, expected {expected}");
                    return Err(SettlementError::GatewayOrderMismatch {
                        order_id: order_id.clone(),
                        expected: expected.to_string(),
                        received: received.to_string(),
                    });
                }
            }
            let stage = OrderStage::of(&order)?;
            if stage.is_settled() {
                debug!("🧾️ Order {order_id} is already settled ({stage}). Treating payment {payment_id} as a duplicate");
                let plan = self.allocator.plan(&order).await?;
                return self.reconcile_settled(order, plan).await;
            }
            let now = Utc::now();
            let capture = OrderEvent::CapturePayment { gateway_payment_id: payment_id.to_string() };
            let mut confirmed = transition(&order, &capture, now)
                .and_then(|paid| transition(paid.order(), &OrderEvent::Confirm, now))
                .map_err(|e| {
                    warn!("🧾️ {e}");
                    SettlementError::from(e)
                })?
                .into_order();
            if confirmed.gateway_order_id.is_none() {
                confirmed.gateway_order_id = gateway_order_id.map(String::from);
            }
            let AllocationPlan { to_insert, existing, skipped } = self.allocator.plan(&order).await?;
            let guard = StateGuard::from(&order);
            let commit = SettlementCommit { transition: Some((guard, confirmed.clone())), earnings: to_insert };
            match self.db.commit_settlement(commit).await? {
                CommitOutcome::Committed { order: updated, earnings } => {
                    let updated = updated.unwrap_or(confirmed);
                    let allocation = Allocation::from_results(earnings, existing, skipped);
                    info!(
                        "🧾️ Order {order_id} settled by payment {payment_id}. {} earnings records created, {} existing, \
                         {} line items skipped",
                        allocation.created.len(),
                        allocation.existing.len(),
                        allocation.skipped.len()
                    );
                    self.call_order_settled_hook(&updated, &allocation.created).await;
                    return Ok(SettlementResult::new(&updated, &allocation, false));
                },
                CommitOutcome::StateConflict => {
                    debug!("🧾️ Order {order_id} changed while settling (attempt {attempt}). Re-reading it.");
                },
            }
        }
        error!("🧾️ Order {order_id} kept changing underneath {MAX_ATTEMPTS} settlement attempts. Giving up.");
        Err(SettlementError::TransientPersistenceFailure(format!(
            "order {order_id} was modified concurrently {MAX_ATTEMPTS} times"
        )))
    }

    /// The idempotent path. The order is already settled, so only earnings that are still missing are written.
    async fn reconcile_settled(&self, order: Order, plan: AllocationPlan) -> Result<SettlementResult, SettlementError> {
        let AllocationPlan { to_insert, existing, skipped } = plan;
        let results = if to_insert.is_empty() {
            Vec::new()
        } else {
            info!("🧾️ Settled order {} is missing {} earnings records. Writing them now.", order.order_id, to_insert.len());
            self.db.insert_earnings_records(to_insert).await?
        };
        let allocation = Allocation::from_results(results, existing, skipped);
        Ok(SettlementResult::new(&order, &allocation, true))
    }

    /// Records that the buyer has started paying, against a freshly created gateway order.
    pub async fn begin_payment(&self, order_id: &OrderId, gateway_order_id: &str) -> Result<Order, SettlementError> {
        let event = OrderEvent::InitiatePayment { gateway_order_id: gateway_order_id.to_string() };
        self.apply_event(order_id, event).await
    }

    /// Marks the order's payment as failed, e.g. when checkout is abandoned after a declined payment.
    ///
    /// The order stays open. A later capture on the same gateway order still settles it, and a new checkout may be
    /// started with [`Self::begin_payment`].
    pub async fn record_payment_failure(&self, order_id: &OrderId) -> Result<Order, SettlementError> {
        self.apply_event(order_id, OrderEvent::FailPayment).await
    }

    /// Applies a lifecycle event to an order through a guarded update, and returns the order as stored.
    ///
    /// Duplicate events return the order unchanged. A payment capture is routed through the settlement flow so that
    /// earnings are never skipped.
    pub async fn apply_event(&self, order_id: &OrderId, event: OrderEvent) -> Result<Order, SettlementError> {
        if let OrderEvent::CapturePayment { gateway_payment_id } = &event {
            self.settle_authenticated(order_id, None, gateway_payment_id).await?;
            return self.fetch_existing_order(order_id).await;
        }
        for attempt in 1..=MAX_ATTEMPTS {
            let order = self.fetch_existing_order(order_id).await?;
            let next = match transition(&order, &event, Utc::now()) {
                Ok(Transition::Unchanged(order)) => {
                    debug!("🧾️ '{event}' on order {order_id} is a duplicate. Nothing to do.");
                    return Ok(order);
                },
                Ok(Transition::Applied(next)) => next,
                Err(e) => {
                    warn!("🧾️ {e}");
                    return Err(e.into());
                },
            };
            match self.db.update_order_status(&StateGuard::from(&order), &next).await? {
                Some(updated) => {
                    info!("🧾️ Applied '{event}' to order {order_id}. It is now {}", OrderStage::of(&updated)?);
                    return Ok(updated);
                },
                None => debug!("🧾️ Order {order_id} changed while applying '{event}' (attempt {attempt}). Retrying."),
            }
        }
        error!("🧾️ Could not apply '{event}' to order {order_id} after {MAX_ATTEMPTS} attempts");
        Err(SettlementError::TransientPersistenceFailure(format!(
            "order {order_id} was modified concurrently {MAX_ATTEMPTS} times"
        )))
    }

    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, SettlementError> {
        Ok(self.db.fetch_order(order_id).await?)
    }

    /// Finds the order a gateway order was opened for. Webhooks without our order id in their notes are matched this
    /// way.
    pub async fn fetch_order_by_gateway_order_id(&self, gateway_order_id: &str) -> Result<Option<Order>, SettlementError> {
        Ok(self.db.fetch_order_by_gateway_order_id(gateway_order_id).await?)
    }

    pub async fn earnings_for_order(&self, order_id: &OrderId) -> Result<Vec<EarningsRecord>, SettlementError> {
        Ok(self.db.fetch_earnings_for_order(order_id).await?)
    }

    async fn fetch_existing_order(&self, order_id: &OrderId) -> Result<Order, SettlementError> {
        self.db.fetch_order(order_id).await?.ok_or_else(|| {
            warn!("🧾️ Order {order_id} does not exist");
            SettlementError::OrderNotFound(order_id.clone())
        })
    }

    async fn call_order_settled_hook(&self, order: &Order, created: &[EarningsRecord]) {
        for emitter in &self.producers.order_settled_producer {
            debug!("🧾️ Notifying order settled hook subscribers");
            let event = OrderSettledEvent::new(order.clone(), created.to_vec());
            emitter.publish_event(event).await;
        }
    }
}
