//! # Order state machine
//!
//! An order carries two status columns, `order_status` and `payment_status`. Together with whether a gateway order
//! has been opened, they determine the order's lifecycle [`OrderStage`]:
//!
//! ```text
//!   Placed ──► PaymentPending ──► Paid ──► Confirmed ──► InProduction ──► Shipped ──► Delivered
//!     │              │             │           │
//!     │              ▼  ▲          ▼           ▼
//!     └────────► PaymentFailed   Refunded    Cancelled (payment refunded)
//!
//!   Cancelled is reachable from every stage before Shipped, except Refunded.
//!   PaymentFailed stays open: the buyer may retry on the same gateway order or start a new checkout.
//! ```
//!
//! [`transition`] is a pure function. It never touches storage and never mutates its input; the caller persists
//! the returned order with a guarded update.
//!
//! | Event             | Legal from                                                         | To             |
//! |-------------------|--------------------------------------------------------------------|----------------|
//! | `InitiatePayment` | Placed, PaymentFailed                                              | PaymentPending |
//! | `CapturePayment`  | Placed, PaymentPending, PaymentFailed                              | Paid           |
//! | `FailPayment`     | Placed, PaymentPending                                             | PaymentFailed  |
//! | `Confirm`         | Paid                                                               | Confirmed      |
//! | `StartProduction` | Confirmed                                                          | InProduction   |
//! | `Ship`            | InProduction                                                       | Shipped        |
//! | `Deliver`         | Shipped                                                            | Delivered      |
//! | `Cancel`          | Placed, PaymentPending, PaymentFailed, Paid, Confirmed, InProduction | Cancelled    |
//! | `Refund`          | Paid, Confirmed, Cancelled (if the payment was captured)           | Refunded       |
//!
//! Refunding a confirmed order also cancels it, since a refunded order must never go into production. A refunded
//! order that had been cancelled stays cancelled.
//!
//! Applying an event to an order that is already in the event's target stage (for `Refund`: whose payment is already
//! refunded) is a duplicate delivery. It succeeds with [`Transition::Unchanged`] and the order as it is.
use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{Order, OrderId, OrderStatusType, PaymentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStage {
    Placed,
    PaymentPending,
    Paid,
    PaymentFailed,
    Refunded,
    Confirmed,
    InProduction,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStage {
    pub const ALL: [OrderStage; 10] = [
        OrderStage::Placed,
        OrderStage::PaymentPending,
        OrderStage::Paid,
        OrderStage::PaymentFailed,
        OrderStage::Refunded,
        OrderStage::Confirmed,
        OrderStage::InProduction,
        OrderStage::Shipped,
        OrderStage::Delivered,
        OrderStage::Cancelled,
    ];

    /// Derives the stage from the order's stored columns.
    pub fn of(order: &Order) -> Result<Self, TransitionError> {
        use OrderStatusType as O;
        use PaymentStatus as P;
        let stage = match (order.order_status, order.payment_status) {
            (O::Cancelled, _) => Self::Cancelled,
            (O::Placed, P::Pending) if order.gateway_order_id.is_some() => Self::PaymentPending,
            (O::Placed, P::Pending) => Self::Placed,
            (O::Placed, P::Paid) => Self::Paid,
            (O::Placed, P::Failed) => Self::PaymentFailed,
            (O::Placed, P::Refunded) => Self::Refunded,
            (O::Confirmed, P::Paid) => Self::Confirmed,
            (O::InProduction, P::Paid) => Self::InProduction,
            (O::Shipped, P::Paid) => Self::Shipped,
            (O::Delivered, P::Paid) => Self::Delivered,
            (order_status, payment_status) => {
                return Err(TransitionError::InvariantViolation {
                    order_id: order.order_id.clone(),
                    order_status,
                    payment_status,
                })
            },
        };
        Ok(stage)
    }

    /// True once the payment has been captured and not reversed, i.e. the order has been (or is being) settled.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Paid | Self::Confirmed | Self::InProduction | Self::Shipped | Self::Delivered)
    }
}

impl Display for OrderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStage::Placed => "placed",
            OrderStage::PaymentPending => "payment_pending",
            OrderStage::Paid => "paid",
            OrderStage::PaymentFailed => "payment_failed",
            OrderStage::Refunded => "refunded",
            OrderStage::Confirmed => "confirmed",
            OrderStage::InProduction => "in_production",
            OrderStage::Shipped => "shipped",
            OrderStage::Delivered => "delivered",
            OrderStage::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    InitiatePayment { gateway_order_id: String },
    CapturePayment { gateway_payment_id: String },
    FailPayment,
    Confirm,
    StartProduction,
    Ship,
    Deliver,
    Cancel,
    Refund,
}

impl OrderEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OrderEvent::InitiatePayment { .. } => "initiate_payment",
            OrderEvent::CapturePayment { .. } => "capture_payment",
            OrderEvent::FailPayment => "fail_payment",
            OrderEvent::Confirm => "confirm",
            OrderEvent::StartProduction => "start_production",
            OrderEvent::Ship => "ship",
            OrderEvent::Deliver => "deliver",
            OrderEvent::Cancel => "cancel",
            OrderEvent::Refund => "refund",
        }
    }

    pub fn target(&self) -> OrderStage {
        match self {
            OrderEvent::InitiatePayment { .. } => OrderStage::PaymentPending,
            OrderEvent::CapturePayment { .. } => OrderStage::Paid,
            OrderEvent::FailPayment => OrderStage::PaymentFailed,
            OrderEvent::Confirm => OrderStage::Confirmed,
            OrderEvent::StartProduction => OrderStage::InProduction,
            OrderEvent::Ship => OrderStage::Shipped,
            OrderEvent::Deliver => OrderStage::Delivered,
            OrderEvent::Cancel => OrderStage::Cancelled,
            OrderEvent::Refund => OrderStage::Refunded,
        }
    }

    fn is_duplicate(&self, stage: OrderStage, order: &Order) -> bool {
        match self {
            OrderEvent::Refund => order.payment_status == PaymentStatus::Refunded,
            _ => stage == self.target(),
        }
    }

    fn is_legal_from(&self, stage: OrderStage, order: &Order) -> bool {
        use OrderStage::*;
        match self {
            OrderEvent::InitiatePayment { .. } => matches!(stage, Placed | PaymentFailed),
            OrderEvent::CapturePayment { .. } => matches!(stage, Placed | PaymentPending | PaymentFailed),
            OrderEvent::FailPayment => matches!(stage, Placed | PaymentPending),
            OrderEvent::Confirm => stage == Paid,
            OrderEvent::StartProduction => stage == Confirmed,
            OrderEvent::Ship => stage == InProduction,
            OrderEvent::Deliver => stage == Shipped,
            OrderEvent::Cancel => {
                matches!(stage, Placed | PaymentPending | PaymentFailed | Paid | Confirmed | InProduction)
            },
            OrderEvent::Refund => {
                matches!(stage, Paid | Confirmed) || (stage == Cancelled && order.payment_status == PaymentStatus::Paid)
            },
        }
    }
}

impl Display for OrderEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Applied(Order),
    /// A duplicate event. The order is returned as it already was.
    Unchanged(Order),
}

impl Transition {
    pub fn order(&self) -> &Order {
        match self {
            Self::Applied(o) | Self::Unchanged(o) => o,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            Self::Applied(o) | Self::Unchanged(o) => o,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Cannot apply '{event}' to order {order_id} while it is {stage}")]
    IllegalTransition { order_id: OrderId, stage: OrderStage, event: &'static str },
    #[error("Order {order_id} is inconsistent: order status {order_status} with payment status {payment_status}")]
    InvariantViolation { order_id: OrderId, order_status: OrderStatusType, payment_status: PaymentStatus },
}

/// Applies `event` to `order` at time `at`, returning the order as it should be stored.
///
/// The input order is never modified. An illegal event returns [`TransitionError::IllegalTransition`] with the
/// current stage and the attempted event.
pub fn transition(order: &Order, event: &OrderEvent, at: DateTime<Utc>) -> Result<Transition, TransitionError> {
    let stage = OrderStage::of(order)?;
    if event.is_duplicate(stage, order) {
        return match event {
            OrderEvent::InitiatePayment { gateway_order_id }
                if order.gateway_order_id.as_deref() != Some(gateway_order_id.as_str()) =>
            {
                let mut next = order.clone();
                next.gateway_order_id = Some(gateway_order_id.clone());
                next.updated_at = at;
                Ok(Transition::Applied(next))
            },
            _ => Ok(Transition::Unchanged(order.clone())),
        };
    }
    if !event.is_legal_from(stage, order) {
        return Err(TransitionError::IllegalTransition { order_id: order.order_id.clone(), stage, event: event.name() });
    }
    let mut next = order.clone();
    match event {
        OrderEvent::InitiatePayment { gateway_order_id } => {
            next.payment_status = PaymentStatus::Pending;
            next.gateway_order_id = Some(gateway_order_id.clone());
        },
        OrderEvent::CapturePayment { gateway_payment_id } => {
            next.payment_status = PaymentStatus::Paid;
            next.gateway_payment_id = Some(gateway_payment_id.clone());
            next.verified_at = Some(at);
        },
        OrderEvent::FailPayment => next.payment_status = PaymentStatus::Failed,
        OrderEvent::Confirm => {
            next.order_status = OrderStatusType::Confirmed;
            next.confirmed_at = Some(at);
        },
        OrderEvent::StartProduction => next.order_status = OrderStatusType::InProduction,
        OrderEvent::Ship => next.order_status = OrderStatusType::Shipped,
        OrderEvent::Deliver => next.order_status = OrderStatusType::Delivered,
        OrderEvent::Cancel => {
            next.order_status = OrderStatusType::Cancelled;
            next.cancelled_at = Some(at);
        },
        OrderEvent::Refund => {
            next.payment_status = PaymentStatus::Refunded;
            if next.order_status == OrderStatusType::Confirmed {
                next.order_status = OrderStatusType::Cancelled;
                next.cancelled_at = Some(at);
            }
        },
    }
    next.updated_at = at;
    Ok(Transition::Applied(next))
}
