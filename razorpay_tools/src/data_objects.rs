use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Free-form key/value pairs attached to a Razorpay entity. We use them to carry the storefront's order id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notes {
    #[serde(rename = "orderId", default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

impl Notes {
    pub fn for_order(order_id: &str) -> Self {
        Self { order_id: Some(order_id.to_string()) }
    }
}

/// Razorpay sends empty notes as `[]` rather than `{}`.
fn lenient_notes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Notes, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Object(_) => serde_json::from_value(value).map_err(serde::de::Error::custom),
        _ => Ok(Notes::default()),
    }
}

/// The body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGatewayOrder {
    /// In minor units
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub notes: Notes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub amount_due: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
    #[serde(default, deserialize_with = "lenient_notes")]
    pub notes: Notes,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEntity {
    pub id: String,
    pub order_id: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    #[serde(default, deserialize_with = "lenient_notes")]
    pub notes: Notes,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundEntity {
    pub id: String,
    pub payment_id: String,
    pub amount: i64,
    #[serde(default, deserialize_with = "lenient_notes")]
    pub notes: Notes,
}

/// Razorpay wraps every entity in the webhook payload as `{"entity": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEntity<T> {
    pub entity: T,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub payment: Option<WebhookEntity<PaymentEntity>>,
    pub order: Option<WebhookEntity<GatewayOrder>>,
    pub refund: Option<WebhookEntity<RefundEntity>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub payload: WebhookPayload,
}

impl WebhookEvent {
    pub fn payment(&self) -> Option<&PaymentEntity> {
        self.payload.payment.as_ref().map(|p| &p.entity)
    }

    pub fn order(&self) -> Option<&GatewayOrder> {
        self.payload.order.as_ref().map(|o| &o.entity)
    }

    pub fn refund(&self) -> Option<&RefundEntity> {
        self.payload.refund.as_ref().map(|r| &r.entity)
    }

    /// The storefront order id, taken from the notes of the payment, the order or the refund, whichever has it.
    pub fn storefront_order_id(&self) -> Option<&str> {
        self.payment()
            .and_then(|p| p.notes.order_id.as_deref())
            .or_else(|| self.order().and_then(|o| o.notes.order_id.as_deref()))
            .or_else(|| self.refund().and_then(|r| r.notes.order_id.as_deref()))
    }

    /// The gateway order id, from the payment if present, otherwise from the order entity.
    pub fn gateway_order_id(&self) -> Option<&str> {
        self.payment().and_then(|p| p.order_id.as_deref()).or_else(|| self.order().map(|o| o.id.as_str()))
    }
}
