use std::fmt::Display;

use pod_common::{Money, DEFAULT_CURRENCY_CODE};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use settlement_engine::{db_types::OrderId, helpers::PaymentVerification, SettlementResult};

/// The body the storefront posts to `/payment/verify` after checkout, as relayed from the gateway's callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    #[serde(rename = "orderId")]
    pub order_id: OrderId,
}

impl From<VerifyPaymentRequest> for PaymentVerification {
    fn from(req: VerifyPaymentRequest) -> Self {
        Self {
            gateway_order_id: req.razorpay_order_id,
            payment_id: req.razorpay_payment_id,
            signature: req.razorpay_signature,
            order_id: req.order_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    #[serde(flatten)]
    pub settlement: SettlementResult,
}

impl From<SettlementResult> for VerifyPaymentResponse {
    fn from(settlement: SettlementResult) -> Self {
        Self { success: true, settlement }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub order_id: OrderId,
    /// In major units, e.g. `800` or `19.99`.
    #[serde(deserialize_with = "amount_from_json")]
    pub amount: Money,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub success: bool,
    pub razorpay_order_id: String,
    /// In minor units, as the checkout widget expects it.
    pub amount: i64,
    pub currency: String,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY_CODE.to_string()
}

/// Accepts the amount as a JSON number or a decimal string. Either way it is parsed as a decimal, never as a float.
fn amount_from_json<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s,
        other => return Err(D::Error::custom(format!("expected an amount, got {other}"))),
    };
    text.parse::<Money>().map_err(D::Error::custom)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}
