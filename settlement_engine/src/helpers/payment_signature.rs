//! # Payment callback signatures
//!
//! When a buyer completes checkout, the payment gateway redirects back to the storefront with the gateway order id,
//! the payment id and a signature. Anyone can post that body to us, so before an order is marked as paid we check
//! that the signature was produced with our merchant secret.
//!
//! ## Message format
//!
//! ```text
//!    HMAC-SHA256(key = merchant_secret, message = "{gateway_order_id}|{payment_id}")
//! ```
//!
//! The signature is sent as lowercase hex. Verification is constant-time.
//!
//! Webhook deliveries use the same primitive over the raw request body, keyed with the webhook secret
//! ([`verify_hmac`]).
use hmac::{Hmac, Mac};
use pod_common::Secret;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::db_types::OrderId;

type HmacSha256 = Hmac<Sha256>;

/// The merchant secret is not configured. Nothing can be verified, so this is fatal to the request.
#[derive(Debug, Clone, Error)]
#[error("Payment gateway secret is not configured: {0}")]
pub struct ConfigurationError(pub String);

/// The payload of a payment callback. It lives only as long as the request that carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentVerification {
    pub gateway_order_id: String,
    pub payment_id: String,
    pub signature: String,
    pub order_id: OrderId,
}

impl PaymentVerification {
    pub fn new(gateway_order_id: &str, payment_id: &str, signature: &str, order_id: OrderId) -> Self {
        Self {
            gateway_order_id: gateway_order_id.to_string(),
            payment_id: payment_id.to_string(),
            signature: signature.to_string(),
            order_id,
        }
    }

    pub fn is_authentic(&self, secret: &Secret<String>) -> Result<bool, ConfigurationError> {
        verify_payment_signature(&self.gateway_order_id, &self.payment_id, &self.signature, secret)
    }
}

fn signature_message(gateway_order_id: &str, payment_id: &str) -> String {
    format!("{gateway_order_id}|{payment_id}")
}

fn new_mac(secret: &Secret<String>) -> Result<HmacSha256, ConfigurationError> {
    if secret.is_missing() {
        return Err(ConfigurationError("the signing secret is empty".into()));
    }
    HmacSha256::new_from_slice(secret.reveal().as_bytes()).map_err(|e| ConfigurationError(e.to_string()))
}

/// Hex-encoded HMAC-SHA256 of `data`.
pub fn calculate_hmac(secret: &Secret<String>, data: &[u8]) -> Result<String, ConfigurationError> {
    let mut mac = new_mac(secret)?;
    mac.update(data);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a hex-encoded HMAC-SHA256 `signature` over `data`.
///
/// Malformed signatures (wrong length, non-hex characters) are simply not authentic.
pub fn verify_hmac(secret: &Secret<String>, data: &[u8], signature: &str) -> Result<bool, ConfigurationError> {
    let mut mac = new_mac(secret)?;
    let Ok(expected) = hex::decode(signature.trim()) else {
        return Ok(false);
    };
    mac.update(data);
    Ok(mac.verify_slice(&expected).is_ok())
}

/// Produces the signature the gateway would send for this pair of ids.
pub fn sign_payment(
    gateway_order_id: &str,
    payment_id: &str,
    secret: &Secret<String>,
) -> Result<String, ConfigurationError> {
    calculate_hmac(secret, signature_message(gateway_order_id, payment_id).as_bytes())
}

/// Returns `Ok(true)` only if `signature` is the merchant's signature over `gateway_order_id|payment_id`.
///
/// Untrusted input never produces an error. The only error is a missing secret.
pub fn verify_payment_signature(
    gateway_order_id: &str,
    payment_id: &str,
    signature: &str,
    secret: &Secret<String>,
) -> Result<bool, ConfigurationError> {
    let message = signature_message(gateway_order_id, payment_id);
    verify_hmac(secret, message.as_bytes(), signature)
}
