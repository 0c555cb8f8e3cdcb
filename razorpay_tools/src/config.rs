use log::*;
use pod_common::Secret;

pub const DEFAULT_RAZORPAY_API_URL: &str = "https://api.razorpay.com/v1";

#[derive(Debug, Clone, Default)]
pub struct RazorpayConfig {
    /// Base URL of the REST API, without a trailing slash.
    pub api_url: String,
    /// The public key id. Together with `key_secret` it authenticates API calls.
    pub key_id: String,
    /// Signs the checkout callbacks that the buyer's browser relays to us.
    pub key_secret: Secret<String>,
    /// Signs webhook deliveries. Set separately in the Razorpay dashboard.
    pub webhook_secret: Secret<String>,
}

impl RazorpayConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("POD_RAZORPAY_API_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| {
                info!("POD_RAZORPAY_API_URL not set, using {DEFAULT_RAZORPAY_API_URL}");
                DEFAULT_RAZORPAY_API_URL.to_string()
            });
        let key_id = std::env::var("POD_RAZORPAY_KEY_ID").unwrap_or_else(|_| {
            error!("POD_RAZORPAY_KEY_ID not set. Creating payments will fail.");
            String::default()
        });
        let key_secret = Secret::new(std::env::var("POD_RAZORPAY_KEY_SECRET").unwrap_or_else(|_| {
            error!("POD_RAZORPAY_KEY_SECRET not set. Payment callbacks cannot be verified and will be refused.");
            String::default()
        }));
        let webhook_secret = Secret::new(std::env::var("POD_RAZORPAY_WEBHOOK_SECRET").unwrap_or_else(|_| {
            error!("POD_RAZORPAY_WEBHOOK_SECRET not set. Webhook deliveries cannot be verified.");
            String::default()
        }));
        Self { api_url, key_id, key_secret, webhook_secret }
    }
}
