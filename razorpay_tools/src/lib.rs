//! A thin client for the parts of the Razorpay REST API that checkout needs, and the types of the webhook payloads
//! that Razorpay delivers.
mod api;
mod config;
mod error;
mod helpers;

mod data_objects;

pub use api::RazorpayApi;
pub use config::RazorpayConfig;
pub use data_objects::{
    GatewayOrder,
    NewGatewayOrder,
    Notes,
    PaymentEntity,
    RefundEntity,
    WebhookEntity,
    WebhookEvent,
    WebhookPayload,
};
pub use error::RazorpayApiError;
pub use helpers::amount_in_minor_units;
