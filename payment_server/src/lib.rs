//! # Print-on-demand payment server
//! This crate hosts the HTTP boundary of order settlement. It is responsible for:
//! Opening gateway orders when a buyer starts checkout.
//! Verifying the payment callbacks that the buyer's browser relays back to us, and settling the order.
//! Receiving gateway webhooks, which settle, fail or refund orders independently of the buyer's browser.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/payment/create`: Opens a gateway order for a storefront order.
//! * `/payment/verify`: Checks a payment callback signature and settles the order.
//! * `/payment/webhook`: Gateway webhook deliveries, authenticated by HMAC over the body.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;

pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
