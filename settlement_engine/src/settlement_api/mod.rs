//! # Settlement engine public API
//!
//! The `settlement_api` module exposes the programmatic API of the settlement engine.
//!
//! * [`order_state`] is the order state machine. It is pure: it decides what an event does to an order, and nothing
//!   else.
//! * [`earnings_allocator`] computes artist commissions per line item and writes them to the earnings ledger, at most
//!   once per line item.
//! * [`settlement_flow_api`] ties payment verification, the state machine and the allocator together, and commits
//!   their writes atomically.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the backend traits it requires.
//!
//! ```rust,ignore
//! use settlement_engine::{events::EventProducers, SettlementApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/pod_store.db", 25).await?;
//! let api = SettlementApi::new(db, merchant_secret, EventProducers::default());
//! let result = api.settle(&verification).await?;
//! ```
pub mod earnings_allocator;
pub mod errors;
pub mod order_state;
pub mod settlement_flow_api;
pub mod settlement_objects;
