//! Print-on-demand Settlement Engine
//!
//! The settlement engine takes an order from "the buyer has paid" to "the order is live and every artist has been
//! credited". This library contains the core logic: it is independent of the HTTP layer and of the payment
//! gateway's REST API.
//!
//! The library is divided into these main sections:
//! 1. The data types ([`mod@db_types`]) shared by every layer: orders, line items, earnings records.
//! 2. The backend contracts ([`mod@traits`]). The engine never talks to a database directly. A backend implements
//!    these traits; [`SqliteDatabase`] is the one that ships with the engine.
//! 3. The public API ([`mod@settlement_api`]): the order state machine, the earnings allocator and the settlement
//!    flow that ties them to payment verification ([`mod@helpers`]).
//!
//! The engine also emits events that can be subscribed to ([`mod@events`]). For example, once an order has been
//! settled, an `OrderSettledEvent` is published to every `on_order_settled` hook.
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod settlement_api;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use settlement_api::{
    earnings_allocator::{commission_for, AllocationError, AllocationPlan, EarningsAllocator, SkipReason, SkippedLineItem},
    errors::SettlementError,
    order_state::{transition, OrderEvent, OrderStage, Transition, TransitionError},
    settlement_flow_api::SettlementApi,
    settlement_objects::SettlementResult,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{ArtistProfiles, EarningsManagement, OrderManagement, SettlementDatabase, SettlementDbError};
