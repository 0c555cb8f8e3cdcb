//! # Settlement collaborators
//!
//! This module defines the interface contracts that a storage *backend* must satisfy for the settlement engine.
//! The engine never talks to a database directly; it is handed a backend that implements these traits, so that the
//! same flows run against SQLite in production and against test doubles in unit tests.
//!
//! * [`OrderManagement`] creates and reads orders, and applies guarded (compare-and-swap) state updates.
//! * [`EarningsManagement`] reads and idempotently writes the artist earnings ledger.
//! * [`ArtistProfiles`] resolves the artist behind a design and the artist's current commission rate.
//! * [`SettlementDatabase`] ties them together and adds the atomic settlement commit.
mod artist_profiles;
mod earnings_management;
mod order_management;
mod settlement_database;

mod data_objects;

pub use artist_profiles::ArtistProfiles;
pub use data_objects::{CommitOutcome, InsertEarningsResult, SettlementCommit, StateGuard};
pub use earnings_management::EarningsManagement;
pub use order_management::OrderManagement;
pub use settlement_database::{SettlementDatabase, SettlementDbError};
