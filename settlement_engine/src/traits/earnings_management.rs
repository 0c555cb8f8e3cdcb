use crate::{
    db_types::{ArtistId, EarningsRecord, NewEarningsRecord, OrderId},
    traits::{InsertEarningsResult, SettlementDbError},
};

/// The `EarningsManagement` trait defines access to the artist earnings ledger.
///
/// The ledger holds at most one record per order line item. Backends must enforce this in storage (a unique
/// constraint), not in memory, since several processes may settle the same order concurrently.
#[allow(async_fn_in_trait)]
pub trait EarningsManagement {
    /// Inserts the record unless one already exists for its line item, in which case the existing record is returned.
    async fn insert_earnings_record(&self, record: NewEarningsRecord) -> Result<InsertEarningsResult, SettlementDbError>;

    async fn fetch_earnings_for_line_item(&self, line_item_id: i64) -> Result<Option<EarningsRecord>, SettlementDbError>;

    async fn fetch_earnings_for_order(&self, order_id: &OrderId) -> Result<Vec<EarningsRecord>, SettlementDbError>;

    async fn fetch_earnings_for_artist(&self, artist_id: &ArtistId) -> Result<Vec<EarningsRecord>, SettlementDbError>;
}
