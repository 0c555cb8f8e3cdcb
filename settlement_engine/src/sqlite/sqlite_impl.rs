//! `SqliteDatabase` is a concrete implementation of a settlement engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{artists, db_url, earnings, new_pool, orders};
use crate::{
    db_types::{ArtistId, CommissionRate, DesignId, EarningsRecord, NewEarningsRecord, NewOrder, Order, OrderId},
    traits::{
        ArtistProfiles,
        CommitOutcome,
        EarningsManagement,
        InsertEarningsResult,
        OrderManagement,
        SettlementCommit,
        SettlementDatabase,
        SettlementDbError,
        StateGuard,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SettlementDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    /// The guarded order update is the first statement of the transaction, so the transaction takes the write lock
    /// before it reads anything. A concurrent settlement of the same order waits for the lock, then finds the order
    /// changed and matches no row.
    async fn commit_settlement(&self, commit: SettlementCommit) -> Result<CommitOutcome, SettlementDbError> {
        let mut tx = self.pool.begin().await?;
        let order = match commit.transition {
            Some((guard, updated)) => match orders::update_order_state(&guard, &updated, &mut tx).await? {
                Some(order) => {
                    let items = orders::fetch_line_items(&order.order_id, &mut tx).await?;
                    Some(order.with_line_items(items))
                },
                None => {
                    debug!("🗃️ Order #{} no longer matches the expected state. Rolling back.", guard.id);
                    tx.rollback().await?;
                    return Ok(CommitOutcome::StateConflict);
                },
            },
            None => None,
        };
        let mut results = Vec::with_capacity(commit.earnings.len());
        for record in commit.earnings {
            results.push(earnings::idempotent_insert(record, &mut tx).await?);
        }
        tx.commit().await?;
        if let Some(order) = &order {
            debug!(
                "🗃️ Order {} is now {}/{}. {} earnings records written",
                order.order_id,
                order.order_status,
                order.payment_status,
                results.iter().filter(|r| r.was_inserted()).count()
            );
        }
        Ok(CommitOutcome::Committed { order, earnings: results })
    }

    async fn insert_earnings_records(
        &self,
        records: Vec<NewEarningsRecord>,
    ) -> Result<Vec<InsertEarningsResult>, SettlementDbError> {
        let mut tx = self.pool.begin().await?;
        let mut results = Vec::with_capacity(records.len());
        for record in records {
            results.push(earnings::idempotent_insert(record, &mut tx).await?);
        }
        tx.commit().await?;
        Ok(results)
    }

    async fn close(&mut self) -> Result<(), SettlementDbError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn create_order(&self, order: NewOrder) -> Result<Order, SettlementDbError> {
        let mut tx = self.pool.begin().await?;
        let (order, inserted) = orders::idempotent_insert(order, &mut tx).await?;
        tx.commit().await?;
        if inserted {
            debug!("🗃️ Order {} has been saved in the DB with id {}", order.order_id, order.id);
        } else {
            debug!("🗃️ Order {} already exists. Returning the stored order", order.order_id);
        }
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, SettlementDbError> {
        let mut conn = self.pool.acquire().await?;
        let Some(order) = orders::fetch_order_by_order_id(order_id, &mut conn).await? else {
            return Ok(None);
        };
        let items = orders::fetch_line_items(order_id, &mut conn).await?;
        Ok(Some(order.with_line_items(items)))
    }

    async fn fetch_order_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<Order>, SettlementDbError> {
        let mut conn = self.pool.acquire().await?;
        let Some(order) = orders::fetch_order_by_gateway_order_id(gateway_order_id, &mut conn).await? else {
            return Ok(None);
        };
        let items = orders::fetch_line_items(&order.order_id, &mut conn).await?;
        Ok(Some(order.with_line_items(items)))
    }

    async fn update_order_status(
        &self,
        expected: &StateGuard,
        updated: &Order,
    ) -> Result<Option<Order>, SettlementDbError> {
        let mut tx = self.pool.begin().await?;
        let Some(order) = orders::update_order_state(expected, updated, &mut tx).await? else {
            tx.rollback().await?;
            return Ok(None);
        };
        let items = orders::fetch_line_items(&order.order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(Some(order.with_line_items(items)))
    }
}

impl EarningsManagement for SqliteDatabase {
    async fn insert_earnings_record(&self, record: NewEarningsRecord) -> Result<InsertEarningsResult, SettlementDbError> {
        let mut conn = self.pool.acquire().await?;
        earnings::idempotent_insert(record, &mut conn).await
    }

    async fn fetch_earnings_for_line_item(&self, line_item_id: i64) -> Result<Option<EarningsRecord>, SettlementDbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(earnings::fetch_by_line_item(line_item_id, &mut conn).await?)
    }

    async fn fetch_earnings_for_order(&self, order_id: &OrderId) -> Result<Vec<EarningsRecord>, SettlementDbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(earnings::fetch_for_order(order_id, &mut conn).await?)
    }

    async fn fetch_earnings_for_artist(&self, artist_id: &ArtistId) -> Result<Vec<EarningsRecord>, SettlementDbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(earnings::fetch_for_artist(artist_id, &mut conn).await?)
    }
}

impl ArtistProfiles for SqliteDatabase {
    async fn fetch_artist_for_design(&self, design_id: &DesignId) -> Result<Option<ArtistId>, SettlementDbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(artists::fetch_artist_for_design(design_id, &mut conn).await?)
    }

    async fn fetch_artist_commission_rate(
        &self,
        artist_id: &ArtistId,
    ) -> Result<Option<CommissionRate>, SettlementDbError> {
        let mut conn = self.pool.acquire().await?;
        Ok(artists::fetch_commission_rate(artist_id, &mut conn).await?)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date. Already-applied migrations are skipped.
    pub async fn run_migrations(&self) -> Result<(), SettlementDbError> {
        sqlx::migrate!("./src/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| SettlementDbError::DatabaseError(format!("Could not run migrations. {e}")))?;
        info!("🗃️ Database schema is up to date");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates or updates an artist profile. This stands in for the storefront's profile management.
    pub async fn upsert_artist_profile(
        &self,
        artist_id: &ArtistId,
        display_name: Option<&str>,
        rate: CommissionRate,
    ) -> Result<(), SettlementDbError> {
        let mut conn = self.pool.acquire().await?;
        artists::upsert_artist_profile(artist_id, display_name, rate, &mut conn).await?;
        Ok(())
    }

    /// Registers a design and the artist who owns it. This stands in for the storefront's catalogue.
    pub async fn insert_design(
        &self,
        design_id: &DesignId,
        artist_id: &ArtistId,
        title: Option<&str>,
    ) -> Result<(), SettlementDbError> {
        let mut conn = self.pool.acquire().await?;
        artists::insert_design(design_id, artist_id, title, &mut conn).await?;
        Ok(())
    }
}
