//! # Earnings allocation
//!
//! Every line item that carries an artist's design earns that artist a commission:
//!
//! ```text
//!   commission = unit_price * quantity * commission_rate
//! ```
//!
//! rounded to whole cents, half-up, once per line item. The rate is the artist's profile rate at the moment of
//! allocation and is copied onto the earnings record, so later profile changes never alter past earnings.
//!
//! The ledger holds at most one record per line item. [`EarningsAllocator::plan`] reads existing records and only
//! proposes records for line items that have none; the storage layer's unique constraint catches the rest.
use std::collections::HashMap;

use log::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    db_types::{ArtistId, CommissionRate, EarningsRecord, LineItem, Money, NewEarningsRecord, Order, OrderId},
    traits::{InsertEarningsResult, SettlementDatabase, SettlementDbError},
};

const MICROS_PER_CENT: i128 = pod_common::MICROS_PER_CENT as i128;
const PPM: i128 = pod_common::PPM_SCALE as i128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The line item has no design, the design no longer exists, or its artist has no profile.
    ArtistUnresolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLineItem {
    pub line_item_id: i64,
    pub reason: SkipReason,
}

/// What allocating an order would write, computed without writing anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationPlan {
    pub to_insert: Vec<NewEarningsRecord>,
    pub existing: Vec<EarningsRecord>,
    pub skipped: Vec<SkippedLineItem>,
}

impl AllocationPlan {
    pub fn is_empty(&self) -> bool {
        self.to_insert.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allocation {
    pub created: Vec<EarningsRecord>,
    pub existing: Vec<EarningsRecord>,
    pub skipped: Vec<SkippedLineItem>,
}

impl Allocation {
    /// Sorts insert results into created and pre-existing records.
    pub fn from_results(results: Vec<InsertEarningsResult>, existing: Vec<EarningsRecord>, skipped: Vec<SkippedLineItem>) -> Self {
        let mut allocation = Self { created: Vec::new(), existing, skipped };
        for result in results {
            match result {
                InsertEarningsResult::Inserted(r) => allocation.created.push(r),
                InsertEarningsResult::AlreadyExists(r) => allocation.existing.push(r),
            }
        }
        allocation
    }
}

#[derive(Debug, Clone, Error)]
pub enum AllocationError {
    #[error("Line item {line_item_id} of order {order_id} has a non-positive quantity ({quantity})")]
    InvalidQuantity { order_id: OrderId, line_item_id: i64, quantity: i64 },
    #[error("Artist {artist_id} has a commission rate outside [0, 1]: {rate}")]
    InvalidCommissionRate { artist_id: ArtistId, rate: CommissionRate },
    #[error("The commission for line item {0} does not fit in a monetary value")]
    CommissionOverflow(i64),
    #[error("Could not read or write allocation data. {0}")]
    DatabaseError(#[from] SettlementDbError),
}

/// The artist's commission on `quantity` units at `unit_price`, rounded half-up to whole cents.
///
/// All arithmetic is exact: the product is formed in 128-bit integers and rounded once. Returns `None` if the result
/// does not fit in [`Money`].
pub fn commission_for(unit_price: Money, quantity: i64, rate: CommissionRate) -> Option<Money> {
    let scaled = i128::from(unit_price.value())
        .checked_mul(i128::from(quantity))?
        .checked_mul(i128::from(rate.ppm()))?;
    let per_cent = MICROS_PER_CENT * PPM;
    let cents = scaled.checked_add(per_cent / 2)?.div_euclid(per_cent);
    let micros = cents.checked_mul(MICROS_PER_CENT)?;
    i64::try_from(micros).ok().map(Money::from_micros)
}

/// Computes and records artist earnings for orders.
#[derive(Clone)]
pub struct EarningsAllocator<B> {
    db: B,
}

impl<B> EarningsAllocator<B>
where B: SettlementDatabase
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Works out the earnings records the order still needs. Nothing is written.
    ///
    /// Line items whose artist cannot be resolved are reported in `skipped` and do not fail the plan. Rates are read
    /// once per artist, so every line item by the same artist in this order uses the same rate.
    pub async fn plan(&self, order: &Order) -> Result<AllocationPlan, AllocationError> {
        let mut plan = AllocationPlan::default();
        let mut rates: HashMap<ArtistId, Option<CommissionRate>> = HashMap::new();
        for item in &order.line_items {
            if let Some(record) = self.db.fetch_earnings_for_line_item(item.id).await? {
                trace!("💸️ Line item {} of order {} already has earnings record #{}", item.id, order.order_id, record.id);
                plan.existing.push(record);
                continue;
            }
            if item.quantity <= 0 {
                return Err(AllocationError::InvalidQuantity {
                    order_id: order.order_id.clone(),
                    line_item_id: item.id,
                    quantity: item.quantity,
                });
            }
            let Some((artist_id, rate)) = self.resolve_artist(item, &mut rates).await? else {
                warn!(
                    "💸️ Cannot attribute line item {} of order {} (design {:?}) to an artist. It is skipped.",
                    item.id, order.order_id, item.design_id
                );
                plan.skipped.push(SkippedLineItem { line_item_id: item.id, reason: SkipReason::ArtistUnresolved });
                continue;
            };
            let amount = commission_for(item.unit_price, item.quantity, rate)
                .ok_or(AllocationError::CommissionOverflow(item.id))?;
            debug!(
                "💸️ Line item {}: {} x {} at {rate} earns {artist_id} {amount}",
                item.id, item.quantity, item.unit_price
            );
            plan.to_insert.push(NewEarningsRecord {
                artist_id,
                order_id: order.order_id.clone(),
                line_item_id: item.id,
                amount,
                commission_rate: rate,
            });
        }
        Ok(plan)
    }

    /// Plans the order's earnings and writes the new records in one transaction.
    ///
    /// Running this twice for the same order creates nothing the second time; the first run's records come back as
    /// `existing`.
    pub async fn allocate(&self, order: &Order) -> Result<Allocation, AllocationError> {
        let AllocationPlan { to_insert, existing, skipped } = self.plan(order).await?;
        let results = self.db.insert_earnings_records(to_insert).await?;
        let allocation = Allocation::from_results(results, existing, skipped);
        info!(
            "💸️ Allocated earnings for order {}: {} created, {} existing, {} skipped",
            order.order_id,
            allocation.created.len(),
            allocation.existing.len(),
            allocation.skipped.len()
        );
        Ok(allocation)
    }

    async fn resolve_artist(
        &self,
        item: &LineItem,
        rates: &mut HashMap<ArtistId, Option<CommissionRate>>,
    ) -> Result<Option<(ArtistId, CommissionRate)>, AllocationError> {
        let Some(design_id) = &item.design_id else {
            return Ok(None);
        };
        let Some(artist_id) = self.db.fetch_artist_for_design(design_id).await? else {
            return Ok(None);
        };
        let rate = match rates.get(&artist_id) {
            Some(rate) => *rate,
            None => {
                let rate = self.db.fetch_artist_commission_rate(&artist_id).await?;
                rates.insert(artist_id.clone(), rate);
                rate
            },
        };
        match rate {
            Some(rate) if !rate.is_valid() => Err(AllocationError::InvalidCommissionRate { artist_id, rate }),
            Some(rate) => Ok(Some((artist_id, rate))),
            None => Ok(None),
        }
    }
}
