use thiserror::Error;

use crate::{
    db_types::{NewEarningsRecord, OrderId},
    traits::{
        data_objects::{CommitOutcome, InsertEarningsResult, SettlementCommit},
        ArtistProfiles,
        EarningsManagement,
        OrderManagement,
    },
};

/// This trait defines the highest level of behaviour for backends supporting the settlement engine.
///
/// On top of the individual collaborators, a backend must be able to apply several writes as one unit. Every method
/// here runs in a single storage transaction: either all of its writes become visible, or none do.
#[allow(async_fn_in_trait)]
pub trait SettlementDatabase: Clone + OrderManagement + EarningsManagement + ArtistProfiles {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Applies a settlement in one atomic transaction:
    /// * if `commit.transition` is present, the guarded order update is applied first. If the guard no longer
    ///   matches, nothing is written and [`CommitOutcome::StateConflict`] is returned.
    /// * each earnings record is inserted unless one already exists for its line item.
    async fn commit_settlement(&self, commit: SettlementCommit) -> Result<CommitOutcome, SettlementDbError>;

    /// Idempotently inserts a batch of earnings records in one transaction. The results are returned in input order.
    async fn insert_earnings_records(
        &self,
        records: Vec<NewEarningsRecord>,
    ) -> Result<Vec<InsertEarningsResult>, SettlementDbError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), SettlementDbError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum SettlementDbError {
    #[error("We have an internal database engine (configuration/uptime etc.) problem: {0}")]
    DatabaseError(String),
    #[error("The database rejected the write: {0}")]
    ConstraintViolation(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Cannot store order {0}: {1}")]
    InvalidOrder(OrderId, String),
    #[error("An earnings record for line item {0} could not be written or read back")]
    EarningsRecordMissing(i64),
}

/// SQLite's primary result code for constraint failures. Trigger aborts share it (`SQLITE_CONSTRAINT_TRIGGER`).
const SQLITE_CONSTRAINT: i32 = 19;

impl From<sqlx::Error> for SettlementDbError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db_err) if is_constraint_violation(db_err.as_ref()) => {
                SettlementDbError::ConstraintViolation(db_err.message().to_string())
            },
            _ => SettlementDbError::DatabaseError(e.to_string()),
        }
    }
}

fn is_constraint_violation(e: &dyn sqlx::error::DatabaseError) -> bool {
    if !matches!(e.kind(), sqlx::error::ErrorKind::Other) {
        return true;
    }
    e.code().and_then(|c| c.parse::<i32>().ok()).is_some_and(|code| code & 0xff == SQLITE_CONSTRAINT)
}
