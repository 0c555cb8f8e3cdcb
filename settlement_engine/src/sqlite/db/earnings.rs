use chrono::Utc;
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{ArtistId, EarningsRecord, NewEarningsRecord, OrderId},
    traits::{InsertEarningsResult, SettlementDbError},
};

/// Inserts the earnings record unless the line item already has one.
///
/// The unique constraint on `line_item_id` decides, not a prior read, so two concurrent callers can never both insert.
/// The loser reads back the winner's record.
pub async fn idempotent_insert(
    record: NewEarningsRecord,
    conn: &mut SqliteConnection,
) -> Result<InsertEarningsResult, SettlementDbError> {
    let line_item_id = record.line_item_id;
    let inserted: Option<EarningsRecord> = sqlx::query_as(
        r#"
            INSERT INTO earnings (artist_id, order_id, line_item_id, amount, commission_rate, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (line_item_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(record.artist_id)
    .bind(record.order_id)
    .bind(line_item_id)
    .bind(record.amount)
    .bind(record.commission_rate)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;
    match inserted {
        Some(r) => {
            debug!("💰️ Earnings record #{} of {} for line item {line_item_id} ({})", r.id, r.amount, r.artist_id);
            Ok(InsertEarningsResult::Inserted(r))
        },
        None => {
            trace!("💰️ Line item {line_item_id} already has an earnings record");
            let existing = fetch_by_line_item(line_item_id, conn)
                .await?
                .ok_or(SettlementDbError::EarningsRecordMissing(line_item_id))?;
            Ok(InsertEarningsResult::AlreadyExists(existing))
        },
    }
}

pub async fn fetch_by_line_item(
    line_item_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<EarningsRecord>, sqlx::Error> {
    let record = sqlx::query_as("SELECT * FROM earnings WHERE line_item_id = $1")
        .bind(line_item_id)
        .fetch_optional(conn)
        .await?;
    Ok(record)
}

pub async fn fetch_for_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<EarningsRecord>, sqlx::Error> {
    let records = sqlx::query_as("SELECT * FROM earnings WHERE order_id = $1 ORDER BY line_item_id")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(records)
}

pub async fn fetch_for_artist(
    artist_id: &ArtistId,
    conn: &mut SqliteConnection,
) -> Result<Vec<EarningsRecord>, sqlx::Error> {
    let records = sqlx::query_as("SELECT * FROM earnings WHERE artist_id = $1 ORDER BY created_at, id")
        .bind(artist_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(records)
}
