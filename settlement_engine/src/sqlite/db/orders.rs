use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{Buyer, LineItem, NewLineItem, NewOrder, Order, OrderId},
    traits::{SettlementDbError, StateGuard},
};

/// Inserts the order and its line items, returning `false` in the second parameter if the order already exists.
///
/// This is not atomic. Embed the call in a transaction and pass `&mut *tx` as the connection argument. The insert is
/// the first statement, so inside a transaction the write lock is taken before anything is read.
pub async fn idempotent_insert(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<(Order, bool), SettlementDbError> {
    validate_new_order(&order)?;
    let order_id = order.order_id.clone();
    let items = order.line_items.clone();
    let inserted = match insert_order(order, conn).await? {
        Some(stored) => {
            let mut line_items = Vec::with_capacity(items.len());
            for item in items {
                line_items.push(insert_line_item(&stored.order_id, item, conn).await?);
            }
            debug!("📝️ Order [{}] inserted with id {} and {} line items", stored.order_id, stored.id, line_items.len());
            (stored.with_line_items(line_items), true)
        },
        None => {
            let existing =
                fetch_order_by_order_id(&order_id, conn).await?.ok_or(SettlementDbError::OrderNotFound(order_id))?;
            let items = fetch_line_items(&existing.order_id, conn).await?;
            (existing.with_line_items(items), false)
        },
    };
    Ok(inserted)
}

fn validate_new_order(order: &NewOrder) -> Result<(), SettlementDbError> {
    let invalid = |reason: String| SettlementDbError::InvalidOrder(order.order_id.clone(), reason);
    if order.order_id.as_str().trim().is_empty() {
        return Err(invalid("the order id is empty".into()));
    }
    if order.line_items.is_empty() {
        return Err(invalid("an order needs at least one line item".into()));
    }
    if let Some(item) = order.line_items.iter().find(|li| li.quantity <= 0) {
        return Err(invalid(format!("product {} has a non-positive quantity ({})", item.product_id, item.quantity)));
    }
    if let Some(item) = order.line_items.iter().find(|li| li.unit_price.value() < 0) {
        return Err(invalid(format!("product {} has a negative price ({})", item.product_id, item.unit_price)));
    }
    Ok(())
}

/// Returns `None` if an order with the same `order_id` is already stored.
async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let total_price = order.total_price();
    let (user_id, guest_email) = match order.buyer {
        Buyer::User(id) => (Some(id), None),
        Buyer::Guest(email) => (None, Some(email)),
    };
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                user_id,
                guest_email,
                total_price,
                currency,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (order_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(order.order_id)
    .bind(user_id)
    .bind(guest_email)
    .bind(total_price)
    .bind(order.currency)
    .bind(order.created_at)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

async fn insert_line_item(
    order_id: &OrderId,
    item: NewLineItem,
    conn: &mut SqliteConnection,
) -> Result<LineItem, sqlx::Error> {
    let item = sqlx::query_as(
        r#"
            INSERT INTO line_items (
                order_id,
                product_id,
                design_id,
                quantity,
                unit_price,
                base_cost,
                platform_profit,
                artist_commission
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(item.product_id)
    .bind(item.design_id)
    .bind(item.quantity)
    .bind(item.unit_price)
    .bind(item.base_cost)
    .bind(item.platform_profit)
    .bind(item.artist_commission)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

/// Returns the order with the given `order_id`, without its line items.
pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_gateway_order_id(
    gateway_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE gateway_order_id = $1 ORDER BY id DESC LIMIT 1")
        .bind(gateway_order_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_line_items(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<LineItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM line_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Writes the state columns of `updated`, but only if the stored order still matches `expected`.
///
/// This is a single conditional `UPDATE`, so the check and the write cannot be separated by another writer. Returns
/// `None` when no row matched.
pub async fn update_order_state(
    expected: &StateGuard,
    updated: &Order,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    trace!(
        "📝️ Guarded update of order #{}: {}/{} -> {}/{}",
        expected.id,
        expected.order_status,
        expected.payment_status,
        updated.order_status,
        updated.payment_status
    );
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                order_status = $1,
                payment_status = $2,
                gateway_order_id = $3,
                gateway_payment_id = $4,
                verified_at = $5,
                confirmed_at = $6,
                cancelled_at = $7,
                updated_at = $8
            WHERE id = $9 AND order_status = $10 AND payment_status = $11 AND gateway_order_id IS $12
            RETURNING *;
        "#,
    )
    .bind(updated.order_status)
    .bind(updated.payment_status)
    .bind(updated.gateway_order_id.as_deref())
    .bind(updated.gateway_payment_id.as_deref())
    .bind(updated.verified_at)
    .bind(updated.confirmed_at)
    .bind(updated.cancelled_at)
    .bind(updated.updated_at)
    .bind(expected.id)
    .bind(expected.order_status)
    .bind(expected.payment_status)
    .bind(expected.gateway_order_id.as_deref())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
