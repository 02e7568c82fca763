use chrono::{DateTime, Utc};
use log::trace;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{Order, OrderId, OrderStatusType, PaymentId},
};

const ORDER_COLUMNS: &str = "id, user_id, canteen_id, items, total_amount, token_number, status, payment_id, intent_id, \
                             created_at, updated_at";

#[derive(Debug, FromRow)]
struct OrderRow {
    id: String,
    user_id: String,
    canteen_id: String,
    items: String,
    total_amount: i64,
    token_number: String,
    status: String,
    payment_id: String,
    intent_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = SqliteDatabaseError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let items = serde_json::from_str(&row.items)?;
        let status = row.status.parse::<OrderStatusType>().map_err(|e| SqliteDatabaseError::CorruptRecord(e.0))?;
        Ok(Order {
            id: row.id.into(),
            user_id: row.user_id.into(),
            canteen_id: row.canteen_id.into(),
            items,
            total_amount: row.total_amount.into(),
            token_number: row.token_number,
            status,
            payment_id: row.payment_id.into(),
            intent_id: row.intent_id.into(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Inserts a fully formed order record. This is not atomic on its own; pass `&mut *tx` to embed it in a transaction.
pub async fn insert_order(order: &Order, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    let items = serde_json::to_string(&order.items)?;
    sqlx::query(
        r#"
            INSERT INTO orders (
                id,
                user_id,
                canteen_id,
                items,
                total_amount,
                token_number,
                status,
                payment_id,
                intent_id,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11);
        "#,
    )
    .bind(order.id.as_str())
    .bind(order.user_id.as_str())
    .bind(order.canteen_id.as_str())
    .bind(items)
    .bind(order.total_amount.value())
    .bind(order.token_number.as_str())
    .bind(order.status.to_string())
    .bind(order.payment_id.as_str())
    .bind(order.intent_id.as_str())
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(conn)
    .await?;
    trace!("🗃️ Order {} inserted with token {}", order.id, order.token_number);
    Ok(())
}

pub async fn fetch_order(id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, SqliteDatabaseError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let row = sqlx::query_as::<_, OrderRow>(&sql).bind(id.as_str()).fetch_optional(conn).await?;
    row.map(Order::try_from).transpose()
}

pub async fn fetch_order_by_payment_id(
    payment_id: &PaymentId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE payment_id = $1");
    let row = sqlx::query_as::<_, OrderRow>(&sql).bind(payment_id.as_str()).fetch_optional(conn).await?;
    row.map(Order::try_from).transpose()
}

/// Takes the database write lock for the current transaction without changing anything visible. Returns false if
/// there is no such order.
pub async fn lock_order(id: &OrderId, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query("UPDATE orders SET updated_at = updated_at WHERE id = $1")
        .bind(id.as_str())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_status(
    id: &OrderId,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, SqliteDatabaseError> {
    let sql = format!("UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3 RETURNING {ORDER_COLUMNS}");
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(status.to_string())
        .bind(Utc::now())
        .bind(id.as_str())
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| SqliteDatabaseError::OrderNotFound(id.clone()))?;
    Order::try_from(row)
}
