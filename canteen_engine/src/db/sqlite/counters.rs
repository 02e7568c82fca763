use chrono::Utc;
use log::trace;
use sqlx::SqliteConnection;

use crate::{db::sqlite::SqliteDatabaseError, db_types::ScopeKey};

/// Increments the scope's counter and returns the new value. A scope without a counter row starts at 1.
///
/// This is a write, so when it is the first statement of a transaction the transaction holds the database write lock
/// from here until it commits or rolls back. Concurrent allocations for any scope queue behind it.
pub async fn next_token(scope: &ScopeKey, conn: &mut SqliteConnection) -> Result<i64, SqliteDatabaseError> {
    let token: i64 = sqlx::query_scalar(
        r#"
            INSERT INTO daily_counters (canteen_id, date_key, last_token, updated_at)
            VALUES ($1, $2, 1, $3)
            ON CONFLICT (canteen_id, date_key) DO UPDATE
                SET last_token = last_token + 1, updated_at = excluded.updated_at
            RETURNING last_token;
        "#,
    )
    .bind(scope.canteen_id.as_str())
    .bind(scope.date.as_str())
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    trace!("🔢️ Token {token} issued for {scope}");
    Ok(token)
}

pub async fn last_token(scope: &ScopeKey, conn: &mut SqliteConnection) -> Result<Option<i64>, SqliteDatabaseError> {
    let token = sqlx::query_scalar("SELECT last_token FROM daily_counters WHERE canteen_id = $1 AND date_key = $2")
        .bind(scope.canteen_id.as_str())
        .bind(scope.date.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(token)
}
