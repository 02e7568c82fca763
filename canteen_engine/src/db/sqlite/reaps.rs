use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{AccountId, PendingReap},
};

#[derive(Debug, FromRow)]
struct PendingReapRow {
    owner_id: String,
    attempts: i64,
    last_error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PendingReapRow> for PendingReap {
    fn from(row: PendingReapRow) -> Self {
        PendingReap {
            owner_id: row.owner_id.into(),
            attempts: row.attempts,
            last_error: row.last_error,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Marks an owner for identity removal. Marking an owner twice keeps the original entry.
pub async fn mark_for_reaping(owner_id: &AccountId, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    sqlx::query(
        r#"
            INSERT INTO pending_reaps (owner_id, attempts, created_at, updated_at) VALUES ($1, 0, $2, $2)
            ON CONFLICT (owner_id) DO NOTHING;
        "#,
    )
    .bind(owner_id.as_str())
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(())
}

/// Entries that have failed at least once and fewer than `max_attempts` times. An entry that has never been attempted
/// belongs to the `owner/deleted` event that created it, so it is left for the feed.
pub async fn pending_reaps(
    max_attempts: i64,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<PendingReap>, SqliteDatabaseError> {
    let rows = sqlx::query_as::<_, PendingReapRow>(
        r#"
            SELECT owner_id, attempts, last_error, created_at, updated_at
            FROM pending_reaps
            WHERE attempts >= 1 AND attempts < $1
            ORDER BY created_at ASC, owner_id ASC
            LIMIT $2;
        "#,
    )
    .bind(max_attempts)
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(PendingReap::from).collect())
}

pub async fn remove(owner_id: &AccountId, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    sqlx::query("DELETE FROM pending_reaps WHERE owner_id = $1").bind(owner_id.as_str()).execute(conn).await?;
    Ok(())
}

pub async fn record_failure(
    owner_id: &AccountId,
    error: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PendingReap>, SqliteDatabaseError> {
    let row = sqlx::query_as::<_, PendingReapRow>(
        r#"
            UPDATE pending_reaps SET attempts = attempts + 1, last_error = $1, updated_at = $2
            WHERE owner_id = $3
            RETURNING owner_id, attempts, last_error, created_at, updated_at;
        "#,
    )
    .bind(error)
    .bind(Utc::now())
    .bind(owner_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(row.map(PendingReap::from))
}
