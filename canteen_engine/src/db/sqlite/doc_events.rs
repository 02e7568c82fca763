use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::trace;
use serde_json::Value;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{ChangeKind, DocumentEvent, EventStream},
};

#[derive(Debug, FromRow)]
struct DocumentEventRow {
    seq: i64,
    stream: String,
    kind: String,
    document_id: String,
    before_doc: Option<String>,
    after_doc: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<DocumentEventRow> for DocumentEvent {
    type Error = SqliteDatabaseError;

    fn try_from(row: DocumentEventRow) -> Result<Self, Self::Error> {
        let stream = match row.stream.as_str() {
            "order" => EventStream::Order,
            "owner" => EventStream::Owner,
            s => return Err(SqliteDatabaseError::CorruptRecord(format!("Unknown event stream: {s}"))),
        };
        let kind = match row.kind.as_str() {
            "created" => ChangeKind::Created,
            "updated" => ChangeKind::Updated,
            "deleted" => ChangeKind::Deleted,
            k => return Err(SqliteDatabaseError::CorruptRecord(format!("Unknown change kind: {k}"))),
        };
        let before = row.before_doc.as_deref().map(Value::from_str).transpose()?;
        let after = row.after_doc.as_deref().map(Value::from_str).transpose()?;
        Ok(DocumentEvent {
            seq: row.seq,
            stream,
            kind,
            document_id: row.document_id,
            before,
            after,
            created_at: row.created_at,
        })
    }
}

/// Appends an entry to a change stream and returns its sequence number. Call this with the same transaction that made
/// the change.
pub async fn append_event(
    stream: EventStream,
    kind: ChangeKind,
    document_id: &str,
    before: Option<&Value>,
    after: Option<&Value>,
    conn: &mut SqliteConnection,
) -> Result<i64, SqliteDatabaseError> {
    let before = before.map(Value::to_string);
    let after = after.map(Value::to_string);
    let seq: i64 = sqlx::query_scalar(
        r#"
            INSERT INTO document_events (stream, kind, document_id, before_doc, after_doc, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING seq;
        "#,
    )
    .bind(stream.to_string())
    .bind(kind.to_string())
    .bind(document_id)
    .bind(before)
    .bind(after)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    trace!("📜️ {stream}/{kind} event #{seq} appended for {document_id}");
    Ok(seq)
}

pub async fn fetch_undelivered(
    stream: EventStream,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<DocumentEvent>, SqliteDatabaseError> {
    let rows = sqlx::query_as::<_, DocumentEventRow>(
        r#"
            SELECT seq, stream, kind, document_id, before_doc, after_doc, created_at
            FROM document_events
            WHERE stream = $1 AND delivered_at IS NULL
            ORDER BY seq ASC
            LIMIT $2;
        "#,
    )
    .bind(stream.to_string())
    .bind(limit)
    .fetch_all(conn)
    .await?;
    rows.into_iter().map(DocumentEvent::try_from).collect()
}

pub async fn mark_delivered(seq: i64, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    sqlx::query("UPDATE document_events SET delivered_at = $1 WHERE seq = $2 AND delivered_at IS NULL")
        .bind(Utc::now())
        .bind(seq)
        .execute(conn)
        .await?;
    Ok(())
}
