use thiserror::Error;

use crate::{db_types::OrderId, helpers::IsTransient};

// SQLite result codes (extended codes included) that mean "another writer got there first"
const SQLITE_BUSY: &str = "5";
const SQLITE_LOCKED: &str = "6";
const SQLITE_BUSY_RECOVERY: &str = "261";
const SQLITE_LOCKED_SHAREDCACHE: &str = "262";
const SQLITE_BUSY_SNAPSHOT: &str = "517";
const SQLITE_BUSY_TIMEOUT: &str = "773";
const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";
const SQLITE_CONSTRAINT_PRIMARYKEY: &str = "1555";

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Database query error: {0}")]
    QueryError(String),
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),
    #[error("Could not (de)serialize a stored document: {0}")]
    CorruptRecord(String),
}

impl From<serde_json::Error> for SqliteDatabaseError {
    fn from(e: serde_json::Error) -> Self {
        Self::CorruptRecord(e.to_string())
    }
}

impl SqliteDatabaseError {
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::DriverError(sqlx::Error::Database(e)) => {
                matches!(e.code().as_deref(), Some(SQLITE_CONSTRAINT_UNIQUE | SQLITE_CONSTRAINT_PRIMARYKEY))
            },
            _ => false,
        }
    }
}

impl IsTransient for SqliteDatabaseError {
    /// Lock contention, snapshot conflicts and pool exhaustion all clear up once the competing writer commits.
    fn is_transient(&self) -> bool {
        match self {
            Self::DriverError(sqlx::Error::Database(e)) => matches!(
                e.code().as_deref(),
                Some(
                    SQLITE_BUSY |
                        SQLITE_LOCKED |
                        SQLITE_BUSY_RECOVERY |
                        SQLITE_LOCKED_SHAREDCACHE |
                        SQLITE_BUSY_SNAPSHOT |
                        SQLITE_BUSY_TIMEOUT
                )
            ),
            Self::DriverError(sqlx::Error::PoolTimedOut) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod test {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    #[test]
    fn only_contention_is_transient() {
        assert!(SqliteDatabaseError::DriverError(sqlx::Error::PoolTimedOut).is_transient());
        assert!(!SqliteDatabaseError::DriverError(sqlx::Error::RowNotFound).is_transient());
        assert!(!SqliteDatabaseError::QueryError("bad".into()).is_transient());
        assert!(!SqliteDatabaseError::OrderNotFound("abc".into()).is_transient());
    }

    #[tokio::test]
    async fn constraint_violations_are_permanent() {
        let pool = SqlitePoolOptions::new().max_connections(1).connect("sqlite::memory:").await.unwrap();
        sqlx::query("CREATE TABLE payments (payment_id TEXT NOT NULL UNIQUE)").execute(&pool).await.unwrap();
        sqlx::query("INSERT INTO payments VALUES ('pay_1')").execute(&pool).await.unwrap();
        let err = sqlx::query("INSERT INTO payments VALUES ('pay_1')").execute(&pool).await.unwrap_err();
        let err = SqliteDatabaseError::from(err);
        assert!(err.is_unique_violation());
        assert!(!err.is_transient());
        assert!(!SqliteDatabaseError::DriverError(sqlx::Error::PoolTimedOut).is_unique_violation());
    }
}
