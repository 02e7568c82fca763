use std::fmt::Debug;

use chrono::Utc;
use log::*;
use sqlx::SqlitePool;

use super::{counters, db_url, doc_events, new_pool, orders, profiles, reaps, SqliteDatabaseError};
use crate::{
    db_types::{
        AccountId,
        CanteenId,
        ChangeKind,
        CommitResult,
        DocumentEvent,
        EventStream,
        NewOrder,
        NewProfile,
        Order,
        OrderId,
        OrderStatusType,
        PaymentId,
        PendingReap,
        Profile,
        ProfileRole,
        ScopeKey,
    },
    traits::{DocumentEventLog, OrderCommitDatabase, ProfileManagement, ReapLedger, SequenceAllocator},
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

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `CANTEEN_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let pool = new_pool(url, max_connections).await?;
        trace!("🗃️ Running migrations on {url}");
        sqlx::migrate!("./src/db/sqlite/migrations").run(&pool).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) -> Result<(), SqliteDatabaseError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderCommitDatabase for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn commit_order(&self, scope: &ScopeKey, order: NewOrder) -> Result<CommitResult, Self::Error> {
        let mut tx = self.pool.begin().await?;
        // The counter upsert is the first statement, so this transaction holds the write lock before it reads anything.
        // A concurrent commit either waits for us or fails with SQLITE_BUSY and is retried by the caller.
        let token = counters::next_token(scope, &mut tx).await?;
        if let Some(existing) = orders::fetch_order_by_payment_id(&order.payment_id, &mut tx).await? {
            // Rolling back returns the token we just took
            tx.rollback().await?;
            debug!("🗃️ Payment {} was already committed as order {}", order.payment_id, existing.id);
            return Ok(CommitResult::AlreadyProcessed(existing));
        }
        let now = Utc::now();
        let record = Order {
            id: OrderId::random(),
            user_id: order.user_id,
            canteen_id: order.canteen_id,
            items: order.items,
            total_amount: order.total_amount,
            token_number: token.to_string(),
            status: OrderStatusType::Pending,
            payment_id: order.payment_id,
            intent_id: order.intent_id,
            created_at: now,
            updated_at: now,
        };
        if let Err(e) = orders::insert_order(&record, &mut tx).await {
            tx.rollback().await?;
            if e.is_unique_violation() {
                if let Some(existing) = self.fetch_order_by_payment_id(&record.payment_id).await? {
                    debug!("🗃️ Payment {} was committed concurrently as order {}", record.payment_id, existing.id);
                    return Ok(CommitResult::AlreadyProcessed(existing));
                }
            }
            return Err(e);
        }
        let snapshot = serde_json::to_value(&record)?;
        doc_events::append_event(EventStream::Order, ChangeKind::Created, record.id.as_str(), None, Some(&snapshot), &mut tx)
            .await?;
        tx.commit().await?;
        debug!("🗃️ Order {} committed for {scope} with token {}", record.id, record.token_number);
        Ok(CommitResult::Created(record))
    }

    async fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(id, &mut conn).await
    }

    async fn fetch_order_by_payment_id(&self, payment_id: &PaymentId) -> Result<Option<Order>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_payment_id(payment_id, &mut conn).await
    }

    async fn update_order_status(&self, id: &OrderId, status: OrderStatusType) -> Result<Order, Self::Error> {
        let mut tx = self.pool.begin().await?;
        if !orders::lock_order(id, &mut tx).await? {
            return Err(SqliteDatabaseError::OrderNotFound(id.clone()));
        }
        let before = orders::fetch_order(id, &mut tx).await?.ok_or_else(|| SqliteDatabaseError::OrderNotFound(id.clone()))?;
        let after = orders::update_status(id, status, &mut tx).await?;
        let before_doc = serde_json::to_value(&before)?;
        let after_doc = serde_json::to_value(&after)?;
        doc_events::append_event(
            EventStream::Order,
            ChangeKind::Updated,
            id.as_str(),
            Some(&before_doc),
            Some(&after_doc),
            &mut tx,
        )
        .await?;
        tx.commit().await?;
        debug!("🗃️ Order {id} status: {} -> {}", before.status, after.status);
        Ok(after)
    }
}

impl SequenceAllocator for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn allocate(&self, scope: &ScopeKey) -> Result<i64, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let token = counters::next_token(scope, &mut tx).await?;
        tx.commit().await?;
        Ok(token)
    }

    async fn last_token(&self, scope: &ScopeKey) -> Result<Option<i64>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        counters::last_token(scope, &mut conn).await
    }
}

impl ProfileManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn upsert_profile(&self, profile: NewProfile) -> Result<Profile, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let created = profiles::insert_profile_if_new(&profile, &mut tx).await?;
        let result = if created {
            let stored = profiles::fetch_profile(profile.role, &profile.id, &mut tx)
                .await?
                .ok_or_else(|| SqliteDatabaseError::QueryError(format!("Profile {} vanished after insert", profile.id)))?;
            if stored.role == ProfileRole::Owner {
                let snapshot = serde_json::to_value(&stored)?;
                doc_events::append_event(
                    EventStream::Owner,
                    ChangeKind::Created,
                    stored.id.as_str(),
                    None,
                    Some(&snapshot),
                    &mut tx,
                )
                .await?;
            }
            stored
        } else {
            profiles::update_profile(&profile, &mut tx).await?
        };
        tx.commit().await?;
        debug!("🧑️ Profile {}/{} saved (new: {created})", result.role, result.id);
        Ok(result)
    }

    async fn fetch_profile(&self, role: ProfileRole, id: &AccountId) -> Result<Option<Profile>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        profiles::fetch_profile(role, id, &mut conn).await
    }

    async fn owner_for_canteen(&self, canteen_id: &CanteenId) -> Result<Option<Profile>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        profiles::owner_for_canteen(canteen_id, &mut conn).await
    }

    async fn link_canteen_owner(&self, canteen_id: &CanteenId, owner_id: &AccountId) -> Result<(), Self::Error> {
        let mut conn = self.pool.acquire().await?;
        profiles::link_canteen_owner(canteen_id, owner_id, &mut conn).await
    }

    async fn admin_profiles(&self) -> Result<Vec<Profile>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        profiles::fetch_profiles_with_role(ProfileRole::Admin, &mut conn).await
    }

    async fn delete_owner_profile(&self, owner_id: &AccountId) -> Result<bool, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let Some(deleted) = profiles::delete_profile(ProfileRole::Owner, owner_id, &mut tx).await? else {
            tx.rollback().await?;
            debug!("🧑️ No owner profile {owner_id} to delete");
            return Ok(false);
        };
        reaps::mark_for_reaping(owner_id, &mut tx).await?;
        let snapshot = serde_json::to_value(&deleted)?;
        doc_events::append_event(EventStream::Owner, ChangeKind::Deleted, owner_id.as_str(), Some(&snapshot), None, &mut tx)
            .await?;
        tx.commit().await?;
        info!("🧑️ Owner profile {owner_id} deleted. Identity removal is pending.");
        Ok(true)
    }
}

impl ReapLedger for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn pending_reaps(&self, max_attempts: i64, limit: i64) -> Result<Vec<PendingReap>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        reaps::pending_reaps(max_attempts, limit, &mut conn).await
    }

    async fn record_reap_success(&self, owner_id: &AccountId) -> Result<(), Self::Error> {
        let mut conn = self.pool.acquire().await?;
        reaps::remove(owner_id, &mut conn).await
    }

    async fn record_reap_failure(&self, owner_id: &AccountId, error: &str) -> Result<Option<PendingReap>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        reaps::record_failure(owner_id, error, &mut conn).await
    }
}

impl DocumentEventLog for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn fetch_undelivered_events(&self, stream: EventStream, limit: i64) -> Result<Vec<DocumentEvent>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        doc_events::fetch_undelivered(stream, limit, &mut conn).await
    }

    async fn mark_event_delivered(&self, seq: i64) -> Result<(), Self::Error> {
        let mut conn = self.pool.acquire().await?;
        doc_events::mark_delivered(seq, &mut conn).await
    }
}
