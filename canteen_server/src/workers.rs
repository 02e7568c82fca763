//! Background workers.
//!
//! Both workers run forever. Do not await the returned `JoinHandle`s.
use std::time::Duration;

use canteen_engine::{
    db_types::EventStream,
    events::EventProducers,
    AccountReaper,
    DocumentFeed,
    NotificationDispatcher,
    ReconcileSummary,
    SqliteDatabase,
};
use firebase_tools::{FcmClient, IdentityAdminClient};
use log::*;
use tokio::task::JoinHandle;

pub type ServerReaper = AccountReaper<SqliteDatabase, IdentityAdminClient>;
pub type ServerFeed = DocumentFeed<SqliteDatabase, FcmClient, IdentityAdminClient>;

/// Builds the document feed that the feed worker drives. Deleted owners are reaped with `reaper`.
pub fn build_document_feed(
    db: SqliteDatabase,
    push: FcmClient,
    reaper: ServerReaper,
    producers: EventProducers,
) -> ServerFeed {
    let dispatcher = NotificationDispatcher::new(db.clone(), push, reaper);
    DocumentFeed::new(db, dispatcher, producers)
}

/// Starts the document feed worker, which delivers the order and owner change streams to the notification
/// dispatcher and the registered hooks.
pub fn start_feed_worker(feed: ServerFeed, poll_interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(poll_interval);
        info!("📬️ Document feed worker started. Polling every {}ms", poll_interval.as_millis());
        loop {
            timer.tick().await;
            for stream in [EventStream::Order, EventStream::Owner] {
                match feed.poll_once(stream).await {
                    Ok(0) => {},
                    Ok(n) => trace!("📬️ Feed worker delivered {n} {stream} event(s)"),
                    Err(e) => error!("📬️ Error polling the {stream} stream: {e}"),
                }
            }
        }
    })
}

/// Starts the reap reconciliation worker, which retries account deletions that failed when their owner was deleted.
pub fn start_reap_worker(reaper: ServerReaper, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        info!("🪦️ Reap reconciliation worker started. Running every {}s", interval.as_secs());
        loop {
            timer.tick().await;
            debug!("🪦️ Running reap reconciliation job");
            match reaper.reconcile().await {
                Ok(summary) if summary == ReconcileSummary::default() => {},
                Ok(summary) => info!(
                    "🪦️ Reconciliation pass: {} reaped, {} still failing, {} abandoned",
                    summary.reaped, summary.failed, summary.abandoned
                ),
                Err(e) => error!("🪦️ Error running reap reconciliation job: {e}"),
            }
        }
    })
}
