//! Canteen Order Engine
//!
//! This library holds the core of the canteen ordering service: turning a verified gateway payment into exactly one
//! order record with a fresh daily token number, and reacting to order and owner lifecycle changes. It does not know
//! about HTTP, or about which payment gateway, push service or identity provider sits on the other side.
//!
//! The library is divided into these sections:
//! 1. Storage ([`mod@db`] and [`mod@traits`]). The SQLite backend implements the storage traits. Every change it
//!    commits is also appended, in the same transaction, to an ordered change stream.
//! 2. The engine API ([`mod@ocs_api`]). [`OrderCommitApi`] brokers payment intents and commits confirmed payments.
//!    [`DocumentFeed`] consumes the change streams and feeds them to the [`NotificationDispatcher`], which sends push
//!    notifications and hands deleted owners to the [`AccountReaper`].
//! 3. Events ([`mod@events`]). Embedders can register hooks to observe the same typed events the dispatcher handles.
mod db;

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod ocs_api;
pub mod traits;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use ocs_api::{
    account_reaper::{AccountReaper, ReapOutcome, ReconcileSummary},
    document_feed::DocumentFeed,
    errors::OrderCommitError,
    notification_dispatcher::NotificationDispatcher,
    notification_objects,
    order_commit_api::OrderCommitApi,
    payment_objects,
};
