//! # Backend and collaborator contracts
//!
//! Storage backends implement the first group of traits; the engine's APIs are generic over them.
//!
//! * [`OrderCommitDatabase`] writes order records exactly once per gateway payment, and applies status transitions.
//! * [`SequenceAllocator`] hands out the per-canteen, per-day token numbers.
//! * [`ProfileManagement`] resolves owner, user and admin profiles and their notification targets, and records owner
//!   lifecycle changes.
//! * [`ReapLedger`] tracks owners whose authentication identity still has to be removed.
//! * [`DocumentEventLog`] exposes the ordered change streams that drive notifications.
//!
//! The second group describes the external systems the engine talks to: the payment gateway
//! ([`PaymentGateway`]), the push-notification transport ([`PushTransport`]) and the identity store
//! ([`IdentityStore`]).
mod document_event_log;
mod identity_store;
mod order_commit_database;
mod payment_gateway;
mod profile_management;
mod push_transport;
mod sequence_allocator;

pub use document_event_log::DocumentEventLog;
pub use identity_store::{IdentityDeletion, IdentityStore};
pub use order_commit_database::OrderCommitDatabase;
pub use payment_gateway::PaymentGateway;
pub use profile_management::{ProfileManagement, ReapLedger};
pub use push_transport::PushTransport;
pub use sequence_allocator::SequenceAllocator;
