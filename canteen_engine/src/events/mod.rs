//! Typed trigger events and a small pub-sub layer for them.
//!
//! Every committed change lands in a document change stream (see [`crate::traits::DocumentEventLog`]). The document
//! feed decodes each entry into a [`TriggerEvent`], hands it to the notification dispatcher, and then publishes it to
//! any hooks an embedder registered with [`EventHooks`]. Hook handlers run on their own tasks, so a slow subscriber
//! never holds up the feed.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
