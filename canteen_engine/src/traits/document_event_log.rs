use crate::db_types::{DocumentEvent, EventStream};

/// Ordered, at-least-once change streams.
///
/// Entries are produced by the writes themselves (inside the same transaction), so a committed change always has a
/// stream entry. An entry stays undelivered until a consumer marks it, so a consumer that crashes half way through a
/// batch will see the remaining entries again.
#[allow(async_fn_in_trait)]
pub trait DocumentEventLog: Clone {
    type Error: std::error::Error;

    /// The oldest undelivered entries of the stream, in sequence order.
    async fn fetch_undelivered_events(&self, stream: EventStream, limit: i64)
        -> Result<Vec<DocumentEvent>, Self::Error>;

    async fn mark_event_delivered(&self, seq: i64) -> Result<(), Self::Error>;
}
