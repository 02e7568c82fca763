use log::*;

use crate::{
    db_types::EventStream,
    events::{EventProducers, TriggerEvent},
    ocs_api::notification_dispatcher::NotificationDispatcher,
    traits::{DocumentEventLog, IdentityStore, ProfileManagement, PushTransport, ReapLedger},
};

pub const DEFAULT_FEED_BATCH_SIZE: i64 = 50;

/// Consumes the document change streams in sequence order.
///
/// Each entry is decoded, dispatched, published to the registered hooks, and only then marked delivered. If the
/// process dies part way, the unmarked entries are delivered again on restart, so delivery is at least once.
#[derive(Clone)]
pub struct DocumentFeed<B, T, I> {
    log: B,
    dispatcher: NotificationDispatcher<B, T, I>,
    producers: EventProducers,
    batch_size: i64,
}

impl<B, T, I> DocumentFeed<B, T, I> {
    pub fn new(log: B, dispatcher: NotificationDispatcher<B, T, I>, producers: EventProducers) -> Self {
        Self { log, dispatcher, producers, batch_size: DEFAULT_FEED_BATCH_SIZE }
    }

    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

impl<B, T, I> DocumentFeed<B, T, I>
where
    B: DocumentEventLog + ProfileManagement + ReapLedger,
    T: PushTransport,
    I: IdentityStore,
{
    /// Handles one batch of undelivered entries from `stream`. Returns how many entries were consumed.
    pub async fn poll_once(&self, stream: EventStream) -> Result<usize, <B as DocumentEventLog>::Error> {
        let events = self.log.fetch_undelivered_events(stream, self.batch_size).await?;
        let count = events.len();
        for event in events {
            let seq = event.seq;
            match TriggerEvent::try_from(event) {
                Ok(trigger) => {
                    trace!("📬️ Dispatching {stream} event #{seq}");
                    self.dispatcher.dispatch(&trigger).await;
                    self.producers.publish(trigger).await;
                },
                Err(e) => warn!("📬️ Skipping {stream} event #{seq}. {e}"),
            }
            self.log.mark_event_delivered(seq).await?;
        }
        if count > 0 {
            debug!("📬️ {count} {stream} event(s) delivered");
        }
        Ok(count)
    }

    /// Polls every stream until there is nothing left to deliver.
    pub async fn drain(&self) -> Result<usize, <B as DocumentEventLog>::Error> {
        let mut total = 0;
        loop {
            let delivered = self.poll_once(EventStream::Order).await? + self.poll_once(EventStream::Owner).await?;
            if delivered == 0 {
                return Ok(total);
            }
            total += delivered;
        }
    }
}
