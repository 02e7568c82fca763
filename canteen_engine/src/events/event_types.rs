use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::db_types::{AccountId, ChangeKind, DocumentEvent, EventStream, Order, Profile};

#[derive(Debug, Clone, PartialEq)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderStatusChangedEvent {
    pub before: Order,
    pub after: Order,
}

impl OrderStatusChangedEvent {
    pub fn new(before: Order, after: Order) -> Self {
        Self { before, after }
    }

    /// Updates that leave the status alone (item edits, touch-ups) are not status changes.
    pub fn status_changed(&self) -> bool {
        self.before.status != self.after.status
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OwnerCreatedEvent {
    pub profile: Profile,
}

impl OwnerCreatedEvent {
    pub fn new(profile: Profile) -> Self {
        Self { profile }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OwnerDeletedEvent {
    pub owner_id: AccountId,
    /// The profile as it was just before deletion, when the stream entry carries it
    pub profile: Option<Profile>,
}

impl OwnerDeletedEvent {
    pub fn new(owner_id: AccountId) -> Self {
        Self { owner_id, profile: None }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerEvent {
    OrderCreated(OrderCreatedEvent),
    OrderStatusChanged(OrderStatusChangedEvent),
    OwnerCreated(OwnerCreatedEvent),
    OwnerDeleted(OwnerDeletedEvent),
}

#[derive(Debug, Clone, Error)]
pub enum EventDecodeError {
    #[error("No trigger is defined for {0}/{1} events")]
    Unsupported(EventStream, ChangeKind),
    #[error("Event #{0} is missing its {1} snapshot")]
    MissingSnapshot(i64, &'static str),
    #[error("Event #{0} has an unreadable snapshot: {1}")]
    BadSnapshot(i64, String),
}

fn snapshot<T: DeserializeOwned>(seq: i64, doc: Option<Value>, which: &'static str) -> Result<T, EventDecodeError> {
    let doc = doc.ok_or(EventDecodeError::MissingSnapshot(seq, which))?;
    serde_json::from_value(doc).map_err(|e| EventDecodeError::BadSnapshot(seq, e.to_string()))
}

impl TryFrom<DocumentEvent> for TriggerEvent {
    type Error = EventDecodeError;

    fn try_from(event: DocumentEvent) -> Result<Self, Self::Error> {
        let seq = event.seq;
        match (event.stream, event.kind) {
            (EventStream::Order, ChangeKind::Created) => {
                let order = snapshot(seq, event.after, "after")?;
                Ok(Self::OrderCreated(OrderCreatedEvent::new(order)))
            },
            (EventStream::Order, ChangeKind::Updated) => {
                let before = snapshot(seq, event.before, "before")?;
                let after = snapshot(seq, event.after, "after")?;
                Ok(Self::OrderStatusChanged(OrderStatusChangedEvent::new(before, after)))
            },
            (EventStream::Owner, ChangeKind::Created) => {
                let profile = snapshot(seq, event.after, "after")?;
                Ok(Self::OwnerCreated(OwnerCreatedEvent::new(profile)))
            },
            (EventStream::Owner, ChangeKind::Deleted) => {
                let profile = event.before.and_then(|doc| serde_json::from_value(doc).ok());
                let owner_id = AccountId::from(event.document_id);
                Ok(Self::OwnerDeleted(OwnerDeletedEvent { owner_id, profile }))
            },
            (stream, kind) => Err(EventDecodeError::Unsupported(stream, kind)),
        }
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::db_types::OrderStatusType;
    use canteen_common::Paise;

    fn order(status: OrderStatusType) -> Order {
        let now = Utc::now();
        Order {
            id: "order1".into(),
            user_id: "user1".into(),
            canteen_id: "C1".into(),
            items: vec![json!({"name": "Dosa", "qty": 2})],
            total_amount: Paise::from(12000),
            token_number: "7".into(),
            status,
            payment_id: "pay_1".into(),
            intent_id: "order_1".into(),
            created_at: now,
            updated_at: now,
        }
    }

    fn doc_event(stream: EventStream, kind: ChangeKind, before: Option<Value>, after: Option<Value>) -> DocumentEvent {
        DocumentEvent { seq: 1, stream, kind, document_id: "order1".into(), before, after, created_at: Utc::now() }
    }

    #[test]
    fn decode_status_change() {
        let before = serde_json::to_value(order(OrderStatusType::Pending)).unwrap();
        let after = serde_json::to_value(order(OrderStatusType::Ready)).unwrap();
        let ev = doc_event(EventStream::Order, ChangeKind::Updated, Some(before), Some(after));
        match TriggerEvent::try_from(ev).unwrap() {
            TriggerEvent::OrderStatusChanged(e) => {
                assert!(e.status_changed());
                assert_eq!(e.after.status, OrderStatusType::Ready);
            },
            other => panic!("Unexpected event {other:?}"),
        }
    }

    #[test]
    fn decode_failures() {
        let ev = doc_event(EventStream::Order, ChangeKind::Created, None, None);
        assert!(matches!(TriggerEvent::try_from(ev), Err(EventDecodeError::MissingSnapshot(1, "after"))));
        let ev = doc_event(EventStream::Order, ChangeKind::Created, None, Some(json!({"id": 5})));
        assert!(matches!(TriggerEvent::try_from(ev), Err(EventDecodeError::BadSnapshot(1, _))));
        let ev = doc_event(EventStream::Order, ChangeKind::Deleted, None, None);
        assert!(matches!(TriggerEvent::try_from(ev), Err(EventDecodeError::Unsupported(..))));
    }

    #[test]
    fn owner_deleted_without_snapshot() {
        let mut ev = doc_event(EventStream::Owner, ChangeKind::Deleted, None, None);
        ev.document_id = "owner9".into();
        let TriggerEvent::OwnerDeleted(e) = TriggerEvent::try_from(ev).unwrap() else { panic!("Expected OwnerDeleted") };
        assert_eq!(e.owner_id.as_str(), "owner9");
        assert!(e.profile.is_none());
    }
}
