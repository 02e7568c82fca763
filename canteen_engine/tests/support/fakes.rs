use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Arc,
        Mutex,
    },
};

use canteen_engine::{
    db_types::{AccountId, IntentId, NotificationTarget},
    notification_objects::PushMessage,
    payment_objects::{NewPaymentIntent, PaymentIntent},
    traits::{IdentityDeletion, IdentityStore, PaymentGateway, PushTransport},
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct FakeError(pub String);

/// Records every push it is asked to send. Sends to targets in `failing` return an error (but are still recorded).
#[derive(Clone, Default)]
pub struct RecordingPush {
    sent: Arc<Mutex<Vec<(NotificationTarget, PushMessage)>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl RecordingPush {
    pub fn fail_for(&self, target: &str) {
        self.failing.lock().unwrap().insert(target.to_string());
    }

    pub fn sent(&self) -> Vec<(NotificationTarget, PushMessage)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, target: &str) -> Vec<PushMessage> {
        self.sent().into_iter().filter(|(t, _)| t.as_str() == target).map(|(_, m)| m).collect()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl PushTransport for RecordingPush {
    type Error = FakeError;

    async fn send(&self, target: &NotificationTarget, message: &PushMessage) -> Result<(), Self::Error> {
        self.sent.lock().unwrap().push((target.clone(), message.clone()));
        if self.failing.lock().unwrap().contains(target.as_str()) {
            return Err(FakeError(format!("device {target} is unreachable")));
        }
        Ok(())
    }
}

/// An identity store holding a set of identities. It can be told to fail the next `n` deletions.
#[derive(Clone, Default)]
pub struct RecordingIdentityStore {
    identities: Arc<Mutex<HashSet<String>>>,
    attempts: Arc<Mutex<Vec<AccountId>>>,
    failures_left: Arc<AtomicU32>,
}

impl RecordingIdentityStore {
    pub fn with_identities(ids: &[&str]) -> Self {
        let store = Self::default();
        store.identities.lock().unwrap().extend(ids.iter().map(|s| s.to_string()));
        store
    }

    pub fn fail_next(&self, n: u32) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> Vec<AccountId> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn exists(&self, id: &str) -> bool {
        self.identities.lock().unwrap().contains(id)
    }
}

impl IdentityStore for RecordingIdentityStore {
    type Error = FakeError;

    async fn delete_identity(&self, id: &AccountId) -> Result<IdentityDeletion, Self::Error> {
        self.attempts.lock().unwrap().push(id.clone());
        let fail = self.failures_left.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok();
        if fail {
            return Err(FakeError("identity service unavailable".into()));
        }
        if self.identities.lock().unwrap().remove(id.as_str()) {
            Ok(IdentityDeletion::Deleted)
        } else {
            Ok(IdentityDeletion::NotFound)
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeGateway {
    issued: Arc<AtomicU32>,
    down: Arc<AtomicBool>,
}

impl FakeGateway {
    pub fn go_down(&self) {
        self.down.store(true, Ordering::SeqCst);
    }

    pub fn issued(&self) -> u32 {
        self.issued.load(Ordering::SeqCst)
    }
}

impl PaymentGateway for FakeGateway {
    type Error = FakeError;

    async fn create_payment_intent(&self, intent: NewPaymentIntent) -> Result<PaymentIntent, Self::Error> {
        if self.down.load(Ordering::SeqCst) {
            return Err(FakeError("gateway returned 503".into()));
        }
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(PaymentIntent {
            id: IntentId::from(format!("order_fake{n:04}")),
            amount: intent.amount,
            currency: intent.currency,
            receipt: Some(intent.receipt),
            status: "created".into(),
        })
    }
}
