use canteen_common::{Paise, INR_CURRENCY_CODE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db_types::{AccountId, CanteenId, IntentId, NewOrder, PaymentId};

/// The authenticated identity making a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub uid: AccountId,
}

impl Caller {
    pub fn new<A: Into<AccountId>>(uid: A) -> Self {
        Self { uid: uid.into() }
    }
}

/// A request to open a payment with the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPaymentIntent {
    pub amount: Paise,
    pub currency: String,
    pub receipt: String,
    /// Opaque key-value notes passed through to the gateway
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub notes: Value,
}

impl NewPaymentIntent {
    pub fn new<S: Into<String>>(amount: Paise, receipt: S) -> Self {
        Self { amount, currency: INR_CURRENCY_CODE.to_string(), receipt: receipt.into(), notes: Value::Null }
    }

    pub fn with_currency<S: Into<String>>(mut self, currency: S) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_notes(mut self, notes: Value) -> Self {
        self.notes = notes;
        self
    }
}

/// The gateway's view of an opened payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: IntentId,
    pub amount: Paise,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: String,
}

/// What the client sends back after completing a payment with the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub intent_id: IntentId,
    pub payment_id: PaymentId,
    /// Lowercase hex HMAC-SHA256 of `intent_id|payment_id`, as issued by the gateway
    pub signature: String,
    pub user_id: AccountId,
    pub canteen_id: CanteenId,
    pub items: Vec<Value>,
    pub total_amount: Paise,
}

impl PaymentConfirmation {
    pub fn into_new_order(self) -> NewOrder {
        NewOrder {
            user_id: self.user_id,
            canteen_id: self.canteen_id,
            items: self.items,
            total_amount: self.total_amount,
            payment_id: self.payment_id,
            intent_id: self.intent_id,
        }
    }
}
