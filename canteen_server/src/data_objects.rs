use canteen_common::{Paise, INR_CURRENCY_CODE};
use canteen_engine::{
    db_types::{AccountId, CanteenId, IntentId, OrderId, PaymentId},
    payment_objects::{NewPaymentIntent, PaymentConfirmation},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /api/create_payment_intent`. `amount` is in paise. `currency` may be omitted, and anything other than
/// `INR` is refused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentIntentRequest {
    pub amount: Paise,
    #[serde(default)]
    pub currency: Option<String>,
    pub receipt: String,
    #[serde(default)]
    pub notes: Option<Value>,
}

impl From<CreatePaymentIntentRequest> for NewPaymentIntent {
    fn from(req: CreatePaymentIntentRequest) -> Self {
        let currency = req.currency.filter(|c| !c.trim().is_empty()).unwrap_or_else(|| INR_CURRENCY_CODE.to_string());
        NewPaymentIntent::new(req.amount, req.receipt)
            .with_currency(currency)
            .with_notes(req.notes.unwrap_or(Value::Null))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentResponse {
    pub order_id: IntentId,
}

/// Body of `POST /api/confirm_payment`. Field names follow the gateway's checkout callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub razorpay_order_id: IntentId,
    pub razorpay_payment_id: PaymentId,
    pub razorpay_signature: String,
    #[serde(rename = "userId")]
    pub user_id: AccountId,
    #[serde(rename = "canteenId")]
    pub canteen_id: CanteenId,
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(rename = "totalAmount")]
    pub total_amount: Paise,
}

impl From<ConfirmPaymentRequest> for PaymentConfirmation {
    fn from(req: ConfirmPaymentRequest) -> Self {
        PaymentConfirmation {
            intent_id: req.razorpay_order_id,
            payment_id: req.razorpay_payment_id,
            signature: req.razorpay_signature,
            user_id: req.user_id,
            canteen_id: req.canteen_id,
            items: req.items,
            total_amount: req.total_amount,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentResponse {
    pub firestore_order_id: OrderId,
}
