use crate::ocs_api::payment_objects::{NewPaymentIntent, PaymentIntent};

/// The payment provider's order API.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    type Error: std::error::Error;

    async fn create_payment_intent(&self, intent: NewPaymentIntent) -> Result<PaymentIntent, Self::Error>;
}
