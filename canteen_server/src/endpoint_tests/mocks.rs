use canteen_engine::{
    payment_objects::{NewPaymentIntent, PaymentIntent},
    traits::PaymentGateway,
};
use mockall::mock;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("The gateway is unavailable")]
pub struct GatewayDown;

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        type Error = GatewayDown;
        async fn create_payment_intent(&self, intent: NewPaymentIntent) -> Result<PaymentIntent, GatewayDown>;
    }
}
