use std::fmt::Debug;

use canteen_common::{Secret, INR_CURRENCY_CODE};
use log::*;

use crate::{
    db_types::{CommitResult, ScopeKey},
    helpers::{date_key, OperatingTimeZone, PaymentSignature, RetryError, RetryPolicy},
    ocs_api::{
        errors::OrderCommitError,
        payment_objects::{Caller, NewPaymentIntent, PaymentConfirmation, PaymentIntent},
    },
    traits::{OrderCommitDatabase, PaymentGateway},
};

/// `OrderCommitApi` turns a verified gateway payment into exactly one order record with a fresh daily token.
///
/// It also brokers payment intent creation with the gateway so that clients never need the gateway key secret.
pub struct OrderCommitApi<B, G> {
    db: B,
    gateway: G,
    gateway_secret: Secret<String>,
    time_zone: OperatingTimeZone,
    retry_policy: RetryPolicy,
}

impl<B, G> Debug for OrderCommitApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderCommitApi ({:?})", self.time_zone)
    }
}

impl<B, G> OrderCommitApi<B, G> {
    pub fn new(db: B, gateway: G, gateway_secret: Secret<String>) -> Self {
        Self {
            db,
            gateway,
            gateway_secret,
            time_zone: OperatingTimeZone::default(),
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_time_zone(mut self, time_zone: OperatingTimeZone) -> Self {
        self.time_zone = time_zone;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, G> OrderCommitApi<B, G>
where
    B: OrderCommitDatabase,
    G: PaymentGateway,
{
    /// Opens a payment with the gateway on behalf of an authenticated caller. Nothing is stored locally.
    ///
    /// Only positive amounts in INR are accepted.
    pub async fn create_payment_intent(
        &self,
        caller: Option<&Caller>,
        intent: NewPaymentIntent,
    ) -> Result<PaymentIntent, OrderCommitError> {
        let caller = caller.ok_or(OrderCommitError::Unauthenticated)?;
        if !intent.amount.is_chargeable() {
            return Err(OrderCommitError::InvalidOrder(format!("Cannot charge {}", intent.amount)));
        }
        // Every stored amount is in paise, so every payment must be in rupees
        if intent.currency != INR_CURRENCY_CODE {
            return Err(OrderCommitError::InvalidOrder(format!(
                "Unsupported currency {}. Payments are taken in {INR_CURRENCY_CODE}.",
                intent.currency
            )));
        }
        debug!("🧾️ {} is opening a payment of {} (receipt {})", caller.uid, intent.amount, intent.receipt);
        let result = self.gateway.create_payment_intent(intent).await.map_err(|e| {
            error!("🧾️ Payment intent creation failed: {e}");
            OrderCommitError::Gateway(e.to_string())
        })?;
        info!("🧾️ Payment intent {} created for {}", result.id, caller.uid);
        Ok(result)
    }

    /// Verifies the gateway's payment signature and commits the order.
    ///
    /// Nothing is written unless the caller is authenticated, the signature checks out and the order names a canteen
    /// and a customer. Confirming the same payment twice is safe: the second call returns the order created by the
    /// first as [`CommitResult::AlreadyProcessed`], without taking another token.
    pub async fn confirm_payment(
        &self,
        caller: Option<&Caller>,
        confirmation: PaymentConfirmation,
    ) -> Result<CommitResult, OrderCommitError> {
        let caller = caller.ok_or(OrderCommitError::Unauthenticated)?;
        let valid = PaymentSignature::verify(
            confirmation.intent_id.as_str(),
            confirmation.payment_id.as_str(),
            &confirmation.signature,
            self.gateway_secret.reveal(),
        );
        if !valid {
            warn!(
                "🔐️ Rejected payment confirmation from {} for payment {} on {}. The signature does not match.",
                caller.uid, confirmation.payment_id, confirmation.intent_id
            );
            return Err(OrderCommitError::InvalidSignature);
        }
        trace!("🔐️ Signature for payment {} verified", confirmation.payment_id);
        if confirmation.canteen_id.is_empty() {
            return Err(OrderCommitError::InvalidOrder("canteenId is required".into()));
        }
        if confirmation.user_id.is_empty() {
            return Err(OrderCommitError::InvalidOrder("userId is required".into()));
        }
        let scope = ScopeKey::new(confirmation.canteen_id.clone(), date_key(self.time_zone));
        let order = confirmation.into_new_order();
        let result = self
            .retry_policy
            .run("Order commit", || self.db.commit_order(&scope, order.clone()))
            .await
            .map_err(|e| match e {
                RetryError::Exhausted { attempts, last } => {
                    error!("🧾️ Could not commit payment {} for {scope}: {last}", order.payment_id);
                    OrderCommitError::AllocationConflict(attempts)
                },
                RetryError::Permanent(e) => {
                    error!("🧾️ Could not commit payment {} for {scope}: {e}", order.payment_id);
                    OrderCommitError::Database(e.to_string())
                },
            })?;
        match &result {
            CommitResult::Created(o) => {
                info!("🧾️ Order {} committed for {scope} with token #{}", o.id, o.token_number)
            },
            CommitResult::AlreadyProcessed(o) => {
                info!("🧾️ Payment {} was already committed as order {}. Returning it.", o.payment_id, o.id)
            },
        }
        Ok(result)
    }
}
