use crate::{db_types::NotificationTarget, ocs_api::notification_objects::PushMessage};

#[allow(async_fn_in_trait)]
pub trait PushTransport {
    type Error: std::error::Error;

    async fn send(&self, target: &NotificationTarget, message: &PushMessage) -> Result<(), Self::Error>;
}
