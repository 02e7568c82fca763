use canteen_engine::{db_types::NotificationTarget, notification_objects::PushMessage, traits::PushTransport};
use log::*;
use reqwest::Method;
use serde_json::{json, Value};

use crate::{api::FirebaseApi, data_objects::FcmMessage, FirebaseApiError};

/// Sends push notifications through the FCM v1 HTTP API.
#[derive(Clone)]
pub struct FcmClient {
    api: FirebaseApi,
}

impl FcmClient {
    pub fn new(api: FirebaseApi) -> Self {
        Self { api }
    }

    pub fn url(&self) -> String {
        let config = self.api.config();
        format!("{}/v1/projects/{}/messages:send", config.fcm_url.trim_end_matches('/'), config.project_id)
    }
}

impl PushTransport for FcmClient {
    type Error = FirebaseApiError;

    async fn send(&self, target: &NotificationTarget, message: &PushMessage) -> Result<(), Self::Error> {
        let body = json!({ "message": FcmMessage::new(target, message) });
        let response = self.api.rest_query::<Value, _>(Method::POST, self.url(), Some(body)).await?;
        debug!("Push '{}' accepted by FCM as {}", message.title, response["name"]);
        Ok(())
    }
}
