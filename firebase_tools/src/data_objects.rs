use std::collections::BTreeMap;

use canteen_engine::{db_types::NotificationTarget, notification_objects::PushMessage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct FcmNotification {
    pub title: String,
    pub body: String,
}

/// One FCM v1 message, addressed to a single registration token.
#[derive(Debug, Clone, Serialize)]
pub struct FcmMessage {
    pub token: String,
    pub notification: FcmNotification,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

impl FcmMessage {
    pub fn new(target: &NotificationTarget, message: &PushMessage) -> Self {
        Self {
            token: target.as_str().to_string(),
            notification: FcmNotification { title: message.title.clone(), body: message.body.clone() },
            data: message.data.clone(),
        }
    }
}

/// Google APIs report errors as `{"error": {"code": 404, "message": "...", "status": "NOT_FOUND"}}`
#[derive(Debug, Clone, Deserialize)]
pub struct FirebaseErrorBody {
    pub error: FirebaseErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirebaseErrorDetail {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}
