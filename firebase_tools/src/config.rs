use std::time::Duration;

use canteen_common::Secret;
use log::*;

pub const FCM_API_URL: &str = "https://fcm.googleapis.com";
pub const IDENTITY_API_URL: &str = "https://identitytoolkit.googleapis.com";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    pub project_id: String,
    /// OAuth2 bearer token for a service account with messaging and identity admin scopes
    pub access_token: Secret<String>,
    pub fcm_url: String,
    pub identity_url: String,
    /// Upper bound on a whole request. A push or identity call that hangs would otherwise hold up every event queued
    /// behind it.
    pub request_timeout: Duration,
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self::new(String::default(), Secret::default())
    }
}

impl FirebaseConfig {
    pub fn new<S: Into<String>>(project_id: S, access_token: Secret<String>) -> Self {
        Self {
            project_id: project_id.into(),
            access_token,
            fcm_url: FCM_API_URL.to_string(),
            identity_url: IDENTITY_API_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_urls<F: Into<String>, I: Into<String>>(mut self, fcm_url: F, identity_url: I) -> Self {
        self.fcm_url = fcm_url.into();
        self.identity_url = identity_url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn new_from_env_or_default() -> Self {
        let project_id = std::env::var("CANTEEN_FIREBASE_PROJECT_ID").unwrap_or_else(|_| {
            warn!("🪛️ CANTEEN_FIREBASE_PROJECT_ID not set, using (probably useless) default");
            "canteen-demo".to_string()
        });
        let access_token = Secret::new(std::env::var("CANTEEN_FIREBASE_ACCESS_TOKEN").unwrap_or_else(|_| {
            warn!("🪛️ CANTEEN_FIREBASE_ACCESS_TOKEN not set. Push notifications and account cleanup will fail.");
            String::default()
        }));
        let request_timeout = std::env::var("CANTEEN_FIREBASE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| match s.parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    warn!("🪛️ CANTEEN_FIREBASE_TIMEOUT_SECS is not a positive number of seconds: {s}");
                    None
                },
            })
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        Self::new(project_id, access_token).with_request_timeout(request_timeout)
    }
}
