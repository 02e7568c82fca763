use std::sync::Arc;

use log::*;
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};

use crate::{config::FirebaseConfig, data_objects::FirebaseErrorBody, FirebaseApiError};

/// Shared HTTP plumbing for the Firebase clients. Requests carry the configured bearer token.
#[derive(Clone)]
pub struct FirebaseApi {
    config: FirebaseConfig,
    client: Arc<Client>,
}

impl FirebaseApi {
    pub fn new(config: FirebaseConfig) -> Result<Self, FirebaseApiError> {
        let client = Client::builder().timeout(config.request_timeout).build().map_err(|e| FirebaseApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &FirebaseConfig {
        &self.config
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        url: String,
        body: Option<B>,
    ) -> Result<T, FirebaseApiError> {
        trace!("Sending Firebase request: {method} {url}");
        let mut req = self.client.request(method, url).bearer_auth(self.config.access_token.reveal());
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| FirebaseApiError::RequestError(e.to_string()))?;
        if response.status().is_success() {
            trace!("Firebase request successful. {}", response.status());
            response.json::<T>().await.map_err(|e| FirebaseApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let text = response.text().await.map_err(|e| FirebaseApiError::RequestError(e.to_string()))?;
            let message = serde_json::from_str::<FirebaseErrorBody>(&text).map(|b| b.error.message).unwrap_or(text);
            Err(FirebaseApiError::QueryError { status, message })
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::{Duration, Instant};

    use canteen_common::Secret;
    use canteen_engine::{
        db_types::{AccountId, NotificationTarget},
        notification_objects::PushMessage,
        traits::{IdentityStore, PushTransport},
    };
    use tokio::net::TcpListener;

    use super::*;
    use crate::{FcmClient, IdentityAdminClient};

    /// Accepts connections and never answers them
    async fn silent_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn hung_requests_time_out() {
        let url = silent_server().await;
        let config = FirebaseConfig::new("canteen-test", Secret::new("tok".to_string()))
            .with_urls(url.clone(), url)
            .with_request_timeout(Duration::from_millis(200));
        let api = FirebaseApi::new(config).unwrap();

        let start = Instant::now();
        let err = FcmClient::new(api.clone())
            .send(&NotificationTarget::from("device-1"), &PushMessage::new("Hello", "World"))
            .await
            .unwrap_err();
        assert!(matches!(err, FirebaseApiError::RequestError(_)));
        let err = IdentityAdminClient::new(api).delete_identity(&AccountId::from("owner-1")).await.unwrap_err();
        assert!(matches!(err, FirebaseApiError::RequestError(_)));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
