use canteen_engine::{
    db_types::AccountId,
    traits::{IdentityDeletion, IdentityStore},
};
use log::*;
use reqwest::Method;
use serde_json::{json, Value};

use crate::{api::FirebaseApi, FirebaseApiError};

const USER_NOT_FOUND: &str = "USER_NOT_FOUND";

/// Deletes authentication accounts through the Identity Toolkit admin API.
#[derive(Clone)]
pub struct IdentityAdminClient {
    api: FirebaseApi,
}

impl IdentityAdminClient {
    pub fn new(api: FirebaseApi) -> Self {
        Self { api }
    }

    pub fn url(&self) -> String {
        let config = self.api.config();
        format!("{}/v1/projects/{}/accounts:delete", config.identity_url.trim_end_matches('/'), config.project_id)
    }
}

impl IdentityStore for IdentityAdminClient {
    type Error = FirebaseApiError;

    async fn delete_identity(&self, id: &AccountId) -> Result<IdentityDeletion, Self::Error> {
        let body = json!({ "localId": id.as_str() });
        match self.api.rest_query::<Value, _>(Method::POST, self.url(), Some(body)).await {
            Ok(_) => Ok(IdentityDeletion::Deleted),
            Err(e) if is_user_not_found(&e) => {
                debug!("Identity {id} does not exist");
                Ok(IdentityDeletion::NotFound)
            },
            Err(e) => Err(e),
        }
    }
}

fn is_user_not_found(e: &FirebaseApiError) -> bool {
    e.api_message().is_some_and(|m| m.starts_with(USER_NOT_FOUND))
}
