use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use canteen_engine::{
    traits::{OrderCommitDatabase, PaymentGateway},
    OrderCommitApi,
    SqliteDatabase,
};
use chrono::Duration;
use log::debug;
use serde_json::Value;
use tempfile::TempDir;

use crate::{
    auth::{TokenIssuer, TokenValidator},
    config::AuthConfig,
    routes::{health, json_config, ConfirmPaymentRoute, CreatePaymentIntentRoute},
};

pub const JWT_SECRET: &str = "endpoint-test-jwt-secret";
pub const GATEWAY_SECRET: &str = "test_secret";

pub fn auth_config() -> AuthConfig {
    AuthConfig::new(JWT_SECRET)
}

pub fn issue_token(account_id: &str) -> String {
    TokenIssuer::new(&auth_config()).issue_token(account_id, None).expect("Failed to sign token")
}

pub fn expired_token(account_id: &str) -> String {
    TokenIssuer::new(&auth_config()).issue_token(account_id, Some(Duration::hours(-1))).expect("Failed to sign token")
}

/// A fresh, migrated database in its own temporary directory. Keep the directory alive for the whole test.
pub async fn test_database() -> (SqliteDatabase, TempDir) {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().expect("Error creating temporary directory");
    let url = format!("sqlite://{}", dir.path().join("endpoint_test.db").display());
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating test database");
    (db, dir)
}

/// POSTs `body` to `path` on an app serving both callables against `api`, and returns the status and the JSON body.
pub async fn post_request<B, G>(
    token: Option<&str>,
    path: &str,
    body: &Value,
    api: web::Data<OrderCommitApi<B, G>>,
) -> (StatusCode, Value)
where
    B: OrderCommitDatabase + 'static,
    G: PaymentGateway + 'static,
{
    let mut req = TestRequest::post().uri(path).set_json(body);
    if let Some(token) = token {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    let app = App::new()
        .app_data(json_config())
        .app_data(api)
        .app_data(web::Data::new(TokenValidator::new(&auth_config())))
        .service(health)
        .service(
            web::scope("/api")
                .service(CreatePaymentIntentRoute::<B, G>::new())
                .service(ConfirmPaymentRoute::<B, G>::new()),
        );
    let service = test::init_service(app).await;
    debug!("Making request to {path}");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let bytes = test::read_body(res).await;
    let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()));
    (status, body)
}
