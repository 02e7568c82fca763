use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use canteen_engine::{
    events::{EventHandlers, EventHooks},
    helpers::RetryPolicy,
    AccountReaper,
    OrderCommitApi,
    SqliteDatabase,
};
use firebase_tools::{FcmClient, FirebaseApi, IdentityAdminClient};
use log::*;
use razorpay_tools::RazorpayApi;

use crate::{
    auth::TokenValidator,
    config::ServerConfig,
    errors::ServerError,
    routes::{health, json_config, ConfirmPaymentRoute, CreatePaymentIntentRoute},
    workers::{build_document_feed, start_feed_worker, start_reap_worker},
};

const HOOK_BUFFER_SIZE: usize = 64;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    run_server_with_hooks(config, EventHooks::default()).await
}

/// Runs the server, and hands every delivered order and owner event to `hooks` as well as to the notification
/// dispatcher.
pub async fn run_server_with_hooks(config: ServerConfig, hooks: EventHooks) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let firebase = FirebaseApi::new(config.firebase.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let reaper = AccountReaper::new(db.clone(), IdentityAdminClient::new(firebase.clone()))
        .with_max_attempts(config.reap_max_attempts);
    let handlers = EventHandlers::new(HOOK_BUFFER_SIZE, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let feed = build_document_feed(db.clone(), FcmClient::new(firebase), reaper.clone(), producers);
    // Catch up on anything that was committed but not delivered before the last shutdown
    match feed.drain().await {
        Ok(n) if n > 0 => info!("📬️ Delivered {n} event(s) left over from the previous run"),
        Ok(_) => {},
        Err(e) => warn!("📬️ Could not catch up on undelivered events. The feed worker will retry. {e}"),
    }
    let _feed_worker = start_feed_worker(feed, config.feed_poll_interval);
    let _reap_worker = start_reap_worker(reaper, config.reap_interval);
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let gateway = RazorpayApi::new(config.razorpay.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let retry_policy = RetryPolicy::default().with_max_attempts(config.allocation_max_attempts);
    let srv = HttpServer::new(move || {
        let commit_api = OrderCommitApi::new(db.clone(), gateway.clone(), config.razorpay.key_secret.clone())
            .with_time_zone(config.time_zone)
            .with_retry_policy(retry_policy);
        let validator = TokenValidator::new(&config.auth);
        let api_scope = web::scope("/api")
            .service(CreatePaymentIntentRoute::<SqliteDatabase, RazorpayApi>::new())
            .service(ConfirmPaymentRoute::<SqliteDatabase, RazorpayApi>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("canteen::access_log"))
            .app_data(json_config())
            .app_data(web::Data::new(commit_api))
            .app_data(web::Data::new(validator))
            .service(health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
