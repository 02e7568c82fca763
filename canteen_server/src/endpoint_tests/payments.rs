use actix_web::{http::StatusCode, test, web, App};
use canteen_common::{Paise, Secret};
use canteen_engine::{
    db_types::{CanteenId, IntentId, OrderId, OrderStatusType, PaymentId, ScopeKey},
    helpers::{date_key, OperatingTimeZone, PaymentSignature},
    payment_objects::PaymentIntent,
    traits::{OrderCommitDatabase, SequenceAllocator},
    OrderCommitApi,
    SqliteDatabase,
};
use serde_json::{json, Value};

use super::{
    helpers::{expired_token, issue_token, post_request, test_database, GATEWAY_SECRET},
    mocks::{GatewayDown, MockGateway},
};
use crate::routes::health;

type TestApi = web::Data<OrderCommitApi<SqliteDatabase, MockGateway>>;

fn commit_api(db: &SqliteDatabase, gateway: MockGateway) -> TestApi {
    web::Data::new(OrderCommitApi::new(db.clone(), gateway, Secret::new(GATEWAY_SECRET.to_string())))
}

fn idle_gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_create_payment_intent().never();
    gateway
}

fn today(canteen: &str) -> ScopeKey {
    ScopeKey::new(canteen, date_key(OperatingTimeZone::default()))
}

fn confirmation(intent_id: &str, payment_id: &str, canteen_id: &str) -> Value {
    let signature = PaymentSignature::compute(intent_id, payment_id, GATEWAY_SECRET).expect("HMAC accepts any key");
    json!({
        "razorpay_order_id": intent_id,
        "razorpay_payment_id": payment_id,
        "razorpay_signature": signature,
        "userId": "user_1",
        "canteenId": canteen_id,
        "items": [{"name": "Veg Thali", "qty": 1, "price": 9000}],
        "totalAmount": 9000
    })
}

fn error_status(body: &Value) -> &str {
    body["error"]["status"].as_str().unwrap_or_default()
}

#[actix_web::test]
async fn health_check() {
    let app = test::init_service(App::new().service(health)).await;
    let req = test::TestRequest::get().uri("/health").to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(body, web::Bytes::from_static("👍️\n".as_bytes()));
}

//----------------------------------------------   createPaymentIntent  ----------------------------------------------

#[actix_web::test]
async fn create_payment_intent_without_token() {
    let (db, _dir) = test_database().await;
    let body = json!({ "amount": 50000, "receipt": "rcpt_1" });
    let (status, body) =
        post_request(None, "/api/create_payment_intent", &body, commit_api(&db, idle_gateway())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_status(&body), "unauthenticated");
}

#[actix_web::test]
async fn create_payment_intent_with_expired_token() {
    let (db, _dir) = test_database().await;
    let token = expired_token("user_1");
    let body = json!({ "amount": 50000, "receipt": "rcpt_1" });
    let (status, body) =
        post_request(Some(&token), "/api/create_payment_intent", &body, commit_api(&db, idle_gateway())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_status(&body), "unauthenticated");
}

#[actix_web::test]
async fn create_payment_intent_returns_gateway_id() {
    let (db, _dir) = test_database().await;
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_payment_intent()
        .withf(|intent| {
            intent.amount == Paise::from(50000) &&
                intent.currency == "INR" &&
                intent.receipt == "rcpt_1" &&
                intent.notes["table"] == 4
        })
        .times(1)
        .returning(|intent| {
            Ok(PaymentIntent {
                id: IntentId::from("order_test_1"),
                amount: intent.amount,
                currency: intent.currency,
                receipt: Some(intent.receipt),
                status: "created".into(),
            })
        });
    let token = issue_token("user_1");
    let body = json!({ "amount": 50000, "receipt": "rcpt_1", "notes": { "table": 4 } });
    let (status, body) =
        post_request(Some(&token), "/api/create_payment_intent", &body, commit_api(&db, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "orderId": "order_test_1" }));
}

#[actix_web::test]
async fn create_payment_intent_gateway_failure() {
    let (db, _dir) = test_database().await;
    let mut gateway = MockGateway::new();
    gateway.expect_create_payment_intent().times(1).returning(|_| Err(GatewayDown));
    let token = issue_token("user_1");
    let body = json!({ "amount": 50000, "receipt": "rcpt_1" });
    let (status, body) =
        post_request(Some(&token), "/api/create_payment_intent", &body, commit_api(&db, gateway)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_status(&body), "internal");
    assert_eq!(body["error"]["message"], "Failed to create the payment order. Please retry.");
}

#[actix_web::test]
async fn create_payment_intent_malformed_body() {
    let (db, _dir) = test_database().await;
    let token = issue_token("user_1");
    let body = json!({ "amount": "fifty rupees", "receipt": "rcpt_1" });
    let (status, body) =
        post_request(Some(&token), "/api/create_payment_intent", &body, commit_api(&db, idle_gateway())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_status(&body), "invalid-argument");
}

#[actix_web::test]
async fn malformed_body_without_token_is_unauthenticated() {
    let (db, _dir) = test_database().await;
    let body = json!({ "amount": "fifty rupees", "receipt": "rcpt_1" });
    let (status, body) =
        post_request(None, "/api/create_payment_intent", &body, commit_api(&db, idle_gateway())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_status(&body), "unauthenticated");
    let body = json!({ "canteenId": 7 });
    let (status, body) = post_request(None, "/api/confirm_payment", &body, commit_api(&db, idle_gateway())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_status(&body), "unauthenticated");
}

#[actix_web::test]
async fn create_payment_intent_refuses_other_currencies() {
    let (db, _dir) = test_database().await;
    let token = issue_token("user_1");
    let body = json!({ "amount": 50000, "currency": "USD", "receipt": "rcpt_1" });
    let (status, body) =
        post_request(Some(&token), "/api/create_payment_intent", &body, commit_api(&db, idle_gateway())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_status(&body), "invalid-argument");
    assert_eq!(body["error"]["message"], "Unsupported currency USD. Payments are taken in INR.");
}

//----------------------------------------------   confirmPayment  ----------------------------------------------------

#[actix_web::test]
async fn confirm_payment_commits_order() {
    let (db, _dir) = test_database().await;
    let api = commit_api(&db, idle_gateway());
    let token = issue_token("user_1");
    let body = confirmation("order_test_1", "pay_test_1", "C1");
    assert_eq!(
        body["razorpay_signature"],
        "4ff18c7c3f955cc3c2bcb682411489df14e0d3b5fff455794c525df6e2465ae5"
    );
    let (status, body) = post_request(Some(&token), "/api/confirm_payment", &body, api).await;
    assert_eq!(status, StatusCode::OK);
    let order_id = body["firestoreOrderId"].as_str().expect("No order id in response");
    assert_eq!(order_id.len(), 20);

    let order = db.fetch_order(&OrderId::from(order_id)).await.unwrap().expect("Order was not written");
    assert_eq!(order.token_number, "1");
    assert_eq!(order.status, OrderStatusType::Pending);
    assert_eq!(order.canteen_id, CanteenId::from("C1"));
    assert_eq!(order.payment_id, PaymentId::from("pay_test_1"));
    assert_eq!(order.total_amount, Paise::from(9000));
}

#[actix_web::test]
async fn confirm_payment_twice_returns_the_same_order() {
    let (db, _dir) = test_database().await;
    let api = commit_api(&db, idle_gateway());
    let token = issue_token("user_1");
    let body = confirmation("order_test_1", "pay_test_1", "C1");
    let (status, first) = post_request(Some(&token), "/api/confirm_payment", &body, api.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, second) = post_request(Some(&token), "/api/confirm_payment", &body, api).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["firestoreOrderId"], second["firestoreOrderId"]);
    assert_eq!(db.last_token(&today("C1")).await.unwrap(), Some(1));
}

#[actix_web::test]
async fn confirm_payment_tokens_follow_each_canteen() {
    let (db, _dir) = test_database().await;
    let api = commit_api(&db, idle_gateway());
    let token = issue_token("user_1");
    let payments = [("order_a", "pay_a", "C1"), ("order_b", "pay_b", "C1"), ("order_c", "pay_c", "C2")];
    let mut tokens = Vec::new();
    for (intent, payment, canteen) in payments {
        let body = confirmation(intent, payment, canteen);
        let (status, body) = post_request(Some(&token), "/api/confirm_payment", &body, api.clone()).await;
        assert_eq!(status, StatusCode::OK);
        let id = body["firestoreOrderId"].as_str().unwrap().to_string();
        let order = db.fetch_order(&OrderId::from(id)).await.unwrap().unwrap();
        tokens.push(order.token_number);
    }
    assert_eq!(tokens, vec!["1", "2", "1"]);
}

#[actix_web::test]
async fn confirm_payment_with_bad_signature_writes_nothing() {
    let (db, _dir) = test_database().await;
    let api = commit_api(&db, idle_gateway());
    let token = issue_token("user_1");
    let mut body = confirmation("order_test_1", "pay_test_1", "C1");
    body["razorpay_signature"] = json!("5ff18c7c3f955cc3c2bcb682411489df14e0d3b5fff455794c525df6e2465ae5");
    let (status, body) = post_request(Some(&token), "/api/confirm_payment", &body, api).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_status(&body), "permission-denied");
    assert_eq!(db.fetch_order_by_payment_id(&PaymentId::from("pay_test_1")).await.unwrap(), None);
    assert_eq!(db.last_token(&today("C1")).await.unwrap(), None);
}

#[actix_web::test]
async fn confirm_payment_without_token_writes_nothing() {
    let (db, _dir) = test_database().await;
    let api = commit_api(&db, idle_gateway());
    let body = confirmation("order_test_1", "pay_test_1", "C1");
    let (status, body) = post_request(None, "/api/confirm_payment", &body, api).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_status(&body), "unauthenticated");
    assert_eq!(db.last_token(&today("C1")).await.unwrap(), None);
}

#[actix_web::test]
async fn confirm_payment_requires_a_canteen() {
    let (db, _dir) = test_database().await;
    let api = commit_api(&db, idle_gateway());
    let token = issue_token("user_1");
    let body = confirmation("order_test_1", "pay_test_1", "");
    let (status, body) = post_request(Some(&token), "/api/confirm_payment", &body, api).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_status(&body), "invalid-argument");
    assert_eq!(body["error"]["message"], "canteenId is required");
}
