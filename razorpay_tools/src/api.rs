use std::sync::Arc;

use canteen_common::Paise;
use canteen_engine::{
    db_types::IntentId,
    payment_objects::{NewPaymentIntent, PaymentIntent},
    traits::PaymentGateway,
};
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::RazorpayConfig,
    data_objects::{RazorpayErrorBody, RazorpayOrder, RazorpayOrderRequest},
    RazorpayApiError,
};

#[derive(Clone)]
pub struct RazorpayApi {
    config: RazorpayConfig,
    client: Arc<Client>,
}

impl RazorpayApi {
    pub fn new(config: RazorpayConfig) -> Result<Self, RazorpayApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RazorpayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/v1{path}", self.config.api_url.trim_end_matches('/'))
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, RazorpayApiError> {
        let url = self.url(path);
        trace!("Sending Razorpay request: {method} {url}");
        let mut req = self
            .client
            .request(method, url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.reveal()));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| RazorpayApiError::RequestError(e.to_string()))?;
        if response.status().is_success() {
            trace!("Razorpay request successful. {}", response.status());
            response.json::<T>().await.map_err(|e| RazorpayApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let text = response.text().await.map_err(|e| RazorpayApiError::RequestError(e.to_string()))?;
            let (code, description) = match serde_json::from_str::<RazorpayErrorBody>(&text) {
                Ok(body) => (body.error.code, body.error.description),
                Err(_) => ("UNKNOWN".to_string(), text),
            };
            Err(RazorpayApiError::QueryError { status, code, description })
        }
    }

    pub async fn create_order(&self, request: RazorpayOrderRequest) -> Result<RazorpayOrder, RazorpayApiError> {
        debug!("Creating Razorpay order for {} {} (receipt {})", request.amount, request.currency, request.receipt);
        let order = self.rest_query::<RazorpayOrder, _>(Method::POST, "/orders", Some(request)).await?;
        info!("Created Razorpay order {}", order.id);
        Ok(order)
    }
}

impl PaymentGateway for RazorpayApi {
    type Error = RazorpayApiError;

    async fn create_payment_intent(&self, intent: NewPaymentIntent) -> Result<PaymentIntent, Self::Error> {
        if !intent.amount.is_chargeable() {
            return Err(RazorpayApiError::InvalidCurrencyAmount(intent.amount.to_string()));
        }
        let request = RazorpayOrderRequest {
            amount: intent.amount.value(),
            currency: intent.currency,
            receipt: intent.receipt,
            notes: intent.notes,
        };
        let order = self.create_order(request).await?;
        Ok(PaymentIntent {
            id: IntentId::from(order.id),
            amount: Paise::from(order.amount),
            currency: order.currency,
            receipt: order.receipt,
            status: order.status,
        })
    }
}

#[cfg(test)]
mod test {
    use std::time::{Duration, Instant};

    use canteen_common::Secret;
    use tokio::net::TcpListener;

    use super::*;

    #[test]
    fn urls() {
        let config = RazorpayConfig::new("rzp_test_1", Secret::new("secret".into())).with_api_url("http://localhost:9999/");
        let api = RazorpayApi::new(config).unwrap();
        assert_eq!(api.url("/orders"), "http://localhost:9999/v1/orders");
        assert_eq!(api.url("/orders/order_1"), "http://localhost:9999/v1/orders/order_1");
    }

    #[tokio::test]
    async fn free_orders_never_reach_the_gateway() {
        // Nothing listens on this port. A request would fail with a RequestError instead.
        let config = RazorpayConfig::new("rzp_test_1", Secret::new("secret".into())).with_api_url("http://127.0.0.1:9");
        let api = RazorpayApi::new(config).unwrap();
        let err = api.create_payment_intent(NewPaymentIntent::new(Paise::from(0), "r1")).await.unwrap_err();
        assert!(matches!(err, RazorpayApiError::InvalidCurrencyAmount(_)));
        let err = api.create_payment_intent(NewPaymentIntent::new(Paise::from(100), "r2")).await.unwrap_err();
        assert!(matches!(err, RazorpayApiError::RequestError(_)));
    }

    #[tokio::test]
    async fn hung_requests_time_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        let config = RazorpayConfig::new("rzp_test_1", Secret::new("secret".into()))
            .with_api_url(format!("http://{addr}"))
            .with_request_timeout(Duration::from_millis(200));
        let api = RazorpayApi::new(config).unwrap();
        let start = Instant::now();
        let err = api.create_payment_intent(NewPaymentIntent::new(Paise::from(100), "r1")).await.unwrap_err();
        assert!(matches!(err, RazorpayApiError::RequestError(_)));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
