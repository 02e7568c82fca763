use std::time::Duration;

use canteen_common::Secret;
use log::*;

pub const DEFAULT_API_URL: &str = "https://api.razorpay.com";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    /// Used for basic auth against the API, and as the HMAC key for payment signatures
    pub key_secret: Secret<String>,
    pub api_url: String,
    /// Upper bound on a whole request, from connecting to reading the body
    pub request_timeout: Duration,
}

impl Default for RazorpayConfig {
    fn default() -> Self {
        Self {
            key_id: String::default(),
            key_secret: Secret::default(),
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl RazorpayConfig {
    pub fn new<S: Into<String>>(key_id: S, key_secret: Secret<String>) -> Self {
        Self { key_id: key_id.into(), key_secret, ..Default::default() }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_api_url<S: Into<String>>(mut self, url: S) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn new_from_env_or_default() -> Self {
        let key_id = std::env::var("CANTEEN_RAZORPAY_KEY_ID").unwrap_or_else(|_| {
            warn!("🪛️ CANTEEN_RAZORPAY_KEY_ID not set, using (probably useless) default");
            "rzp_test_00000000000000".to_string()
        });
        let key_secret = Secret::new(std::env::var("CANTEEN_RAZORPAY_KEY_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ CANTEEN_RAZORPAY_KEY_SECRET not set. Payment signatures cannot be verified until it is.");
            String::default()
        }));
        let api_url = std::env::var("CANTEEN_RAZORPAY_API_URL").unwrap_or_else(|_| {
            info!("🪛️ CANTEEN_RAZORPAY_API_URL not set, using {DEFAULT_API_URL}");
            DEFAULT_API_URL.to_string()
        });
        let request_timeout = std::env::var("CANTEEN_RAZORPAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| match s.parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    warn!("🪛️ CANTEEN_RAZORPAY_TIMEOUT_SECS is not a positive number of seconds: {s}");
                    None
                },
            })
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        Self { key_id, key_secret, api_url, request_timeout }
    }
}
