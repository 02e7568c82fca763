//! A thin client for the payment gateway's order API. Gateway "orders" are what the engine calls payment intents.
mod api;
mod config;
mod data_objects;
mod error;

pub use api::RazorpayApi;
pub use config::RazorpayConfig;
pub use data_objects::{RazorpayErrorBody, RazorpayOrder, RazorpayOrderRequest};
pub use error::RazorpayApiError;
