use thiserror::Error;

#[derive(Debug, Error)]
pub enum RazorpayApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Request could not be sent: {0}")]
    RequestError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Razorpay rejected the request. Error {status} ({code}). {description}")]
    QueryError { status: u16, code: String, description: String },
    #[error("Invalid currency amount: {0}")]
    InvalidCurrencyAmount(String),
}
