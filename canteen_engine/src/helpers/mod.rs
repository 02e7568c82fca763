mod date_key;
mod payment_signature;
mod retry;

pub use date_key::{date_key, date_key_for, OperatingTimeZone};
pub use payment_signature::PaymentSignature;
pub use retry::{IsTransient, RetryError, RetryPolicy};
