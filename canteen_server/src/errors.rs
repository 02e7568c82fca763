use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use canteen_engine::OrderCommitError;
use log::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Payment could not be verified.")]
    PaymentNotVerified,
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0} Please retry.")]
    RetryableFailure(String),
}

/// The error kinds reported to callers of the two callables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallableErrorCode {
    Unauthenticated,
    PermissionDenied,
    InvalidArgument,
    Internal,
}

impl CallableErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::PermissionDenied => "permission-denied",
            Self::InvalidArgument => "invalid-argument",
            Self::Internal => "internal",
        }
    }
}

impl ServerError {
    pub fn code(&self) -> CallableErrorCode {
        match self {
            Self::AuthenticationError(_) => CallableErrorCode::Unauthenticated,
            Self::PaymentNotVerified => CallableErrorCode::PermissionDenied,
            Self::InvalidRequestBody(_) | Self::InvalidArgument(_) => CallableErrorCode::InvalidArgument,
            Self::InitializeError(_) |
            Self::BackendError(_) |
            Self::IOError(_) |
            Self::ConfigurationError(_) |
            Self::Unspecified(_) |
            Self::RetryableFailure(_) => CallableErrorCode::Internal,
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self.code() {
            CallableErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            CallableErrorCode::PermissionDenied => StatusCode::FORBIDDEN,
            CallableErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
            CallableErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = serde_json::json!({
            "error": { "status": self.code().as_str(), "message": self.to_string() }
        });
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(body.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("The access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("The access token could not be validated. {0}")]
    ValidationError(String),
}

impl From<OrderCommitError> for ServerError {
    fn from(e: OrderCommitError) -> Self {
        match e {
            OrderCommitError::Unauthenticated => Self::AuthenticationError(AuthError::MissingToken),
            OrderCommitError::InvalidSignature => Self::PaymentNotVerified,
            OrderCommitError::InvalidOrder(msg) => Self::InvalidArgument(msg),
            // Provider and storage details stay in the logs
            OrderCommitError::Gateway(msg) => {
                debug!("💻️ Reporting gateway failure to the caller. {msg}");
                Self::RetryableFailure("Failed to create the payment order.".into())
            },
            OrderCommitError::AllocationConflict(n) => {
                Self::RetryableFailure(format!("Could not allocate a token after {n} attempts."))
            },
            OrderCommitError::Database(msg) => {
                debug!("💻️ Reporting storage failure to the caller. {msg}");
                Self::BackendError("The order could not be saved.".into())
            },
        }
    }
}

#[cfg(test)]
mod test {
    use actix_web::body::MessageBody;

    use super::*;

    fn body_of(err: ServerError) -> serde_json::Value {
        let res = err.error_response();
        let bytes = res.into_body().try_into_bytes().expect("Body was not bytes");
        serde_json::from_slice(&bytes).expect("Body was not json")
    }

    #[test]
    fn engine_errors_map_to_callable_codes() {
        let cases = [
            (OrderCommitError::Unauthenticated, StatusCode::UNAUTHORIZED, "unauthenticated"),
            (OrderCommitError::InvalidSignature, StatusCode::FORBIDDEN, "permission-denied"),
            (OrderCommitError::InvalidOrder("canteenId is required".into()), StatusCode::BAD_REQUEST, "invalid-argument"),
            (OrderCommitError::Gateway("timeout".into()), StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            (OrderCommitError::AllocationConflict(8), StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            (OrderCommitError::Database("disk full".into()), StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        ];
        for (err, status, code) in cases {
            let err = ServerError::from(err);
            assert_eq!(err.status_code(), status);
            assert_eq!(err.code().as_str(), code);
        }
    }

    #[test]
    fn error_body_shape() {
        let body = body_of(ServerError::PaymentNotVerified);
        assert_eq!(body["error"]["status"], "permission-denied");
        assert_eq!(body["error"]["message"], "Payment could not be verified.");
    }

    #[test]
    fn retryable_failures_say_so() {
        let body = body_of(ServerError::from(OrderCommitError::AllocationConflict(3)));
        assert_eq!(body["error"]["status"], "internal");
        assert!(body["error"]["message"].as_str().unwrap().ends_with("Please retry."));
    }

    #[test]
    fn provider_details_are_not_reported() {
        let body = body_of(ServerError::from(OrderCommitError::Gateway("BAD_REQUEST_ERROR key rzp_live_x".into())));
        assert_eq!(body["error"]["message"], "Failed to create the payment order. Please retry.");
        let body = body_of(ServerError::from(OrderCommitError::Database("no such table: orders".into())));
        let message = body["error"]["message"].as_str().unwrap();
        assert!(!message.contains("orders"));
        assert!(message.ends_with("The order could not be saved."));
    }
}
