use thiserror::Error;

#[derive(Debug, Error)]
pub enum FirebaseApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Request could not be sent: {0}")]
    RequestError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Firebase rejected the request. Error {status}. {message}")]
    QueryError { status: u16, message: String },
}

impl FirebaseApiError {
    /// The error message reported by the API, if this is an API error
    pub fn api_message(&self) -> Option<&str> {
        match self {
            Self::QueryError { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }
}
