use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum OrderCommitError {
    #[error("Authentication required.")]
    Unauthenticated,
    #[error("Invalid payment signature.")]
    InvalidSignature,
    #[error("The payment gateway request failed. {0}")]
    Gateway(String),
    #[error("Could not allocate a token after {0} attempts. Please retry.")]
    AllocationConflict(u32),
    #[error("Invalid order: {0}")]
    InvalidOrder(String),
    #[error("Database error: {0}")]
    Database(String),
}

impl OrderCommitError {
    /// True for failures the caller may fix by simply trying again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Gateway(_) | Self::AllocationConflict(_))
    }
}
