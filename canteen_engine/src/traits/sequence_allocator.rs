use crate::{db_types::ScopeKey, helpers::IsTransient};

/// Issues the token sequence 1, 2, 3, ... for each scope, with no gaps and no repeats.
#[allow(async_fn_in_trait)]
pub trait SequenceAllocator: Clone {
    type Error: std::error::Error + IsTransient;

    /// Reads the scope's last token (0 if the scope is new), stores and returns the successor, all in one serializable
    /// transaction. A caller that loses a race receives a transient error and must retry.
    async fn allocate(&self, scope: &ScopeKey) -> Result<i64, Self::Error>;

    /// The most recently issued token for the scope, if any.
    async fn last_token(&self, scope: &ScopeKey) -> Result<Option<i64>, Self::Error>;
}
