use crate::db_types::AccountId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityDeletion {
    Deleted,
    /// There was no identity with that id. Reaping treats this the same as a deletion.
    NotFound,
}

/// The authentication provider's account store.
#[allow(async_fn_in_trait)]
pub trait IdentityStore {
    type Error: std::error::Error;

    async fn delete_identity(&self, id: &AccountId) -> Result<IdentityDeletion, Self::Error>;
}
