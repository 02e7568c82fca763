use crate::db_types::{AccountId, CanteenId, NewProfile, PendingReap, Profile, ProfileRole};

#[allow(async_fn_in_trait)]
pub trait ProfileManagement: Clone {
    type Error: std::error::Error;

    /// Creates or replaces a profile. Creating a new owner profile appends an `owner/created` entry to the owner
    /// change stream.
    async fn upsert_profile(&self, profile: NewProfile) -> Result<Profile, Self::Error>;

    async fn fetch_profile(&self, role: ProfileRole, id: &AccountId) -> Result<Option<Profile>, Self::Error>;

    /// Resolves the owner profile of a canteen. An explicit canteen link takes precedence; without one, the owner
    /// profile with the same id as the canteen is used.
    async fn owner_for_canteen(&self, canteen_id: &CanteenId) -> Result<Option<Profile>, Self::Error>;

    async fn link_canteen_owner(&self, canteen_id: &CanteenId, owner_id: &AccountId) -> Result<(), Self::Error>;

    async fn admin_profiles(&self) -> Result<Vec<Profile>, Self::Error>;

    /// Step one of the owner deletion saga. In one transaction the owner profile is deleted, the owner is marked for
    /// identity reaping, and an `owner/deleted` entry is appended to the owner change stream.
    ///
    /// Returns false, and changes nothing, if there was no such owner.
    async fn delete_owner_profile(&self, owner_id: &AccountId) -> Result<bool, Self::Error>;
}

/// Bookkeeping for step two of the owner deletion saga.
#[allow(async_fn_in_trait)]
pub trait ReapLedger: Clone {
    type Error: std::error::Error;

    /// Owners whose identity removal has failed before and should be retried, oldest first. Entries that were never
    /// attempted are left out, since their `owner/deleted` event has not been handled yet. So are entries that have
    /// already failed `max_attempts` times.
    async fn pending_reaps(&self, max_attempts: i64, limit: i64) -> Result<Vec<PendingReap>, Self::Error>;

    async fn record_reap_success(&self, owner_id: &AccountId) -> Result<(), Self::Error>;

    /// Increments the attempt count and stores the error. Returns the updated entry, if it still exists.
    async fn record_reap_failure(&self, owner_id: &AccountId, error: &str) -> Result<Option<PendingReap>, Self::Error>;
}
