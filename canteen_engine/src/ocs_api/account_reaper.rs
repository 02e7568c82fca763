use log::*;

use crate::{
    db_types::AccountId,
    traits::{IdentityDeletion, IdentityStore, ReapLedger},
};

pub const DEFAULT_REAP_MAX_ATTEMPTS: i64 = 10;
/// How many pending reaps a single reconciliation pass works through
pub const RECONCILE_BATCH_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReapOutcome {
    /// The identity was deleted
    Reaped,
    /// There was nothing to delete. This counts as success.
    AlreadyGone,
    /// The attempt failed and will be retried by the next reconciliation pass
    Failed { attempts: i64 },
    /// The attempt failed and the retry budget is spent
    Abandoned { attempts: i64 },
}

impl ReapOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Reaped | Self::AlreadyGone)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub reaped: usize,
    pub failed: usize,
    pub abandoned: usize,
}

/// Second step of the owner deletion saga: removes the authentication identity of a deleted owner.
///
/// The first step (deleting the profile and marking the owner for reaping) happens in the store, atomically. Each
/// `reap` makes exactly one deletion attempt. The first attempt is made by the `owner/deleted` handler. Failed attempts
/// stay in the ledger and are retried by [`Self::reconcile`] until they succeed or the attempt budget runs out.
#[derive(Clone)]
pub struct AccountReaper<L, I> {
    ledger: L,
    identities: I,
    max_attempts: i64,
}

impl<L, I> AccountReaper<L, I> {
    pub fn new(ledger: L, identities: I) -> Self {
        Self { ledger, identities, max_attempts: DEFAULT_REAP_MAX_ATTEMPTS }
    }

    pub fn with_max_attempts(mut self, max_attempts: i64) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
}

impl<L, I> AccountReaper<L, I>
where
    L: ReapLedger,
    I: IdentityStore,
{
    pub async fn reap(&self, owner_id: &AccountId) -> ReapOutcome {
        trace!("🪦️ Removing the identity of deleted owner {owner_id}");
        let outcome = match self.identities.delete_identity(owner_id).await {
            Ok(IdentityDeletion::Deleted) => {
                info!("🪦️ Identity {owner_id} deleted");
                ReapOutcome::Reaped
            },
            Ok(IdentityDeletion::NotFound) => {
                info!("🪦️ Identity {owner_id} does not exist. Nothing to delete.");
                ReapOutcome::AlreadyGone
            },
            Err(e) => return self.record_failure(owner_id, &e.to_string()).await,
        };
        if let Err(e) = self.ledger.record_reap_success(owner_id).await {
            // A stale entry is harmless. Retrying it finds nothing to delete, which clears it.
            warn!("🪦️ Identity {owner_id} is gone, but the reap ledger could not be updated. {e}");
        }
        outcome
    }

    async fn record_failure(&self, owner_id: &AccountId, error: &str) -> ReapOutcome {
        let attempts = match self.ledger.record_reap_failure(owner_id, error).await {
            Ok(Some(entry)) => entry.attempts,
            Ok(None) => {
                warn!("🪦️ Could not delete identity {owner_id} ({error}), and it is not in the reap ledger.");
                1
            },
            Err(e) => {
                error!("🪦️ Could not delete identity {owner_id} ({error}) nor record the failure ({e}).");
                1
            },
        };
        if attempts >= self.max_attempts {
            error!(
                "🪦️ Giving up on deleting identity {owner_id} after {attempts} attempts. Last error: {error}. It must \
                 be removed by hand."
            );
            ReapOutcome::Abandoned { attempts }
        } else {
            warn!("🪦️ Attempt {attempts} to delete identity {owner_id} failed: {error}. It will be retried.");
            ReapOutcome::Failed { attempts }
        }
    }

    /// Retries every reap that has failed at least once, and fewer than the maximum number of times.
    pub async fn reconcile(&self) -> Result<ReconcileSummary, L::Error> {
        let pending = self.ledger.pending_reaps(self.max_attempts, RECONCILE_BATCH_SIZE).await?;
        let mut summary = ReconcileSummary::default();
        if pending.is_empty() {
            trace!("🪦️ No pending reaps");
            return Ok(summary);
        }
        debug!("🪦️ Reconciling {} pending reap(s)", pending.len());
        for entry in pending {
            match self.reap(&entry.owner_id).await {
                ReapOutcome::Reaped | ReapOutcome::AlreadyGone => summary.reaped += 1,
                ReapOutcome::Failed { .. } => summary.failed += 1,
                ReapOutcome::Abandoned { .. } => summary.abandoned += 1,
            }
        }
        info!(
            "🪦️ Reconciliation complete. {} reaped, {} failed, {} abandoned",
            summary.reaped, summary.failed, summary.abandoned
        );
        Ok(summary)
    }
}
