//! Retries for transient storage conflicts.
//!
//! Concurrent writers to the same daily counter are serialised by the database. A writer that loses the race gets a
//! busy/locked error, which is safe to retry from the start of the transaction. Any other error is returned at once.

use std::{future::Future, time::Duration};

use log::*;
use rand::Rng;
use thiserror::Error;

/// Errors that can tell whether retrying the failed operation from scratch may succeed.
pub trait IsTransient {
    fn is_transient(&self) -> bool;
}

#[derive(Debug, Error)]
pub enum RetryError<E: std::error::Error> {
    #[error("Gave up after {attempts} attempts. Last error: {last}")]
    Exhausted { attempts: u32, last: E },
    #[error("{0}")]
    Permanent(E),
}

/// Exponential backoff with full jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first. Always at least 1.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 8, initial_delay: Duration::from_millis(5), max_delay: Duration::from_millis(250) }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// The upper bound of the backoff before retry number `attempt` (1-based).
    pub fn backoff_ceiling(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }

    fn jittered_delay(&self, attempt: u32) -> Duration {
        let ceiling = self.backoff_ceiling(attempt).as_micros() as u64;
        Duration::from_micros(rand::thread_rng().gen_range(0..=ceiling))
    }

    /// Runs `op` until it succeeds, fails with a non-transient error, or the attempts run out.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, RetryError<E>>
    where
        E: std::error::Error + IsTransient,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) if !e.is_transient() => return Err(RetryError::Permanent(e)),
                Err(e) if attempt >= max_attempts => {
                    warn!("🔁️ {label} failed with a transient error on the final attempt ({attempt}). {e}");
                    return Err(RetryError::Exhausted { attempts: attempt, last: e });
                },
                Err(e) => {
                    let delay = self.jittered_delay(attempt);
                    debug!("🔁️ {label} hit a transient conflict on attempt {attempt}. Retrying in {delay:?}. {e}");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                },
            }
        }
    }
}

impl<E: std::error::Error> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { last, .. } => last,
            Self::Permanent(e) => e,
        }
    }
}
