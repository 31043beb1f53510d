//! Per-user quota documents. Backends provide a versioned get and a
//! compare-and-set write, [`QuotaStore`] turns those into a transactional
//! read-modify-write that serializes concurrent updates to one user.

use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::metrics::STORE_CONFLICTS;
use crate::models::UserQuotaRecord;

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

// upper bound for a single pause between lost compare-and-set attempts
const MAX_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version(pub String);

impl Version {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// a record together with the version it was read at
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned {
    pub record: UserQuotaRecord,
    pub version: Version,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<Versioned>, StoreError>;

    /// Write `record` only if the stored version still equals `expected`.
    ///
    /// `expected = None` means the document must not exist. Returns
    /// `Ok(false)` when another writer got there first.
    async fn compare_and_set(
        &self,
        user_id: &str,
        record: &UserQuotaRecord,
        expected: Option<&Version>,
    ) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct QuotaStore {
    backend: Arc<dyn DocumentStore>,
    max_attempts: u32,
    backoff: Duration,
}

impl QuotaStore {
    pub fn new(backend: Arc<dyn DocumentStore>, max_attempts: u32) -> Self {
        Self {
            backend,
            max_attempts: max_attempts.max(1),
            backoff: Duration::from_millis(20),
        }
    }

    // base pause after the first lost race, doubled on each further loss
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub async fn read_or_default(&self, user_id: &str) -> Result<UserQuotaRecord, StoreError> {
        Ok(match self.backend.get(user_id).await? {
            Some(found) => found.record,
            None => UserQuotaRecord::empty(user_id),
        })
    }

    /// Atomically apply `update` to the record for `user_id`.
    ///
    /// `update` gets the committed record (`None` if absent) and may run more
    /// than once under contention. Returning the record unchanged commits
    /// without a write.
    pub async fn transactional_update<T, F>(&self, user_id: &str, mut update: F) -> Result<T, StoreError>
    where
        F: FnMut(Option<&UserQuotaRecord>) -> (UserQuotaRecord, T) + Send,
        T: Send,
    {
        for attempt in 1..=self.max_attempts {
            let current = self.backend.get(user_id).await?;
            let prev = current.as_ref().map(|v| &v.record);

            let (mut next, out) = update(prev);
            next.user_id = user_id.to_string();

            if prev == Some(&next) {
                return Ok(out);
            }

            let expected = current.as_ref().map(|v| &v.version);
            if self.backend.compare_and_set(user_id, &next, expected).await? {
                return Ok(out);
            }

            STORE_CONFLICTS.inc();
            if attempt < self.max_attempts {
                let pause = backoff_delay(self.backoff, attempt);
                debug!(user_id, attempt, ?pause, "quota record changed under us, retrying");
                tokio::time::sleep(pause).await;
            }
        }

        warn!(user_id, attempts = self.max_attempts, "giving up on contended quota record");
        Err(StoreError::Contention {
            attempts: self.max_attempts,
        })
    }
}

// Exponential pause with equal jitter: at least half of the step, so racers
// spread out without the delay ever collapsing to zero.
pub(crate) fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let step = base
        .saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
        .min(MAX_BACKOFF);
    let half = step / 2;
    let spread = u64::try_from(half.as_micros()).unwrap_or(u64::MAX);
    half + Duration::from_micros(rand::rng().random_range(0..=spread))
}
