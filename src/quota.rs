//! Per-user admission: `limit` calls per window, the window anchored at the
//! call that opened it. Rejected calls never move it.

use std::sync::Arc;
use tracing::{debug, error, info};

use crate::clock::{Clock, SystemClock};
use crate::error::StoreError;
use crate::metrics::ADMISSIONS;
use crate::models::UserQuotaRecord;
use crate::store::QuotaStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub limit: u32,
    pub window_secs: u64,
}

impl QuotaPolicy {
    pub fn new(limit: u32, window_secs: u64) -> Self {
        Self { limit, window_secs }
    }

    fn window(&self) -> i64 {
        i64::try_from(self.window_secs).unwrap_or(i64::MAX)
    }
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self::new(2, 60)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmitResult {
    // counters are the values just committed
    Allowed { total_calls: u64, minute_calls: u32 },
    Denied { cooldown_seconds: u64 },
    // store could not be consulted, fail closed
    Failed { cause: StoreError },
}

impl AdmitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AdmitResult::Allowed { .. })
    }

    fn outcome(&self) -> &'static str {
        match self {
            AdmitResult::Allowed { .. } => "allowed",
            AdmitResult::Denied { .. } => "denied",
            AdmitResult::Failed { .. } => "failed",
        }
    }
}

// Decision made against one committed snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { total_calls: u64, minute_calls: u32 },
    Denied { cooldown_seconds: u64 },
}

/// Record to persist and decision for a call at `now`. Must stay pure, the
/// store re-runs it after a lost race.
pub fn decide(
    prev: Option<&UserQuotaRecord>,
    username: &str,
    now: i64,
    policy: &QuotaPolicy,
) -> (UserQuotaRecord, Decision) {
    let Some(prev) = prev else {
        let next = UserQuotaRecord {
            user_id: String::new(),
            username: username.to_string(),
            total_calls: 1,
            minute_calls: 1,
            last_accessed: now,
        };
        return (next, Decision::Allowed { total_calls: 1, minute_calls: 1 });
    };

    let mut next = prev.clone();
    next.username = username.to_string();

    // a clock that went backwards counts as no time elapsed
    let elapsed = now.saturating_sub(prev.last_accessed).max(0);
    let window = policy.window();

    if elapsed < window {
        if prev.minute_calls >= policy.limit {
            let cooldown_seconds = (window - elapsed) as u64;
            return (next, Decision::Denied { cooldown_seconds });
        }
        next.total_calls = prev.total_calls + 1;
        next.minute_calls = prev.minute_calls + 1;
    } else {
        next.total_calls = prev.total_calls + 1;
        next.minute_calls = 1;
        next.last_accessed = now;
    }

    let decision = Decision::Allowed {
        total_calls: next.total_calls,
        minute_calls: next.minute_calls,
    };
    (next, decision)
}

#[derive(Clone)]
pub struct QuotaTracker {
    store: QuotaStore,
    policy: QuotaPolicy,
    clock: Arc<dyn Clock>,
}

impl QuotaTracker {
    pub fn new(store: QuotaStore, policy: QuotaPolicy) -> Self {
        Self::with_clock(store, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(store: QuotaStore, policy: QuotaPolicy, clock: Arc<dyn Clock>) -> Self {
        Self { store, policy, clock }
    }

    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    pub fn store(&self) -> &QuotaStore {
        &self.store
    }

    pub async fn admit(&self, user_id: &str, username: &str) -> AdmitResult {
        self.admit_at(user_id, username, self.clock.now_unix()).await
    }

    // `now` in unix seconds
    pub async fn admit_at(&self, user_id: &str, username: &str, now: i64) -> AdmitResult {
        let policy = self.policy;
        let res = self
            .store
            .transactional_update(user_id, |prev| decide(prev, username, now, &policy))
            .await;

        let result = match res {
            Ok(Decision::Allowed {
                total_calls,
                minute_calls,
            }) => {
                debug!(user_id, username, total_calls, minute_calls, "request admitted");
                AdmitResult::Allowed {
                    total_calls,
                    minute_calls,
                }
            }
            Ok(Decision::Denied { cooldown_seconds }) => {
                info!(user_id, username, cooldown_seconds, "quota exceeded");
                AdmitResult::Denied { cooldown_seconds }
            }
            Err(cause) => {
                error!(user_id, error = %cause, "admission check failed");
                AdmitResult::Failed { cause }
            }
        };

        ADMISSIONS.with_label_values(&[result.outcome()]).inc();
        result
    }
}
