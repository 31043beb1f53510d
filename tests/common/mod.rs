#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use story_gateway::error::{GenerationError, StoreError};
use story_gateway::generation::GenerationBackend;
use story_gateway::models::UserQuotaRecord;
use story_gateway::quota::{QuotaPolicy, QuotaTracker};
use story_gateway::store::{DocumentStore, MemoryStore, QuotaStore, Version, Versioned};

/// Serve `app` on an ephemeral local port and return its base url.
pub async fn serve(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn memory_tracker(policy: QuotaPolicy, retries: u32) -> (QuotaTracker, Arc<MemoryStore>) {
    let backend = Arc::new(MemoryStore::new());
    let store = QuotaStore::new(backend.clone(), retries).with_backoff(Duration::from_millis(1));
    (QuotaTracker::new(store, policy), backend)
}

/// Store that is always down.
pub struct DownStore;

#[async_trait]
impl DocumentStore for DownStore {
    async fn get(&self, _user_id: &str) -> Result<Option<Versioned>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn compare_and_set(
        &self,
        _user_id: &str,
        _record: &UserQuotaRecord,
        _expected: Option<&Version>,
    ) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

/// Store that reads fine but refuses every write.
pub struct ReadOnlyStore(pub MemoryStore);

#[async_trait]
impl DocumentStore for ReadOnlyStore {
    async fn get(&self, user_id: &str) -> Result<Option<Versioned>, StoreError> {
        self.0.get(user_id).await
    }

    async fn compare_and_set(
        &self,
        _user_id: &str,
        _record: &UserQuotaRecord,
        _expected: Option<&Version>,
    ) -> Result<bool, StoreError> {
        Err(StoreError::Rejected {
            status: 403,
            body: "permission denied".into(),
        })
    }
}

/// Generation backend with a canned answer that counts its calls.
pub struct CannedBackend {
    pub reply: Result<String, ()>,
    pub calls: AtomicUsize,
}

impl CannedBackend {
    pub fn ok(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn down() -> Self {
        Self {
            reply: Err(()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationBackend for CannedBackend {
    async fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(()) => Err(GenerationError::Status {
                status: 503,
                body: "maintenance".into(),
            }),
        }
    }
}
