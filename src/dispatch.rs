use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::generation::GenerationBackend;
use crate::quota::{AdmitResult, QuotaTracker};

// max tokens when the user does not say
pub const DEFAULT_WORDS: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryRequest {
    pub user_id: String,
    pub username: String,
    pub prompt: String,
    pub words: Option<i64>,
}

impl StoryRequest {
    pub fn max_tokens(&self) -> u32 {
        match self.words {
            Some(words) if words >= 1 => u32::try_from(words).unwrap_or(u32::MAX),
            _ => DEFAULT_WORDS,
        }
    }
}

// what the user gets to see, quota / store / backend outcomes kept apart
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryReply {
    Story { prompt: String, text: String },
    QuotaExceeded { limit: u32, cooldown_seconds: u64 },
    StoreFailure,
    BackendUnavailable,
}

impl fmt::Display for StoryReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoryReply::Story { prompt, text } => write!(f, "**{}**{}", prompt, text),
            StoryReply::QuotaExceeded {
                limit,
                cooldown_seconds,
            } => write!(
                f,
                "Whoa there, you exceeded your quota of {} requests per minute, please wait {} seconds.",
                limit, cooldown_seconds
            ),
            StoryReply::StoreFailure => write!(f, "Unknown error with the database occurred."),
            StoryReply::BackendUnavailable => {
                write!(f, "The model is currently down. Try again in a couple of hours.")
            }
        }
    }
}

#[derive(Clone)]
pub struct StoryDispatcher {
    tracker: QuotaTracker,
    backend: Arc<dyn GenerationBackend>,
}

impl StoryDispatcher {
    pub fn new(tracker: QuotaTracker, backend: Arc<dyn GenerationBackend>) -> Self {
        Self { tracker, backend }
    }

    // quota is spent once admitted, a failing backend does not refund it
    pub async fn handle(&self, req: &StoryRequest) -> StoryReply {
        match self.tracker.admit(&req.user_id, &req.username).await {
            AdmitResult::Allowed { .. } => {}
            AdmitResult::Denied { cooldown_seconds } => {
                return StoryReply::QuotaExceeded {
                    limit: self.tracker.policy().limit,
                    cooldown_seconds,
                };
            }
            AdmitResult::Failed { .. } => return StoryReply::StoreFailure,
        }

        match self.backend.generate(&req.prompt, req.max_tokens()).await {
            Ok(text) => StoryReply::Story {
                prompt: req.prompt.clone(),
                text,
            },
            Err(e) => {
                warn!(user_id = %req.user_id, error = %e, "story generation failed after admission");
                StoryReply::BackendUnavailable
            }
        }
    }
}
