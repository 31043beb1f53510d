use serde::{Deserialize, Serialize};

/// Per-user quota document.
///
/// Persisted as `{username, totalCalls, minuteCalls, lastAccessed}`, one
/// document per user id. The id itself is the document key and is not part
/// of the body. Absent fields decode as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserQuotaRecord {
    #[serde(skip)]
    pub user_id: String,
    pub username: String,
    pub total_calls: u64,
    pub minute_calls: u32,
    // unix seconds, start of the current window
    pub last_accessed: i64,
}

impl UserQuotaRecord {
    // zeroed record for a user that has never been seen
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }
}

// Generation backend request format
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub max_tokens: u32,
}

// Generation backend response format
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct GenerateResponse {
    pub text: String,
}
