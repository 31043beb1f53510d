//! Firestore REST backend.
//!
//! Each user is a document `{collection}/{user_id}`. Firestore stamps every
//! write with an `updateTime`, which doubles as the compare-and-set version:
//! writes carry a `currentDocument.updateTime` precondition (or
//! `currentDocument.exists=false` for creation) and the server refuses them
//! if someone else committed in between.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error};

use super::{DocumentStore, Version, Versioned};
use crate::error::StoreError;
use crate::models::UserQuotaRecord;

pub struct FirestoreStore {
    client: reqwest::Client,
    // .../projects/{project}/databases/(default)/documents/{collection}
    collection_url: String,
    token: Option<String>,
    // per-request bound, a store that stops answering must fail the admission
    timeout: Duration,
}

// Firestore document as returned by the REST api
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    #[serde(default)]
    fields: HashMap<String, Value>,
    update_time: String,
}

impl FirestoreStore {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        project: &str,
        collection: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Self {
        let collection_url = format!(
            "{}/projects/{}/databases/(default)/documents/{}",
            base_url.trim_end_matches('/'),
            project,
            collection
        );
        Self {
            client,
            collection_url,
            token,
            timeout,
        }
    }

    fn doc_url(&self, user_id: &str) -> String {
        format!("{}/{}", self.collection_url, user_id)
    }

    fn prepare(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req.timeout(self.timeout);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, user_id: &str) -> Result<Option<Versioned>, StoreError> {
        let res = self
            .prepare(self.client.get(self.doc_url(user_id)))
            .send()
            .await?;

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            error!(user_id, %status, "firestore read failed");
            return Err(status_error(status, body));
        }

        let doc: Document = res.json().await?;
        decode_document(user_id, doc).map(Some)
    }

    async fn compare_and_set(
        &self,
        user_id: &str,
        record: &UserQuotaRecord,
        expected: Option<&Version>,
    ) -> Result<bool, StoreError> {
        let precondition = match expected {
            Some(version) => format!("currentDocument.updateTime={}", version.as_str()),
            None => "currentDocument.exists=false".to_string(),
        };
        let url = format!("{}?{}", self.doc_url(user_id), precondition);

        let res = self
            .prepare(self.client.patch(url))
            .json(&json!({ "fields": encode_fields(record) }))
            .send()
            .await?;

        let status = res.status();
        if status.is_success() {
            return Ok(true);
        }

        let body = res.text().await.unwrap_or_default();
        if is_precondition_failure(status, &body) {
            debug!(user_id, %status, "firestore precondition failed");
            return Ok(false);
        }

        error!(user_id, %status, "firestore write failed");
        Err(status_error(status, body))
    }
}

fn status_error(status: StatusCode, body: String) -> StoreError {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        StoreError::Unavailable(format!("{}: {}", status, body))
    } else {
        StoreError::Rejected {
            status: status.as_u16(),
            body,
        }
    }
}

// updateTime mismatch is FAILED_PRECONDITION, exists=false on an existing
// document is ALREADY_EXISTS, a document deleted under us is NOT_FOUND
fn is_precondition_failure(status: StatusCode, body: &str) -> bool {
    match status {
        StatusCode::CONFLICT | StatusCode::NOT_FOUND | StatusCode::PRECONDITION_FAILED => true,
        StatusCode::BAD_REQUEST => body.contains("FAILED_PRECONDITION"),
        _ => false,
    }
}

pub(crate) fn encode_fields(record: &UserQuotaRecord) -> Value {
    json!({
        "username": { "stringValue": record.username },
        "totalCalls": { "integerValue": record.total_calls.to_string() },
        "minuteCalls": { "integerValue": record.minute_calls.to_string() },
        "lastAccessed": { "integerValue": record.last_accessed.to_string() },
    })
}

fn decode_document(user_id: &str, doc: Document) -> Result<Versioned, StoreError> {
    let fields = &doc.fields;

    let username = match fields.get("username") {
        None => String::new(),
        Some(v) => v
            .get("stringValue")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| bad_field("username"))?,
    };
    let total_calls = integer_field(fields, "totalCalls")?;
    let minute_calls = integer_field(fields, "minuteCalls")?;
    let last_accessed = integer_field(fields, "lastAccessed")?;

    Ok(Versioned {
        record: UserQuotaRecord {
            user_id: user_id.to_string(),
            username,
            total_calls: u64::try_from(total_calls).map_err(|_| bad_field("totalCalls"))?,
            minute_calls: u32::try_from(minute_calls).map_err(|_| bad_field("minuteCalls"))?,
            last_accessed,
        },
        version: Version(doc.update_time),
    })
}

// Firestore sends int64 as a JSON string, absent fields read as zero
fn integer_field(fields: &HashMap<String, Value>, name: &str) -> Result<i64, StoreError> {
    let Some(value) = fields.get(name) else {
        return Ok(0);
    };
    match value.get("integerValue") {
        Some(Value::String(s)) => s.parse().map_err(|_| bad_field(name)),
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| bad_field(name)),
        _ => Err(bad_field(name)),
    }
}

fn bad_field(name: &str) -> StoreError {
    StoreError::Serialization(format!("field `{}` has an unexpected type", name))
}
