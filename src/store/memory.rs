use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

use super::{DocumentStore, Version, Versioned};
use crate::error::StoreError;
use crate::models::UserQuotaRecord;

// Stored document: the record plus a write counter used as its version
struct Slot {
    record: UserQuotaRecord,
    version: u64,
}

// In-process store, compare-and-set runs under the entry's shard lock.
// Counters are per-instance and gone on restart.
#[derive(Clone, Default)]
pub struct MemoryStore {
    docs: Arc<DashMap<String, Slot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, user_id: &str) -> Result<Option<Versioned>, StoreError> {
        Ok(self.docs.get(user_id).map(|slot| Versioned {
            record: slot.record.clone(),
            version: Version(slot.version.to_string()),
        }))
    }

    async fn compare_and_set(
        &self,
        user_id: &str,
        record: &UserQuotaRecord,
        expected: Option<&Version>,
    ) -> Result<bool, StoreError> {
        let mut record = record.clone();
        record.user_id = user_id.to_string();

        match (self.docs.entry(user_id.to_string()), expected) {
            (Entry::Vacant(slot), None) => {
                slot.insert(Slot { record, version: 1 });
                Ok(true)
            }
            (Entry::Occupied(mut slot), Some(expected)) => {
                let current = slot.get().version;
                if current.to_string() != expected.as_str() {
                    return Ok(false);
                }
                slot.insert(Slot {
                    record,
                    version: current + 1,
                });
                Ok(true)
            }
            // created under us, or deleted under us
            _ => Ok(false),
        }
    }
}
