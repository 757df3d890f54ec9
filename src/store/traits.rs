//! RecordStore trait definition.

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::StoreError;

/// Opaque handle identifying one written record version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordHandle {
    pub id: Uuid,
    pub version: u64,
}

/// One version of a value stored under a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<V> {
    pub handle: RecordHandle,
    pub written_at: Timestamp,
    pub value: V,
}

impl<V> Record<V> {
    pub(crate) fn new(version: u64, value: V) -> Self {
        Self {
            handle: RecordHandle {
                id: Uuid::new_v4(),
                version,
            },
            written_at: Timestamp::now(),
            value,
        }
    }

    pub(crate) fn order_key(&self) -> (u64, Timestamp, Uuid) {
        (self.handle.version, self.written_at, self.handle.id)
    }
}

/// Eventually consistent, versioned key/record store as seen from one peer.
///
/// Writes never mutate an existing record: every `put` appends a new version
/// and the latest visible version wins. Reads only reflect what has reached
/// this peer so far and may be stale.
#[async_trait]
pub trait RecordStore<K, V>: Send + Sync
where
    K: Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Append a new version of the record under `key`.
    async fn put(&self, key: K, value: V) -> Result<RecordHandle, StoreError>;

    /// Latest version visible to this peer.
    async fn get(&self, key: &K) -> Result<Option<Record<V>>, StoreError>;

    /// Every version visible to this peer, oldest first.
    async fn history(&self, key: &K) -> Result<Vec<Record<V>>, StoreError>;
}

/// Insert a record into a version list, keeping it ordered and free of duplicates.
///
/// Returns `false` when the record was already present.
pub(crate) fn merge_record<V>(records: &mut Vec<Record<V>>, record: Record<V>) -> bool {
    if records.iter().any(|r| r.handle.id == record.handle.id) {
        return false;
    }
    let position = records
        .iter()
        .position(|r| r.order_key() > record.order_key())
        .unwrap_or(records.len());
    records.insert(position, record);
    true
}

/// Next version number for a writer whose current view is `records`.
pub(crate) fn next_version<V>(records: &[Record<V>]) -> u64 {
    records.last().map(|r| r.handle.version + 1).unwrap_or(1)
}
