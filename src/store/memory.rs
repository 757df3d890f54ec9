//! In-memory replicated record network.
//!
//! A [`MemoryNetwork`] simulates an eventually consistent substrate shared by
//! several peers. Each peer joins with its own view ([`MemoryPeerStore`]);
//! writes are visible to the writer immediately and reach the other peers
//! according to the network's [`ReplicationMode`]. [`MemoryNetwork::sync`] is
//! the convergence barrier: after it returns every peer holds every record.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::store::traits::{merge_record, next_version};
use crate::store::{Record, RecordHandle, RecordStore, StoreError};

/// How writes propagate from the writing peer to the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicationMode {
    /// Only [`MemoryNetwork::sync`] propagates writes.
    Manual,
    /// Writes reach every peer before `put` returns.
    Immediate,
    /// Writes reach the other peers after the given delay.
    Delayed(Duration),
}

struct PeerView<K, V> {
    id: Uuid,
    records: DashMap<K, Vec<Record<V>>>,
}

impl<K, V> PeerView<K, V>
where
    K: Eq + Hash + Clone,
{
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            records: DashMap::new(),
        }
    }

    fn apply(&self, key: &K, record: Record<V>) -> bool {
        let mut entry = self.records.entry(key.clone()).or_default();
        merge_record(entry.value_mut(), record)
    }
}

struct NetworkInner<K, V> {
    mode: ReplicationMode,
    peers: DashMap<Uuid, Arc<PeerView<K, V>>>,
    published: DashMap<Uuid, (K, Record<V>)>,
}

impl<K, V> NetworkInner<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn broadcast(&self, origin: Uuid, key: &K, record: &Record<V>) {
        for peer in self.peers.iter() {
            if peer.id != origin {
                peer.apply(key, record.clone());
            }
        }
    }
}

/// Shared substrate that peer stores join.
pub struct MemoryNetwork<K, V> {
    inner: Arc<NetworkInner<K, V>>,
}

impl<K, V> Clone for MemoryNetwork<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> MemoryNetwork<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(mode: ReplicationMode) -> Self {
        Self {
            inner: Arc::new(NetworkInner {
                mode,
                peers: DashMap::new(),
                published: DashMap::new(),
            }),
        }
    }

    /// Adds a peer with an empty view.
    pub fn join(&self) -> MemoryPeerStore<K, V> {
        let view = Arc::new(PeerView::new());
        self.inner.peers.insert(view.id, Arc::clone(&view));
        MemoryPeerStore {
            view,
            network: Arc::clone(&self.inner),
        }
    }

    /// Delivers every published record to every peer.
    pub fn sync(&self) {
        let mut delivered = 0usize;
        for peer in self.inner.peers.iter() {
            for published in self.inner.published.iter() {
                let (key, record) = published.value();
                if peer.apply(key, record.clone()) {
                    delivered += 1;
                }
            }
        }
        tracing::debug!(
            peers = self.inner.peers.len(),
            records = self.inner.published.len(),
            delivered,
            "Record network converged"
        );
    }

    pub fn peer_count(&self) -> usize {
        self.inner.peers.len()
    }
}

/// One peer's view of a [`MemoryNetwork`].
pub struct MemoryPeerStore<K, V> {
    view: Arc<PeerView<K, V>>,
    network: Arc<NetworkInner<K, V>>,
}

impl<K, V> Drop for MemoryPeerStore<K, V> {
    fn drop(&mut self) {
        self.network.peers.remove(&self.view.id);
    }
}

#[async_trait]
impl<K, V> RecordStore<K, V> for MemoryPeerStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn put(&self, key: K, value: V) -> Result<RecordHandle, StoreError> {
        let version = self
            .view
            .records
            .get(&key)
            .map(|records| next_version(records.value()))
            .unwrap_or(1);
        let record = Record::new(version, value);
        let handle = record.handle;

        self.view.apply(&key, record.clone());
        self.network
            .published
            .insert(handle.id, (key.clone(), record.clone()));

        match self.network.mode {
            ReplicationMode::Manual => {}
            ReplicationMode::Immediate => self.network.broadcast(self.view.id, &key, &record),
            ReplicationMode::Delayed(delay) => {
                let network = Arc::clone(&self.network);
                let origin = self.view.id;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    network.broadcast(origin, &key, &record);
                });
            }
        }

        Ok(handle)
    }

    async fn get(&self, key: &K) -> Result<Option<Record<V>>, StoreError> {
        Ok(self
            .view
            .records
            .get(key)
            .and_then(|records| records.value().last().cloned()))
    }

    async fn history(&self, key: &K) -> Result<Vec<Record<V>>, StoreError> {
        Ok(self
            .view
            .records
            .get(key)
            .map(|records| records.value().clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writer_reads_its_own_writes() {
        let network = MemoryNetwork::<String, u32>::new(ReplicationMode::Manual);
        let peer = network.join();

        let handle = peer.put("k".to_string(), 7).await.unwrap();
        let record = peer.get(&"k".to_string()).await.unwrap().unwrap();

        assert_eq!(record.value, 7);
        assert_eq!(record.handle, handle);
        assert_eq!(handle.version, 1);
    }

    #[tokio::test]
    async fn test_manual_mode_is_stale_until_sync() {
        let network = MemoryNetwork::<String, u32>::new(ReplicationMode::Manual);
        let writer = network.join();
        let reader = network.join();

        writer.put("k".to_string(), 1).await.unwrap();
        assert!(reader.get(&"k".to_string()).await.unwrap().is_none());

        network.sync();
        assert_eq!(reader.get(&"k".to_string()).await.unwrap().unwrap().value, 1);
    }

    #[tokio::test]
    async fn test_sync_reaches_late_joiners() {
        let network = MemoryNetwork::<String, u32>::new(ReplicationMode::Immediate);
        let writer = network.join();
        writer.put("k".to_string(), 1).await.unwrap();

        let late = network.join();
        assert!(late.get(&"k".to_string()).await.unwrap().is_none());
        network.sync();
        assert!(late.get(&"k".to_string()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_immediate_mode_replicates_on_put() {
        let network = MemoryNetwork::<String, u32>::new(ReplicationMode::Immediate);
        let writer = network.join();
        let reader = network.join();

        writer.put("k".to_string(), 1).await.unwrap();
        writer.put("k".to_string(), 2).await.unwrap();

        let latest = reader.get(&"k".to_string()).await.unwrap().unwrap();
        assert_eq!(latest.value, 2);
        assert_eq!(latest.handle.version, 2);
        assert_eq!(reader.history(&"k".to_string()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delayed_mode_replicates_after_delay() {
        let network =
            MemoryNetwork::<String, u32>::new(ReplicationMode::Delayed(Duration::from_millis(50)));
        let writer = network.join();
        let reader = network.join();

        writer.put("k".to_string(), 1).await.unwrap();
        assert!(reader.get(&"k".to_string()).await.unwrap().is_none());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(reader.get(&"k".to_string()).await.unwrap().unwrap().value, 1);
    }

    #[tokio::test]
    async fn test_repeated_sync_is_idempotent() {
        let network = MemoryNetwork::<String, u32>::new(ReplicationMode::Manual);
        let writer = network.join();
        let reader = network.join();

        writer.put("k".to_string(), 1).await.unwrap();
        network.sync();
        network.sync();

        assert_eq!(reader.history(&"k".to_string()).await.unwrap().len(), 1);
        assert_eq!(writer.history(&"k".to_string()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_peer_leaves_network() {
        let network = MemoryNetwork::<String, u32>::new(ReplicationMode::Manual);
        let peer = network.join();
        assert_eq!(network.peer_count(), 1);
        drop(peer);
        assert_eq!(network.peer_count(), 0);
    }
}
