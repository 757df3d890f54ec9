//! Disk-backed record store holding one peer's local view.
//!
//! Each key maps to a JSON file containing every version written under it.
//! Files are replaced atomically through a temporary file and rename.

use std::fmt::Display;
use std::marker::PhantomData;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use crate::store::traits::{merge_record, next_version};
use crate::store::{Record, RecordHandle, RecordStore, StoreError};

/// Record store persisted under a directory, one file per key.
pub struct FileRecordStore<K, V> {
    directory: PathBuf,
    write_lock: Mutex<()>,
    _marker: PhantomData<fn(K) -> V>,
}

impl<K, V> FileRecordStore<K, V>
where
    K: Display,
    V: Serialize + DeserializeOwned,
{
    /// Opens (and creates if needed) a store rooted at `directory`.
    pub async fn open(directory: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let directory = directory.into();
        tokio::fs::create_dir_all(&directory)
            .await
            .map_err(|e| StoreError::io(&directory, e))?;
        tracing::debug!(directory = %directory.display(), "Opened file record store");
        Ok(Self {
            directory,
            write_lock: Mutex::new(()),
            _marker: PhantomData,
        })
    }

    fn path_for(&self, key: &K) -> PathBuf {
        let name: String = key
            .to_string()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.directory.join(format!("{}.json", name))
    }

    async fn load(&self, key: &K) -> Result<Vec<Record<V>>, StoreError> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    async fn persist(&self, key: &K, records: &[Record<V>]) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(records)?;
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| StoreError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        Ok(())
    }
}

#[async_trait]
impl<K, V> RecordStore<K, V> for FileRecordStore<K, V>
where
    K: Display + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn put(&self, key: K, value: V) -> Result<RecordHandle, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load(&key).await?;
        let record = Record::new(next_version(&records), value);
        let handle = record.handle;
        merge_record(&mut records, record);
        self.persist(&key, &records).await?;
        Ok(handle)
    }

    async fn get(&self, key: &K) -> Result<Option<Record<V>>, StoreError> {
        Ok(self.load(key).await?.pop())
    }

    async fn history(&self, key: &K) -> Result<Vec<Record<V>>, StoreError> {
        self.load(key).await
    }
}
