//! In-memory byte storage.

use crate::{ByteStore, StoredObject, content_checksum};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use verso_core::{MediaType, Partition};
use verso_error::{StorageError, StorageErrorKind, VersoResult};

/// Byte store kept entirely in process memory.
///
/// Accepts any partition. Useful for tests and short-lived tools; content
/// does not survive the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: RwLock<HashMap<(Partition, String), Vec<u8>>>,
    writes: AtomicUsize,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `put` calls served so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of distinct objects held on `partition`.
    pub async fn object_count(&self, partition: &Partition) -> usize {
        self.objects
            .read()
            .await
            .keys()
            .filter(|(p, _)| p == partition)
            .count()
    }
}

#[async_trait::async_trait]
impl ByteStore for MemoryStorage {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn put(
        &self,
        partition: &Partition,
        data: &[u8],
        _media_type: &MediaType,
    ) -> VersoResult<StoredObject> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let key = content_checksum(data);
        self.objects
            .write()
            .await
            .entry((partition.clone(), key.clone()))
            .or_insert_with(|| data.to_vec());
        tracing::debug!(partition = %partition, key = %key, size = data.len(), "Stored content in memory");
        Ok(StoredObject {
            checksum: key.clone(),
            key,
            byte_size: data.len() as i64,
        })
    }

    async fn get(&self, partition: &Partition, key: &str) -> VersoResult<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(&(partition.clone(), key.to_string()))
            .cloned()
            .ok_or_else(|| {
                StorageError::new(StorageErrorKind::NotFound(format!("{}/{}", partition, key)))
                    .into()
            })
    }

    async fn delete(&self, partition: &Partition, key: &str) -> VersoResult<()> {
        match self
            .objects
            .write()
            .await
            .remove(&(partition.clone(), key.to_string()))
        {
            Some(_) => Ok(()),
            None => Err(
                StorageError::new(StorageErrorKind::NotFound(format!("{}/{}", partition, key)))
                    .into(),
            ),
        }
    }

    async fn exists(&self, partition: &Partition, key: &str) -> VersoResult<bool> {
        Ok(self
            .objects
            .read()
            .await
            .contains_key(&(partition.clone(), key.to_string())))
    }
}
