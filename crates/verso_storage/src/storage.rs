//! Byte store trait definition.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use verso_core::{MediaType, Partition};
use verso_error::VersoResult;

/// What a successful write produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredObject {
    /// Key to read the bytes back with
    pub key: String,
    /// SHA-256 of the bytes, hex encoded
    pub checksum: String,
    /// Number of bytes written
    pub byte_size: i64,
}

/// SHA-256 of `data`, lowercase hex.
pub fn content_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Trait for pluggable byte storage backends.
///
/// Implementations handle the storage and retrieval of binary content,
/// while metadata is managed separately by a
/// `verso_interface::VariantRepository`.
#[async_trait]
pub trait ByteStore: Send + Sync {
    /// Backend name (e.g., "filesystem", "memory").
    fn backend_name(&self) -> &'static str;

    /// Store `data` on `partition`.
    ///
    /// Writes are atomic: either the full content becomes readable under the
    /// returned key or nothing does.
    async fn put(
        &self,
        partition: &Partition,
        data: &[u8],
        media_type: &MediaType,
    ) -> VersoResult<StoredObject>;

    /// Read the bytes stored under `key` on `partition`.
    async fn get(&self, partition: &Partition, key: &str) -> VersoResult<Vec<u8>>;

    /// Remove the bytes stored under `key` on `partition`.
    async fn delete(&self, partition: &Partition, key: &str) -> VersoResult<()>;

    /// Whether bytes exist under `key` on `partition`.
    async fn exists(&self, partition: &Partition, key: &str) -> VersoResult<bool>;

    /// Write `data` again if nothing is stored under `key` anymore.
    ///
    /// Keys are shared by identical content, so a purge may reclaim a key
    /// between a writer's `put` and the insert of the row that refers to it.
    /// Writers call this once their row is committed. Returns whether the
    /// bytes had to be rewritten.
    async fn restore(
        &self,
        partition: &Partition,
        key: &str,
        data: &[u8],
        media_type: &MediaType,
    ) -> VersoResult<bool> {
        if self.exists(partition, key).await? {
            return Ok(false);
        }
        let stored = self.put(partition, data, media_type).await?;
        tracing::warn!(partition = %partition, key = %stored.key, "Rewrote reclaimed content");
        Ok(true)
    }
}
