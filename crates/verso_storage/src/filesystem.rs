//! Filesystem-based byte storage implementation.
//!
//! Each partition is a directory under the storage root; content inside a
//! partition is filed by hash for automatic deduplication.

use crate::{ByteStore, StoredObject, content_checksum};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use verso_core::{MediaType, Partition};
use verso_error::{StorageError, StorageErrorKind, VersoResult};

/// Filesystem storage backend.
///
/// Stores content in a content-addressable structure:
/// `{base_path}/{partition}/{hash[0:2]}/{hash[2:4]}/{hash}`
///
/// # Example Structure
///
/// ```text
/// /var/verso/storage/
/// ├── local/
/// │   └── ab/
/// │       └── cd/
/// │           └── abcdef123456...
/// └── local_public/
///     └── 12/
///         └── 34/
///             └── 123456abcdef...
/// ```
///
/// Only partitions provisioned at construction are accepted.
pub struct FileSystemStorage {
    base_path: PathBuf,
    partitions: BTreeSet<Partition>,
}

impl FileSystemStorage {
    /// Create a filesystem store serving `partitions` under `base_path`.
    ///
    /// Creates the partition directories if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns error if a directory cannot be created or a partition name
    /// is not a plain directory name.
    #[tracing::instrument(skip_all)]
    pub fn new(
        base_path: impl Into<PathBuf>,
        partitions: impl IntoIterator<Item = Partition>,
    ) -> VersoResult<Self> {
        let base_path = base_path.into();
        let partitions: BTreeSet<Partition> = partitions.into_iter().collect();

        for partition in &partitions {
            if !is_plain_name(partition.as_str()) {
                return Err(StorageError::new(StorageErrorKind::UnknownPartition(
                    partition.to_string(),
                ))
                .into());
            }
            let dir = base_path.join(partition.as_str());
            std::fs::create_dir_all(&dir).map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    dir.display(),
                    e
                )))
            })?;
        }

        tracing::info!(
            path = %base_path.display(),
            partitions = partitions.len(),
            "Created filesystem storage"
        );
        Ok(Self {
            base_path,
            partitions,
        })
    }

    /// Root directory of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get the filesystem path for a key on a partition.
    ///
    /// Structure: `{base}/{partition}/{key[0:2]}/{key[2:4]}/{key}`
    fn get_path(&self, partition: &Partition, key: &str) -> VersoResult<PathBuf> {
        if !self.partitions.contains(partition) {
            return Err(
                StorageError::new(StorageErrorKind::UnknownPartition(partition.to_string())).into(),
            );
        }
        if !is_content_key(key) {
            return Err(StorageError::new(StorageErrorKind::InvalidKey(key.to_string())).into());
        }

        Ok(self
            .base_path
            .join(partition.as_str())
            .join(&key[0..2])
            .join(&key[2..4])
            .join(key))
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

fn is_content_key(key: &str) -> bool {
    key.len() == 64 && key.bytes().all(|b| b.is_ascii_hexdigit())
}

#[async_trait::async_trait]
impl ByteStore for FileSystemStorage {
    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    #[tracing::instrument(skip(self, data, partition, media_type), fields(size = data.len(), partition = %partition, media_type = %media_type))]
    async fn put(
        &self,
        partition: &Partition,
        data: &[u8],
        media_type: &MediaType,
    ) -> VersoResult<StoredObject> {
        let key = content_checksum(data);
        let path = self.get_path(partition, &key)?;
        let stored = StoredObject {
            key: key.clone(),
            checksum: key.clone(),
            byte_size: data.len() as i64,
        };

        // If file already exists, just return reference (deduplication)
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!(key = %key, path = %path.display(), "Content already stored");
            return Ok(stored);
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        // Unique temp name per writer; concurrent writers of the same content
        // each rename their own complete copy into place.
        let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        tokio::fs::write(&temp_path, data).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;

        tokio::fs::rename(&temp_path, &path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
        })?;

        tracing::info!(
            key = %key,
            path = %path.display(),
            size = data.len(),
            "Stored content"
        );

        Ok(stored)
    }

    #[tracing::instrument(skip(self, partition), fields(partition = %partition))]
    async fn get(&self, partition: &Partition, key: &str) -> VersoResult<Vec<u8>> {
        let path = self.get_path(partition, key)?;

        let data = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(format!("{}/{}", partition, key)))
            } else {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        })?;

        let actual = content_checksum(&data);
        if actual != key {
            return Err(StorageError::new(StorageErrorKind::ChecksumMismatch {
                expected: key.to_string(),
                actual,
            })
            .into());
        }

        tracing::debug!(key, size = data.len(), "Retrieved content");
        Ok(data)
    }

    #[tracing::instrument(skip(self, partition), fields(partition = %partition))]
    async fn delete(&self, partition: &Partition, key: &str) -> VersoResult<()> {
        let path = self.get_path(partition, key)?;

        tokio::fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(format!("{}/{}", partition, key)))
            } else {
                StorageError::new(StorageErrorKind::FileWrite(format!(
                    "delete {}: {}",
                    path.display(),
                    e
                )))
            }
        })?;

        tracing::info!(key, "Deleted content");
        Ok(())
    }

    async fn exists(&self, partition: &Partition, key: &str) -> VersoResult<bool> {
        let path = self.get_path(partition, key)?;
        Ok(tokio::fs::try_exists(path).await.unwrap_or(false))
    }
}
