//! Source uploads and deletion.

use chrono::Utc;
use derive_getters::Getters;
use std::sync::Arc;
use uuid::Uuid;
use verso_core::{Blob, BlobMetadata, MediaType, Partition, Variant};
use verso_error::{
    DatabaseError, DatabaseErrorKind, StorageErrorKind, VersoError, VersoErrorKind, VersoResult,
};
use verso_interface::VariantRepository;
use verso_storage::ByteStore;

/// What a purge removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
pub struct PurgeReport {
    /// Variant records removed with the source
    variants_removed: usize,
    /// Byte store objects deleted because no blob row referred to them anymore
    objects_deleted: usize,
}

/// Records immutable sources and removes them with their variants.
#[derive(Clone)]
pub struct BlobService {
    repository: Arc<dyn VariantRepository>,
    bytes: Arc<dyn ByteStore>,
}

impl BlobService {
    /// Create a service over a metadata store and a byte store.
    pub fn new(repository: Arc<dyn VariantRepository>, bytes: Arc<dyn ByteStore>) -> Self {
        Self { repository, bytes }
    }

    /// Store `data` on `partition` and record it as a source.
    ///
    /// The media type is sniffed from the content, then guessed from
    /// `filename`, and falls back to `application/octet-stream`.
    pub async fn upload(
        &self,
        partition: &Partition,
        data: &[u8],
        filename: Option<&str>,
    ) -> VersoResult<Blob> {
        let metadata = BlobMetadata {
            filename: filename.map(str::to_string),
            ..BlobMetadata::default()
        };
        self.upload_with_metadata(partition, data, metadata).await
    }

    /// Like [`upload`](Self::upload), with dimensions or duration already known.
    #[tracing::instrument(skip(self, data, metadata, partition), fields(partition = %partition, size = data.len()))]
    pub async fn upload_with_metadata(
        &self,
        partition: &Partition,
        data: &[u8],
        metadata: BlobMetadata,
    ) -> VersoResult<Blob> {
        let media_type = MediaType::detect(data, metadata.filename.as_deref());
        let stored = self.bytes.put(partition, data, &media_type).await?;

        let blob = Blob {
            id: Uuid::new_v4(),
            key: stored.key,
            partition: partition.clone(),
            media_type,
            byte_size: stored.byte_size,
            checksum: stored.checksum,
            metadata,
            created_at: Utc::now(),
        };
        self.repository.insert_blob(&blob).await?;
        // A concurrent purge may have reclaimed shared content before the row existed.
        self.bytes
            .restore(partition, &blob.key, data, &blob.media_type)
            .await?;

        tracing::info!(blob_id = %blob.id, media_type = %blob.media_type, "Uploaded source");
        Ok(blob)
    }

    /// Load a blob by id.
    pub async fn find(&self, id: Uuid) -> VersoResult<Option<Blob>> {
        self.repository.find_blob(id).await
    }

    /// All variants derived from `source_id`, oldest first.
    pub async fn variants(&self, source_id: Uuid) -> VersoResult<Vec<Variant>> {
        self.repository.variants_for(source_id).await
    }

    /// Delete a source, its variant records and their artifacts.
    ///
    /// Rows go first, in one metadata store operation. Bytes are then
    /// deleted for every key no remaining blob row refers to; content
    /// shared with other blobs stays. A key that gains a row while it is
    /// being deleted is written back before this returns.
    ///
    /// # Errors
    ///
    /// Returns a not-found database error when the source does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn purge(&self, source_id: Uuid) -> VersoResult<PurgeReport> {
        let source = self
            .repository
            .find_blob(source_id)
            .await?
            .ok_or_else(|| DatabaseError::new(DatabaseErrorKind::NotFound))?;
        let artifacts = self.repository.delete_source(source_id).await?;

        let mut report = PurgeReport {
            variants_removed: artifacts.len(),
            objects_deleted: 0,
        };
        for blob in std::iter::once(&source).chain(artifacts.iter()) {
            if self.release(blob).await? {
                report.objects_deleted += 1;
            }
        }

        tracing::info!(
            variants = report.variants_removed,
            objects = report.objects_deleted,
            "Purged source"
        );
        Ok(report)
    }

    /// Delete the bytes of `blob` unless a blob row still refers to them.
    async fn release(&self, blob: &Blob) -> VersoResult<bool> {
        let (partition, key) = (&blob.partition, blob.key.as_str());
        if self.repository.key_in_use(partition, key).await? {
            return Ok(false);
        }

        // Keep a copy so a writer that reuses the key mid-delete can be repaired.
        let data = match self.bytes.get(partition, key).await {
            Ok(data) => data,
            Err(e) if is_missing(&e) => return Ok(false),
            Err(e) => return Err(e),
        };
        match self.bytes.delete(partition, key).await {
            Ok(()) => {}
            // Already gone, e.g. two artifacts of this purge shared a key.
            Err(e) if is_missing(&e) => return Ok(false),
            Err(e) => return Err(e),
        }

        if self.repository.key_in_use(partition, key).await? {
            tracing::warn!(partition = %partition, key, "Content reused during purge, restoring");
            self.bytes.put(partition, &data, &blob.media_type).await?;
            return Ok(false);
        }
        Ok(true)
    }
}

fn is_missing(err: &VersoError) -> bool {
    match err.kind() {
        VersoErrorKind::Storage(e) => matches!(e.kind, StorageErrorKind::NotFound(_)),
        _ => false,
    }
}
