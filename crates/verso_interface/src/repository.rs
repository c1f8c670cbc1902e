//! Metadata store for blobs and the variant index.

use async_trait::async_trait;
use uuid::Uuid;
use verso_core::{Blob, DescriptorDigest, Partition, Variant};
use verso_error::VersoResult;

/// Result of attempting to insert a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsertOutcome {
    /// The record and its artifact row were written
    Inserted,
    /// Another writer already holds `(source_id, descriptor_digest)`;
    /// nothing was written
    Conflict,
}

/// Persistent index of blobs and variant records.
///
/// Implementations must enforce uniqueness of `(source_id,
/// descriptor_digest)` in the store itself (a unique index), not in
/// process memory: several processes may share one store.
///
/// Every method is one round-trip to the store.
#[async_trait]
pub trait VariantRepository: Send + Sync {
    /// Record a newly uploaded blob.
    async fn insert_blob(&self, blob: &Blob) -> VersoResult<()>;

    /// Load a blob by id.
    async fn find_blob(&self, id: Uuid) -> VersoResult<Option<Blob>>;

    /// Look up the variant of `source_id` for `digest`.
    async fn find_variant(
        &self,
        source_id: Uuid,
        digest: &DescriptorDigest,
    ) -> VersoResult<Option<Variant>>;

    /// Look up the variants of many sources for one digest in a single query.
    ///
    /// Sources without a variant are simply absent from the result.
    async fn find_variants(
        &self,
        source_ids: &[Uuid],
        digest: &DescriptorDigest,
    ) -> VersoResult<Vec<Variant>>;

    /// Atomically insert the artifact blob row and the variant record.
    ///
    /// On a uniqueness conflict neither row is kept and
    /// [`InsertOutcome::Conflict`] is returned.
    async fn insert_variant(&self, variant: &Variant) -> VersoResult<InsertOutcome>;

    /// All variants derived from `source_id`.
    async fn variants_for(&self, source_id: Uuid) -> VersoResult<Vec<Variant>>;

    /// Delete a source, its variant records and their artifact blob rows.
    ///
    /// The cascade follows artifacts that were themselves used as sources,
    /// to any depth. Returns every artifact blob that was removed.
    async fn delete_source(&self, source_id: Uuid) -> VersoResult<Vec<Blob>>;

    /// Whether any remaining blob row still refers to `key` on `partition`.
    async fn key_in_use(&self, partition: &Partition, key: &str) -> VersoResult<bool>;
}
