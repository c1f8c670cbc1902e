//! Race-safe access to the variant index.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;
use verso_core::{DescriptorDigest, Variant};
use verso_error::{DatabaseError, DatabaseErrorKind, VersoResult};
use verso_interface::{InsertOutcome, VariantRepository};

/// How a variant came to be returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Resolution {
    /// An existing record was found; nothing was derived
    Hit,
    /// This caller derived the artifact and its record won the insert
    Created,
    /// This caller derived an artifact but another writer's record won
    Adopted,
}

/// Lookup-or-create over a [`VariantRepository`].
///
/// No lock is held while `create` runs. Concurrent callers may all derive;
/// the store's unique index picks one winner and every loser re-reads it.
#[derive(Clone)]
pub struct VariantStore {
    repository: Arc<dyn VariantRepository>,
    batch_size: usize,
}

impl VariantStore {
    /// Wrap a repository. Batched lookups send at most `batch_size` ids per query.
    pub fn new(repository: Arc<dyn VariantRepository>, batch_size: usize) -> Self {
        Self {
            repository,
            batch_size: batch_size.max(1),
        }
    }

    /// The underlying repository.
    pub fn repository(&self) -> &Arc<dyn VariantRepository> {
        &self.repository
    }

    /// Plain lookup.
    pub async fn find(
        &self,
        source_id: Uuid,
        digest: &DescriptorDigest,
    ) -> VersoResult<Option<Variant>> {
        self.repository.find_variant(source_id, digest).await
    }

    /// Return the variant for `(source_id, digest)`, creating it if absent.
    ///
    /// `create` runs only on a miss. If its record loses the insert to a
    /// concurrent writer, the winner is read back and returned instead.
    #[tracing::instrument(skip(self, digest, create), fields(digest = %digest.short()))]
    pub async fn find_or_create<F, Fut>(
        &self,
        source_id: Uuid,
        digest: &DescriptorDigest,
        create: F,
    ) -> VersoResult<(Variant, Resolution)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = VersoResult<Variant>>,
    {
        if let Some(existing) = self.find(source_id, digest).await? {
            tracing::debug!("Variant cache hit");
            return Ok((existing, Resolution::Hit));
        }

        let candidate = create().await?;
        self.insert_or_adopt(candidate).await
    }

    /// Insert a freshly derived variant, or adopt the record that beat it.
    pub async fn insert_or_adopt(&self, candidate: Variant) -> VersoResult<(Variant, Resolution)> {
        match self.repository.insert_variant(&candidate).await? {
            InsertOutcome::Inserted => {
                tracing::info!(
                    source_id = %candidate.record.source_id,
                    artifact_id = %candidate.artifact.id,
                    "Recorded new variant"
                );
                Ok((candidate, Resolution::Created))
            }
            InsertOutcome::Conflict => {
                let record = &candidate.record;
                let winner = self
                    .find(record.source_id, &record.descriptor_digest)
                    .await?
                    // The winner can only vanish if its source was deleted meanwhile.
                    .ok_or_else(|| DatabaseError::new(DatabaseErrorKind::NotFound))?;
                tracing::debug!(
                    source_id = %record.source_id,
                    winner = %winner.artifact.id,
                    discarded = %candidate.artifact.id,
                    same_bytes = winner.artifact.key == candidate.artifact.key,
                    "Lost variant race, adopted winner"
                );
                Ok((winner, Resolution::Adopted))
            }
        }
    }

    /// Look up the variants of many sources for one digest.
    ///
    /// One query per `batch_size` distinct ids. Sources without a variant
    /// are absent from the map.
    #[tracing::instrument(skip(self, source_ids, digest), fields(sources = source_ids.len(), digest = %digest.short()))]
    pub async fn find_all_by_sources_and_digest(
        &self,
        source_ids: &[Uuid],
        digest: &DescriptorDigest,
    ) -> VersoResult<HashMap<Uuid, Variant>> {
        let mut ids = source_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut found = HashMap::with_capacity(ids.len());
        for chunk in ids.chunks(self.batch_size) {
            for variant in self.repository.find_variants(chunk, digest).await? {
                found.insert(variant.record.source_id, variant);
            }
        }

        tracing::debug!(hits = found.len(), "Batched variant lookup");
        Ok(found)
    }
}

impl std::fmt::Debug for VariantStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariantStore")
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}
