//! In-memory implementation of VariantRepository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;
use verso_core::{Blob, DescriptorDigest, Partition, Variant, VariantRecord};
use verso_error::{DatabaseError, DatabaseErrorKind, VersoResult};
use verso_interface::{InsertOutcome, VariantRepository};

#[derive(Debug, Default)]
struct State {
    blobs: HashMap<Uuid, Blob>,
    // Keyed like the unique index on (source_id, descriptor_digest).
    records: HashMap<(Uuid, DescriptorDigest), VariantRecord>,
}

impl State {
    fn join(&self, record: &VariantRecord) -> VersoResult<Variant> {
        let artifact = self.blobs.get(&record.artifact_id).cloned().ok_or_else(|| {
            DatabaseError::new(DatabaseErrorKind::ForeignKey(format!(
                "variant {} points at missing artifact {}",
                record.id, record.artifact_id
            )))
        })?;
        Ok(Variant {
            record: record.clone(),
            artifact,
        })
    }
}

/// Process-local variant index.
///
/// Every trait method counts as one round-trip (see
/// [`query_count`](Self::query_count)) and holds the state lock only for
/// the duration of that round-trip, never across a transformation.
///
/// # Example
///
/// ```
/// use verso_database::MemoryVariantRepository;
///
/// let repo = MemoryVariantRepository::new();
/// assert_eq!(repo.query_count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MemoryVariantRepository {
    state: Mutex<State>,
    queries: AtomicUsize,
    latency: Option<Duration>,
}

impl MemoryVariantRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every round-trip by `latency`, to widen race windows in tests.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of round-trips served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Reset the round-trip counter.
    pub fn reset_query_count(&self) {
        self.queries.store(0, Ordering::SeqCst);
    }

    /// Number of variant records currently indexed.
    pub async fn record_count(&self) -> usize {
        self.state.lock().await.records.len()
    }

    /// Number of blob rows currently stored.
    pub async fn blob_count(&self) -> usize {
        self.state.lock().await.blobs.len()
    }

    async fn round_trip(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl VariantRepository for MemoryVariantRepository {
    async fn insert_blob(&self, blob: &Blob) -> VersoResult<()> {
        self.round_trip().await;
        let mut state = self.state.lock().await;
        if state.blobs.contains_key(&blob.id) {
            return Err(DatabaseError::new(DatabaseErrorKind::Query(format!(
                "duplicate blob id {}",
                blob.id
            )))
            .into());
        }
        state.blobs.insert(blob.id, blob.clone());
        Ok(())
    }

    async fn find_blob(&self, id: Uuid) -> VersoResult<Option<Blob>> {
        self.round_trip().await;
        Ok(self.state.lock().await.blobs.get(&id).cloned())
    }

    async fn find_variant(
        &self,
        source_id: Uuid,
        digest: &DescriptorDigest,
    ) -> VersoResult<Option<Variant>> {
        self.round_trip().await;
        let state = self.state.lock().await;
        state
            .records
            .get(&(source_id, digest.clone()))
            .map(|record| state.join(record))
            .transpose()
    }

    async fn find_variants(
        &self,
        source_ids: &[Uuid],
        digest: &DescriptorDigest,
    ) -> VersoResult<Vec<Variant>> {
        self.round_trip().await;
        let state = self.state.lock().await;
        source_ids
            .iter()
            .filter_map(|id| state.records.get(&(*id, digest.clone())))
            .map(|record| state.join(record))
            .collect()
    }

    async fn insert_variant(&self, variant: &Variant) -> VersoResult<InsertOutcome> {
        self.round_trip().await;
        let mut state = self.state.lock().await;
        let record = &variant.record;

        if !state.blobs.contains_key(&record.source_id) {
            return Err(DatabaseError::new(DatabaseErrorKind::ForeignKey(format!(
                "source blob {} does not exist",
                record.source_id
            )))
            .into());
        }

        let index_key = (record.source_id, record.descriptor_digest.clone());
        if state.records.contains_key(&index_key) {
            tracing::debug!(
                source_id = %record.source_id,
                digest = %record.descriptor_digest.short(),
                "Unique index conflict"
            );
            return Ok(InsertOutcome::Conflict);
        }

        state
            .blobs
            .insert(variant.artifact.id, variant.artifact.clone());
        state.records.insert(index_key, record.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn variants_for(&self, source_id: Uuid) -> VersoResult<Vec<Variant>> {
        self.round_trip().await;
        let state = self.state.lock().await;
        let mut variants = state
            .records
            .values()
            .filter(|record| record.source_id == source_id)
            .map(|record| state.join(record))
            .collect::<VersoResult<Vec<_>>>()?;
        variants.sort_by_key(|v| v.record.created_at);
        Ok(variants)
    }

    async fn delete_source(&self, source_id: Uuid) -> VersoResult<Vec<Blob>> {
        self.round_trip().await;
        let mut state = self.state.lock().await;
        if state.blobs.remove(&source_id).is_none() {
            return Err(DatabaseError::new(DatabaseErrorKind::NotFound).into());
        }

        // Artifacts may themselves be sources; follow them down.
        let mut removed = Vec::new();
        let mut frontier = vec![source_id];
        while !frontier.is_empty() {
            let artifact_ids: Vec<Uuid> = state
                .records
                .values()
                .filter(|record| frontier.contains(&record.source_id))
                .map(|record| record.artifact_id)
                .collect();
            state
                .records
                .retain(|(source, _), _| !frontier.contains(source));
            removed.extend(artifact_ids.iter().filter_map(|id| state.blobs.remove(id)));
            frontier = artifact_ids;
        }
        // Records whose own source or artifact just vanished cascade too.
        let State { blobs, records } = &mut *state;
        records.retain(|(source, _), record| {
            blobs.contains_key(source) && blobs.contains_key(&record.artifact_id)
        });

        Ok(removed)
    }

    async fn key_in_use(&self, partition: &Partition, key: &str) -> VersoResult<bool> {
        self.round_trip().await;
        Ok(self
            .state
            .lock()
            .await
            .blobs
            .values()
            .any(|blob| &blob.partition == partition && blob.key == key))
    }
}
