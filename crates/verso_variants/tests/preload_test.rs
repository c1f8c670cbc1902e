//! Tests for batch preloading.

mod test_utils;

use async_trait::async_trait;
use std::sync::Arc;
use test_utils::{Fixture, StubImageTransformer};
use uuid::Uuid;
use verso_core::{Blob, DescriptorDigest, Partition, RawOptions, Variant};
use verso_database::MemoryVariantRepository;
use verso_error::{DatabaseError, DatabaseErrorKind, DerivationErrorKind, VersoResult};
use verso_interface::{InsertOutcome, VariantRepository};
use verso_storage::MemoryStorage;
use verso_variants::{DerivationEngine, EngineConfig, Resolution, TransformerRegistry};

fn thumbnail() -> RawOptions {
    [("resize", "50x50"), ("format", "webp")].into_iter().collect()
}

async fn warmed_sources(fx: &Fixture, count: usize) -> Vec<Blob> {
    let mut sources = Vec::with_capacity(count);
    for i in 0..count {
        let source = fx.image("local", &format!("photo-{i}")).await;
        fx.engine
            .describe(&source, thumbnail())
            .unwrap()
            .process()
            .await
            .unwrap();
        sources.push(source);
    }
    sources
}

#[tokio::test]
async fn test_preload_query_count_is_independent_of_source_count() {
    for count in [2, 10, 40] {
        let fx = Fixture::new(TransformerRegistry::new().with(StubImageTransformer::new()));
        let sources = warmed_sources(&fx, count).await;
        fx.repository.reset_query_count();

        let preloaded = fx.engine.preload_variants(&sources, thumbnail()).await.unwrap();
        for handle in preloaded.handles() {
            let resolved = handle.process().await.unwrap();
            assert_eq!(*resolved.resolution(), Resolution::Hit);
        }

        assert_eq!(preloaded.hit_count(), count);
        assert_eq!(fx.repository.query_count(), 1, "for {count} sources");
    }
}

#[tokio::test]
async fn test_resolution_without_preload_costs_one_query_per_source() {
    let fx = Fixture::new(TransformerRegistry::new().with(StubImageTransformer::new()));
    let sources = warmed_sources(&fx, 6).await;
    fx.repository.reset_query_count();

    for source in &sources {
        fx.engine
            .describe(source, thumbnail())
            .unwrap()
            .process()
            .await
            .unwrap();
    }

    assert_eq!(fx.repository.query_count(), sources.len());
}

#[tokio::test]
async fn test_batch_size_caps_ids_per_query() {
    let config = EngineConfig::builder().batch_size(4usize).build().unwrap();
    let fx = Fixture::with_repository(
        TransformerRegistry::new().with(StubImageTransformer::new()),
        MemoryVariantRepository::new(),
        config,
    );
    let sources = warmed_sources(&fx, 10).await;
    fx.repository.reset_query_count();

    let preloaded = fx.engine.preload_variants(&sources, thumbnail()).await.unwrap();

    assert_eq!(preloaded.hit_count(), 10);
    assert_eq!(fx.repository.query_count(), 3);
}

#[tokio::test]
async fn test_misses_are_not_derived_by_preload() {
    let transformer = StubImageTransformer::new();
    let calls = transformer.calls();
    let fx = Fixture::new(TransformerRegistry::new().with(transformer));

    let mut sources = warmed_sources(&fx, 2).await;
    sources.push(fx.image("local", "cold-1").await);
    sources.push(fx.image("local", "cold-2").await);
    let calls_before = calls.load(std::sync::atomic::Ordering::SeqCst);

    let preloaded = fx.engine.preload_variants(&sources, thumbnail()).await.unwrap();

    assert_eq!(preloaded.hit_count(), 2);
    assert_eq!(preloaded.misses().count(), 2);
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), calls_before);
    assert_eq!(fx.repository.record_count().await, 2);

    let handles = preloaded.handles();
    assert!(handles[0].is_processed());
    assert!(handles[1].is_processed());
    assert!(handles[2].reference().is_none());

    for handle in &handles[2..] {
        let resolved = handle.process().await.unwrap();
        assert_eq!(*resolved.resolution(), Resolution::Created);
    }
    assert_eq!(fx.repository.record_count().await, 4);
}

#[tokio::test]
async fn test_preload_of_nothing_issues_no_query() {
    let fx = Fixture::new(TransformerRegistry::new().with(StubImageTransformer::new()));
    fx.repository.reset_query_count();

    let preloaded = fx.engine.preload_variants(&[], thumbnail()).await.unwrap();

    assert_eq!(preloaded.hit_count(), 0);
    assert!(preloaded.handles().is_empty());
    assert_eq!(fx.repository.query_count(), 0);
}

#[tokio::test]
async fn test_preloaded_variant_matches_direct_lookup() {
    let fx = Fixture::new(TransformerRegistry::new().with(StubImageTransformer::new()));
    let sources = warmed_sources(&fx, 3).await;

    let preloaded = fx.engine.preload_variants(&sources, thumbnail()).await.unwrap();

    for source in &sources {
        let direct = fx
            .engine
            .store()
            .find(source.id, preloaded.descriptor().digest())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(preloaded.get(source.id), Some(&direct));
    }
}

/// Index whose batched lookup always loses its connection.
struct UnreachableBatchIndex(MemoryVariantRepository);

#[async_trait]
impl VariantRepository for UnreachableBatchIndex {
    async fn insert_blob(&self, blob: &Blob) -> VersoResult<()> {
        self.0.insert_blob(blob).await
    }

    async fn find_blob(&self, id: Uuid) -> VersoResult<Option<Blob>> {
        self.0.find_blob(id).await
    }

    async fn find_variant(
        &self,
        source_id: Uuid,
        digest: &DescriptorDigest,
    ) -> VersoResult<Option<Variant>> {
        self.0.find_variant(source_id, digest).await
    }

    async fn find_variants(
        &self,
        _source_ids: &[Uuid],
        _digest: &DescriptorDigest,
    ) -> VersoResult<Vec<Variant>> {
        Err(DatabaseError::new(DatabaseErrorKind::Connection("connection reset".to_string())).into())
    }

    async fn insert_variant(&self, variant: &Variant) -> VersoResult<InsertOutcome> {
        self.0.insert_variant(variant).await
    }

    async fn variants_for(&self, source_id: Uuid) -> VersoResult<Vec<Variant>> {
        self.0.variants_for(source_id).await
    }

    async fn delete_source(&self, source_id: Uuid) -> VersoResult<Vec<Blob>> {
        self.0.delete_source(source_id).await
    }

    async fn key_in_use(&self, partition: &Partition, key: &str) -> VersoResult<bool> {
        self.0.key_in_use(partition, key).await
    }
}

#[tokio::test]
async fn test_preload_reports_index_failure_as_store_unavailable() {
    let repository = Arc::new(UnreachableBatchIndex(MemoryVariantRepository::new()));
    let engine = DerivationEngine::new(
        EngineConfig::default(),
        TransformerRegistry::new().with(StubImageTransformer::new()),
        repository,
        Arc::new(MemoryStorage::new()),
    );
    let sources = vec![Fixture::new(TransformerRegistry::new()).image("local", "a").await];

    let err = engine.preload_variants(&sources, thumbnail()).await.unwrap_err();

    assert!(matches!(
        err.derivation().map(|d| d.kind()),
        Some(DerivationErrorKind::StoreUnavailable(_))
    ));
    assert!(err.is_retryable());
}
