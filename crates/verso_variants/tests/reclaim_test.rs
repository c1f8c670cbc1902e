//! Tests for purging content that a concurrent writer reuses.

mod test_utils;

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use test_utils::png_bytes;
use tokio::sync::Notify;
use verso_core::{Blob, BlobMetadata, Descriptor, MediaType, Partition, RawOptions};
use verso_database::MemoryVariantRepository;
use verso_error::VersoResult;
use verso_interface::{TransformFailure, TransformOutput, Transformer};
use verso_storage::{ByteStore, MemoryStorage, StoredObject};
use verso_variants::{BlobService, DerivationEngine, EngineConfig, Resolution, TransformerRegistry};

const THUMBNAIL: &[u8] = b"thumbnail bytes";

/// One-shot pause point inside a byte store call.
#[derive(Default)]
struct Gate {
    armed: AtomicBool,
    paused: Notify,
    resume: Notify,
}

impl Gate {
    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    async fn pass(&self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.paused.notify_one();
            self.resume.notified().await;
        }
    }

    async fn wait_paused(&self) {
        self.paused.notified().await;
    }

    fn release(&self) {
        self.resume.notify_one();
    }
}

/// Memory store that can park right after a `put` or right before a `delete`.
#[derive(Default)]
struct PausingStorage {
    inner: MemoryStorage,
    after_put: Gate,
    before_delete: Gate,
}

#[async_trait]
impl ByteStore for PausingStorage {
    fn backend_name(&self) -> &'static str {
        "pausing"
    }

    async fn put(
        &self,
        partition: &Partition,
        data: &[u8],
        media_type: &MediaType,
    ) -> VersoResult<StoredObject> {
        let stored = self.inner.put(partition, data, media_type).await?;
        self.after_put.pass().await;
        Ok(stored)
    }

    async fn get(&self, partition: &Partition, key: &str) -> VersoResult<Vec<u8>> {
        self.inner.get(partition, key).await
    }

    async fn delete(&self, partition: &Partition, key: &str) -> VersoResult<()> {
        self.before_delete.pass().await;
        self.inner.delete(partition, key).await
    }

    async fn exists(&self, partition: &Partition, key: &str) -> VersoResult<bool> {
        self.inner.exists(partition, key).await
    }
}

/// Image backend whose output never depends on its input.
struct FixedOutputTransformer;

#[async_trait]
impl Transformer for FixedOutputTransformer {
    fn name(&self) -> &str {
        "fixed_output"
    }

    fn supports(&self, media_type: &MediaType) -> bool {
        media_type.as_str().starts_with("image/")
    }

    async fn transform(
        &self,
        _source: &Blob,
        _data: &[u8],
        _descriptor: &Descriptor,
    ) -> Result<TransformOutput, TransformFailure> {
        Ok(TransformOutput {
            data: THUMBNAIL.to_vec(),
            media_type: MediaType::new("image/png"),
            metadata: BlobMetadata::default(),
        })
    }
}

struct Setup {
    bytes: Arc<PausingStorage>,
    blobs: BlobService,
    engine: DerivationEngine,
}

fn setup() -> Setup {
    let repository = Arc::new(MemoryVariantRepository::new());
    let bytes = Arc::new(PausingStorage::default());
    let blobs = BlobService::new(repository.clone(), bytes.clone());
    let engine = DerivationEngine::new(
        EngineConfig::default(),
        TransformerRegistry::new().with(FixedOutputTransformer),
        repository,
        bytes.clone(),
    );
    Setup {
        bytes,
        blobs,
        engine,
    }
}

fn local() -> Partition {
    Partition::new("local")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_upload_survives_purge_between_put_and_insert() {
    let s = setup();
    let first = s.blobs.upload(&local(), &png_bytes("same"), None).await.unwrap();

    s.bytes.after_put.arm();
    let blobs = s.blobs.clone();
    let second = tokio::spawn(async move {
        blobs.upload(&local(), &png_bytes("same"), None).await
    });
    s.bytes.after_put.wait_paused().await;

    // The second upload has written its bytes but owns no row yet.
    let report = s.blobs.purge(first.id).await.unwrap();
    assert_eq!(*report.objects_deleted(), 1);

    s.bytes.after_put.release();
    let second = second.await.unwrap().unwrap();

    assert_eq!(second.key, first.key);
    assert!(s.blobs.find(second.id).await.unwrap().is_some());
    assert_eq!(
        s.bytes.get(&second.partition, &second.key).await.unwrap(),
        png_bytes("same")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_derived_artifact_survives_purge_between_put_and_insert() {
    let s = setup();
    let twin = s
        .blobs
        .upload(&local(), THUMBNAIL, Some("twin.png"))
        .await
        .unwrap();
    let source = s.blobs.upload(&local(), &png_bytes("photo"), None).await.unwrap();

    s.bytes.after_put.arm();
    let engine = s.engine.clone();
    let derivation = tokio::spawn(async move {
        let raw: RawOptions = [("resize", "10x10")].into_iter().collect();
        let handle = engine.describe(&source, raw).unwrap();
        let outcome = handle
            .process()
            .await
            .map(|r| (r.reference().clone(), *r.resolution()));
        outcome
    });
    s.bytes.after_put.wait_paused().await;

    s.blobs.purge(twin.id).await.unwrap();

    s.bytes.after_put.release();
    let (reference, resolution) = derivation.await.unwrap().unwrap();

    assert_eq!(resolution, Resolution::Created);
    assert_eq!(reference.key, twin.key);
    assert_eq!(
        s.bytes.get(&reference.partition, &reference.key).await.unwrap(),
        THUMBNAIL
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_purge_restores_content_reused_during_delete() {
    let s = setup();
    let first = s.blobs.upload(&local(), &png_bytes("again"), None).await.unwrap();

    s.bytes.before_delete.arm();
    let blobs = s.blobs.clone();
    let purge = tokio::spawn(async move { blobs.purge(first.id).await });
    s.bytes.before_delete.wait_paused().await;

    // Purge has found the key unused and is about to delete it.
    let second = s.blobs.upload(&local(), &png_bytes("again"), None).await.unwrap();

    s.bytes.before_delete.release();
    let report = purge.await.unwrap().unwrap();

    assert_eq!(*report.objects_deleted(), 0);
    assert_eq!(
        s.bytes.get(&second.partition, &second.key).await.unwrap(),
        png_bytes("again")
    );
}
