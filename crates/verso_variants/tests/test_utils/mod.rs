//! Test utilities for verso_variants tests.
//!
//! Provides stub transformers and an engine wired to in-memory stores.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use verso_core::{Blob, BlobMetadata, Descriptor, MediaKind, MediaType, Partition};
use verso_database::MemoryVariantRepository;
use verso_interface::{TransformFailure, TransformOutput, Transformer};
use verso_storage::MemoryStorage;
use verso_variants::{BlobService, DerivationEngine, EngineConfig, TransformerRegistry};

/// Smallest content sniffed as PNG.
pub fn png_bytes(tag: &str) -> Vec<u8> {
    let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
    data.extend_from_slice(tag.as_bytes());
    data
}

/// Smallest content sniffed as MP4.
pub fn mp4_bytes(tag: &str) -> Vec<u8> {
    let mut data = b"\0\0\0\x18ftypmp42".to_vec();
    data.extend_from_slice(tag.as_bytes());
    data
}

/// Image backend that appends the canonical descriptor to the source bytes.
///
/// Rejects `resize` values that are not `WxH`.
#[derive(Debug, Clone, Default)]
pub struct StubImageTransformer {
    calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl StubImageTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every transform.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared call counter; clones count into the same total.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl Transformer for StubImageTransformer {
    fn name(&self) -> &str {
        "stub_image"
    }

    fn supports(&self, media_type: &MediaType) -> bool {
        media_type.kind() == MediaKind::Image
    }

    async fn transform(
        &self,
        source: &Blob,
        data: &[u8],
        descriptor: &Descriptor,
    ) -> Result<TransformOutput, TransformFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut metadata = BlobMetadata::default();
        if let Some(resize) = descriptor.get_str("resize") {
            let (w, h) = resize
                .split_once('x')
                .and_then(|(w, h)| Some((w.parse().ok()?, h.parse().ok()?)))
                .ok_or_else(|| TransformFailure::new(format!("malformed resize '{resize}'")))?;
            metadata.width = Some(w);
            metadata.height = Some(h);
        }

        let media_type = descriptor
            .get_str("format")
            .map(|format| MediaType::new(format!("image/{format}")))
            .unwrap_or_else(|| source.media_type.clone());

        let mut out = data.to_vec();
        out.extend_from_slice(descriptor.canonical().as_bytes());
        Ok(TransformOutput {
            data: out,
            media_type,
            metadata,
        })
    }
}

/// Video backend documented to double the clip: output duration is twice
/// the source duration.
#[derive(Debug, Clone, Default)]
pub struct DoublingVideoTransformer;

#[async_trait]
impl Transformer for DoublingVideoTransformer {
    fn name(&self) -> &str {
        "doubling_video"
    }

    fn supports(&self, media_type: &MediaType) -> bool {
        media_type.kind() == MediaKind::Video
    }

    async fn transform(
        &self,
        source: &Blob,
        data: &[u8],
        _descriptor: &Descriptor,
    ) -> Result<TransformOutput, TransformFailure> {
        let duration = source
            .metadata
            .duration_seconds
            .ok_or_else(|| TransformFailure::new("source has no duration"))?;
        Ok(TransformOutput {
            data: [data, data].concat(),
            media_type: source.media_type.clone(),
            metadata: BlobMetadata {
                duration_seconds: Some(duration * 2.0),
                ..BlobMetadata::default()
            },
        })
    }
}

/// Backend that accepts everything and then always fails.
#[derive(Debug, Clone, Default)]
pub struct BrokenTransformer;

#[async_trait]
impl Transformer for BrokenTransformer {
    fn name(&self) -> &str {
        "broken"
    }

    fn supports(&self, _media_type: &MediaType) -> bool {
        true
    }

    async fn transform(
        &self,
        _source: &Blob,
        _data: &[u8],
        _descriptor: &Descriptor,
    ) -> Result<TransformOutput, TransformFailure> {
        Err(TransformFailure::new("codec crashed"))
    }
}

/// Engine over in-memory stores, plus handles on those stores.
pub struct Fixture {
    pub repository: Arc<MemoryVariantRepository>,
    pub bytes: Arc<MemoryStorage>,
    pub blobs: BlobService,
    pub engine: DerivationEngine,
}

impl Fixture {
    pub fn new(registry: TransformerRegistry) -> Self {
        Self::with_repository(registry, MemoryVariantRepository::new(), EngineConfig::default())
    }

    pub fn with_repository(
        registry: TransformerRegistry,
        repository: MemoryVariantRepository,
        config: EngineConfig,
    ) -> Self {
        let repository = Arc::new(repository);
        let bytes = Arc::new(MemoryStorage::new());
        let blobs = BlobService::new(repository.clone(), bytes.clone());
        let engine = DerivationEngine::new(config, registry, repository.clone(), bytes.clone());
        Self {
            repository,
            bytes,
            blobs,
            engine,
        }
    }

    /// Upload a PNG source on `partition`.
    pub async fn image(&self, partition: &str, tag: &str) -> Blob {
        self.blobs
            .upload(&Partition::new(partition), &png_bytes(tag), Some("photo.png"))
            .await
            .expect("upload image")
    }

    /// Upload an MP4 source of the given duration on `partition`.
    pub async fn video(&self, partition: &str, duration_seconds: f64) -> Blob {
        let metadata = BlobMetadata {
            filename: Some("clip.mp4".to_string()),
            duration_seconds: Some(duration_seconds),
            ..BlobMetadata::default()
        };
        self.blobs
            .upload_with_metadata(&Partition::new(partition), &mp4_bytes("clip"), metadata)
            .await
            .expect("upload video")
    }
}
