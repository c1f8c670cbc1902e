//! The derivation engine.

use crate::{
    BatchPreloader, EngineConfig, PreloadedVariants, ResolvedVariant, Resolution,
    TransformerRegistry, VariantHandle, VariantStore,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use verso_core::{Blob, Descriptor, RawOptions, Variant};
use verso_error::{DerivationError, DerivationErrorKind, VersoError, VersoErrorKind, VersoResult};
use verso_interface::VariantRepository;
use verso_storage::ByteStore;

struct EngineInner {
    config: EngineConfig,
    store: VariantStore,
    bytes: Arc<dyn ByteStore>,
    registry: RwLock<Arc<TransformerRegistry>>,
}

/// Derives variants of sources and caches them in the variant index.
///
/// Cheap to clone; clones share the registry, the stores and the config.
///
/// Resolving a handle walks these steps:
/// 1. look the `(source, digest)` pair up in the index; a hit is returned
///    as-is and no transformer runs
/// 2. on a miss, snapshot the registry and pick the first backend that
///    supports the source's media type
/// 3. read the source bytes and transform them
/// 4. write the derived bytes to the source's partition
/// 5. insert the artifact row and record together, adopting a concurrent
///    winner's record on conflict
///
/// Bytes are always written before the record, and checked again once the
/// record is committed, so a record never points at missing bytes. Only [`DerivationErrorKind`] failures (and descriptor
/// rejections from [`describe`](Self::describe)) leave the engine.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use verso_core::{Blob, RawOptions};
/// use verso_database::MemoryVariantRepository;
/// use verso_storage::MemoryStorage;
/// use verso_variants::{DerivationEngine, EngineConfig, TransformerRegistry};
///
/// # async fn example(source: Blob) -> Result<(), Box<dyn std::error::Error>> {
/// let engine = DerivationEngine::new(
///     EngineConfig::default(),
///     TransformerRegistry::new(),
///     Arc::new(MemoryVariantRepository::new()),
///     Arc::new(MemoryStorage::new()),
/// );
///
/// let raw: RawOptions = [("resize", "100x100")].into_iter().collect();
/// let handle = engine.describe(&source, raw)?;
/// let resolved = handle.process().await?;
/// println!("{}", resolved.reference().key);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DerivationEngine {
    inner: Arc<EngineInner>,
}

impl DerivationEngine {
    /// Assemble an engine from its collaborators.
    pub fn new(
        config: EngineConfig,
        registry: TransformerRegistry,
        repository: Arc<dyn VariantRepository>,
        bytes: Arc<dyn ByteStore>,
    ) -> Self {
        tracing::info!(
            transformers = ?registry.names(),
            byte_store = bytes.backend_name(),
            batch_size = config.batch_size(),
            strict = config.policy().strict,
            "Created derivation engine"
        );
        let store = VariantStore::new(repository, *config.batch_size());
        Self {
            inner: Arc::new(EngineInner {
                config,
                store,
                bytes,
                registry: RwLock::new(Arc::new(registry)),
            }),
        }
    }

    /// Engine settings.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// The variant index this engine reads and writes.
    pub fn store(&self) -> &VariantStore {
        &self.inner.store
    }

    /// The byte store artifacts are written to.
    pub fn bytes(&self) -> &Arc<dyn ByteStore> {
        &self.inner.bytes
    }

    /// The registry new derivations will select from.
    pub async fn registry(&self) -> Arc<TransformerRegistry> {
        self.inner.registry.read().await.clone()
    }

    /// Swap in a new registry.
    ///
    /// Derivations that already selected a backend finish with it.
    pub async fn replace_registry(&self, registry: TransformerRegistry) {
        tracing::info!(transformers = ?registry.names(), "Replacing transformer registry");
        *self.inner.registry.write().await = Arc::new(registry);
    }

    /// Normalise `raw` and prepare a handle for `source`. Performs no I/O.
    ///
    /// # Errors
    ///
    /// Returns a descriptor error when the options are rejected.
    pub fn describe(&self, source: &Blob, raw: RawOptions) -> VersoResult<VariantHandle> {
        let descriptor = Descriptor::normalize(raw, self.inner.config.policy())?;
        Ok(self.variant(source, descriptor))
    }

    /// Prepare a handle for an already normalised descriptor.
    pub fn variant(&self, source: &Blob, descriptor: Descriptor) -> VariantHandle {
        VariantHandle::new(self.clone(), source.clone(), descriptor)
    }

    /// Fetch the variants of `sources` for one set of options in one batch.
    ///
    /// Misses are not derived; their handles resolve normally later.
    pub async fn preload_variants(
        &self,
        sources: &[Blob],
        raw: RawOptions,
    ) -> VersoResult<PreloadedVariants> {
        let descriptor = Descriptor::normalize(raw, self.inner.config.policy())?;
        BatchPreloader::new(self.clone())
            .preload(sources, descriptor)
            .await
            .map_err(store_unavailable)
    }

    #[tracing::instrument(skip_all, fields(source_id = %source.id, digest = %descriptor.digest().short()))]
    pub(crate) async fn resolve(
        &self,
        source: &Blob,
        descriptor: &Descriptor,
    ) -> VersoResult<ResolvedVariant> {
        let mut derived: Option<Vec<u8>> = None;
        let slot = &mut derived;
        let (variant, resolution) = self
            .inner
            .store
            .find_or_create(source.id, descriptor.digest(), || async move {
                let (variant, data) = self.derive(source, descriptor).await?;
                *slot = Some(data);
                Ok(variant)
            })
            .await
            .map_err(store_unavailable)?;

        // The key may have been reclaimed by a purge before our record existed.
        if resolution == Resolution::Created
            && let Some(data) = derived
        {
            let artifact = &variant.artifact;
            self.inner
                .bytes
                .restore(&artifact.partition, &artifact.key, &data, &artifact.media_type)
                .await
                .map_err(store_unavailable)?;
        }

        tracing::debug!(%resolution, artifact_id = %variant.artifact.id, "Resolved variant");
        Ok(ResolvedVariant::new(variant, resolution))
    }

    async fn derive(
        &self,
        source: &Blob,
        descriptor: &Descriptor,
    ) -> VersoResult<(Variant, Vec<u8>)> {
        let backend = self.registry().await.select(&source.media_type)?;
        tracing::debug!(transformer = backend.name(), "Selected transformer");

        let data = self.inner.bytes.get(&source.partition, &source.key).await?;
        let output = backend
            .transform(source, &data, descriptor)
            .await
            .map_err(|failure| {
                tracing::warn!(transformer = backend.name(), detail = %failure, "Transformation failed");
                DerivationError::new(DerivationErrorKind::Transformation {
                    transformer: backend.name().to_string(),
                    detail: failure.detail,
                })
            })?;

        // Artifacts live wherever their source lives.
        let stored = self
            .inner
            .bytes
            .put(&source.partition, &output.data, &output.media_type)
            .await?;

        let artifact = Blob {
            id: Uuid::new_v4(),
            key: stored.key,
            partition: source.partition.clone(),
            media_type: output.media_type,
            byte_size: stored.byte_size,
            checksum: stored.checksum,
            metadata: output.metadata,
            created_at: Utc::now(),
        };
        Ok((
            Variant::new(source.id, descriptor.digest().clone(), artifact),
            output.data,
        ))
    }
}

impl std::fmt::Debug for DerivationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivationEngine")
            .field("config", &self.inner.config)
            .field("store", &self.inner.store)
            .field("byte_store", &self.inner.bytes.backend_name())
            .finish_non_exhaustive()
    }
}

/// Report byte store and metadata store failures as `StoreUnavailable`.
fn store_unavailable(err: VersoError) -> VersoError {
    match err.kind() {
        VersoErrorKind::Storage(_) | VersoErrorKind::Database(_) => {
            tracing::error!(error = %err, "Store unavailable during derivation");
            DerivationError::new(DerivationErrorKind::StoreUnavailable(err.to_string())).into()
        }
        _ => err,
    }
}

