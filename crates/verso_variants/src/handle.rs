//! Lazy variant handles.

use crate::{DerivationEngine, Resolution};
use derive_getters::Getters;
use tokio::sync::OnceCell;
use verso_core::{ArtifactRef, Blob, Descriptor, DescriptorDigest, Variant};
use verso_error::VersoResult;

/// The outcome of a successful derivation.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct ResolvedVariant {
    /// Index record and artifact blob
    variant: Variant,
    /// Where the derived bytes live
    reference: ArtifactRef,
    /// Whether the variant was found, created, or adopted from a concurrent writer
    resolution: Resolution,
}

impl ResolvedVariant {
    pub(crate) fn new(variant: Variant, resolution: Resolution) -> Self {
        Self {
            reference: variant.reference(),
            variant,
            resolution,
        }
    }
}

/// A described but not necessarily resolved variant of one source.
///
/// Building a handle does no I/O. [`process`](Self::process) resolves it
/// once; later calls return the same result. Failures are not memoised, so
/// a failed handle may be processed again.
pub struct VariantHandle {
    engine: DerivationEngine,
    source: Blob,
    descriptor: Descriptor,
    resolved: OnceCell<ResolvedVariant>,
}

impl VariantHandle {
    pub(crate) fn new(engine: DerivationEngine, source: Blob, descriptor: Descriptor) -> Self {
        Self {
            engine,
            source,
            descriptor,
            resolved: OnceCell::new(),
        }
    }

    pub(crate) fn preloaded(
        engine: DerivationEngine,
        source: Blob,
        descriptor: Descriptor,
        variant: Variant,
    ) -> Self {
        Self {
            engine,
            source,
            descriptor,
            resolved: OnceCell::new_with(Some(ResolvedVariant::new(variant, Resolution::Hit))),
        }
    }

    /// Resolve the variant, deriving it if the index has none.
    ///
    /// # Errors
    ///
    /// Returns a derivation error: `Invariable`, `Transformation` or
    /// `StoreUnavailable`.
    pub async fn process(&self) -> VersoResult<&ResolvedVariant> {
        self.resolved
            .get_or_try_init(|| self.engine.resolve(&self.source, &self.descriptor))
            .await
    }

    /// Artifact location, once resolved.
    pub fn reference(&self) -> Option<&ArtifactRef> {
        self.resolved.get().map(ResolvedVariant::reference)
    }

    /// Whether the handle already holds a resolved variant.
    pub fn is_processed(&self) -> bool {
        self.resolved.initialized()
    }

    /// The source this handle derives from.
    pub fn source(&self) -> &Blob {
        &self.source
    }

    /// The normalised request.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Cache identity of the request.
    pub fn digest(&self) -> &DescriptorDigest {
        self.descriptor.digest()
    }
}

impl std::fmt::Debug for VariantHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariantHandle")
            .field("source_id", &self.source.id)
            .field("descriptor", self.descriptor.canonical())
            .field("resolved", &self.resolved.get())
            .finish()
    }
}
