//! Transformation backends.

use async_trait::async_trait;
use verso_core::{Blob, BlobMetadata, Descriptor, MediaType};

/// Derived content produced by a transformer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    /// The derived bytes
    pub data: Vec<u8>,
    /// Media type of the derived bytes
    pub media_type: MediaType,
    /// Dimensions/duration of the derived content, when known
    pub metadata: BlobMetadata,
}

/// A transformer's refusal or failure for one specific descriptor.
///
/// # Examples
///
/// ```
/// use verso_interface::TransformFailure;
///
/// let failure = TransformFailure::new("unsupported filter 'sepia'");
/// assert_eq!(failure.to_string(), "unsupported filter 'sepia'");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("{}", detail)]
pub struct TransformFailure {
    /// Backend diagnostic
    pub detail: String,
}

impl TransformFailure {
    /// Wrap a backend diagnostic.
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// A pluggable transformation backend.
///
/// Transformation is expensive (CPU-bound or shelling out to a codec).
/// Implementations that block should move the work onto
/// `tokio::task::spawn_blocking`; the engine never holds a lock while a
/// transformer runs.
#[async_trait]
pub trait Transformer: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Whether this backend can transform media of `media_type` at all.
    fn supports(&self, media_type: &MediaType) -> bool;

    /// Derive new content from `data`, the bytes of `source`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransformFailure`] when this descriptor cannot be applied
    /// (bad parameters, backend crash).
    async fn transform(
        &self,
        source: &Blob,
        data: &[u8],
        descriptor: &Descriptor,
    ) -> Result<TransformOutput, TransformFailure>;
}
