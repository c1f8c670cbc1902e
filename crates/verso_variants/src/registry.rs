//! Ordered transformer selection.

use std::fmt;
use std::sync::Arc;
use verso_core::MediaType;
use verso_error::{DerivationError, DerivationErrorKind};
use verso_interface::Transformer;

/// Ordered list of transformation backends.
///
/// The first backend whose `supports` accepts a media type handles it.
/// A registry is immutable once handed to an engine; to change backends,
/// build a new registry and swap it in whole with
/// [`DerivationEngine::replace_registry`](crate::DerivationEngine::replace_registry).
#[derive(Clone, Default)]
pub struct TransformerRegistry {
    backends: Vec<Arc<dyn Transformer>>,
}

impl TransformerRegistry {
    /// Create an empty registry. Every derivation against it is invariable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a backend, returning the registry for chaining.
    pub fn with(mut self, backend: impl Transformer + 'static) -> Self {
        self.register(Arc::new(backend));
        self
    }

    /// Append a backend after those already registered.
    pub fn register(&mut self, backend: Arc<dyn Transformer>) {
        tracing::debug!(
            transformer = backend.name(),
            position = self.backends.len(),
            "Registered transformer"
        );
        self.backends.push(backend);
    }

    /// Number of registered backends.
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Whether no backend is registered.
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Backend names in selection order.
    pub fn names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Pick the first backend that supports `media_type`.
    ///
    /// # Errors
    ///
    /// Returns [`DerivationErrorKind::Invariable`] when no backend supports it.
    pub fn select(&self, media_type: &MediaType) -> Result<Arc<dyn Transformer>, DerivationError> {
        self.backends
            .iter()
            .find(|backend| backend.supports(media_type))
            .cloned()
            .ok_or_else(|| {
                DerivationError::new(DerivationErrorKind::Invariable(media_type.to_string()))
            })
    }
}

impl fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformerRegistry")
            .field("backends", &self.names())
            .finish()
    }
}
