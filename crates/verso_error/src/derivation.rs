//! Derivation failures surfaced by the engine.

/// Ways a derivation can fail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum DerivationErrorKind {
    /// No registered transformer supports the source's media type
    #[display("Cannot transform media of type {}", _0)]
    Invariable(String),
    /// A transformer accepted the media type but failed on this descriptor
    #[display("Transformer '{}' failed: {}", transformer, detail)]
    Transformation {
        /// Name of the transformer that failed
        transformer: String,
        /// Diagnostic detail from the backend
        detail: String,
    },
    /// The byte store or metadata store could not be reached
    #[display("Store unavailable: {}", _0)]
    StoreUnavailable(String),
}

/// Derivation error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Derivation Error: {} at line {} in {}", kind, line, file)]
pub struct DerivationError {
    kind: DerivationErrorKind,
    line: u32,
    file: &'static str,
}

impl DerivationError {
    /// Create a new derivation error with caller location tracking.
    #[track_caller]
    pub fn new(kind: DerivationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &DerivationErrorKind {
        &self.kind
    }

    /// Only store outages are transient.
    ///
    /// # Examples
    ///
    /// ```
    /// use verso_error::{DerivationError, DerivationErrorKind};
    ///
    /// let err = DerivationError::new(DerivationErrorKind::StoreUnavailable("timeout".into()));
    /// assert!(err.is_retryable());
    ///
    /// let err = DerivationError::new(DerivationErrorKind::Invariable("video/mp4".into()));
    /// assert!(!err.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, DerivationErrorKind::StoreUnavailable(_))
    }
}
