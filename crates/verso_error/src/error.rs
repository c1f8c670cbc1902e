//! Top-level error wrapper types.

use crate::{
    ConfigError, DatabaseError, DerivationError, DescriptorError, JsonError, StorageError,
};

/// Every error condition a verso crate can report.
///
/// # Examples
///
/// ```
/// use verso_error::{VersoError, StorageError, StorageErrorKind};
///
/// let err: VersoError = StorageError::new(StorageErrorKind::NotFound("abc".into())).into();
/// assert!(format!("{}", err).contains("Storage Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum VersoErrorKind {
    /// Byte store error
    #[from(StorageError)]
    Storage(StorageError),
    /// Metadata store error
    #[from(DatabaseError)]
    Database(DatabaseError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Rejected transformation options
    #[from(DescriptorError)]
    Descriptor(DescriptorError),
    /// Failed derivation
    #[from(DerivationError)]
    Derivation(DerivationError),
    /// JSON encoding or decoding failure
    #[from(JsonError)]
    Json(JsonError),
}

impl From<serde_json::Error> for VersoErrorKind {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        VersoErrorKind::Json(JsonError::from(err))
    }
}

/// Verso error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Verso Error: {}", _0)]
pub struct VersoError(Box<VersoErrorKind>);

impl VersoError {
    /// Create a new error from a kind.
    pub fn new(kind: VersoErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &VersoErrorKind {
        &self.0
    }

    /// The derivation failure carried by this error, if any.
    pub fn derivation(&self) -> Option<&DerivationError> {
        match self.kind() {
            VersoErrorKind::Derivation(e) => Some(e),
            _ => None,
        }
    }

    /// Whether a caller may safely retry the operation that produced this error.
    ///
    /// Derivation is idempotent, so transient store failures are retryable;
    /// everything else will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self.kind() {
            VersoErrorKind::Derivation(e) => e.is_retryable(),
            VersoErrorKind::Storage(_) | VersoErrorKind::Database(_) => true,
            _ => false,
        }
    }
}

// Generic From implementation for any type that converts to VersoErrorKind
impl<T> From<T> for VersoError
where
    T: Into<VersoErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for verso operations.
pub type VersoResult<T> = std::result::Result<T, VersoError>;
