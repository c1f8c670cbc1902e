//! Byte store error types.

/// Kinds of storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Partition directory could not be created
    #[display("Cannot create partition directory: {}", _0)]
    DirectoryCreation(String),
    /// Object bytes could not be written
    #[display("Cannot write object: {}", _0)]
    FileWrite(String),
    /// Object bytes could not be read
    #[display("Cannot read object: {}", _0)]
    FileRead(String),
    /// Content not found under the given key
    #[display("Content not found: {}", _0)]
    NotFound(String),
    /// Stored bytes no longer match their key
    #[display("Checksum mismatch: expected {}, got {}", expected, actual)]
    ChecksumMismatch {
        /// Checksum recorded at write time
        expected: String,
        /// Checksum of the bytes that were read
        actual: String,
    },
    /// Partition is not provisioned on this store
    #[display("Unknown partition: {}", _0)]
    UnknownPartition(String),
    /// Key is not a valid content key
    #[display("Invalid storage key: {}", _0)]
    InvalidKey(String),
}

/// Byte store failure, tagged with the place it was raised.
///
/// # Examples
///
/// ```
/// use verso_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::NotFound("ab/cd/abcd".to_string()));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Records the caller's location alongside `kind`.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
