//! Transformation option errors.

/// Reasons a set of raw options cannot become a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum DescriptorErrorKind {
    /// Option name is not accepted in strict mode
    #[display("Unknown option: {}", _0)]
    UnknownOption(String),
    /// Option name is empty or whitespace
    #[display("Option names must not be blank")]
    BlankOption,
    /// Option value cannot be represented canonically
    #[display("Invalid value for '{}': {}", option, reason)]
    InvalidValue {
        /// The option name
        option: String,
        /// Why the value was rejected
        reason: String,
    },
}

/// Descriptor error with location tracking.
///
/// # Examples
///
/// ```
/// use verso_error::{DescriptorError, DescriptorErrorKind};
///
/// let err = DescriptorError::new(DescriptorErrorKind::UnknownOption("rotate".into()));
/// assert_eq!(err.kind(), &DescriptorErrorKind::UnknownOption("rotate".into()));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Descriptor Error: {} at line {} in {}", kind, line, file)]
pub struct DescriptorError {
    kind: DescriptorErrorKind,
    line: u32,
    file: &'static str,
}

impl DescriptorError {
    /// Create a new descriptor error with caller location tracking.
    #[track_caller]
    pub fn new(kind: DescriptorErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &DescriptorErrorKind {
        &self.kind
    }
}
