//! Configuration and startup error types.

/// What went wrong while assembling verso's settings.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ConfigErrorKind {
    /// A configuration source could not be read or merged
    #[display("Cannot load configuration from {}: {}", origin, detail)]
    Unreadable {
        /// File path or layer name
        origin: String,
        /// Parser or I/O message
        detail: String,
    },
    /// A setting has the wrong type or shape
    #[display("Invalid configuration: {}", _0)]
    Invalid(String),
    /// `[logging] level` is not a filter directive
    #[display("Invalid log level '{}': {}", level, detail)]
    LogLevel {
        /// The rejected directive
        level: String,
        /// Why it was rejected
        detail: String,
    },
    /// A global subscriber was already installed
    #[display("Logging already initialised: {}", _0)]
    LoggingInstalled(String),
    /// Neither `[database] url` nor `DATABASE_URL` is set
    #[display("No database URL: set [database] url or DATABASE_URL")]
    MissingDatabaseUrl,
}

/// Configuration error with source location.
///
/// # Examples
///
/// ```
/// use verso_error::{ConfigError, ConfigErrorKind};
///
/// let err = ConfigError::new(ConfigErrorKind::Invalid("store.batch_size".into()));
/// assert!(err.to_string().contains("store.batch_size"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", kind, line, file)]
pub struct ConfigError {
    /// The kind of error that occurred
    pub kind: ConfigErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ConfigError {
    /// Wrap `kind` with the caller's location.
    #[track_caller]
    pub fn new(kind: ConfigErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
