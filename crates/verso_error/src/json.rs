//! Failures rendering values as JSON output.

/// A value could not be encoded or decoded as JSON.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("JSON Error: {} at line {} in {}", detail, line, file)]
pub struct JsonError {
    /// Message from `serde_json`
    pub detail: String,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl JsonError {
    /// Record `detail` at the caller's location.
    #[track_caller]
    pub fn new(detail: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            detail: detail.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}

impl From<serde_json::Error> for JsonError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}
