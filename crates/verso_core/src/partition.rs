//! Storage partitions.

use serde::{Deserialize, Serialize};

/// Logical storage location ("service") a blob's bytes live on.
///
/// Artifacts always inherit the partition of the source they were derived
/// from, so storage-location policy is decided once at upload time.
///
/// # Examples
///
/// ```
/// use verso_core::Partition;
///
/// let partition = Partition::new("local_public");
/// assert_eq!(partition.as_str(), "local_public");
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct Partition(String);

impl Partition {
    /// Create a partition name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The partition name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Partition {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl AsRef<str> for Partition {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
