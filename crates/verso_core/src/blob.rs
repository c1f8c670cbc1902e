//! Immutable binary objects.

use crate::{MediaType, Partition};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Descriptive metadata stored alongside a blob.
///
/// Note: Does not derive `Eq` or `Hash` due to the `f64` duration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlobMetadata {
    /// Original filename (if available)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Image/video width in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Image/video height in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Audio/video duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

/// An immutable binary object and where its bytes live.
///
/// Sources and artifacts share this shape: an artifact is simply a blob
/// that some variant record points at, and may itself be the source of
/// further derivations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blob {
    /// Stable identity
    pub id: Uuid,
    /// Byte store key the content is filed under
    pub key: String,
    /// Partition holding the bytes
    pub partition: Partition,
    /// Declared media type
    pub media_type: MediaType,
    /// Size of the content in bytes
    pub byte_size: i64,
    /// SHA-256 of the content, hex encoded
    pub checksum: String,
    /// Descriptive metadata
    #[serde(default)]
    pub metadata: BlobMetadata,
    /// When the blob was recorded
    pub created_at: DateTime<Utc>,
}
