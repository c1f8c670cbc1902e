//! Variant records and artifact references.

use crate::{Blob, DescriptorDigest, MediaType, Partition};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persistent mapping from `(source, descriptor digest)` to an artifact.
///
/// At most one record exists per `(source_id, descriptor_digest)`. Records
/// are never updated; they disappear only with their source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantRecord {
    /// Row identity
    pub id: Uuid,
    /// Blob the artifact was derived from
    pub source_id: Uuid,
    /// Digest of the descriptor that produced the artifact
    pub descriptor_digest: DescriptorDigest,
    /// Blob holding the derived content
    pub artifact_id: Uuid,
    /// When the derivation was first recorded
    pub created_at: DateTime<Utc>,
}

/// A variant record together with the artifact blob it points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    /// The index row
    pub record: VariantRecord,
    /// The derived blob
    pub artifact: Blob,
}

impl Variant {
    /// Pair a freshly stored artifact with a new record for `source_id`.
    pub fn new(source_id: Uuid, descriptor_digest: DescriptorDigest, artifact: Blob) -> Self {
        Self {
            record: VariantRecord {
                id: Uuid::new_v4(),
                source_id,
                descriptor_digest,
                artifact_id: artifact.id,
                created_at: Utc::now(),
            },
            artifact,
        }
    }

    /// Where the derived bytes live and what they are.
    pub fn reference(&self) -> ArtifactRef {
        ArtifactRef::from(&self.artifact)
    }
}

/// Location and media type of derived content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Artifact blob id
    pub blob_id: Uuid,
    /// Partition holding the bytes
    pub partition: Partition,
    /// Byte store key
    pub key: String,
    /// Media type of the derived content
    pub media_type: MediaType,
    /// SHA-256 of the derived content
    pub checksum: String,
    /// Size in bytes
    pub byte_size: i64,
}

impl From<&Blob> for ArtifactRef {
    fn from(blob: &Blob) -> Self {
        Self {
            blob_id: blob.id,
            partition: blob.partition.clone(),
            key: blob.key.clone(),
            media_type: blob.media_type.clone(),
            checksum: blob.checksum.clone(),
            byte_size: blob.byte_size,
        }
    }
}

impl ArtifactRef {
    /// Whether two references name the same bytes, regardless of blob id.
    pub fn same_content(&self, other: &ArtifactRef) -> bool {
        self.checksum == other.checksum && self.media_type == other.media_type
    }
}
