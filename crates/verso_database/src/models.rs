//! Row types for the variant index tables.

use crate::schema::{blobs, variant_records};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value as JsonValue;
use uuid::Uuid;
use verso_core::{Blob, DescriptorDigest, MediaType, Partition, Variant, VariantRecord};
use verso_error::{DatabaseError, DatabaseErrorKind};

/// Database row for a blob.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = blobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BlobRow {
    /// Blob id
    pub id: Uuid,
    /// Byte store key
    pub storage_key: String,
    /// Partition name
    pub partition_name: String,
    /// MIME type
    pub media_type: String,
    /// Size in bytes
    pub byte_size: i64,
    /// SHA-256 of the content
    pub checksum: String,
    /// Serialized `BlobMetadata`
    pub metadata: JsonValue,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Database row for a variant record.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = variant_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VariantRecordRow {
    /// Record id
    pub id: Uuid,
    /// Source blob id
    pub source_id: Uuid,
    /// Hex descriptor digest
    pub descriptor_digest: String,
    /// Artifact blob id
    pub artifact_id: Uuid,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&Blob> for BlobRow {
    type Error = DatabaseError;

    fn try_from(blob: &Blob) -> Result<Self, Self::Error> {
        Ok(Self {
            id: blob.id,
            storage_key: blob.key.clone(),
            partition_name: blob.partition.to_string(),
            media_type: blob.media_type.to_string(),
            byte_size: blob.byte_size,
            checksum: blob.checksum.clone(),
            metadata: serde_json::to_value(&blob.metadata)?,
            created_at: blob.created_at,
        })
    }
}

impl TryFrom<BlobRow> for Blob {
    type Error = DatabaseError;

    fn try_from(row: BlobRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            key: row.storage_key,
            partition: Partition::new(row.partition_name),
            media_type: MediaType::new(row.media_type),
            byte_size: row.byte_size,
            checksum: row.checksum,
            metadata: serde_json::from_value(row.metadata)?,
            created_at: row.created_at,
        })
    }
}

impl From<&VariantRecord> for VariantRecordRow {
    fn from(record: &VariantRecord) -> Self {
        Self {
            id: record.id,
            source_id: record.source_id,
            descriptor_digest: record.descriptor_digest.to_string(),
            artifact_id: record.artifact_id,
            created_at: record.created_at,
        }
    }
}

impl TryFrom<VariantRecordRow> for VariantRecord {
    type Error = DatabaseError;

    fn try_from(row: VariantRecordRow) -> Result<Self, Self::Error> {
        let descriptor_digest = DescriptorDigest::from_hex(row.descriptor_digest.clone())
            .ok_or_else(|| {
                DatabaseError::new(DatabaseErrorKind::Serialization(format!(
                    "malformed descriptor digest '{}' on variant {}",
                    row.descriptor_digest, row.id
                )))
            })?;
        Ok(Self {
            id: row.id,
            source_id: row.source_id,
            descriptor_digest,
            artifact_id: row.artifact_id,
            created_at: row.created_at,
        })
    }
}

/// Convert a joined `(record, artifact)` row pair.
pub(crate) fn variant_from_rows(
    (record, artifact): (VariantRecordRow, BlobRow),
) -> Result<Variant, DatabaseError> {
    Ok(Variant {
        record: record.try_into()?,
        artifact: artifact.try_into()?,
    })
}
