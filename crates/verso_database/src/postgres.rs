//! PostgreSQL implementation of VariantRepository.

use crate::connection::PgPool;
use crate::models::{BlobRow, VariantRecordRow, variant_from_rows};
use crate::schema::{blobs, variant_records};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;
use verso_core::{Blob, DescriptorDigest, Partition, Variant};
use verso_error::{DatabaseError, DatabaseErrorKind, VersoResult};
use verso_interface::{InsertOutcome, VariantRepository};

/// PostgreSQL variant index using Diesel ORM.
///
/// Uniqueness of `(source_id, descriptor_digest)` is enforced by the
/// `variant_records_source_digest_key` constraint, so any number of
/// processes may share one database. Diesel is synchronous; every call runs
/// on the blocking thread pool with a pooled connection.
///
/// # Example
/// ```no_run
/// use verso_database::{PgVariantRepository, create_pool};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool("postgres://localhost/verso", 8)?;
/// let repo = PgVariantRepository::new(pool);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PgVariantRepository {
    pool: PgPool,
}

impl PgVariantRepository {
    /// Create a repository over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn with_conn<F, T>(&self, f: F) -> VersoResult<T>
    where
        F: FnOnce(&mut PgConnection) -> VersoResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| DatabaseError::new(DatabaseErrorKind::Connection(e.to_string())))?;
            f(&mut *conn)
        })
        .await
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Query(e.to_string())))?
    }
}

fn joined_rows(
    rows: Vec<(VariantRecordRow, BlobRow)>,
) -> Result<Vec<Variant>, DatabaseError> {
    rows.into_iter().map(variant_from_rows).collect()
}

#[async_trait]
impl VariantRepository for PgVariantRepository {
    #[tracing::instrument(skip(self, blob), fields(blob_id = %blob.id))]
    async fn insert_blob(&self, blob: &Blob) -> VersoResult<()> {
        let row = BlobRow::try_from(blob)?;
        self.with_conn(move |conn| {
            diesel::insert_into(blobs::table)
                .values(&row)
                .execute(conn)
                .map_err(DatabaseError::from)?;
            Ok(())
        })
        .await
    }

    async fn find_blob(&self, id: Uuid) -> VersoResult<Option<Blob>> {
        self.with_conn(move |conn| {
            let row = blobs::table
                .find(id)
                .select(BlobRow::as_select())
                .first::<BlobRow>(conn)
                .optional()
                .map_err(DatabaseError::from)?;
            Ok(row.map(Blob::try_from).transpose()?)
        })
        .await
    }

    #[tracing::instrument(skip(self, digest), fields(digest = %digest.short()))]
    async fn find_variant(
        &self,
        source_id: Uuid,
        digest: &DescriptorDigest,
    ) -> VersoResult<Option<Variant>> {
        let digest = digest.to_string();
        self.with_conn(move |conn| {
            let row = variant_records::table
                .inner_join(blobs::table)
                .filter(variant_records::source_id.eq(source_id))
                .filter(variant_records::descriptor_digest.eq(digest))
                .select((VariantRecordRow::as_select(), BlobRow::as_select()))
                .first::<(VariantRecordRow, BlobRow)>(conn)
                .optional()
                .map_err(DatabaseError::from)?;
            Ok(row.map(variant_from_rows).transpose()?)
        })
        .await
    }

    #[tracing::instrument(skip(self, source_ids, digest), fields(sources = source_ids.len(), digest = %digest.short()))]
    async fn find_variants(
        &self,
        source_ids: &[Uuid],
        digest: &DescriptorDigest,
    ) -> VersoResult<Vec<Variant>> {
        let source_ids = source_ids.to_vec();
        let digest = digest.to_string();
        self.with_conn(move |conn| {
            let rows = variant_records::table
                .inner_join(blobs::table)
                .filter(variant_records::source_id.eq_any(source_ids))
                .filter(variant_records::descriptor_digest.eq(digest))
                .select((VariantRecordRow::as_select(), BlobRow::as_select()))
                .load::<(VariantRecordRow, BlobRow)>(conn)
                .map_err(DatabaseError::from)?;
            Ok(joined_rows(rows)?)
        })
        .await
    }

    #[tracing::instrument(skip(self, variant), fields(source_id = %variant.record.source_id, digest = %variant.record.descriptor_digest.short()))]
    async fn insert_variant(&self, variant: &Variant) -> VersoResult<InsertOutcome> {
        let artifact = BlobRow::try_from(&variant.artifact)?;
        let record = VariantRecordRow::from(&variant.record);
        self.with_conn(move |conn| {
            // The artifact row and the record commit together; losing the
            // race on the unique index rolls the artifact row back as well.
            let result = conn.transaction::<_, diesel::result::Error, _>(|conn| {
                diesel::insert_into(blobs::table)
                    .values(&artifact)
                    .execute(conn)?;
                let inserted = diesel::insert_into(variant_records::table)
                    .values(&record)
                    .on_conflict((
                        variant_records::source_id,
                        variant_records::descriptor_digest,
                    ))
                    .do_nothing()
                    .execute(conn)?;
                if inserted == 0 {
                    return Err(diesel::result::Error::RollbackTransaction);
                }
                Ok(())
            });

            match result {
                Ok(()) => Ok(InsertOutcome::Inserted),
                Err(diesel::result::Error::RollbackTransaction) => Ok(InsertOutcome::Conflict),
                Err(e) => Err(DatabaseError::from(e).into()),
            }
        })
        .await
    }

    async fn variants_for(&self, source_id: Uuid) -> VersoResult<Vec<Variant>> {
        self.with_conn(move |conn| {
            let rows = variant_records::table
                .inner_join(blobs::table)
                .filter(variant_records::source_id.eq(source_id))
                .order(variant_records::created_at.asc())
                .select((VariantRecordRow::as_select(), BlobRow::as_select()))
                .load::<(VariantRecordRow, BlobRow)>(conn)
                .map_err(DatabaseError::from)?;
            Ok(joined_rows(rows)?)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_source(&self, source_id: Uuid) -> VersoResult<Vec<Blob>> {
        self.with_conn(move |conn| {
            let removed = conn
                .transaction::<_, diesel::result::Error, _>(|conn| {
                    // Artifacts may themselves be sources; collect every level.
                    let mut artifact_ids: Vec<Uuid> = Vec::new();
                    let mut frontier = vec![source_id];
                    while !frontier.is_empty() {
                        let next: Vec<Uuid> = variant_records::table
                            .filter(variant_records::source_id.eq_any(frontier))
                            .select(variant_records::artifact_id)
                            .load(conn)?;
                        artifact_ids.extend_from_slice(&next);
                        frontier = next;
                    }

                    // Variant records go with the source via ON DELETE CASCADE.
                    let deleted = diesel::delete(blobs::table.find(source_id)).execute(conn)?;
                    if deleted == 0 {
                        return Err(diesel::result::Error::NotFound);
                    }

                    diesel::delete(blobs::table.filter(blobs::id.eq_any(artifact_ids)))
                        .returning(BlobRow::as_returning())
                        .get_results::<BlobRow>(conn)
                })
                .map_err(DatabaseError::from)?;

            let removed = removed
                .into_iter()
                .map(Blob::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            tracing::info!(artifacts = removed.len(), "Deleted source and its derived artifacts");
            Ok(removed)
        })
        .await
    }

    async fn key_in_use(&self, partition: &Partition, key: &str) -> VersoResult<bool> {
        let partition = partition.to_string();
        let key = key.to_string();
        self.with_conn(move |conn| {
            let in_use = diesel::select(diesel::dsl::exists(
                blobs::table
                    .filter(blobs::partition_name.eq(partition))
                    .filter(blobs::storage_key.eq(key)),
            ))
            .get_result::<bool>(conn)
            .map_err(DatabaseError::from)?;
            Ok(in_use)
        })
        .await
    }
}
