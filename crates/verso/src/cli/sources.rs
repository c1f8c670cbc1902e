//! Source management command handlers.

use super::commands::SourceCommands;
use verso::{VersoConfig, VersoResult};

/// Handle source management commands.
#[cfg(feature = "postgres")]
pub async fn handle_source_command(config: &VersoConfig, cmd: SourceCommands) -> VersoResult<()> {
    use super::commands::OutputFormat;
    use verso::{Partition, StorageError, StorageErrorKind};

    let blobs = connect(config)?;

    match cmd {
        SourceCommands::Upload { file, partition } => {
            let data = tokio::fs::read(&file).await.map_err(|e| {
                StorageError::new(StorageErrorKind::FileRead(format!("{}: {}", file.display(), e)))
            })?;
            let partition = partition
                .map(Partition::new)
                .unwrap_or_else(|| config.storage.default_partition());
            let filename = file.file_name().and_then(|name| name.to_str());

            let blob = blobs.upload(&partition, &data, filename).await?;
            println!("{}", blob.id);
            println!("  Partition:  {}", blob.partition);
            println!("  Media type: {}", blob.media_type);
            println!("  Size:       {} bytes", blob.byte_size);
            println!("  Key:        {}", blob.key);
        }

        SourceCommands::Variants { source_id, format } => {
            let variants = blobs.variants(source_id).await?;
            match format {
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&variants)?;
                    println!("{}", json);
                }
                OutputFormat::Human => {
                    println!("Variants of {}:", source_id);
                    println!("{:-<80}", "");
                    for variant in &variants {
                        println!(
                            "{}  {:<12}  {:>10} bytes  {}",
                            variant.record.descriptor_digest.short(),
                            variant.artifact.media_type.as_str(),
                            variant.artifact.byte_size,
                            variant.record.created_at
                        );
                    }
                    println!("Total: {} variants", variants.len());
                }
            }
        }

        SourceCommands::Purge { source_id } => {
            let report = blobs.purge(source_id).await?;
            println!(
                "Purged {}: {} variants, {} stored objects",
                source_id,
                report.variants_removed(),
                report.objects_deleted()
            );
        }
    }

    Ok(())
}

/// Build a blob service over the configured filesystem store and database.
#[cfg(feature = "postgres")]
fn connect(config: &VersoConfig) -> VersoResult<verso::BlobService> {
    use std::sync::Arc;
    use verso::{
        BlobService, ConfigError, ConfigErrorKind, DatabaseError, DatabaseErrorKind,
        FileSystemStorage, PgVariantRepository, create_pool, run_migrations,
    };

    let url = match &config.database.url {
        Some(url) => url.clone(),
        None => std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::new(ConfigErrorKind::MissingDatabaseUrl))?,
    };

    let pool = create_pool(&url, config.database.pool_size)?;
    let mut conn = pool
        .get()
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Connection(e.to_string())))?;
    run_migrations(&mut conn)?;

    let bytes = FileSystemStorage::new(&config.storage.root, config.storage.partitions())?;
    Ok(BlobService::new(
        Arc::new(PgVariantRepository::new(pool)),
        Arc::new(bytes),
    ))
}

#[cfg(not(feature = "postgres"))]
pub async fn handle_source_command(
    _config: &VersoConfig,
    _cmd: SourceCommands,
) -> VersoResult<()> {
    eprintln!("Error: Source commands need a database. Rebuild with --features postgres");
    std::process::exit(1);
}
