//! Verso - derive media variants once, reuse them forever.
//!
//! Verso manages artifacts derived from immutable source blobs (a resized
//! image, a transcoded clip) and guarantees that each transformation of a
//! given source is computed at most once, even when many callers and
//! processes ask for it at the same time.
//!
//! # Features
//!
//! - **Digest identity**: transformation options are canonicalised and
//!   hashed, so option order and construction path never matter
//! - **Race-safe caching**: a unique index on `(source, digest)` picks one
//!   winner; losers adopt its record
//! - **Pluggable transformers**: ordered registry, first match wins
//! - **Batch preloading**: one lookup for many sources sharing a descriptor
//! - **Partitioned storage**: artifacts live on their source's partition
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use verso::{
//!     BlobService, DerivationEngine, FileSystemStorage, MemoryVariantRepository, Partition,
//!     TransformerRegistry, VersoConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = VersoConfig::load()?;
//!     let bytes = Arc::new(FileSystemStorage::new(
//!         &config.storage.root,
//!         config.storage.partitions(),
//!     )?);
//!     let repository = Arc::new(MemoryVariantRepository::new());
//!
//!     let source = BlobService::new(repository.clone(), bytes.clone())
//!         .upload(&Partition::new("local"), &std::fs::read("cat.png")?, Some("cat.png"))
//!         .await?;
//!
//!     let engine = DerivationEngine::new(
//!         config.engine_config(),
//!         TransformerRegistry::new().with(MyResizer),
//!         repository,
//!         bytes,
//!     );
//!     let handle = engine.describe(&source, [("resize", "100x100")].into_iter().collect())?;
//!     println!("{:?}", handle.process().await?.reference());
//!     Ok(())
//! }
//! ```
//!
//! # Cargo Features
//!
//! - `postgres` - PostgreSQL variant index (`PgVariantRepository`)
//!
//! # Architecture
//!
//! - `verso_error` - Error types
//! - `verso_core` - Blobs, media types, partitions, descriptors, variant records
//! - `verso_interface` - `Transformer` and `VariantRepository` traits
//! - `verso_storage` - Content-addressable byte storage
//! - `verso_database` - Variant index stores (in-memory, PostgreSQL)
//! - `verso_variants` - Derivation engine, registry, preloader, configuration
//!
//! This crate re-exports everything for convenience.

pub use verso_core::*;
pub use verso_database::*;
pub use verso_error::*;
pub use verso_interface::*;
pub use verso_storage::*;
pub use verso_variants::*;

mod observability;

pub use observability::init_logging;
