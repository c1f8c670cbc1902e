//! Variant derivation and caching for verso.
//!
//! A *variant* is an artifact derived from an immutable source blob by one
//! transformation request (a [`Descriptor`](verso_core::Descriptor)). This
//! crate guarantees that each `(source, descriptor)` pair is derived at most
//! once and reused afterwards, across any number of concurrent callers and
//! processes sharing one metadata store.
//!
//! # Components
//!
//! - [`TransformerRegistry`]: ordered transformation backends
//! - [`VariantStore`]: lookup-or-create over the variant index
//! - [`DerivationEngine`] and [`VariantHandle`]: describe, then process
//! - [`BatchPreloader`]: one lookup for many sources sharing a descriptor
//! - [`BlobService`]: uploads and cascading deletes of sources
//! - [`VersoConfig`]: TOML configuration
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use verso_core::Partition;
//! use verso_database::MemoryVariantRepository;
//! use verso_storage::MemoryStorage;
//! use verso_variants::{BlobService, DerivationEngine, EngineConfig, TransformerRegistry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = Arc::new(MemoryVariantRepository::new());
//! let bytes = Arc::new(MemoryStorage::new());
//!
//! let blobs = BlobService::new(repository.clone(), bytes.clone());
//! let source = blobs
//!     .upload(&Partition::new("local"), b"...", Some("clip.mp4"))
//!     .await?;
//!
//! let engine = DerivationEngine::new(
//!     EngineConfig::default(),
//!     TransformerRegistry::new(),
//!     repository,
//!     bytes,
//! );
//! let handle = engine.describe(&source, [("format", "webm")].into_iter().collect())?;
//! match handle.process().await {
//!     Ok(resolved) => println!("{:?}", resolved.reference()),
//!     Err(e) => println!("{e}"),
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod blobs;
mod config;
mod engine;
mod handle;
mod preload;
mod registry;
mod store;

pub use blobs::{BlobService, PurgeReport};
pub use config::{
    DatabaseConfig, DescriptorConfig, EngineConfig, EngineConfigBuilder, LoggingConfig,
    StorageConfig, StoreConfig, VersoConfig,
};
pub use engine::DerivationEngine;
pub use handle::{ResolvedVariant, VariantHandle};
pub use preload::{BatchPreloader, PreloadedVariants};
pub use registry::TransformerRegistry;
pub use store::{Resolution, VariantStore};
