//! Variant index persistence for verso.
//!
//! This crate provides the metadata stores behind
//! [`verso_interface::VariantRepository`]:
//!
//! - [`MemoryVariantRepository`]: process-local, always available. It
//!   enforces the `(source_id, descriptor_digest)` uniqueness the same way a
//!   unique index would and counts round-trips, which makes it the store of
//!   choice for tests.
//! - `PgVariantRepository` (feature `postgres`): Diesel-based PostgreSQL
//!   store with embedded migrations and r2d2 pooling.
//!
//! # Example
//!
//! ```rust,ignore
//! use verso_database::{create_pool, run_migrations, PgVariantRepository};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("postgres://localhost/verso", 8)?;
//! run_migrations(&mut pool.get()?)?;
//! let repo = PgVariantRepository::new(pool);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod memory;

#[cfg(feature = "postgres")]
mod connection;
#[cfg(feature = "postgres")]
mod models;
#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "postgres")]
pub mod schema;

pub use memory::MemoryVariantRepository;

#[cfg(feature = "postgres")]
pub use connection::{PgPool, create_pool, establish_connection, run_migrations};
#[cfg(feature = "postgres")]
pub use models::{BlobRow, VariantRecordRow};
#[cfg(feature = "postgres")]
pub use postgres::PgVariantRepository;

use verso_error::DatabaseError;

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;
