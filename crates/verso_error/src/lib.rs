//! Error types for the verso variant engine.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! Only three derivation failures ever reach callers of the engine:
//! [`DerivationErrorKind::Invariable`], [`DerivationErrorKind::Transformation`]
//! and [`DerivationErrorKind::StoreUnavailable`]. A lost race on the variant
//! index is not an error at all; it is reported as a conflict outcome by the
//! metadata store and absorbed by the engine.
//!
//! # Examples
//!
//! ```
//! use verso_error::{ConfigError, ConfigErrorKind, VersoResult};
//!
//! fn load() -> VersoResult<String> {
//!     Err(ConfigError::new(ConfigErrorKind::Invalid("missing [storage] section".into())))?
//! }
//!
//! assert!(load().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod database;
mod derivation;
mod descriptor;
mod error;
mod json;
mod storage;

pub use config::{ConfigError, ConfigErrorKind};
pub use database::{DatabaseError, DatabaseErrorKind};
pub use derivation::{DerivationError, DerivationErrorKind};
pub use descriptor::{DescriptorError, DescriptorErrorKind};
pub use error::{VersoError, VersoErrorKind, VersoResult};
pub use json::JsonError;
pub use storage::{StorageError, StorageErrorKind};
