//! Trait definitions for the verso variant engine.
//!
//! Two seams are pluggable:
//!
//! - [`Transformer`]: a backend that turns source bytes into derived bytes
//!   for the media types it supports.
//! - [`VariantRepository`]: the metadata store holding blob rows and the
//!   unique variant index.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod repository;
mod transformer;

pub use repository::{InsertOutcome, VariantRepository};
pub use transformer::{TransformFailure, TransformOutput, Transformer};
