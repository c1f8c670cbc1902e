//! Core data types for the verso variant engine.
//!
//! This crate provides the data model shared by every other verso crate:
//! immutable blobs (sources and artifacts alike), media types, storage
//! partitions, transformation descriptors with their digests, and variant
//! records.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod blob;
mod descriptor;
mod digest;
mod media_type;
mod partition;
mod variant;

pub use blob::{Blob, BlobMetadata};
pub use descriptor::{Descriptor, DescriptorBuilder, OptionPolicy, RawOptions};
pub use digest::DescriptorDigest;
pub use media_type::{MediaKind, MediaType};
pub use partition::Partition;
pub use variant::{ArtifactRef, Variant, VariantRecord};
