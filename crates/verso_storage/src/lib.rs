//! Content-addressable byte storage for verso.
//!
//! Sources and derived artifacts are stored by the SHA-256 of their content,
//! inside a named partition. The engine never picks a partition for an
//! artifact on its own: it always reuses the source's.
//!
//! # Features
//!
//! - **Content-addressable storage**: identical bytes share one key
//! - **Partitions**: each partition is an independent namespace
//! - **Atomic writes**: temp file + rename, so readers never see partial content
//! - **Integrity**: reads verify the content against its key
//!
//! # Example
//!
//! ```rust
//! use verso_core::{MediaType, Partition};
//! use verso_storage::{ByteStore, FileSystemStorage};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let partition = Partition::new("local");
//! let storage = FileSystemStorage::new("/tmp/verso", [partition.clone()])?;
//!
//! let data = vec![0u8; 1024];
//! let stored = storage.put(&partition, &data, &MediaType::new("image/png")).await?;
//!
//! let retrieved = storage.get(&partition, &stored.key).await?;
//! assert_eq!(data, retrieved);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod filesystem;
mod memory;
mod storage;

pub use filesystem::FileSystemStorage;
pub use memory::MemoryStorage;
pub use storage::{ByteStore, StoredObject, content_checksum};
pub use verso_error::{StorageError, StorageErrorKind};
