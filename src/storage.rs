//! Storage abstraction layer for segment files.
//!
//! Segment stores are read through the [`Storage`] trait so that the segment
//! format code does not care whether its files live on disk or in memory.
//!
//! - [`file::FileStorage`] reads and writes a directory on disk. Opening an
//!   existing store with [`file::FileStorage::open`] never creates anything.
//! - [`memory::MemoryStorage`] keeps files in a map and backs unit tests and
//!   benchmarks.
//! - [`structured`] provides checksummed binary readers and writers on top of
//!   either backend.
//!
//! # Example
//!
//! ```
//! use std::io::{Read, Write};
//! use shardstat::storage::Storage;
//! use shardstat::storage::memory::MemoryStorage;
//!
//! # fn main() -> shardstat::error::Result<()> {
//! let storage = MemoryStorage::new_default();
//!
//! let mut output = storage.create_output("segments.json")?;
//! output.write_all(b"{}")?;
//! output.close()?;
//!
//! let mut input = storage.open_input("segments.json")?;
//! let mut content = String::new();
//! input.read_to_string(&mut content)?;
//! assert_eq!(content, "{}");
//! # Ok(())
//! # }
//! ```

pub mod file;
pub mod memory;
pub mod structured;
pub mod traits;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use traits::{Storage, StorageConfig, StorageError, StorageInput, StorageOutput};
