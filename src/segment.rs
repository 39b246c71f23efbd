//! Segment store format and readers.
//!
//! A segment store is a directory holding a `segments.json` commit and, per
//! segment, a stored-fields file (`.fdt`), an optional deleted-documents file
//! (`.liv`) and the term dictionary (`.tim` blocks, `.tip` index). Segments
//! are immutable once committed; only their deletions change.
//!
//! Analysis only needs the [`SegmentReader`] view: document counts, per-field
//! term dictionary statistics and a visitor over stored fields. The
//! [`IndexWriter`] exists to produce stores in this format.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use shardstat::segment::{Document, IndexWriter, StoredFieldVisitor, StoredValue, open_segments};
//! use shardstat::storage::memory::MemoryStorage;
//!
//! # fn main() -> shardstat::error::Result<()> {
//! let storage = Arc::new(MemoryStorage::new_default());
//!
//! let mut writer = IndexWriter::open(storage.clone())?;
//! writer.add_document(Document::builder().add_text("message", "disk full").build())?;
//! writer.commit()?;
//!
//! struct Count(u64);
//! impl StoredFieldVisitor for Count {
//!     fn visit_field(&mut self, _field: &str, value: &StoredValue) {
//!         self.0 += value.counted_bytes();
//!     }
//! }
//!
//! let segments = open_segments(storage)?;
//! let mut count = Count(0);
//! assert_eq!(segments[0].visit_live_documents(None, &mut count)?, 1);
//! assert_eq!(count.0, 9);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Result, ShardStatError};
use crate::storage::Storage;
use crate::storage::file::FileStorage;

pub mod commit;
pub mod reader;
pub mod terms;
pub mod value;
pub mod writer;

pub use commit::{FieldInfo, SegmentInfo, SegmentInfos};
pub use reader::StorageSegmentReader;
pub use terms::TermDictionaryStats;
pub use value::{Document, DocumentBuilder, DocumentField, IndexOptions, StoredValue};
pub use writer::{DocAddress, IndexWriter};

/// Magic number heading `.fdt` files.
pub const STORED_FIELDS_MAGIC: u32 = 0x4644_5431; // "FDT1"

/// Magic number heading `.liv` files.
pub const LIVE_DOCS_MAGIC: u32 = 0x4c49_5631; // "LIV1"

/// Version byte following every file magic.
pub const FORMAT_VERSION: u8 = 1;

/// Receives the stored fields of visited documents.
pub trait StoredFieldVisitor {
    /// Called once per stored field occurrence, in document order.
    fn visit_field(&mut self, field: &str, value: &StoredValue);

    /// Called after the last field of each visited document.
    fn end_document(&mut self) {}
}

/// Read access to one committed segment.
pub trait SegmentReader: Send + std::fmt::Debug {
    /// Segment identifier.
    fn segment_id(&self) -> &str;

    /// Number of documents written, deleted ones included.
    fn max_doc(&self) -> u64;

    /// Number of live documents.
    fn num_docs(&self) -> u64;

    /// Number of deleted documents.
    fn num_deleted_docs(&self) -> u64;

    /// Per-field metadata, sorted by field name.
    fn field_infos(&self) -> &BTreeMap<String, FieldInfo>;

    /// Persisted term dictionary statistics of a field.
    fn term_stats(&self, field: &str) -> Option<&TermDictionaryStats> {
        self.field_infos().get(field).map(|info| &info.terms)
    }

    /// Feed the stored fields of live documents to `visitor`, in document
    /// order, stopping after `limit` documents when given.
    ///
    /// Returns the number of documents visited.
    fn visit_live_documents(
        &self,
        limit: Option<u64>,
        visitor: &mut dyn StoredFieldVisitor,
    ) -> Result<u64>;
}

/// Opens the segments of a segment store directory.
pub trait IndexOpener: Send + Sync + std::fmt::Debug {
    /// Open every segment of the store at `path`.
    fn open(&self, path: &Path) -> Result<Vec<Box<dyn SegmentReader>>>;
}

/// Opens segment stores on the local filesystem, read-only.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsIndexOpener;

impl IndexOpener for FsIndexOpener {
    fn open(&self, path: &Path) -> Result<Vec<Box<dyn SegmentReader>>> {
        let storage = FileStorage::open(path)
            .map_err(|e| ShardStatError::shard_io(format!("{}: {e}", path.display())))?;
        open_segments(Arc::new(storage))
    }
}

/// Open every segment listed in a store's commit.
pub fn open_segments(storage: Arc<dyn Storage>) -> Result<Vec<Box<dyn SegmentReader>>> {
    let infos = SegmentInfos::load(storage.as_ref())?;
    infos
        .segments
        .into_iter()
        .map(|info| {
            StorageSegmentReader::open(Arc::clone(&storage), info)
                .map(|reader| Box::new(reader) as Box<dyn SegmentReader>)
        })
        .collect()
}
