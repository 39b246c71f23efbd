//! Storage-backed segment reader.

use std::collections::BTreeMap;
use std::sync::Arc;

use bit_vec::BitVec;
use log::trace;

use crate::error::{Result, ShardStatError};
use crate::segment::commit::{FieldInfo, SegmentInfo};
use crate::segment::value::StoredValue;
use crate::segment::{
    FORMAT_VERSION, LIVE_DOCS_MAGIC, STORED_FIELDS_MAGIC, SegmentReader, StoredFieldVisitor,
};
use crate::storage::structured::StructReader;
use crate::storage::{Storage, StorageInput};

/// Read the deleted document ids of a segment.
pub(crate) fn read_deleted_docs(storage: &dyn Storage, info: &SegmentInfo) -> Result<Vec<u32>> {
    let mut reader = StructReader::new(storage.open_input(&info.live_docs_file())?)?;
    check_header(&mut reader, LIVE_DOCS_MAGIC, &info.live_docs_file())?;
    let ids = reader.read_delta_compressed_u32s()?;

    if !reader.verify_checksum()? {
        return Err(ShardStatError::segment(format!(
            "Checksum mismatch in {}",
            info.live_docs_file()
        )));
    }
    Ok(ids)
}

fn check_header<R: StorageInput>(reader: &mut StructReader<R>, magic: u32, name: &str) -> Result<()> {
    let found = reader.read_u32()?;
    if found != magic {
        return Err(ShardStatError::segment(format!(
            "Bad magic in {name}: {found:#010x}"
        )));
    }
    let version = reader.read_u8()?;
    if version != FORMAT_VERSION {
        return Err(ShardStatError::segment(format!(
            "Unsupported version {version} in {name}"
        )));
    }
    Ok(())
}

/// A [`SegmentReader`] over a segment stored in a [`Storage`].
///
/// Deletions are loaded when the reader is opened; stored fields are streamed
/// from the `.fdt` file on every visit.
#[derive(Debug)]
pub struct StorageSegmentReader {
    storage: Arc<dyn Storage>,
    info: SegmentInfo,
    deleted: BitVec,
}

impl StorageSegmentReader {
    /// Open a segment described by the commit.
    pub fn open(storage: Arc<dyn Storage>, info: SegmentInfo) -> Result<Self> {
        let max_doc = usize::try_from(info.max_doc)
            .map_err(|_| ShardStatError::segment(format!("{}: max_doc too large", info.id)))?;
        let mut deleted = BitVec::from_elem(max_doc, false);

        if info.deleted_count > 0 {
            let ids = read_deleted_docs(storage.as_ref(), &info)?;
            if ids.len() as u64 != info.deleted_count {
                return Err(ShardStatError::segment(format!(
                    "{}: commit lists {} deletions, {} has {}",
                    info.id,
                    info.deleted_count,
                    info.live_docs_file(),
                    ids.len()
                )));
            }
            for id in ids {
                if id as usize >= max_doc {
                    return Err(ShardStatError::segment(format!(
                        "{}: deleted document {id} out of range",
                        info.id
                    )));
                }
                deleted.set(id as usize, true);
            }
        }

        Ok(StorageSegmentReader {
            storage,
            info,
            deleted,
        })
    }

    /// The commit entry this reader was opened from.
    pub fn info(&self) -> &SegmentInfo {
        &self.info
    }

    /// Whether a document ordinal is deleted.
    pub fn is_deleted(&self, doc: u64) -> bool {
        self.deleted.get(doc as usize).unwrap_or(false)
    }
}

impl SegmentReader for StorageSegmentReader {
    fn segment_id(&self) -> &str {
        &self.info.id
    }

    fn max_doc(&self) -> u64 {
        self.info.max_doc
    }

    fn num_docs(&self) -> u64 {
        self.info.live_doc_count()
    }

    fn num_deleted_docs(&self) -> u64 {
        self.info.deleted_count
    }

    fn field_infos(&self) -> &BTreeMap<String, FieldInfo> {
        &self.info.fields
    }

    fn visit_live_documents(
        &self,
        limit: Option<u64>,
        visitor: &mut dyn StoredFieldVisitor,
    ) -> Result<u64> {
        let limit = limit.unwrap_or(u64::MAX);
        if limit == 0 || self.num_docs() == 0 {
            return Ok(0);
        }

        let name = self.info.stored_fields_file();
        let mut reader = StructReader::new(self.storage.open_input(&name)?)?;
        check_header(&mut reader, STORED_FIELDS_MAGIC, &name)?;

        let doc_count = reader.read_varint()?;
        if doc_count != self.info.max_doc {
            return Err(ShardStatError::segment(format!(
                "{name}: {doc_count} documents, commit says {}",
                self.info.max_doc
            )));
        }

        let mut visited = 0;
        for doc in 0..doc_count {
            let live = !self.is_deleted(doc);
            let field_count = reader.read_varint()?;
            for _ in 0..field_count {
                let field = reader.read_string()?;
                let value = StoredValue::read_from(&mut reader)?;
                if live {
                    visitor.visit_field(&field, &value);
                }
            }

            if live {
                visitor.end_document();
                visited += 1;
                if visited == limit {
                    trace!("{}: stopped after {visited} documents", self.info.id);
                    return Ok(visited);
                }
            }
        }

        if !reader.verify_checksum()? {
            return Err(ShardStatError::segment(format!("Checksum mismatch in {name}")));
        }
        Ok(visited)
    }
}
