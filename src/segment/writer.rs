//! Segment writer.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use log::debug;

use crate::error::{Result, ShardStatError};
use crate::segment::commit::{FieldInfo, SegmentInfo, SegmentInfos};
use crate::segment::reader::read_deleted_docs;
use crate::segment::terms::TermsWriter;
use crate::segment::value::Document;
use crate::segment::{FORMAT_VERSION, LIVE_DOCS_MAGIC, STORED_FIELDS_MAGIC};
use crate::storage::Storage;
use crate::storage::structured::StructWriter;

/// Address of a document: its segment and its ordinal within the segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocAddress {
    /// Segment identifier.
    pub segment: String,
    /// Document ordinal.
    pub doc: u32,
}

/// Buffers documents and deletions and commits them to a segment store.
///
/// Every commit that has buffered documents flushes exactly one new segment.
/// Deletions are applied at commit time, both to committed segments and to
/// the segment being flushed.
#[derive(Debug)]
pub struct IndexWriter {
    storage: Arc<dyn Storage>,
    infos: SegmentInfos,
    pending: Vec<Document>,
    pending_deletes: BTreeMap<String, BTreeSet<u32>>,
}

impl IndexWriter {
    /// Open a writer on a store, continuing from its current commit if any.
    pub fn open(storage: Arc<dyn Storage>) -> Result<Self> {
        let infos = SegmentInfos::load_or_default(storage.as_ref())?;
        Ok(IndexWriter {
            storage,
            infos,
            pending: Vec::new(),
            pending_deletes: BTreeMap::new(),
        })
    }

    fn next_segment_id(&self) -> String {
        format!("segment_{:08x}", self.infos.generation + 1)
    }

    /// Buffer a document. Returns the address it will have once committed.
    pub fn add_document(&mut self, doc: Document) -> Result<DocAddress> {
        let ordinal = u32::try_from(self.pending.len())
            .map_err(|_| ShardStatError::segment("Too many documents in one segment"))?;
        self.pending.push(doc);
        Ok(DocAddress {
            segment: self.next_segment_id(),
            doc: ordinal,
        })
    }

    /// Mark a committed or buffered document as deleted.
    pub fn delete_document(&mut self, address: &DocAddress) -> Result<()> {
        let max_doc = if address.segment == self.next_segment_id() {
            self.pending.len() as u64
        } else {
            self.infos
                .segments
                .iter()
                .find(|s| s.id == address.segment)
                .map(|s| s.max_doc)
                .ok_or_else(|| {
                    ShardStatError::segment(format!("Unknown segment: {}", address.segment))
                })?
        };

        if address.doc as u64 >= max_doc {
            return Err(ShardStatError::segment(format!(
                "Document {} out of range for segment {} ({max_doc} documents)",
                address.doc, address.segment
            )));
        }

        self.pending_deletes
            .entry(address.segment.clone())
            .or_default()
            .insert(address.doc);
        Ok(())
    }

    /// Number of buffered documents.
    pub fn pending_docs(&self) -> usize {
        self.pending.len()
    }

    /// The last committed state.
    pub fn segment_infos(&self) -> &SegmentInfos {
        &self.infos
    }

    /// Flush buffered documents into a new segment, apply deletions and
    /// write a new commit.
    pub fn commit(&mut self) -> Result<()> {
        let mut infos = self.infos.clone();
        let new_id = self.next_segment_id();
        let mut deletes = std::mem::take(&mut self.pending_deletes);

        if !self.pending.is_empty() {
            let docs = std::mem::take(&mut self.pending);
            let deleted = deletes.remove(&new_id).unwrap_or_default();
            let info = self.flush_segment(&new_id, &docs, &deleted)?;
            debug!(
                "Flushed {} with {} documents ({} deleted)",
                info.id, info.max_doc, info.deleted_count
            );
            infos.segments.push(info);
        }

        for (segment_id, deleted) in deletes {
            let Some(info) = infos.segment_mut(&segment_id) else {
                continue;
            };
            let mut all: BTreeSet<u32> = if info.deleted_count > 0 {
                read_deleted_docs(self.storage.as_ref(), info)?
                    .into_iter()
                    .collect()
            } else {
                BTreeSet::new()
            };
            all.extend(deleted);
            write_live_docs(self.storage.as_ref(), &info.live_docs_file(), &all)?;
            info.deleted_count = all.len() as u64;
        }

        infos.generation += 1;
        infos.save(self.storage.as_ref())?;
        self.infos = infos;
        Ok(())
    }

    fn flush_segment(
        &self,
        id: &str,
        docs: &[Document],
        deleted: &BTreeSet<u32>,
    ) -> Result<SegmentInfo> {
        let mut info = SegmentInfo {
            id: id.to_string(),
            max_doc: docs.len() as u64,
            deleted_count: deleted.len() as u64,
            fields: BTreeMap::new(),
        };

        let mut fdt = StructWriter::new(self.storage.create_output(&info.stored_fields_file())?);
        fdt.write_u32(STORED_FIELDS_MAGIC)?;
        fdt.write_u8(FORMAT_VERSION)?;
        fdt.write_varint(info.max_doc)?;

        // field -> term -> document frequency
        let mut field_terms: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();

        for doc in docs {
            let stored: Vec<_> = doc.fields().iter().filter(|f| f.stored).collect();
            fdt.write_varint(stored.len() as u64)?;
            for field in &stored {
                fdt.write_string(&field.name)?;
                field.value.write_to(&mut fdt)?;
            }

            let mut doc_terms: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
            for field in doc.fields() {
                let field_info: &mut FieldInfo = info.fields.entry(field.name.clone()).or_default();
                field_info.stored |= field.stored;
                if field.indexed {
                    field_info.index_options = field_info
                        .index_options
                        .max(field.value.default_index_options());
                    doc_terms
                        .entry(field.name.as_str())
                        .or_default()
                        .extend(field.value.index_terms());
                }
            }

            for (field, terms) in doc_terms {
                let counts = field_terms.entry(field.to_string()).or_default();
                for term in terms {
                    *counts.entry(term).or_insert(0) += 1;
                }
            }
        }
        fdt.close()?;

        let mut terms_writer = TermsWriter::new(
            self.storage.create_output(&info.terms_file())?,
            self.storage.create_output(&info.terms_index_file())?,
        )?;
        for (field, terms) in &field_terms {
            if terms.is_empty() {
                continue;
            }
            let stats = terms_writer.write_field(field, terms)?;
            if let Some(field_info) = info.fields.get_mut(field) {
                field_info.terms = stats;
            }
        }
        terms_writer.close()?;

        if !deleted.is_empty() {
            write_live_docs(self.storage.as_ref(), &info.live_docs_file(), deleted)?;
        }

        Ok(info)
    }
}

fn write_live_docs(storage: &dyn Storage, name: &str, deleted: &BTreeSet<u32>) -> Result<()> {
    let ids: Vec<u32> = deleted.iter().copied().collect();

    let mut writer = StructWriter::new(storage.create_output(name)?);
    writer.write_u32(LIVE_DOCS_MAGIC)?;
    writer.write_u8(FORMAT_VERSION)?;
    writer.write_delta_compressed_u32s(&ids)?;
    writer.close()
}
