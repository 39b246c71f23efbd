//! The segment commit (`segments.json`).

use std::collections::BTreeMap;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShardStatError};
use crate::segment::terms::TermDictionaryStats;
use crate::segment::value::IndexOptions;
use crate::storage::Storage;

/// Name of the commit file in a segment store.
pub const COMMIT_FILE: &str = "segments.json";

const COMMIT_TEMP_FILE: &str = "segments.json.tmp";

/// Per-field metadata persisted with a segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    /// What the inverted index records for this field.
    pub index_options: IndexOptions,
    /// Whether any document stored a value for this field.
    pub stored: bool,
    /// Term dictionary byte breakdown.
    #[serde(default)]
    pub terms: TermDictionaryStats,
}

/// Metadata of one immutable segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentInfo {
    /// Unique identifier; also the base name of the segment's files.
    pub id: String,
    /// Number of documents written, deleted ones included.
    pub max_doc: u64,
    /// Number of deleted documents.
    #[serde(default)]
    pub deleted_count: u64,
    /// Field metadata keyed by field name.
    pub fields: BTreeMap<String, FieldInfo>,
}

impl SegmentInfo {
    /// Number of live documents.
    pub fn live_doc_count(&self) -> u64 {
        self.max_doc.saturating_sub(self.deleted_count)
    }

    /// Stored-fields file name.
    pub fn stored_fields_file(&self) -> String {
        format!("{}.fdt", self.id)
    }

    /// Deleted-documents file name.
    pub fn live_docs_file(&self) -> String {
        format!("{}.liv", self.id)
    }

    /// Term blocks file name.
    pub fn terms_file(&self) -> String {
        format!("{}.tim", self.id)
    }

    /// Terms index file name.
    pub fn terms_index_file(&self) -> String {
        format!("{}.tip", self.id)
    }
}

/// The list of segments making up a store at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentInfos {
    /// Incremented on every commit.
    pub generation: u64,
    /// Segments in creation order.
    pub segments: Vec<SegmentInfo>,
}

impl SegmentInfos {
    /// Load the commit of a store.
    ///
    /// A store without a commit file has no readable segment data and is
    /// reported as a segment error.
    pub fn load(storage: &dyn Storage) -> Result<Self> {
        if !storage.file_exists(COMMIT_FILE) {
            return Err(ShardStatError::segment(format!(
                "No {COMMIT_FILE} in segment store"
            )));
        }

        let data = storage.read_all(COMMIT_FILE)?;
        serde_json::from_slice(&data)
            .map_err(|e| ShardStatError::segment(format!("Failed to parse {COMMIT_FILE}: {e}")))
    }

    /// Load the commit, or start an empty one if the store has none.
    pub fn load_or_default(storage: &dyn Storage) -> Result<Self> {
        if storage.file_exists(COMMIT_FILE) {
            Self::load(storage)
        } else {
            Ok(SegmentInfos::default())
        }
    }

    /// Write the commit, replacing the previous one atomically.
    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        let data = serde_json::to_vec_pretty(self)?;

        let mut output = storage.create_output(COMMIT_TEMP_FILE)?;
        output.write_all(&data)?;
        output.close()?;

        storage.rename_file(COMMIT_TEMP_FILE, COMMIT_FILE)
    }

    /// Total number of live documents across segments.
    pub fn live_doc_count(&self) -> u64 {
        self.segments.iter().map(SegmentInfo::live_doc_count).sum()
    }

    /// Find a segment by id.
    pub fn segment_mut(&mut self, id: &str) -> Option<&mut SegmentInfo> {
        self.segments.iter_mut().find(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;

    fn sample_info() -> SegmentInfo {
        let mut fields = BTreeMap::new();
        fields.insert(
            "message".to_string(),
            FieldInfo {
                index_options: IndexOptions::DocsAndFreqs,
                stored: true,
                terms: TermDictionaryStats {
                    term_bytes: 120,
                    term_count: 20,
                    ..Default::default()
                },
            },
        );
        SegmentInfo {
            id: "segment_00000001".to_string(),
            max_doc: 10,
            deleted_count: 3,
            fields,
        }
    }

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new_default();
        let infos = SegmentInfos {
            generation: 4,
            segments: vec![sample_info()],
        };

        infos.save(&storage).unwrap();
        assert!(!storage.file_exists(COMMIT_TEMP_FILE));

        let loaded = SegmentInfos::load(&storage).unwrap();
        assert_eq!(loaded, infos);
        assert_eq!(loaded.live_doc_count(), 7);
    }

    #[test]
    fn test_missing_commit() {
        let storage = MemoryStorage::new_default();

        assert!(SegmentInfos::load(&storage).is_err());
        assert_eq!(
            SegmentInfos::load_or_default(&storage).unwrap(),
            SegmentInfos::default()
        );
    }

    #[test]
    fn test_corrupt_commit() {
        let storage = MemoryStorage::new_default();
        storage.put_file(COMMIT_FILE, b"{ not json");

        let err = SegmentInfos::load(&storage).unwrap_err();
        assert!(matches!(err, ShardStatError::Segment(_)));
    }

    #[test]
    fn test_file_names() {
        let info = sample_info();
        assert_eq!(info.stored_fields_file(), "segment_00000001.fdt");
        assert_eq!(info.live_docs_file(), "segment_00000001.liv");
        assert_eq!(info.terms_file(), "segment_00000001.tim");
        assert_eq!(info.terms_index_file(), "segment_00000001.tip");
    }
}
