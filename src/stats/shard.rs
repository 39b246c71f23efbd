//! Physical shards and their measurements.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::stats::field::FieldStatistics;

/// One physical shard of one logical index.
#[derive(Debug, Clone, PartialEq)]
pub struct ShardDescriptor {
    /// Logical index name.
    pub name: String,
    /// Directory identifier under the indices directory.
    pub directory_id: String,
    /// Segment store path.
    pub index_path: PathBuf,
    /// Write-ahead log path.
    pub translog_path: PathBuf,
    /// Bytes under the segment store.
    pub index_bytes: u64,
    /// Bytes under the write-ahead log.
    pub translog_bytes: u64,
    /// Live documents.
    pub docs: u64,
    /// Deleted documents.
    pub deleted_docs: u64,
}

impl ShardDescriptor {
    /// Describe a shard that has not been measured yet.
    pub fn new<N: Into<String>, I: Into<String>>(
        name: N,
        directory_id: I,
        index_path: PathBuf,
        translog_path: PathBuf,
    ) -> Self {
        ShardDescriptor {
            name: name.into(),
            directory_id: directory_id.into(),
            index_path,
            translog_path,
            index_bytes: 0,
            translog_bytes: 0,
            docs: 0,
            deleted_docs: 0,
        }
    }

    /// Segment store bytes per live document, 0 without documents.
    pub fn bytes_per_doc(&self) -> u64 {
        self.index_bytes.checked_div(self.docs).unwrap_or(0)
    }

    /// Add a measurement's disk and document counters.
    pub fn apply(&mut self, measurement: &ShardMeasurement) {
        self.index_bytes += measurement.index_bytes;
        self.translog_bytes += measurement.translog_bytes;
        self.docs += measurement.docs;
        self.deleted_docs += measurement.deleted_docs;
    }
}

/// Everything measured for one shard, before it is merged into its group.
///
/// Measuring a shard touches no shared state, so measurements of different
/// shards can be taken concurrently and merged afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShardMeasurement {
    /// Bytes under the segment store.
    pub index_bytes: u64,
    /// Bytes under the write-ahead log.
    pub translog_bytes: u64,
    /// Live documents.
    pub docs: u64,
    /// Deleted documents.
    pub deleted_docs: u64,
    /// Number of segments read.
    pub segments: u64,
    /// Per-field statistics of this shard.
    pub fields: BTreeMap<String, FieldStatistics>,
}

impl ShardMeasurement {
    /// The accumulator for `name`, created on first use.
    pub fn field_mut(&mut self, name: &str) -> &mut FieldStatistics {
        self.fields
            .entry(name.to_string())
            .or_insert_with(|| FieldStatistics::new(name))
    }

    /// Drop document and field statistics, keeping disk usage.
    pub fn clear_contents(&mut self) {
        self.docs = 0;
        self.deleted_docs = 0;
        self.segments = 0;
        self.fields.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shard() -> ShardDescriptor {
        ShardDescriptor::new(
            "logs_0-2020.10.01",
            "uuid-a",
            PathBuf::from("/n/indices/uuid-a/0/index"),
            PathBuf::from("/n/indices/uuid-a/0/translog"),
        )
    }

    #[test]
    fn test_bytes_per_doc() {
        let mut shard = shard();
        assert_eq!(shard.bytes_per_doc(), 0);

        shard.apply(&ShardMeasurement {
            index_bytes: 1000,
            translog_bytes: 55,
            docs: 3,
            deleted_docs: 1,
            ..Default::default()
        });
        assert_eq!(shard.bytes_per_doc(), 333);
        assert_eq!(shard.translog_bytes, 55);
        assert_eq!(shard.deleted_docs, 1);
    }

    #[test]
    fn test_clear_contents_keeps_disk_usage() {
        let mut measurement = ShardMeasurement {
            index_bytes: 10,
            translog_bytes: 2,
            docs: 4,
            segments: 1,
            ..Default::default()
        };
        measurement.field_mut("host").accumulate_stored_bytes(9);
        measurement.clear_contents();

        assert_eq!(measurement.index_bytes, 10);
        assert_eq!(measurement.translog_bytes, 2);
        assert_eq!(measurement.docs, 0);
        assert!(measurement.fields.is_empty());
    }
}
