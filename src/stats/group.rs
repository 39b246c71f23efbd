//! Index groups and the corpus they are measured against.

use std::collections::BTreeMap;

use crate::stats::field::FieldStatistics;
use crate::stats::percentage;
use crate::stats::shard::{ShardDescriptor, ShardMeasurement};

/// Disk usage of the whole indices directory of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corpus {
    /// Bytes under the indices directory.
    pub total_bytes: u64,
}

impl Corpus {
    /// Create a corpus of the given size.
    pub fn new(total_bytes: u64) -> Self {
        Corpus { total_bytes }
    }
}

/// A set of indices reported as one logical dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexGroup {
    name: String,
    shards: Vec<ShardDescriptor>,
    fields: BTreeMap<String, FieldStatistics>,
    index_bytes: u64,
    translog_bytes: u64,
    docs: u64,
    deleted_docs: u64,
    segments: u64,
    calculated: Option<Calculated>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Calculated {
    total_size: u64,
    percentage_of_corpus: f64,
}

impl IndexGroup {
    /// Create an empty group.
    pub fn new<S: Into<String>>(name: S) -> Self {
        IndexGroup {
            name: name.into(),
            shards: Vec::new(),
            fields: BTreeMap::new(),
            index_bytes: 0,
            translog_bytes: 0,
            docs: 0,
            deleted_docs: 0,
            segments: 0,
            calculated: None,
        }
    }

    /// Group key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a shard; returns its position.
    pub fn add_shard(&mut self, shard: ShardDescriptor) -> usize {
        self.shards.push(shard);
        self.calculated = None;
        self.shards.len() - 1
    }

    /// Shards in insertion order.
    pub fn shards(&self) -> &[ShardDescriptor] {
        &self.shards
    }

    /// Fields sorted by name.
    pub fn fields(&self) -> impl Iterator<Item = &FieldStatistics> {
        self.fields.values()
    }

    /// Look up one field.
    pub fn field(&self, name: &str) -> Option<&FieldStatistics> {
        self.fields.get(name)
    }

    /// Merge the measurement of the shard at `shard_index`.
    ///
    /// Counters are added to both the shard and the group; field statistics
    /// go to the group only.
    pub fn merge_shard(&mut self, shard_index: usize, measurement: ShardMeasurement) {
        if let Some(shard) = self.shards.get_mut(shard_index) {
            shard.apply(&measurement);
        }

        self.index_bytes += measurement.index_bytes;
        self.translog_bytes += measurement.translog_bytes;
        self.docs += measurement.docs;
        self.deleted_docs += measurement.deleted_docs;
        self.segments += measurement.segments;

        for (name, stats) in measurement.fields {
            match self.fields.get_mut(&name) {
                Some(existing) => existing.merge(stats),
                None => {
                    self.fields.insert(name, stats);
                }
            }
        }
        self.calculated = None;
    }

    /// Finalize the group: calculated total, field percentages, and the
    /// group's share of the corpus.
    pub fn calculate(&mut self, corpus: &Corpus) {
        let total_size: u64 = self.fields.values().map(FieldStatistics::total).sum();
        for field in self.fields.values_mut() {
            field.finalize(total_size);
        }
        self.calculated = Some(Calculated {
            total_size,
            percentage_of_corpus: percentage(self.index_bytes, corpus.total_bytes),
        });
    }

    /// Whether [`IndexGroup::calculate`] has run since the last merge.
    pub fn is_calculated(&self) -> bool {
        self.calculated.is_some()
    }

    fn calculated(&self) -> Calculated {
        debug_assert!(
            self.calculated.is_some(),
            "group {} read before calculate",
            self.name
        );
        self.calculated.unwrap_or(Calculated {
            total_size: 0,
            percentage_of_corpus: 0.0,
        })
    }

    /// Sum of all field totals.
    pub fn calculated_total_size(&self) -> u64 {
        self.calculated().total_size
    }

    /// Segment store bytes as a percentage of the corpus.
    pub fn percentage_of_corpus(&self) -> f64 {
        self.calculated().percentage_of_corpus
    }

    /// Segment store bytes.
    pub fn index_bytes(&self) -> u64 {
        self.index_bytes
    }

    /// Write-ahead log bytes.
    pub fn translog_bytes(&self) -> u64 {
        self.translog_bytes
    }

    /// Live documents.
    pub fn docs(&self) -> u64 {
        self.docs
    }

    /// Deleted documents.
    pub fn deleted_docs(&self) -> u64 {
        self.deleted_docs
    }

    /// Segments read.
    pub fn segments(&self) -> u64 {
        self.segments
    }
}
