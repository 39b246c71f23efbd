//! Node report built from finalized groups.
//!
//! The report is plain data: groups in key order, shards in decode order,
//! fields in name order. Rendering is left to the caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::SamplingConfig;
use crate::segment::IndexOptions;
use crate::stats::{FieldStatistics, IndexGroup, ShardDescriptor};

/// Report for one node (or one bare segment store).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeReport {
    /// Directory whose size is the corpus.
    pub indices_dir: String,
    /// Bytes under `indices_dir`.
    pub corpus_bytes: u64,
    /// Per-segment sample size, when stored fields were sampled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<u64>,
    /// Groups in key order.
    pub groups: Vec<GroupReport>,
    /// Directories under `indices_dir` no decoded index points at.
    #[serde(default)]
    pub unreferenced: Vec<UnreferencedDirectory>,
}

impl NodeReport {
    /// Build a report from calculated groups.
    pub fn new(
        indices_dir: String,
        corpus_bytes: u64,
        sampling: &SamplingConfig,
        groups: &BTreeMap<String, IndexGroup>,
        unreferenced: Vec<UnreferencedDirectory>,
    ) -> Self {
        NodeReport {
            indices_dir,
            corpus_bytes,
            sample_size: sampling.limit(),
            groups: groups.values().map(GroupReport::from_group).collect(),
            unreferenced,
        }
    }

    /// Find a group by key.
    pub fn group(&self, name: &str) -> Option<&GroupReport> {
        self.groups.iter().find(|g| g.name == name)
    }
}

/// One logical dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupReport {
    pub name: String,
    pub shards: Vec<ShardReport>,
    pub docs: u64,
    pub deleted_docs: u64,
    pub segments: u64,
    pub index_bytes: u64,
    pub translog_bytes: u64,
    /// Sum of the field totals.
    pub calculated_total_bytes: u64,
    pub percentage_of_corpus: f64,
    pub fields: Vec<FieldReport>,
}

impl GroupReport {
    /// Snapshot a calculated group.
    pub fn from_group(group: &IndexGroup) -> Self {
        GroupReport {
            name: group.name().to_string(),
            shards: group.shards().iter().map(ShardReport::from_shard).collect(),
            docs: group.docs(),
            deleted_docs: group.deleted_docs(),
            segments: group.segments(),
            index_bytes: group.index_bytes(),
            translog_bytes: group.translog_bytes(),
            calculated_total_bytes: group.calculated_total_size(),
            percentage_of_corpus: group.percentage_of_corpus(),
            fields: group.fields().map(FieldReport::from_field).collect(),
        }
    }

    /// Find a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldReport> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One shard of a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardReport {
    pub name: String,
    pub directory_id: String,
    pub docs: u64,
    pub deleted_docs: u64,
    pub index_bytes: u64,
    pub translog_bytes: u64,
    pub bytes_per_doc: u64,
}

impl ShardReport {
    fn from_shard(shard: &ShardDescriptor) -> Self {
        ShardReport {
            name: shard.name.clone(),
            directory_id: shard.directory_id.clone(),
            docs: shard.docs,
            deleted_docs: shard.deleted_docs,
            index_bytes: shard.index_bytes,
            translog_bytes: shard.translog_bytes,
            bytes_per_doc: shard.bytes_per_doc(),
        }
    }
}

/// Storage composition of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldReport {
    pub name: String,
    pub index_options: IndexOptions,
    /// Stored bytes plus all term dictionary categories.
    pub total_bytes: u64,
    /// Share of the group's calculated total.
    pub percentage: f64,
    pub stored_bytes: u64,
    pub index_bytes: u64,
    pub term_count: u64,
    pub bytes_per_term: f64,
    pub term_bytes: u64,
    pub block_suffix_bytes: u64,
    pub uncompressed_block_suffix_bytes: u64,
    pub block_stats_bytes: u64,
    pub block_other_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample: Option<String>,
}

impl FieldReport {
    fn from_field(field: &FieldStatistics) -> Self {
        let terms = field.terms();
        FieldReport {
            name: field.name().to_string(),
            index_options: field.index_options(),
            total_bytes: field.total(),
            percentage: field.percentage(),
            stored_bytes: field.stored_bytes(),
            index_bytes: terms.index_bytes,
            term_count: terms.term_count,
            bytes_per_term: terms.bytes_per_term(),
            term_bytes: terms.term_bytes,
            block_suffix_bytes: terms.block_suffix_bytes,
            uncompressed_block_suffix_bytes: terms.uncompressed_block_suffix_bytes,
            block_stats_bytes: terms.block_stats_bytes,
            block_other_bytes: terms.block_other_bytes,
            sample: field.sample().map(str::to_string),
        }
    }
}

/// A directory under the indices directory that no index name maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreferencedDirectory {
    pub directory_id: String,
    pub bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::TermDictionaryStats;
    use crate::stats::{Corpus, ShardMeasurement};
    use std::path::PathBuf;

    fn calculated_groups() -> BTreeMap<String, IndexGroup> {
        let mut group = IndexGroup::new("logs_0");
        let idx = group.add_shard(ShardDescriptor::new(
            "logs_0-a",
            "id-a",
            PathBuf::from("/i/id-a/0/index"),
            PathBuf::from("/i/id-a/0/translog"),
        ));
        let mut m = ShardMeasurement {
            index_bytes: 300,
            translog_bytes: 7,
            docs: 3,
            segments: 1,
            ..Default::default()
        };
        m.field_mut("message").accumulate_terms(
            &TermDictionaryStats {
                term_bytes: 30,
                term_count: 4,
                ..Default::default()
            },
            IndexOptions::DocsAndFreqs,
        );
        m.field_mut("_source").accumulate_stored_bytes(90);
        m.field_mut("_source").accumulate_sample("{}".to_string());
        group.merge_shard(idx, m);
        group.calculate(&Corpus::new(600));

        BTreeMap::from([("logs_0".to_string(), group)])
    }

    #[test]
    fn test_report_from_groups() {
        let report = NodeReport::new(
            "/i".to_string(),
            600,
            &SamplingConfig::exact(),
            &calculated_groups(),
            vec![],
        );

        assert_eq!(report.sample_size, None);
        let group = report.group("logs_0").unwrap();
        assert_eq!(group.calculated_total_bytes, 120);
        assert_eq!(group.percentage_of_corpus, 50.0);
        assert_eq!(group.shards[0].bytes_per_doc, 100);

        let names: Vec<_> = group.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["_source", "message"]);

        let message = group.field("message").unwrap();
        assert_eq!(message.percentage, 25.0);
        assert_eq!(message.bytes_per_term, 7.5);
        assert_eq!(message.index_options, IndexOptions::DocsAndFreqs);
        assert_eq!(group.field("_source").unwrap().sample.as_deref(), Some("{}"));
    }

    #[test]
    fn test_json_shape() {
        let report = NodeReport::new(
            "/i".to_string(),
            600,
            &SamplingConfig::sampled(100),
            &calculated_groups(),
            vec![UnreferencedDirectory {
                directory_id: "orphan".to_string(),
                bytes: 12,
            }],
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["sample_size"], 100);
        assert_eq!(json["groups"][0]["fields"][1]["index_options"], "DOCS_AND_FREQS");
        assert!(json["groups"][0]["fields"][1].get("sample").is_none());
        assert_eq!(json["unreferenced"][0]["directory_id"], "orphan");

        let back: NodeReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }
}
