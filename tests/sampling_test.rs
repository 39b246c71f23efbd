use std::path::Path;
use std::sync::Arc;

use tempfile::Builder;

use shardstat::analyzer::NodeAnalyzer;
use shardstat::config::{AnalysisConfig, SamplingConfig};
use shardstat::report::GroupReport;
use shardstat::segment::{Document, IndexWriter};
use shardstat::storage::FileStorage;

/// Write `segments` commits of `docs_per_segment` documents each.
fn write_store(path: &Path, segments: usize, docs_per_segment: usize) {
    let storage = Arc::new(FileStorage::new(path, Default::default()).unwrap());
    let mut writer = IndexWriter::open(storage).unwrap();
    for s in 0..segments {
        for d in 0..docs_per_segment {
            writer
                .add_document(
                    Document::builder()
                        .add_text("message", format!("segment {s:02} document {d:05}"))
                        .add_unstored_text("body", "indexed only")
                        .add_float("latency", 0.25)
                        .build(),
                )
                .unwrap();
        }
        writer.commit().unwrap();
    }
}

fn analyze(path: &Path, sampling: SamplingConfig) -> GroupReport {
    let mut config = AnalysisConfig::default();
    config.sampling = sampling;
    let report = NodeAnalyzer::new(config)
        .analyze_segment_store(path)
        .unwrap();
    report.groups.into_iter().next().unwrap()
}

#[test]
fn test_sample_covering_segment_equals_exact() {
    let dir = Builder::new().prefix("test_sampling").tempdir().unwrap();
    write_store(dir.path(), 2, 40);

    let exact = analyze(dir.path(), SamplingConfig::exact());
    let sampled = analyze(dir.path(), SamplingConfig::sampled(40));

    assert_eq!(exact.fields, sampled.fields);
    assert_eq!(exact.calculated_total_bytes, sampled.calculated_total_bytes);
}

#[test]
fn test_sampled_estimate_extrapolates() {
    let dir = Builder::new().prefix("test_sampling").tempdir().unwrap();
    write_store(dir.path(), 3, 100);

    let exact = analyze(dir.path(), SamplingConfig::exact());
    let sampled = analyze(dir.path(), SamplingConfig::sampled(10));

    // "segment 00 document 00000" is 25 bytes in every document
    let message = sampled.field("message").unwrap();
    assert_eq!(message.stored_bytes, 3 * 100 * 25);
    assert_eq!(message.stored_bytes, exact.field("message").unwrap().stored_bytes);
    assert_eq!(sampled.field("latency").unwrap().stored_bytes, 300);
    assert_eq!(sampled.docs, 300);
    assert_eq!(sampled.segments, 3);
}

#[test]
fn test_term_statistics_are_never_sampled() {
    let dir = Builder::new().prefix("test_sampling").tempdir().unwrap();
    write_store(dir.path(), 1, 200);

    let exact = analyze(dir.path(), SamplingConfig::exact());
    let sampled = analyze(dir.path(), SamplingConfig::sampled(5));

    for field in ["message", "body"] {
        let e = exact.field(field).unwrap();
        let s = sampled.field(field).unwrap();
        assert_eq!(e.term_count, s.term_count);
        assert_eq!(e.term_bytes, s.term_bytes);
        assert_eq!(e.index_bytes, s.index_bytes);
        assert_eq!(e.block_suffix_bytes, s.block_suffix_bytes);
    }

    let body = sampled.field("body").unwrap();
    assert_eq!(body.stored_bytes, 0);
    assert!(body.term_count > 0);
}
