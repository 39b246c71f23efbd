use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::{Builder, TempDir};
use uuid::Uuid;

use shardstat::analyzer::NodeAnalyzer;
use shardstat::cli::output::{render_human, render_json};
use shardstat::config::AnalysisConfig;
use shardstat::error::ShardStatError;
use shardstat::metadata::{CborCodec, MetadataMap, MetadataValue};
use shardstat::segment::{DocAddress, Document, IndexOptions, IndexWriter};
use shardstat::storage::FileStorage;

fn map(entries: Vec<(&str, MetadataValue)>) -> MetadataValue {
    MetadataValue::from(entries.into_iter().collect::<MetadataMap>())
}

/// A state record with flat `index.*` settings.
fn index_record(name: &str, uuid: &str) -> Vec<u8> {
    let settings = map(vec![
        ("index.uuid", MetadataValue::from(uuid)),
        ("index.provided_name", MetadataValue::from(name)),
    ]);
    let root = map(vec![(name, map(vec![("settings", settings)]))]);
    CborCodec.encode(&root).unwrap()
}

/// A state record with nested `index` settings.
fn nested_index_record(name: &str, uuid: &str) -> Vec<u8> {
    let index = map(vec![
        ("uuid", MetadataValue::from(uuid)),
        ("provided_name", MetadataValue::from(name)),
    ]);
    let root = map(vec![(
        name,
        map(vec![("settings", map(vec![("index", index)]))]),
    )]);
    CborCodec.encode(&root).unwrap()
}

fn writer(path: &Path) -> IndexWriter {
    let storage = Arc::new(FileStorage::new(path, Default::default()).unwrap());
    IndexWriter::open(storage).unwrap()
}

fn write_state(root: &Path, records: Vec<Vec<u8>>) -> PathBuf {
    let state = root.join("_state");
    let mut writer = writer(&state);
    for record in records {
        writer
            .add_document(Document::builder().add_binary("data", record).build())
            .unwrap();
    }
    writer.commit().unwrap();
    state
}

fn index_dir(root: &Path, uuid: &str) -> PathBuf {
    root.join("indices").join(uuid).join("0").join("index")
}

fn write_index(root: &Path, uuid: &str, docs: usize) -> Vec<DocAddress> {
    let mut writer = writer(&index_dir(root, uuid));
    let addresses = (0..docs)
        .map(|i| {
            writer
                .add_document(
                    Document::builder()
                        .add_text("message", format!("user {i:04} logged in"))
                        .add_text("host", "web-01")
                        .add_integer("status", 200)
                        .add_binary("_source", format!("{{\"n\":{i:04}}}").into_bytes())
                        .build(),
                )
                .unwrap()
        })
        .collect();
    writer.commit().unwrap();
    addresses
}

fn time_partitioned_node() -> TempDir {
    let dir = Builder::new().prefix("test_node").tempdir().unwrap();
    let root = dir.path();

    write_state(
        root,
        vec![
            index_record("<interset_access_rawdata_01p-{2020-10-w42}>", "u42"),
            index_record("<interset_access_rawdata_01p-{2020-10-w43}>", "u43"),
            index_record("<interset_access_rawdata_0-{2020-10-w44}>", "u44"),
            nested_index_record("entity_stats_0_2020-12-11_00_48_35", "e1"),
            index_record("entity_stats_0_2020-12-12_03_26_50", "e2"),
        ],
    );
    write_index(root, "u42", 20);
    write_index(root, "u43", 30);
    write_index(root, "u44", 5);
    write_index(root, "e1", 8);
    write_index(root, "e2", 12);

    dir
}

#[test]
fn test_groups_and_ordering() {
    let dir = time_partitioned_node();
    let report = NodeAnalyzer::new(AnalysisConfig::default())
        .analyze(dir.path().join("_state"))
        .unwrap();

    let keys: Vec<_> = report.groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "entity_stats_0",
            "interset_access_rawdata_0",
            "interset_access_rawdata_01p"
        ]
    );

    let access = report.group("interset_access_rawdata_01p").unwrap();
    let shards: Vec<_> = access.shards.iter().map(|s| s.directory_id.as_str()).collect();
    assert_eq!(shards, vec!["u42", "u43"]);
    assert_eq!(access.docs, 50);

    let entity = report.group("entity_stats_0").unwrap();
    assert_eq!(entity.shards.len(), 2);
    assert_eq!(entity.docs, 20);

    let fields: Vec<_> = entity.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(fields, vec!["_source", "host", "message", "status"]);
}

#[test]
fn test_field_breakdown() {
    let dir = time_partitioned_node();
    let report = NodeAnalyzer::new(AnalysisConfig::default())
        .analyze(dir.path().join("_state"))
        .unwrap();
    let group = report.group("interset_access_rawdata_0").unwrap();

    // "user 0000 logged in" is 19 bytes
    let message = group.field("message").unwrap();
    assert_eq!(message.stored_bytes, 5 * 19);
    assert_eq!(message.index_options, IndexOptions::DocsAndFreqs);
    assert!(message.term_count > 0);
    assert_eq!(
        message.total_bytes,
        message.stored_bytes
            + message.index_bytes
            + message.term_bytes
            + message.block_suffix_bytes
            + message.uncompressed_block_suffix_bytes
            + message.block_stats_bytes
            + message.block_other_bytes
    );

    let status = group.field("status").unwrap();
    assert_eq!(status.stored_bytes, 5);

    let source = group.field("_source").unwrap();
    assert_eq!(source.index_options, IndexOptions::None);
    assert_eq!(source.term_count, 0);
    assert_eq!(source.total_bytes, source.stored_bytes);
}

#[test]
fn test_totals_and_percentages() {
    let dir = time_partitioned_node();
    let report = NodeAnalyzer::new(AnalysisConfig::default())
        .analyze(dir.path().join("_state"))
        .unwrap();

    let mut corpus_share = 0.0;
    for group in &report.groups {
        let field_total: u64 = group.fields.iter().map(|f| f.total_bytes).sum();
        assert_eq!(group.calculated_total_bytes, field_total);

        let percentage_sum: f64 = group.fields.iter().map(|f| f.percentage).sum();
        assert!((percentage_sum - 100.0).abs() < 1e-6 * 100.0);

        let shard_bytes: u64 = group.shards.iter().map(|s| s.index_bytes).sum();
        assert_eq!(group.index_bytes, shard_bytes);
        corpus_share += group.percentage_of_corpus;
    }
    assert!(corpus_share > 0.0 && corpus_share <= 100.0 + 1e-9);
}

#[test]
fn test_runs_are_idempotent() {
    let dir = time_partitioned_node();
    let analyzer = NodeAnalyzer::new(AnalysisConfig::default());

    let first = analyzer.analyze(dir.path().join("_state")).unwrap();
    let second = analyzer.analyze(dir.path().join("_state")).unwrap();

    assert_eq!(render_human(&first), render_human(&second));
    assert_eq!(
        render_json(&first, false).unwrap(),
        render_json(&second, false).unwrap()
    );
}

#[test]
fn test_parallel_report_matches_sequential() {
    let dir = time_partitioned_node();
    let state = dir.path().join("_state");

    let mut config = AnalysisConfig::default();
    config.include_sample_docs = true;
    let sequential = NodeAnalyzer::new(config.clone()).analyze(&state).unwrap();

    config.parallel = true;
    config.threads = Some(4);
    let parallel = NodeAnalyzer::new(config).analyze(&state).unwrap();

    assert_eq!(render_json(&sequential, true).unwrap(), render_json(&parallel, true).unwrap());
}

#[test]
fn test_samples_are_rendered() {
    let dir = time_partitioned_node();
    let mut config = AnalysisConfig::default();
    config.include_sample_docs = true;

    let report = NodeAnalyzer::new(config)
        .analyze(dir.path().join("_state"))
        .unwrap();
    let group = report.group("interset_access_rawdata_01p").unwrap();

    assert_eq!(group.field("_source").unwrap().sample.as_deref(), Some("{\"n\":0000}"));
    assert_eq!(group.field("status").unwrap().sample.as_deref(), Some("200"));
    assert_eq!(
        group.field("message").unwrap().sample.as_deref(),
        Some("user 0000 logged in")
    );
}

#[test]
fn test_malformed_and_settingless_records_are_skipped() {
    let dir = Builder::new().prefix("test_malformed").tempdir().unwrap();
    let root = dir.path();

    let cluster = map(vec![(
        "meta-data",
        map(vec![("cluster_uuid", MetadataValue::from("c1"))]),
    )]);
    write_state(
        root,
        vec![
            CborCodec.encode(&cluster).unwrap(),
            vec![0xff, 0x00, 0x13],
            index_record("metrics", "m1"),
        ],
    );
    write_index(root, "m1", 3);

    let report = NodeAnalyzer::new(AnalysisConfig::default())
        .analyze(root.join("_state"))
        .unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].name, "metrics");
    assert_eq!(report.groups[0].docs, 3);
}

#[test]
fn test_missing_segment_store_contributes_nothing() {
    let dir = Builder::new().prefix("test_missing").tempdir().unwrap();
    let root = dir.path();

    write_state(
        root,
        vec![index_record("logs_0-a", "present"), index_record("logs_0-b", "gone")],
    );
    write_index(root, "present", 4);

    let report = NodeAnalyzer::new(AnalysisConfig::default())
        .analyze(root.join("_state"))
        .unwrap();
    let group = report.group("logs_0").unwrap();

    let gone = &group.shards[1];
    assert_eq!(gone.directory_id, "gone");
    assert_eq!(gone.index_bytes, 0);
    assert_eq!(gone.translog_bytes, 0);
    assert_eq!(gone.docs, 0);
    assert_eq!(gone.bytes_per_doc, 0);
    assert_eq!(group.docs, 4);
}

#[test]
fn test_corrupt_segment_store_keeps_disk_usage() {
    let dir = Builder::new().prefix("test_corrupt").tempdir().unwrap();
    let root = dir.path();

    write_state(root, vec![index_record("broken", "b1")]);
    let index = index_dir(root, "b1");
    fs::create_dir_all(&index).unwrap();
    fs::write(index.join("segments.json"), b"not json").unwrap();

    let report = NodeAnalyzer::new(AnalysisConfig::default())
        .analyze(root.join("_state"))
        .unwrap();
    let group = report.group("broken").unwrap();

    assert_eq!(group.index_bytes, 8);
    assert_eq!(group.docs, 0);
    assert!(group.fields.is_empty());
    assert_eq!(group.calculated_total_bytes, 0);
}

#[test]
fn test_deleted_documents() {
    let dir = Builder::new().prefix("test_deletes").tempdir().unwrap();
    let root = dir.path();

    write_state(root, vec![index_record("audit", "a1")]);
    let addresses = write_index(root, "a1", 10);

    let mut writer = writer(&index_dir(root, "a1"));
    writer.delete_document(&addresses[0]).unwrap();
    writer.delete_document(&addresses[7]).unwrap();
    writer.commit().unwrap();

    let report = NodeAnalyzer::new(AnalysisConfig::default())
        .analyze(root.join("_state"))
        .unwrap();
    let group = report.group("audit").unwrap();

    assert_eq!(group.docs, 8);
    assert_eq!(group.deleted_docs, 2);
    assert_eq!(group.field("message").unwrap().stored_bytes, 8 * 19);
}

#[test]
fn test_translog_and_unreferenced_directories() {
    let dir = Builder::new().prefix("test_translog").tempdir().unwrap();
    let root = dir.path();

    let directory_id = Uuid::new_v4().to_string();
    write_state(root, vec![index_record("events", &directory_id)]);
    write_index(root, &directory_id, 2);

    let translog = root
        .join("indices")
        .join(&directory_id)
        .join("0")
        .join("translog");
    fs::create_dir_all(&translog).unwrap();
    fs::write(translog.join("translog-1.tlog"), vec![0u8; 64]).unwrap();

    for orphan in ["b-orphan", "a-orphan"] {
        let path = root.join("indices").join(orphan);
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("data"), vec![0u8; 16]).unwrap();
    }

    let report = NodeAnalyzer::new(AnalysisConfig::default())
        .analyze(root.join("_state"))
        .unwrap();

    assert_eq!(report.group("events").unwrap().translog_bytes, 64);
    let orphans: Vec<_> = report
        .unreferenced
        .iter()
        .map(|d| (d.directory_id.as_str(), d.bytes))
        .collect();
    assert_eq!(orphans, vec![("a-orphan", 16), ("b-orphan", 16)]);
}

#[test]
fn test_fatal_errors() {
    let dir = Builder::new().prefix("test_fatal").tempdir().unwrap();
    let analyzer = NodeAnalyzer::new(AnalysisConfig::default());

    let err = analyzer.analyze(dir.path().join("nodes")).unwrap_err();
    assert!(matches!(err, ShardStatError::InputShape(_)));

    let state = write_state(dir.path(), vec![]);
    let err = analyzer.analyze(&state).unwrap_err();
    assert!(matches!(err, ShardStatError::EmptyResult(_)));
}
