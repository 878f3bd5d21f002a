//! Tests for job module

use super::*;
use crate::config::OutputOptions;
use crate::error::ErrorKind;
use crate::output::read_partitioned;
use crate::transform::RenameRules;
use crate::types::{CompressionCodec, Record, RecordOrigin};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

/// Source holding records in memory
struct VecSource {
    records: Vec<Value>,
}

#[async_trait]
impl RecordSource for VecSource {
    fn location(&self) -> &str {
        "memory://records"
    }

    async fn read_all(&self) -> Result<SourceBatch> {
        let records = self
            .records
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let record: Record = v.as_object().cloned().unwrap_or_default();
                SourcedRecord::new(RecordOrigin::new("records.json", i), record)
            })
            .collect();
        Ok(SourceBatch {
            records,
            objects_read: 1,
            bytes_read: 0,
        })
    }
}

struct Fixture {
    _dir: TempDir,
    source: PathBuf,
    destination: PathBuf,
}

impl Fixture {
    fn new(lines: &[Value]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("raw");
        let destination = dir.path().join("processed");
        fs::create_dir_all(&source).unwrap();
        write_input(&source.join("part-0.json"), lines);
        Self {
            _dir: dir,
            source,
            destination,
        }
    }

    fn config(&self) -> JobConfig {
        JobConfig::new(
            "raw_to_processed",
            self.source.to_str().unwrap(),
            self.destination.to_str().unwrap(),
        )
        .with_rename_rules(RenameRules::from_pairs([("name", "full_name")]).unwrap())
        .with_drop_fields(["unnecessary_column"])
        .with_partition_keys(["year", "month"])
    }

    async fn read_back(&self) -> Vec<(String, Value)> {
        let location = StorageLocation::source(self.destination.to_str().unwrap()).unwrap();
        read_partitioned(&location)
            .await
            .unwrap()
            .into_iter()
            .map(|r| (r.partition.to_path_string(), Value::Object(r.record)))
            .collect()
    }

    fn files_under(&self, partition: &str) -> Vec<String> {
        let dir = self.destination.join(partition);
        let mut names: Vec<String> = match fs::read_dir(&dir) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
                .filter(|n| n.ends_with(".parquet"))
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }
}

fn write_input(path: &Path, lines: &[Value]) {
    let body: String = lines.iter().map(|l| format!("{l}\n")).collect();
    fs::write(path, body).unwrap();
}

fn people() -> Vec<Value> {
    vec![
        json!({"name": "Ana", "unnecessary_column": 1, "year": 2023, "month": 5}),
        json!({"name": "Bo", "unnecessary_column": 2, "year": 2023, "month": 6}),
        json!({"name": "Cy", "unnecessary_column": 3, "year": 2024, "month": 1}),
        json!({"name": "Di", "unnecessary_column": 4, "year": 2023, "month": 5}),
    ]
}

// ============================================================================
// End-to-End Tests
// ============================================================================

#[tokio::test]
async fn test_rename_drop_partition_example() {
    let fixture = Fixture::new(&[
        json!({"name": "Ana", "unnecessary_column": 1, "year": 2023, "month": 5}),
    ]);

    let result = TransformJob::new(fixture.config()).run().await.unwrap();

    assert_eq!(result.records_read, 1);
    assert_eq!(result.records_written, 1);
    assert_eq!(result.partitions.len(), 1);
    assert_eq!(result.partitions[0].path, "year=2023/month=5");
    assert_eq!(result.partitions[0].columns, 1);

    let rows = fixture.read_back().await;
    assert_eq!(
        rows,
        vec![(
            "year=2023/month=5".to_string(),
            json!({"full_name": "Ana", "year": 2023, "month": 5})
        )]
    );
}

#[tokio::test]
async fn test_partition_directories_match_distinct_tuples() {
    let fixture = Fixture::new(&people());
    let result = TransformJob::new(fixture.config()).run().await.unwrap();

    let paths: Vec<_> = result.partitions.iter().map(|p| p.path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["year=2023/month=5", "year=2023/month=6", "year=2024/month=1"]
    );

    let may: Vec<_> = fixture
        .read_back()
        .await
        .into_iter()
        .filter(|(p, _)| p == "year=2023/month=5")
        .map(|(_, r)| r["full_name"].clone())
        .collect();
    assert_eq!(may, vec![json!("Ana"), json!("Di")]);
}

#[tokio::test]
async fn test_missing_partition_key_writes_nothing() {
    let fixture = Fixture::new(&[
        json!({"name": "Ana", "year": 2023, "month": 5}),
        json!({"name": "Bo", "year": 2023}),
    ]);

    let err = TransformJob::new(fixture.config()).run().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PartitionKeyMissing);
    assert!(err.to_string().contains("'month'"));
    assert!(!fixture.destination.exists());
}

#[tokio::test]
async fn test_type_conflict_fails_job() {
    let fixture = Fixture::new(&[
        json!({"name": "Ana", "age": 30, "year": 2023, "month": 5}),
        json!({"name": "Bo", "age": "thirty", "year": 2023, "month": 5}),
    ]);

    let err = TransformJob::new(fixture.config()).run().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeConflict);
    assert!(!fixture.destination.exists());
}

#[tokio::test]
async fn test_type_conflict_is_per_partition() {
    let fixture = Fixture::new(&[
        json!({"name": "Ana", "age": 30, "year": 2023, "month": 5}),
        json!({"name": "Bo", "age": "thirty", "year": 2024, "month": 5}),
    ]);

    let result = TransformJob::new(fixture.config()).run().await.unwrap();
    assert_eq!(result.partitions.len(), 2);
}

#[tokio::test]
async fn test_malformed_source_fails_job() {
    let fixture = Fixture::new(&people());
    fs::write(fixture.source.join("part-1.json"), "{\"name\": ").unwrap();

    let err = TransformJob::new(fixture.config()).run().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RecordParseError);
    assert!(!fixture.destination.exists());
}

#[tokio::test]
async fn test_missing_source_is_unavailable() {
    let fixture = Fixture::new(&people());
    let mut config = fixture.config();
    config.source_location = fixture.source.join("nope").to_string_lossy().to_string();

    let err = TransformJob::new(config).run().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
}

#[tokio::test]
async fn test_invalid_config_fails_before_reading() {
    let fixture = Fixture::new(&people());
    let config = fixture.config().with_drop_fields(["year"]);

    let err = TransformJob::new(config).run().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_unwritable_destination_is_unavailable() {
    let fixture = Fixture::new(&people());
    fs::write(&fixture.destination, "not a directory").unwrap();

    let err = TransformJob::new(fixture.config()).run().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DestinationUnavailable);
    assert_eq!(err.exit_code(), 1);
    assert!(fixture.source.join("part-0.json").exists());
}

#[tokio::test]
async fn test_file_url_spelling_of_source_is_rejected() {
    let fixture = Fixture::new(&people());
    let mut config = fixture.config().with_partition_keys(Vec::<String>::new());
    config.destination_location = format!("file://{}", fixture.source.display());

    let err = TransformJob::new(config).run().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);

    let remaining: Vec<_> = fs::read_dir(&fixture.source)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(remaining, vec!["part-0.json"]);
}

#[tokio::test]
async fn test_partition_with_only_key_fields_keeps_them() {
    let fixture = Fixture::new(&[
        json!({"year": 2023, "month": 5}),
        json!({"name": "Cy", "year": 2024, "month": 1}),
    ]);

    let result = TransformJob::new(fixture.config()).run().await.unwrap();
    assert_eq!(result.partitions[0].columns, 2);
    assert_eq!(result.partitions[1].columns, 1);

    let rows = fixture.read_back().await;
    assert_eq!(
        rows,
        vec![
            (
                "year=2023/month=5".to_string(),
                json!({"year": 2023, "month": 5})
            ),
            (
                "year=2024/month=1".to_string(),
                json!({"full_name": "Cy", "year": 2024, "month": 1})
            ),
        ]
    );
}

// ============================================================================
// Shard & Write Mode Tests
// ============================================================================

#[tokio::test]
async fn test_max_records_per_file_splits_shards() {
    let lines: Vec<Value> = (0..5)
        .map(|i| json!({"name": format!("p{i}"), "year": 2023, "month": 5}))
        .collect();
    let fixture = Fixture::new(&lines);
    let mut config = fixture.config();
    config.output.max_records_per_file = 2;

    let result = TransformJob::new(config)
        .with_run_id("run1")
        .run()
        .await
        .unwrap();

    assert_eq!(result.files_written, 3);
    assert_eq!(
        fixture.files_under("year=2023/month=5"),
        vec![
            "part-00000-run1.snappy.parquet",
            "part-00001-run1.snappy.parquet",
            "part-00002-run1.snappy.parquet",
        ]
    );
    assert_eq!(fixture.read_back().await.len(), 5);
}

#[tokio::test]
async fn test_codec_tag_in_file_name() {
    let fixture = Fixture::new(&people()[..1]);
    let mut config = fixture.config();
    config.output.compression = CompressionCodec::Zstd;

    TransformJob::new(config)
        .with_run_id("r")
        .run()
        .await
        .unwrap();
    assert_eq!(
        fixture.files_under("year=2023/month=5"),
        vec!["part-00000-r.zstd.parquet"]
    );
}

#[tokio::test]
async fn test_overwrite_replaces_only_written_partitions() {
    let fixture = Fixture::new(&people());
    TransformJob::new(fixture.config())
        .with_run_id("first")
        .run()
        .await
        .unwrap();

    write_input(
        &fixture.source.join("part-0.json"),
        &[json!({"name": "Eve", "year": 2023, "month": 5})],
    );
    let result = TransformJob::new(fixture.config())
        .with_run_id("second")
        .run()
        .await
        .unwrap();

    assert_eq!(result.objects_replaced, 1);
    assert_eq!(
        fixture.files_under("year=2023/month=5"),
        vec!["part-00000-second.snappy.parquet"]
    );
    assert_eq!(
        fixture.files_under("year=2024/month=1"),
        vec!["part-00000-first.snappy.parquet"]
    );
}

#[tokio::test]
async fn test_append_keeps_existing_shards() {
    let fixture = Fixture::new(&people()[..1]);
    let mut config = fixture.config();
    config.output.write_mode = WriteMode::Append;

    TransformJob::new(config.clone())
        .with_run_id("a")
        .run()
        .await
        .unwrap();
    let result = TransformJob::new(config)
        .with_run_id("b")
        .run()
        .await
        .unwrap();

    assert_eq!(result.objects_replaced, 0);
    assert_eq!(
        fixture.files_under("year=2023/month=5"),
        vec!["part-00000-a.snappy.parquet", "part-00000-b.snappy.parquet"]
    );
    assert_eq!(fixture.read_back().await.len(), 2);
}

#[tokio::test]
async fn test_success_marker() {
    let fixture = Fixture::new(&people());
    TransformJob::new(fixture.config()).run().await.unwrap();
    assert!(fixture.destination.join(SUCCESS_MARKER).exists());

    let other = Fixture::new(&people());
    let config = other.config().with_output(OutputOptions {
        write_success_marker: false,
        ..OutputOptions::default()
    });
    TransformJob::new(config).run().await.unwrap();
    assert!(!other.destination.join(SUCCESS_MARKER).exists());
}

#[tokio::test]
async fn test_rerun_yields_identical_membership() {
    let fixture = Fixture::new(&people());
    let mut first_config = fixture.config();
    first_config.destination_location = fixture
        .destination
        .join("a")
        .to_string_lossy()
        .to_string();
    let mut second_config = fixture.config();
    second_config.destination_location = fixture
        .destination
        .join("b")
        .to_string_lossy()
        .to_string();

    TransformJob::new(first_config).run().await.unwrap();
    TransformJob::new(second_config).run().await.unwrap();

    let membership = |dir: &str| {
        let location =
            StorageLocation::source(fixture.destination.join(dir).to_str().unwrap()).unwrap();
        async move {
            read_partitioned(&location)
                .await
                .unwrap()
                .into_iter()
                .map(|r| (r.partition.to_path_string(), r.record["full_name"].to_string()))
                .collect::<BTreeSet<_>>()
        }
    };
    assert_eq!(membership("a").await, membership("b").await);
}

#[tokio::test]
async fn test_retained_partition_columns() {
    let fixture = Fixture::new(&people()[..1]);
    let config = fixture.config().with_output(OutputOptions {
        retain_partition_columns: true,
        ..OutputOptions::default()
    });

    let result = TransformJob::new(config).run().await.unwrap();
    assert_eq!(result.partitions[0].columns, 3);

    let rows = fixture.read_back().await;
    assert_eq!(rows[0].1, json!({"full_name": "Ana", "year": 2023, "month": 5}));
}

// ============================================================================
// Custom Source Tests
// ============================================================================

#[tokio::test]
async fn test_run_with_custom_source_unpartitioned() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let config = JobConfig::new("memory", "memory://records", out.to_str().unwrap())
        .with_drop_fields(["secret"]);
    let source = VecSource {
        records: vec![
            json!({"id": 1, "secret": "x"}),
            json!({"id": 2, "tags": ["a"]}),
        ],
    };

    let job = TransformJob::new(config).with_run_id("mem");
    let result = job
        .run_with(&source, || StorageLocation::destination(out.to_str().unwrap()))
        .await
        .unwrap();

    assert_eq!(result.source_location, "memory://records");
    assert_eq!(result.partitions.len(), 1);
    assert_eq!(result.partitions[0].path, "");
    assert_eq!(
        result.partitions[0].files,
        vec!["part-00000-mem.snappy.parquet"]
    );
    assert!(out.join("part-00000-mem.snappy.parquet").exists());
}

#[tokio::test]
async fn test_empty_source_writes_only_marker() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let config = JobConfig::new("empty", "memory://records", out.to_str().unwrap())
        .with_partition_keys(["year"]);
    let source = VecSource { records: vec![] };

    let result = TransformJob::new(config)
        .run_with(&source, || StorageLocation::destination(out.to_str().unwrap()))
        .await
        .unwrap();

    assert_eq!(result.records_written, 0);
    assert!(result.partitions.is_empty());
    assert!(out.join(SUCCESS_MARKER).exists());
}

#[test]
fn test_result_serializes() {
    let result = TransformResult {
        job_name: "j".to_string(),
        run_id: "r".to_string(),
        source_location: "s".to_string(),
        destination_location: "d".to_string(),
        objects_read: 1,
        records_read: 2,
        records_written: 2,
        files_written: 1,
        bytes_written: 10,
        objects_replaced: 0,
        partitions: vec![PartitionReport {
            path: "year=2023".to_string(),
            records: 2,
            columns: 1,
            files: vec!["year=2023/part-00000-r.snappy.parquet".to_string()],
        }],
        duration_ms: 5,
    };

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["partitions"][0]["path"], json!("year=2023"));
    assert_eq!(value["records_written"], json!(2));
}

#[test]
fn test_run_id_format() {
    let job = TransformJob::new(JobConfig::new("j", "a", "b"));
    assert_eq!(job.run_id().len(), "20261016T101500123".len());
    assert!(job.run_id().contains('T'));
}
