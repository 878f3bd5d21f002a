//! Integration tests on the local filesystem
//!
//! Tests the full end-to-end flow: YAML job config → JSON source → Parquet output

use pretty_assertions::assert_eq;
use record_projector::cli::failure_message;
use record_projector::output::read_partitioned;
use record_projector::storage::StorageLocation;
use record_projector::{ErrorKind, JobConfig, TransformJob};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

fn write_lines(path: &Path, lines: &[Value]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let body: String = lines.iter().map(|l| format!("{l}\n")).collect();
    fs::write(path, body).unwrap();
}

fn job_yaml(source: &Path, destination: &Path, extra: &str) -> String {
    format!(
        r#"
job_name: raw_to_processed
source_location: {}
destination_location: {}
rename_rules:
  name: full_name
drop_field_names:
  - unnecessary_column
partition_keys:
  - year
  - month
{extra}
"#,
        source.display(),
        destination.display()
    )
}

async fn read_back(destination: &Path) -> Vec<(String, Value)> {
    let location = StorageLocation::source(destination.to_str().unwrap()).unwrap();
    read_partitioned(&location)
        .await
        .unwrap()
        .into_iter()
        .map(|r| (r.partition.to_path_string(), Value::Object(r.record)))
        .collect()
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn test_sample_job_config_is_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("jobs/raw_to_processed.yaml");
    let config = JobConfig::from_file(path).unwrap();

    assert_eq!(config.job_name, "raw_to_processed");
    assert_eq!(config.source_location, "s3://my-data-lake-bucket25/raw/");
    assert_eq!(config.rename_rules.get("name"), Some("full_name"));
    assert_eq!(config.partition_keys, vec!["year", "month"]);
    config.validate().unwrap();
}

// ============================================================================
// End-to-End Tests
// ============================================================================

#[tokio::test]
async fn test_job_from_yaml_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("raw");
    let destination = dir.path().join("processed");

    write_lines(
        &source.join("2023/05/events.json"),
        &[
            json!({"name": "Ana", "unnecessary_column": 1, "year": 2023, "month": 5}),
            json!({"name": "Bo", "unnecessary_column": 2, "year": 2023, "month": 5, "city": "Lisbon"}),
        ],
    );
    // Pretty-printed documents in a second object
    fs::write(
        source.join("late.json"),
        "{\n  \"name\": \"Cy\",\n  \"year\": 2024,\n  \"month\": 1\n}\n",
    )
    .unwrap();
    fs::write(source.join("_SUCCESS"), "").unwrap();

    let config = JobConfig::from_yaml(&job_yaml(&source, &destination, "")).unwrap();
    let result = TransformJob::new(config).run().await.unwrap();

    assert_eq!(result.objects_read, 2);
    assert_eq!(result.records_read, 3);
    assert_eq!(result.records_written, 3);

    let rows = read_back(&destination).await;
    assert_eq!(
        rows,
        vec![
            (
                "year=2023/month=5".to_string(),
                json!({"full_name": "Ana", "city": null, "year": 2023, "month": 5})
            ),
            (
                "year=2023/month=5".to_string(),
                json!({"full_name": "Bo", "city": "Lisbon", "year": 2023, "month": 5})
            ),
            (
                "year=2024/month=1".to_string(),
                json!({"full_name": "Cy", "year": 2024, "month": 1})
            ),
        ]
    );
    assert!(destination.join("_SUCCESS").exists());
}

#[tokio::test]
async fn test_string_partition_values_and_nested_fields() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("raw");
    let destination = dir.path().join("processed");

    write_lines(
        &source.join("a.json"),
        &[
            json!({"id": 1, "region": "eu-west", "address": {"city": "Porto", "zip": "4000"}}),
            json!({"id": 2, "region": "us-east", "address": {"city": "Boston", "zip": "02108"}}),
        ],
    );

    let yaml = format!(
        r#"
job_name: nested
source_location: {}
destination_location: {}
rename_rules:
  address.city: address.town
drop_field_names:
  - address.zip
partition_keys:
  - region
"#,
        source.display(),
        destination.display()
    );
    let config = JobConfig::from_yaml(&yaml).unwrap();
    TransformJob::new(config).run().await.unwrap();

    let rows = read_back(&destination).await;
    assert_eq!(
        rows,
        vec![
            (
                "region=eu-west".to_string(),
                json!({"id": 1, "address": {"town": "Porto"}, "region": "eu-west"})
            ),
            (
                "region=us-east".to_string(),
                json!({"id": 2, "address": {"town": "Boston"}, "region": "us-east"})
            ),
        ]
    );
}

#[tokio::test]
async fn test_missing_partition_key_reports_failure() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("raw");
    let destination = dir.path().join("processed");

    write_lines(
        &source.join("a.json"),
        &[json!({"name": "Ana", "year": 2023})],
    );

    let config = JobConfig::from_yaml(&job_yaml(&source, &destination, "")).unwrap();
    let err = TransformJob::new(config).run().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PartitionKeyMissing);
    assert_eq!(err.exit_code(), 1);
    assert_eq!(failure_message(&err)["error"]["kind"], json!("PartitionKeyMissing"));
    assert!(!destination.exists());
}

#[tokio::test]
async fn test_sharded_gzip_output() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("raw");
    let destination = dir.path().join("processed");

    let lines: Vec<Value> = (0..7)
        .map(|i| json!({"name": format!("n{i}"), "year": 2023, "month": 5, "score": i}))
        .collect();
    write_lines(&source.join("a.json"), &lines);

    let extra = "output:\n  compression: gzip\n  max_records_per_file: 3\n";
    let config = JobConfig::from_yaml(&job_yaml(&source, &destination, extra)).unwrap();
    let result = TransformJob::new(config).run().await.unwrap();

    assert_eq!(result.files_written, 3);
    assert!(result.partitions[0]
        .files
        .iter()
        .all(|f| f.ends_with(".gz.parquet")));

    let scores: Vec<Value> = read_back(&destination)
        .await
        .into_iter()
        .map(|(_, r)| r["score"].clone())
        .collect();
    assert_eq!(scores, (0..7).map(|i| json!(i)).collect::<Vec<_>>());
}
