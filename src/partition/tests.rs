//! Partitioner tests

use super::*;
use crate::error::{Error, ErrorKind};
use crate::types::{Record, RecordOrigin, SourcedRecord};
use serde_json::{json, Value};
use std::collections::BTreeSet;

fn sourced(index: usize, value: Value) -> SourcedRecord {
    let record: Record = match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    };
    SourcedRecord::new(RecordOrigin::new("raw/input.json", index), record)
}

#[test]
fn test_partition_path_from_record() {
    let partitioner = Partitioner::new(["year", "month"]);
    let path = partitioner
        .partition_path(&sourced(0, json!({"full_name": "Ana", "year": 2023, "month": 5})))
        .unwrap();
    assert_eq!(path.to_path_string(), "year=2023/month=5");
}

#[test]
fn test_missing_key_fails() {
    let partitioner = Partitioner::new(["year", "month"]);
    let err = partitioner
        .partition_path(&sourced(4, json!({"year": 2023})))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PartitionKeyMissing);
    match err {
        Error::PartitionKeyMissing { key, object, record } => {
            assert_eq!(key, "month");
            assert_eq!(object, "raw/input.json");
            assert_eq!(record, 4);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_null_key_counts_as_missing() {
    let partitioner = Partitioner::new(["year"]);
    let err = partitioner
        .partition_path(&sourced(0, json!({"year": null})))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PartitionKeyMissing);
}

#[test]
fn test_nested_key_value_rejected() {
    let partitioner = Partitioner::new(["tags"]);
    let err = partitioner
        .partition_path(&sourced(0, json!({"tags": ["a"]})))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPartitionValue);
}

#[test]
fn test_split_groups_and_strips_columns() {
    let partitioner = Partitioner::new(["year", "month"]);
    let groups = partitioner
        .split(vec![
            sourced(0, json!({"id": 1, "year": 2023, "month": 5})),
            sourced(1, json!({"id": 2, "year": 2024, "month": 1})),
            sourced(2, json!({"id": 3, "year": 2023, "month": 5})),
        ])
        .unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups.record_count(), 3);

    let may = PartitionPath::new()
        .with_segment("year", "2023")
        .with_segment("month", "5");
    let records = groups.get(&may).unwrap();
    let ids: Vec<_> = records.iter().map(|r| r.record["id"].clone()).collect();
    assert_eq!(ids, vec![json!(1), json!(3)]);
    assert!(!records[0].record.contains_key("year"));
}

#[test]
fn test_split_retains_columns_when_asked() {
    let partitioner = Partitioner::new(["year"]).with_retained_columns(true);
    let groups = partitioner
        .split(vec![sourced(0, json!({"id": 1, "year": 2023}))])
        .unwrap();
    let (_, records) = groups.iter().next().unwrap();
    assert_eq!(records[0].record["year"], json!(2023));
}

#[test]
fn test_split_keeps_columns_of_key_only_partition() {
    let partitioner = Partitioner::new(["year"]);
    let groups = partitioner
        .split(vec![
            sourced(0, json!({"year": 2023})),
            sourced(1, json!({"id": 2, "year": 2024})),
            sourced(2, json!({"year": 2024})),
        ])
        .unwrap();

    let only_keys = groups
        .get(&PartitionPath::new().with_segment("year", "2023"))
        .unwrap();
    assert_eq!(Value::Object(only_keys[0].record.clone()), json!({"year": 2023}));

    let mixed = groups
        .get(&PartitionPath::new().with_segment("year", "2024"))
        .unwrap();
    assert_eq!(Value::Object(mixed[0].record.clone()), json!({"id": 2}));
    assert!(mixed[1].record.is_empty());
}

#[test]
fn test_partition_set_equals_distinct_tuples() {
    let partitioner = Partitioner::new(["region", "active"]);
    let inputs = vec![
        json!({"region": "eu", "active": true}),
        json!({"region": "us", "active": false}),
        json!({"region": "eu", "active": true}),
        json!({"region": "eu", "active": false}),
    ];

    let expected: BTreeSet<(String, String)> = inputs
        .iter()
        .map(|v| (v["region"].as_str().unwrap().to_string(), v["active"].to_string()))
        .collect();

    let groups = partitioner
        .split(
            inputs
                .into_iter()
                .enumerate()
                .map(|(i, v)| sourced(i, v))
                .collect(),
        )
        .unwrap();

    let observed: BTreeSet<(String, String)> = groups
        .paths()
        .map(|p| {
            (
                p.get("region").unwrap().to_string(),
                p.get("active").unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(observed, expected);
}

#[test]
fn test_no_keys_single_partition() {
    let partitioner = Partitioner::new(Vec::<String>::new());
    let groups = partitioner
        .split(vec![sourced(0, json!({"a": 1})), sourced(1, json!({"b": 2}))])
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert!(groups.paths().next().unwrap().is_empty());
}
