use parquetflow::{StorageType, Value, classify, classify_json};
use serde_json::json;

mod common;
use common::payload;

#[test]
fn id_suffix_blocks_epoch_detection() {
    let n = Value::Int(1_700_000_000);
    assert_eq!(classify(&n, Some("createdAt")), StorageType::Timestamp);
    assert_eq!(classify(&n, Some("userId")), StorageType::Int64);
    assert_eq!(classify(&n, Some("USERID")), StorageType::Int64);
    assert_eq!(classify(&n, Some("id")), StorageType::Int64);
}

#[test]
fn epochs_need_a_field_name() {
    assert_eq!(classify(&Value::Int(1_700_000_000), None), StorageType::Int64);
}

#[test]
fn millis_and_micros_epochs_are_timestamps() {
    assert_eq!(
        classify(&Value::Int(1_700_000_000_000), Some("ts")),
        StorageType::Timestamp
    );
    assert_eq!(
        classify(&Value::Int(1_700_000_000_000_000), Some("ts")),
        StorageType::Timestamp
    );
    assert_eq!(classify(&Value::Int(42), Some("count")), StorageType::Int64);
}

#[test]
fn integer_width_picks_column_type() {
    assert_eq!(classify_json(&json!(i64::MAX), Some("n")), StorageType::Int64);
    assert_eq!(
        classify_json(&payload("9223372036854775808"), Some("n")),
        StorageType::Decimal
    );
    let digits38 = "9".repeat(38);
    assert_eq!(classify_json(&payload(&digits38), Some("n")), StorageType::Decimal);
    let digits39 = "9".repeat(39);
    assert_eq!(classify_json(&payload(&digits39), Some("n")), StorageType::Text);
}

#[test]
fn scalar_types() {
    assert_eq!(classify(&Value::Null, Some("x")), StorageType::Text);
    assert_eq!(classify(&Value::Float(21.5), Some("temp")), StorageType::Double);
    assert_eq!(classify(&Value::Bool(true), Some("ok")), StorageType::Boolean);
    assert_eq!(classify(&Value::Text("n/a".into()), Some("s")), StorageType::Text);
    assert_eq!(
        classify(&Value::Text("2024-01-15T10:30:00Z".into()), Some("at")),
        StorageType::Timestamp
    );
    assert_eq!(classify_json(&json!([1, 2]), Some("tags")), StorageType::Json);
    assert_eq!(classify_json(&json!({"k": "v"}), Some("meta")), StorageType::Json);
}

#[test]
fn oversized_float_literal_falls_back_to_text() {
    assert_eq!(classify_json(&payload("1e400"), Some("x")), StorageType::Text);
}

#[test]
fn datetime_strings_ignore_the_id_suffix() {
    assert_eq!(
        classify(&Value::Text("2024-01-15".into()), Some("batchId")),
        StorageType::Timestamp
    );
}
