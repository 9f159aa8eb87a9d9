#![allow(dead_code)]

use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef};
use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquetflow::Record;
use serde_json::Value as JsonValue;
use std::fs::File;
use std::path::Path;

/// Read a whole Parquet artifact back into one batch.
pub fn read_parquet(path: &Path) -> Result<RecordBatch> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let batches = builder
        .build()?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(concat_batches(&schema, &batches)?)
}

/// Typed view of a named column.
pub fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    let array: &ArrayRef = batch
        .column_by_name(name)
        .with_context(|| format!("missing column {name}"))?;
    array
        .as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("column {name} has type {}", array.data_type()))
}

/// Column names in schema order.
pub fn column_names(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}

/// A record with the given id and payload.
pub fn record(event_id: &str, payload: JsonValue) -> Record {
    Record {
        data_core_id: "core-1".into(),
        event_type: "reading.recorded.0".into(),
        flow_type: "sensor.0".into(),
        time_bucket: "20240115100000".into(),
        valid_time: "2024-01-15T10:30:00.000Z".into(),
        ..Record::with_payload(event_id, payload)
    }
}

/// Parse a payload from JSON text, for literals `json!` cannot express.
pub fn payload(text: &str) -> JsonValue {
    serde_json::from_str(text).unwrap()
}
