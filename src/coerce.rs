//! Value coercion against a column's fixed type.
//!
//! The coercer only handles the conversions the store cannot infer on its
//! own: epoch numbers bound for `TIMESTAMP` columns become ISO-8601 instants,
//! and anything bound for a `JSON` column becomes JSON text. Every other
//! value passes through untouched and is adapted by the store's native
//! conversion rules (see [`crate::store`]).

use crate::schema::StorageType;
use crate::timestamp::{epoch_f64_to_iso8601, epoch_to_iso8601, looks_like_epoch, looks_like_epoch_f64};
use crate::value::Value;

/// Prepare `value` for a column of type `column_type`.
///
/// - `TIMESTAMP`: epoch integers (seconds below 10^12, milliseconds below
///   10^15, microseconds above) and epoch-sized floats become ISO-8601
///   strings; datetime strings are not reformatted
/// - `JSON`: the value is re-serialized to JSON text; null stays null
/// - everything else is returned unchanged
#[must_use]
pub fn coerce(value: Value, column_type: StorageType) -> Value {
    match (column_type, value) {
        (StorageType::Timestamp, Value::Int(n)) if looks_like_epoch(n) => {
            epoch_to_iso8601(n).map_or(Value::Int(n), Value::Text)
        }
        (StorageType::Timestamp, Value::Float(f)) if looks_like_epoch_f64(f) => {
            epoch_f64_to_iso8601(f).map_or(Value::Float(f), Value::Text)
        }
        (StorageType::Json, Value::Null) => Value::Null,
        (StorageType::Json, value) => Value::Text(value.to_json_string()),
        (_, value) => value,
    }
}
