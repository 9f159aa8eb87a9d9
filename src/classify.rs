//! Type classification for payload values.
//!
//! [`classify`] is total over [`Value`]: every value maps to exactly one
//! [`StorageType`]. The rules, in order:
//!
//! 1. null → `VARCHAR`, so the column can later hold anything as text
//! 2. string → `TIMESTAMP` if it has a recognized datetime shape, else `VARCHAR`
//! 3. integer → `TIMESTAMP` if it looks like an epoch and the field name does
//!    not end in `id`; `BIGINT` inside the `i64` range; `DECIMAL(38,0)` up to
//!    38 digits beyond it; `VARCHAR` past that so the digits survive
//! 4. non-integral number → `DOUBLE`
//! 5. boolean → `BOOLEAN`
//! 6. array / object → `JSON`

use crate::schema::{DECIMAL_PRECISION, StorageType};
use crate::timestamp::{is_datetime_string, looks_like_epoch};
use crate::value::{Value, digit_count};

/// Choose the storage type for a column from its first observed value.
///
/// Epoch detection on integers only applies when a field name is known and
/// does not end in `id` (case-insensitive): `userId: 1700000000` is an
/// identifier, `createdAt: 1700000000` is a timestamp.
#[must_use]
pub fn classify(value: &Value, field_name: Option<&str>) -> StorageType {
    match value {
        Value::Null => StorageType::Text,
        Value::Text(s) if is_datetime_string(s) => StorageType::Timestamp,
        Value::Text(_) => StorageType::Text,
        Value::Int(n) if epoch_allowed(field_name) && looks_like_epoch(*n) => StorageType::Timestamp,
        Value::Int(_) => StorageType::Int64,
        Value::Decimal(digits) if digit_count(digits) <= usize::from(DECIMAL_PRECISION) => {
            StorageType::Decimal
        }
        Value::Decimal(_) => StorageType::Text,
        Value::Float(_) => StorageType::Double,
        Value::Bool(_) => StorageType::Boolean,
        Value::Json(_) => StorageType::Json,
    }
}

/// Convenience wrapper that decodes a JSON value first.
#[must_use]
pub fn classify_json(value: &serde_json::Value, field_name: Option<&str>) -> StorageType {
    classify(&Value::from_json(value), field_name)
}

fn epoch_allowed(field_name: Option<&str>) -> bool {
    field_name.is_some_and(|name| !name.to_ascii_lowercase().ends_with("id"))
}
