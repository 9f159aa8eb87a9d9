//! Native value conversion for typed columns.
//!
//! These are the store's own casting rules, applied after the coercer.
//! Null is accepted by every column. Anything not listed is an error and
//! fails the whole row.
//!
//! | column          | accepts                                                         |
//! |-----------------|-----------------------------------------------------------------|
//! | `VARCHAR`       | any value, rendered as text                                     |
//! | `BIGINT`        | integers, numeric strings, in-range floats (rounded), booleans  |
//! | `DECIMAL(38,0)` | integers and numeric strings up to 38 digits, floats, booleans  |
//! | `DOUBLE`        | any number, numeric strings, booleans                           |
//! | `BOOLEAN`       | booleans, numbers (non-zero), `true/false/t/f/yes/no/y/n/1/0`   |
//! | `TIMESTAMP`     | datetime strings (see [`parse_datetime`])                       |
//! | `JSON`          | JSON text produced by the coercer                               |

use crate::schema::{DECIMAL_PRECISION, StorageType};
use crate::timestamp::parse_datetime;
use crate::value::Value;

/// A value converted to its column's physical representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Null in any column.
    Null,
    /// `VARCHAR` or `JSON`.
    Utf8(String),
    /// Microseconds since the epoch, UTC.
    Timestamp(i64),
    /// `BIGINT`.
    Int64(i64),
    /// `DECIMAL(38,0)` unscaled value.
    Decimal(i128),
    /// `DOUBLE`.
    Float64(f64),
    /// `BOOLEAN`.
    Boolean(bool),
}

/// Convert a value into a cell for a column of type `target`.
///
/// # Errors
///
/// Returns a message describing the failed conversion, e.g.
/// `could not convert string 'n/a' to DOUBLE`.
pub fn cast(value: Value, target: StorageType) -> Result<Cell, String> {
    if value.is_null() {
        return Ok(Cell::Null);
    }
    match target {
        StorageType::Text => Ok(Cell::Utf8(value.to_string())),
        StorageType::Json => Ok(Cell::Utf8(match value {
            Value::Text(s) => s,
            other => other.to_json_string(),
        })),
        StorageType::Int64 => to_int64(value),
        StorageType::Decimal => to_decimal(value),
        StorageType::Double => to_double(value),
        StorageType::Boolean => to_boolean(value),
        StorageType::Timestamp => to_timestamp(value),
    }
}

fn to_int64(value: Value) -> Result<Cell, String> {
    let target = StorageType::Int64;
    match value {
        Value::Int(i) => Ok(Cell::Int64(i)),
        Value::Bool(b) => Ok(Cell::Int64(i64::from(b))),
        Value::Float(f) => {
            let rounded = f.round();
            if (-9_223_372_036_854_775_808.0..9_223_372_036_854_775_808.0).contains(&rounded) {
                #[allow(clippy::cast_possible_truncation)]
                let whole = rounded as i64;
                Ok(Cell::Int64(whole))
            } else {
                Err(out_of_range(&f.to_string(), target))
            }
        }
        Value::Decimal(digits) => Err(out_of_range(&digits, target)),
        Value::Text(s) => s
            .trim()
            .parse::<i64>()
            .map(Cell::Int64)
            .map_err(|_| unparseable(&s, target)),
        other => Err(unsupported(&other, target)),
    }
}

fn to_decimal(value: Value) -> Result<Cell, String> {
    let target = StorageType::Decimal;
    match value {
        Value::Int(i) => Ok(Cell::Decimal(i128::from(i))),
        Value::Bool(b) => Ok(Cell::Decimal(i128::from(b))),
        Value::Float(f) => {
            let rounded = f.round();
            if rounded.abs() < 1e38 {
                #[allow(clippy::cast_possible_truncation)]
                let whole = rounded as i128;
                Ok(Cell::Decimal(whole))
            } else {
                Err(out_of_range(&f.to_string(), target))
            }
        }
        Value::Decimal(digits) => parse_decimal(&digits)
            .map(Cell::Decimal)
            .ok_or_else(|| out_of_range(&digits, target)),
        Value::Text(s) => parse_decimal(&s)
            .map(Cell::Decimal)
            .ok_or_else(|| unparseable(&s, target)),
        other => Err(unsupported(&other, target)),
    }
}

fn to_double(value: Value) -> Result<Cell, String> {
    let target = StorageType::Double;
    match value {
        #[allow(clippy::cast_precision_loss)]
        Value::Int(i) => Ok(Cell::Float64(i as f64)),
        Value::Float(f) => Ok(Cell::Float64(f)),
        Value::Bool(b) => Ok(Cell::Float64(if b { 1.0 } else { 0.0 })),
        Value::Decimal(digits) => digits
            .parse::<f64>()
            .map(Cell::Float64)
            .map_err(|_| out_of_range(&digits, target)),
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .map(Cell::Float64)
            .map_err(|_| unparseable(&s, target)),
        other => Err(unsupported(&other, target)),
    }
}

fn to_boolean(value: Value) -> Result<Cell, String> {
    let target = StorageType::Boolean;
    match value {
        Value::Bool(b) => Ok(Cell::Boolean(b)),
        Value::Int(i) => Ok(Cell::Boolean(i != 0)),
        Value::Float(f) => Ok(Cell::Boolean(f != 0.0)),
        Value::Decimal(digits) => Ok(Cell::Boolean(digits.bytes().any(|b| matches!(b, b'1'..=b'9')))),
        Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" => Ok(Cell::Boolean(true)),
            "false" | "f" | "no" | "n" | "0" => Ok(Cell::Boolean(false)),
            _ => Err(unparseable(&s, target)),
        },
        other => Err(unsupported(&other, target)),
    }
}

fn to_timestamp(value: Value) -> Result<Cell, String> {
    let target = StorageType::Timestamp;
    match value {
        Value::Text(s) => parse_datetime(&s)
            .map(|dt| Cell::Timestamp(dt.timestamp_micros()))
            .ok_or_else(|| unparseable(&s, target)),
        other => Err(unsupported(&other, target)),
    }
}

fn parse_decimal(s: &str) -> Option<i128> {
    let s = s.trim();
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    if digits.is_empty()
        || digits.len() > usize::from(DECIMAL_PRECISION)
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    s.parse::<i128>().ok()
}

fn unparseable(s: &str, target: StorageType) -> String {
    format!("could not convert string '{s}' to {target}")
}

fn out_of_range(literal: &str, target: StorageType) -> String {
    format!("value {literal} is out of range for {target}")
}

fn unsupported(value: &Value, target: StorageType) -> String {
    format!("cannot convert {} value '{value}' to {target}", value.type_name())
}
