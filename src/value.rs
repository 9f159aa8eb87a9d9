//! Typed payload values.
//!
//! Payload fields arrive as arbitrary JSON. [`Value`] is the closed set of
//! shapes the engine reasons about: every JSON value maps onto exactly one
//! variant, and numbers keep enough of their original literal that no digits
//! are lost before a column type is chosen.

use crate::schema::DECIMAL_PRECISION;
use serde_json::Number;
use std::fmt;

/// A single payload value after decoding from JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// JSON `null`.
    Null,
    /// JSON `true` / `false`.
    Bool(bool),
    /// An integral number that fits in `i64`.
    Int(i64),
    /// An integral number outside the `i64` range, kept as its exact digit string.
    Decimal(String),
    /// A finite, non-integral number.
    Float(f64),
    /// A JSON string (or a numeric literal too large for any numeric type).
    Text(String),
    /// A JSON array or object.
    Json(serde_json::Value),
}

impl Value {
    /// Decode a JSON value.
    ///
    /// Numbers are read from their literal text:
    /// - literals that fit `i64` become [`Value::Int`], including integral
    ///   floats such as `22.0` or `1e3`
    /// - integral literals beyond `i64` become [`Value::Decimal`] with the exact
    ///   digits; exponent forms (`1e30`) are expanded from the literal, never via `f64`
    /// - other finite literals become [`Value::Float`]
    /// - exponent forms wider than 38 digits and literals beyond `f64` range
    ///   become [`Value::Text`] holding serde_json's rendering of the literal,
    ///   which spells the exponent sign (`1e400` is kept as `1e+400`)
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => Self::from_number(n),
            serde_json::Value::String(s) => Self::Text(s.clone()),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => Self::Json(value.clone()),
        }
    }

    fn from_number(n: &Number) -> Self {
        if let Some(i) = n.as_i64() {
            return Self::Int(i);
        }
        let literal = n.to_string();
        if is_integer_literal(&literal) {
            return Self::Decimal(literal);
        }
        match expand_literal(&literal) {
            Some(Expansion::Integral(digits)) => match digits.parse::<i64>() {
                Ok(i) => Self::Int(i),
                Err(_) => Self::Decimal(digits),
            },
            Some(Expansion::TooWide) => Self::Text(literal),
            Some(Expansion::Fractional) | None => match n.as_f64() {
                Some(f) if f.is_finite() => Self::Float(f),
                _ => Self::Text(literal),
            },
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short human-readable name of the variant, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Decimal(_) => "big integer",
            Self::Float(_) => "float",
            Self::Text(_) => "string",
            Self::Json(_) => "json",
        }
    }

    /// Render the value as JSON text.
    ///
    /// Strings are quoted and escaped; big integers keep their exact digits.
    #[must_use]
    pub fn to_json_string(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Decimal(digits) => digits.clone(),
            Self::Float(f) => Number::from_f64(*f).map_or_else(|| "null".to_string(), |n| n.to_string()),
            Self::Text(s) => serde_json::Value::String(s.clone()).to_string(),
            Self::Json(v) => v.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Decimal(digits) => f.write_str(digits),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        Self::from_json(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Self::Text(s),
            other => Self::from_json(&other),
        }
    }
}

/// Number of decimal digits in an integer literal, ignoring any sign.
#[must_use]
pub fn digit_count(literal: &str) -> usize {
    literal
        .trim_start_matches(['-', '+'])
        .bytes()
        .filter(u8::is_ascii_digit)
        .count()
}

fn is_integer_literal(literal: &str) -> bool {
    let digits = literal.strip_prefix('-').unwrap_or(literal);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Exact reading of a non-plain numeric literal such as `22.0` or `1.5e20`.
enum Expansion {
    /// Integral value, as a signed digit string without leading zeros.
    Integral(String),
    /// Integral, but wider than a `DECIMAL(38,0)` column can hold.
    TooWide,
    Fractional,
}

/// Expand `literal` by shifting its mantissa digits by the exponent.
///
/// Returns `None` when the literal is malformed or its exponent does not fit `i64`.
fn expand_literal(literal: &str) -> Option<Expansion> {
    let max_digits = usize::from(DECIMAL_PRECISION);
    let (negative, unsigned) = match literal.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, literal),
    };
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(at) => (&unsigned[..at], unsigned[at + 1..].parse::<i64>().ok()?),
        None => (unsigned, 0),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if whole.is_empty() || !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let joined = format!("{whole}{fraction}");
    let digits = joined.trim_start_matches('0');
    if digits.is_empty() {
        return Some(Expansion::Integral("0".to_string()));
    }

    // value = digits * 10^shift
    let shift = exponent.checked_sub(i64::try_from(fraction.len()).ok()?)?;
    let expanded = if shift < 0 {
        let dropped = usize::try_from(shift.unsigned_abs()).ok()?;
        if dropped >= digits.len() {
            return Some(Expansion::Fractional);
        }
        let (kept, rest) = digits.split_at(digits.len() - dropped);
        if rest.bytes().any(|b| b != b'0') {
            return Some(Expansion::Fractional);
        }
        kept.to_string()
    } else {
        let pad = usize::try_from(shift).ok()?;
        if digits.len().saturating_add(pad) > max_digits {
            return Some(Expansion::TooWide);
        }
        format!("{digits}{}", "0".repeat(pad))
    };

    if expanded.len() > max_digits {
        return Some(Expansion::TooWide);
    }
    Some(Expansion::Integral(if negative {
        format!("-{expanded}")
    } else {
        expanded
    }))
}
