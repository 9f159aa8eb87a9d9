//! Timestamp heuristics.
//!
//! Two questions are answered here without any state:
//! - is this integer an epoch count, and in which unit ([`epoch_unit`])
//! - is this string shaped like a date, time, or date-time ([`is_datetime_string`])
//!
//! The classifier uses both to pick `TIMESTAMP` columns; the coercer and the
//! columnar store use the conversion helpers to turn epoch counts and
//! datetime strings into instants.
//!
//! Epoch bands are matched by magnitude and are non-overlapping:
//!
//! | unit         | digits | range                                      |
//! |--------------|--------|--------------------------------------------|
//! | seconds      | 10     | `1_000_000_000 ..= 9_999_999_999`          |
//! | milliseconds | 13     | `1_000_000_000_000 ..= 9_999_999_999_999`  |
//! | microseconds | 16     | `1_000_000_000_000_000 ..` with 16 digits  |

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use regex::RegexSet;
use std::ops::RangeInclusive;
use std::sync::LazyLock;

const SECONDS_BAND: RangeInclusive<i64> = 1_000_000_000..=9_999_999_999;
const MILLIS_BAND: RangeInclusive<i64> = 1_000_000_000_000..=9_999_999_999_999;
const MICROS_FLOOR: i64 = 1_000_000_000_000_000;

/// Epoch values at or above this are converted as milliseconds.
pub const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Epoch values at or above this are converted as microseconds.
pub const MICROS_THRESHOLD: i64 = MICROS_FLOOR;

/// Unit of an epoch count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EpochUnit {
    /// Seconds since 1970-01-01T00:00:00Z.
    Seconds,
    /// Milliseconds since the epoch.
    Milliseconds,
    /// Microseconds since the epoch.
    Microseconds,
}

impl EpochUnit {
    /// Lowercase unit name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Seconds => "seconds",
            Self::Milliseconds => "milliseconds",
            Self::Microseconds => "microseconds",
        }
    }

    fn iso_precision(self) -> SecondsFormat {
        match self {
            Self::Microseconds => SecondsFormat::Micros,
            Self::Seconds | Self::Milliseconds => SecondsFormat::Millis,
        }
    }
}

/// Number of decimal digits in `n`, ignoring the sign.
#[must_use]
pub fn decimal_digits(n: i64) -> u32 {
    n.unsigned_abs().checked_ilog10().map_or(1, |log| log + 1)
}

/// Recognize an epoch count and report its unit.
///
/// The microsecond band is decided by digit count, not by an upper bound,
/// so the check stays exact at the 16/17 digit boundary.
#[must_use]
pub fn epoch_unit(n: i64) -> Option<EpochUnit> {
    if SECONDS_BAND.contains(&n) {
        Some(EpochUnit::Seconds)
    } else if MILLIS_BAND.contains(&n) {
        Some(EpochUnit::Milliseconds)
    } else if n >= MICROS_FLOOR && decimal_digits(n) == 16 {
        Some(EpochUnit::Microseconds)
    } else {
        None
    }
}

/// `true` if `n` falls in the seconds, milliseconds, or microseconds band.
#[must_use]
pub fn looks_like_epoch(n: i64) -> bool {
    epoch_unit(n).is_some()
}

/// Same test for a float, applied to its integral part.
#[must_use]
pub fn looks_like_epoch_f64(f: f64) -> bool {
    f.is_finite() && i64_of(f.trunc()).is_some_and(looks_like_epoch)
}

/// Unit used when converting an epoch integer to an instant.
///
/// Anything below [`MILLIS_THRESHOLD`] is seconds, anything from
/// [`MICROS_THRESHOLD`] up is microseconds, the rest is milliseconds.
#[must_use]
pub fn conversion_unit(n: i64) -> EpochUnit {
    if n >= MICROS_THRESHOLD {
        EpochUnit::Microseconds
    } else if n >= MILLIS_THRESHOLD {
        EpochUnit::Milliseconds
    } else {
        EpochUnit::Seconds
    }
}

/// Convert an epoch integer to an instant, picking the unit by magnitude.
#[must_use]
pub fn epoch_to_datetime(n: i64) -> Option<DateTime<Utc>> {
    match conversion_unit(n) {
        EpochUnit::Seconds => DateTime::from_timestamp(n, 0),
        EpochUnit::Milliseconds => DateTime::from_timestamp_millis(n),
        EpochUnit::Microseconds => DateTime::from_timestamp_micros(n),
    }
}

/// Convert a fractional epoch count to an instant with microsecond resolution.
#[must_use]
pub fn epoch_f64_to_datetime(f: f64) -> Option<DateTime<Utc>> {
    let unit = conversion_unit(i64_of(f.trunc())?);
    let micros = match unit {
        EpochUnit::Seconds => f * 1_000_000.0,
        EpochUnit::Milliseconds => f * 1_000.0,
        EpochUnit::Microseconds => f,
    };
    DateTime::from_timestamp_micros(i64_of(micros.round())?)
}

/// Format an epoch integer as an ISO-8601 UTC instant (`2023-11-14T22:13:20.000Z`).
///
/// Microsecond epochs keep six fractional digits; everything else uses three.
#[must_use]
pub fn epoch_to_iso8601(n: i64) -> Option<String> {
    let unit = conversion_unit(n);
    epoch_to_datetime(n).map(|dt| dt.to_rfc3339_opts(unit.iso_precision(), true))
}

/// Format a fractional epoch count as an ISO-8601 UTC instant.
#[must_use]
pub fn epoch_f64_to_iso8601(f: f64) -> Option<String> {
    epoch_f64_to_datetime(f).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Micros, true))
}

static DATETIME_SHAPES: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        // ISO-8601 date-time, optional millis and Z
        r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(\.[0-9]{3})?Z?$",
        // ISO-8601 date
        r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$",
        // time of day
        r"^[0-9]{2}:[0-9]{2}:[0-9]{2}(\.[0-9]{3})?$",
        // epoch seconds / milliseconds as text
        r"^[0-9]{10}$",
        r"^[0-9]{13}$",
        // M/D/YYYY and M-D-YYYY
        r"^(?:[0-9]{1,2}/){2}[0-9]{4}$",
        r"^(?:[0-9]{1,2}-){2}[0-9]{4}$",
        // RFC 2822 in GMT
        r"^[A-Za-z]{3}, [0-9]{1,2} [A-Za-z]{3} [0-9]{4} [0-9]{2}:[0-9]{2}:[0-9]{2} GMT$",
    ])
    .expect("valid datetime patterns")
});

/// `true` if the string has one of the recognized date, time, or date-time shapes.
#[must_use]
pub fn is_datetime_string(s: &str) -> bool {
    DATETIME_SHAPES.is_match(s)
}

/// Parse a datetime string into a UTC instant.
///
/// Accepts every shape [`is_datetime_string`] recognizes, plus RFC 3339
/// strings with numeric offsets or longer fractions and a space separator
/// between date and time:
/// - date-only strings resolve to midnight UTC
/// - bare times resolve to that time on 1970-01-01
/// - 10 and 13 digit strings are epoch seconds and milliseconds
#[must_use]
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = s.strip_suffix('Z').unwrap_or(s);
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(naive, fmt) {
            return Some(ndt.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return midnight(date);
    }

    if let Ok(time) = NaiveTime::parse_from_str(s, "%H:%M:%S%.f") {
        return NaiveDate::from_ymd_opt(1970, 1, 1).map(|d| d.and_time(time).and_utc());
    }

    if matches!(s.len(), 10 | 13) && s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse::<i64>().ok().and_then(epoch_to_datetime);
    }

    for fmt in ["%m/%d/%Y", "%m-%d-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return midnight(date);
        }
    }

    DateTime::parse_from_rfc2822(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|ndt| ndt.and_utc())
}

fn i64_of(f: f64) -> Option<i64> {
    if (-9_223_372_036_854_775_808.0..9_223_372_036_854_775_808.0).contains(&f) {
        #[allow(clippy::cast_possible_truncation)]
        let whole = f as i64;
        Some(whole)
    } else {
        None
    }
}
