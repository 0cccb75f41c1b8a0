//! Shared parsing utilities for raw feed records.
//!
//! Feed records are loosely typed: the same field may arrive as a number or
//! a string, or be missing entirely. These helpers pull typed values out of a
//! [`serde_json::Value`] and return `None` for anything unusable.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Parses a timestamp from a JSON string or epoch-milliseconds number.
///
/// Accepted string forms: RFC 3339, naive ISO 8601 datetimes (with or
/// without fractional seconds, treated as UTC), and plain `YYYY-MM-DD`
/// dates (midnight UTC).
#[must_use]
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_str(s),
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| {
                #[allow(clippy::cast_possible_truncation)]
                n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)
            })?;
            DateTime::from_timestamp_millis(millis)
        }
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parses a single coordinate from a JSON number or numeric string.
///
/// Returns `None` for non-numeric or non-finite values.
#[must_use]
pub fn parse_coordinate(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// Parses a latitude/longitude pair. Returns `None` unless both values are
/// finite numbers. Values are not range-checked.
#[must_use]
pub fn parse_lat_lng(lat: Option<&Value>, lng: Option<&Value>) -> Option<(f64, f64)> {
    Some((parse_coordinate(lat?)?, parse_coordinate(lng?)?))
}

/// Returns the first field in `fields` holding a non-empty string.
#[must_use]
pub fn first_non_empty_str<'a>(record: &'a Value, fields: &[&str]) -> Option<&'a str> {
    fields.iter().find_map(|field| {
        record
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    })
}

/// Returns the first field in `fields` holding a usable value.
#[must_use]
pub fn first_present<'a>(record: &'a Value, fields: &[&str]) -> Option<&'a Value> {
    fields
        .iter()
        .find_map(|field| record.get(field).filter(|v| !v.is_null()))
}

/// Extracts an identifier, trying each field in order. Accepts strings and
/// numbers.
#[must_use]
pub fn extract_id(record: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match record.get(field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
