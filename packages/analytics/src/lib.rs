#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Stateless analytics over an incident batch.
//!
//! Every function takes the full current batch and recomputes its result
//! from scratch. Functions that depend on the current time take "now" as an
//! explicit [`chrono::DateTime`]; incident timestamps are converted into
//! now's time zone before any calendar logic is applied.
//!
//! Aggregations are total and return plain values. Only functions that
//! accept user-entered text return [`AnalyticsError`].

pub mod alerts;
pub mod matching;
pub mod risk;
pub mod routes;
pub mod stats;
pub mod suggestions;
pub mod temporal;

use std::collections::HashMap;

use crime_spotter_analytics_models::{CrimeTypeCount, LocationCount};
use thiserror::Error;

/// Number of entries kept in top-N rankings.
pub const TOP_N: usize = 5;

/// Errors that can occur during analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// User-entered input was rejected.
    #[error("Invalid input: {message}")]
    Validation {
        /// Description of what went wrong.
        message: String,
    },
}

/// Trims `input` and rejects it when nothing is left.
pub(crate) fn require_text<'a>(input: &'a str, field: &str) -> Result<&'a str, AnalyticsError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AnalyticsError::Validation {
            message: format!("{field} must not be empty"),
        });
    }
    Ok(trimmed)
}

/// Rounds to one decimal place.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `part / whole` as a one-decimal percentage, 0 for an empty whole.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round1(part as f64 / whole as f64 * 100.0)
}

/// Counts keys in first-seen order.
pub(crate) fn count_first_seen<'a>(keys: impl IntoIterator<Item = &'a str>) -> Vec<(&'a str, u64)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, u64)> = Vec::new();

    for key in keys {
        if let Some(&i) = index.get(key) {
            counts[i].1 += 1;
        } else {
            index.insert(key, counts.len());
            counts.push((key, 1));
        }
    }

    counts
}

/// The `limit` most frequent keys, ties kept in first-seen order.
pub(crate) fn rank<'a>(keys: impl IntoIterator<Item = &'a str>, limit: usize) -> Vec<(&'a str, u64)> {
    let mut counts = count_first_seen(keys);
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(limit);
    counts
}

pub(crate) fn top_locations<'a>(locations: impl IntoIterator<Item = &'a str>) -> Vec<LocationCount> {
    rank(locations, TOP_N)
        .into_iter()
        .map(|(location, count)| LocationCount {
            location: location.to_string(),
            count,
        })
        .collect()
}

/// Top crime types with their share of `total`.
pub(crate) fn top_crime_types<'a>(
    crime_types: impl IntoIterator<Item = &'a str>,
    total: u64,
) -> Vec<CrimeTypeCount> {
    rank(crime_types, TOP_N)
        .into_iter()
        .map(|(crime_type, count)| CrimeTypeCount {
            crime_type: crime_type.to_string(),
            count,
            percentage: percentage(count, total),
        })
        .collect()
}
