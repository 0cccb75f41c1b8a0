#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical incident record and batch types.
//!
//! Every raw record pulled from the incident feed is normalized into an
//! [`Incident`]. A full poll of the feed becomes one [`IncidentBatch`], which
//! is treated as an immutable snapshot by every downstream aggregator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Label substituted for a missing crime type or location.
pub const UNKNOWN: &str = "Unknown";

/// Opaque identifier of an incident, unique within one batch.
///
/// Numeric identifiers from the feed are stored in their decimal string
/// form so that `42` and `"42"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncidentId(String);

impl IncidentId {
    /// Wraps a raw identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IncidentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which raw field the incident timestamp was resolved from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum TimestampSource {
    /// The record's `date` field.
    Date,
    /// The record's `createdAt` field.
    CreatedAt,
    /// The record's `timestamp` field.
    Timestamp,
    /// No usable time field; the ingestion time was substituted.
    IngestedAt,
}

/// A crime report normalized from the incident feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    /// Identifier from the feed (or a positional fallback).
    pub id: IncidentId,
    /// Free-text crime category, [`UNKNOWN`] when missing.
    pub crime_type: String,
    /// Free-text place name, [`UNKNOWN`] when missing.
    pub location: String,
    /// Latitude in degrees. `None` for records without a geo-tag.
    pub latitude: Option<f64>,
    /// Longitude in degrees. `None` for records without a geo-tag.
    pub longitude: Option<f64>,
    /// Resolved event time.
    ///
    /// When [`Self::timestamp_source`] is [`TimestampSource::IngestedAt`]
    /// this is the time the batch was ingested, not the time of the event.
    pub timestamp: DateTime<Utc>,
    /// Where [`Self::timestamp`] came from.
    pub timestamp_source: TimestampSource,
    /// Optional free-text description.
    pub description: Option<String>,
}

impl Incident {
    /// Returns `(latitude, longitude)` when both coordinates are present.
    #[must_use]
    pub const fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }

    /// Whether the incident takes part in spatial clustering.
    #[must_use]
    pub const fn is_spatial(&self) -> bool {
        self.coordinates().is_some()
    }

    /// Whether the timestamp is the ingestion-time fallback.
    #[must_use]
    pub fn timestamp_is_fallback(&self) -> bool {
        self.timestamp_source == TimestampSource::IngestedAt
    }
}

/// One full poll of the incident feed, normalized.
///
/// Batches are replaced wholesale on every successful poll; nothing diffs
/// or patches a batch in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentBatch {
    /// Normalized incidents in feed order.
    pub incidents: Vec<Incident>,
    /// When the batch was ingested.
    pub ingested_at: DateTime<Utc>,
    /// Number of raw records dropped during normalization.
    pub dropped: usize,
}

impl IncidentBatch {
    /// Creates a batch from already-normalized incidents.
    #[must_use]
    pub const fn new(incidents: Vec<Incident>, ingested_at: DateTime<Utc>, dropped: usize) -> Self {
        Self {
            incidents,
            ingested_at,
            dropped,
        }
    }

    /// Number of incidents in the batch.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.incidents.len()
    }

    /// Whether the batch holds no incidents.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }

    /// Iterates over the incidents that carry both coordinates.
    pub fn spatial(&self) -> impl Iterator<Item = &Incident> {
        self.incidents.iter().filter(|i| i.is_spatial())
    }

    /// Returns the incidents ordered newest first.
    ///
    /// Incidents with equal timestamps keep their feed order.
    #[must_use]
    pub fn newest_first(&self) -> Vec<&Incident> {
        let mut sorted: Vec<&Incident> = self.incidents.iter().collect();
        sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        sorted
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    fn incident(id: &str, lat: Option<f64>, lng: Option<f64>, day: u32) -> Incident {
        Incident {
            id: IncidentId::new(id),
            crime_type: "Theft".to_string(),
            location: "Guindy".to_string(),
            latitude: lat,
            longitude: lng,
            timestamp: Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
            timestamp_source: TimestampSource::Date,
            description: None,
        }
    }

    #[test]
    fn coordinates_require_both_fields() {
        assert_eq!(
            incident("a", Some(13.0), Some(80.2), 1).coordinates(),
            Some((13.0, 80.2))
        );
        assert!(!incident("b", Some(13.0), None, 1).is_spatial());
        assert!(!incident("c", None, Some(80.2), 1).is_spatial());
    }

    #[test]
    fn spatial_iterator_skips_untagged_records() {
        let batch = IncidentBatch::new(
            vec![
                incident("a", Some(13.0), Some(80.2), 1),
                incident("b", None, None, 2),
                incident("c", Some(13.1), Some(80.3), 3),
            ],
            Utc::now(),
            0,
        );
        let ids: Vec<&str> = batch.spatial().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn newest_first_is_stable_for_ties() {
        let batch = IncidentBatch::new(
            vec![
                incident("old", None, None, 1),
                incident("tie-1", None, None, 5),
                incident("tie-2", None, None, 5),
            ],
            Utc::now(),
            0,
        );
        let ids: Vec<&str> = batch.newest_first().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["tie-1", "tie-2", "old"]);
    }

    #[test]
    fn serializes_camel_case() {
        let value = serde_json::to_value(incident("a", None, None, 1)).unwrap();
        assert_eq!(value["crimeType"], "Theft");
        assert_eq!(value["timestampSource"], "date");
        assert_eq!(value["id"], "a");
    }
}
