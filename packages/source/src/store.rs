//! Normalization of raw feed records into [`Incident`] batches.
//!
//! Normalization never fails a whole batch because of one bad record: a
//! record that is not a JSON object (or repeats an id already seen in the
//! batch) is dropped, and a record without coordinates is kept as a
//! non-spatial incident. Only a payload that is not an array at all is an
//! error, and in that case [`IncidentStore`] keeps serving its previous batch.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use crime_spotter_incident_models::{
    Incident, IncidentBatch, IncidentId, TimestampSource, UNKNOWN,
};
use serde_json::Value;

use crate::SourceError;
use crate::parsing::{
    extract_id, first_non_empty_str, first_present, parse_lat_lng, parse_timestamp,
};

const ID_FIELDS: &[&str] = &["_id", "id"];
const CRIME_TYPE_FIELDS: &[&str] = &["crime_type", "crimeType", "type"];
const LATITUDE_FIELDS: &[&str] = &["latitude", "lat"];
const LONGITUDE_FIELDS: &[&str] = &["longitude", "lng", "lon"];
const TIMESTAMP_FIELDS: &[(&str, TimestampSource)] = &[
    ("date", TimestampSource::Date),
    ("createdAt", TimestampSource::CreatedAt),
    ("timestamp", TimestampSource::Timestamp),
];

/// Normalizes one raw record.
///
/// Returns `None` when the record is not a JSON object. `index` is the
/// record's position in the payload and becomes its id when the record
/// carries none.
#[must_use]
pub fn normalize_record(record: &Value, index: usize, ingested_at: DateTime<Utc>) -> Option<Incident> {
    if !record.is_object() {
        return None;
    }

    let id = extract_id(record, ID_FIELDS).unwrap_or_else(|| format!("#{index}"));

    let coordinates = parse_lat_lng(
        first_present(record, LATITUDE_FIELDS),
        first_present(record, LONGITUDE_FIELDS),
    );

    let (timestamp, timestamp_source) = TIMESTAMP_FIELDS
        .iter()
        .find_map(|(field, source)| {
            record
                .get(field)
                .and_then(parse_timestamp)
                .map(|ts| (ts, *source))
        })
        .unwrap_or((ingested_at, TimestampSource::IngestedAt));

    Some(Incident {
        id: IncidentId::new(id),
        crime_type: first_non_empty_str(record, CRIME_TYPE_FIELDS)
            .unwrap_or(UNKNOWN)
            .to_string(),
        location: first_non_empty_str(record, &["location"])
            .unwrap_or(UNKNOWN)
            .to_string(),
        latitude: coordinates.map(|(lat, _)| lat),
        longitude: coordinates.map(|(_, lng)| lng),
        timestamp,
        timestamp_source,
        description: first_non_empty_str(record, &["description"]).map(str::to_string),
    })
}

/// Normalizes a slice of raw records into a batch, preserving input order.
///
/// Records that are not objects, and records whose id was already seen
/// earlier in the same slice, are dropped and counted in
/// [`IncidentBatch::dropped`].
#[must_use]
pub fn normalize_records(records: &[Value], ingested_at: DateTime<Utc>) -> IncidentBatch {
    let mut seen = BTreeSet::new();
    let mut incidents = Vec::with_capacity(records.len());
    let mut dropped = 0;

    for (index, record) in records.iter().enumerate() {
        let Some(incident) = normalize_record(record, index, ingested_at) else {
            log::debug!("Dropping record {index}: not a JSON object");
            dropped += 1;
            continue;
        };

        if !seen.insert(incident.id.clone()) {
            log::warn!(
                "Dropping record {index}: duplicate incident id {}",
                incident.id
            );
            dropped += 1;
            continue;
        }

        incidents.push(incident);
    }

    IncidentBatch::new(incidents, ingested_at, dropped)
}

/// Extracts the record array from a feed payload.
///
/// # Errors
///
/// Returns [`SourceError::NotAnArray`] if the payload is not a JSON array.
pub fn payload_records(payload: &Value) -> Result<&[Value], SourceError> {
    payload
        .as_array()
        .map(Vec::as_slice)
        .ok_or(SourceError::NotAnArray {
            found: json_type_name(payload),
        })
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Holds the most recent successfully ingested batch.
///
/// A failed ingestion leaves the previous batch in place, so consumers keep
/// working from stale-but-valid data rather than an empty one.
#[derive(Debug, Default)]
pub struct IncidentStore {
    current: Option<Arc<IncidentBatch>>,
}

impl IncidentStore {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Returns the last successfully ingested batch, if any.
    #[must_use]
    pub fn current(&self) -> Option<Arc<IncidentBatch>> {
        self.current.clone()
    }

    /// Normalizes `payload` and, on success, makes it the current batch.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::NotAnArray`] if the payload is not a JSON
    /// array. The current batch is left untouched in that case.
    pub fn ingest(
        &mut self,
        payload: &Value,
        ingested_at: DateTime<Utc>,
    ) -> Result<Arc<IncidentBatch>, SourceError> {
        let records = payload_records(payload)?;
        let batch = Arc::new(normalize_records(records, ingested_at));

        if batch.dropped > 0 {
            log::info!(
                "Ingested {} incidents ({} records dropped)",
                batch.len(),
                batch.dropped
            );
        } else {
            log::debug!("Ingested {} incidents", batch.len());
        }

        self.current = Some(Arc::clone(&batch));
        Ok(batch)
    }
}
