//! Location autocomplete from the current batch.

use std::collections::HashSet;

use crime_spotter_incident_models::Incident;

/// Shortest input that produces suggestions.
const MIN_INPUT_CHARS: usize = 2;

/// Default number of suggestions returned.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

/// Distinct incident locations containing `text` (case-insensitive), in
/// first-seen order, at most `limit`.
pub fn suggest_locations(incidents: &[Incident], text: &str, limit: usize) -> Vec<String> {
    let needle = text.trim().to_lowercase();
    if needle.chars().count() < MIN_INPUT_CHARS {
        return Vec::new();
    }

    let mut seen: HashSet<&str> = HashSet::new();
    incidents
        .iter()
        .map(|incident| incident.location.as_str())
        .filter(|location| seen.insert(*location))
        .filter(|location| location.to_lowercase().contains(&needle))
        .take(limit)
        .map(ToString::to_string)
        .collect()
}
