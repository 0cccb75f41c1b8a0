//! New-incident detection between consecutive batches.
//!
//! Identity is only guaranteed within a batch, so detection is best-effort:
//! an incident counts as new when its id did not appear in the previous
//! batch.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use crime_spotter_analytics_models::{Alert, AlertFilter};
use crime_spotter_incident_models::{Incident, IncidentId};

/// Default number of alerts kept by [`AlertLog`].
pub const DEFAULT_ALERT_HISTORY: usize = 10;

/// Incidents of `current` whose id is absent from `previous`, in feed order.
pub fn new_incidents<'a>(previous: &[Incident], current: &'a [Incident]) -> Vec<&'a Incident> {
    let known: HashSet<&IncidentId> = previous.iter().map(|i| &i.id).collect();
    current.iter().filter(|i| !known.contains(&i.id)).collect()
}

/// Whether `incident` passes `filter`.
#[must_use]
pub fn passes_filter(filter: &AlertFilter, incident: &Incident) -> bool {
    if !filter.crime_types.is_empty() && !filter.crime_types.contains(&incident.crime_type) {
        return false;
    }

    match filter.location.as_deref().map(str::trim) {
        Some(location) if !location.is_empty() => incident
            .location
            .to_lowercase()
            .contains(&location.to_lowercase()),
        _ => true,
    }
}

/// New incidents between two batches that pass `filter`, as alerts.
///
/// Returns nothing when there is no previous batch, so the first batch seen
/// never floods subscribers.
pub fn detect_alerts(
    previous: Option<&[Incident]>,
    current: &[Incident],
    filter: &AlertFilter,
    detected_at: DateTime<Utc>,
) -> Vec<Alert> {
    let Some(previous) = previous else {
        return Vec::new();
    };

    new_incidents(previous, current)
        .into_iter()
        .filter(|incident| passes_filter(filter, incident))
        .map(|incident| Alert {
            incident: incident.clone(),
            detected_at,
        })
        .collect()
}

/// Bounded history of alerts, newest first.
#[derive(Debug, Clone)]
pub struct AlertLog {
    capacity: usize,
    alerts: VecDeque<Alert>,
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_HISTORY)
    }
}

impl AlertLog {
    /// Creates an empty log keeping at most `capacity` alerts.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            alerts: VecDeque::with_capacity(capacity),
        }
    }

    /// Adds alerts in detection order. Later alerts end up in front.
    pub fn record(&mut self, alerts: impl IntoIterator<Item = Alert>) {
        for alert in alerts {
            log::info!(
                "Alert: {} at {} ({})",
                alert.incident.crime_type,
                alert.incident.location,
                alert.incident.id
            );
            self.alerts.push_front(alert);
        }
        self.alerts.truncate(self.capacity);
    }

    /// Alerts currently held, newest first.
    #[must_use]
    pub fn recent(&self) -> Vec<Alert> {
        self.alerts.iter().cloned().collect()
    }

    /// Number of alerts held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, incident};

    fn batch(ids: &[(&str, &str, &str)]) -> Vec<Incident> {
        ids.iter()
            .map(|(id, crime_type, location)| incident(id, crime_type, location, at(2024, 1, 1, 0)))
            .collect()
    }

    #[test]
    fn new_incidents_diff_by_id() {
        let previous = batch(&[("a", "Theft", "Guindy"), ("b", "Theft", "Adyar")]);
        let current = batch(&[
            ("b", "Theft", "Adyar"),
            ("c", "Assault", "Guindy"),
            ("a", "Theft", "Guindy"),
            ("d", "Theft", "T Nagar"),
        ]);

        let ids: Vec<&str> = new_incidents(&previous, &current)
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(ids, vec!["c", "d"]);
    }

    #[test]
    fn filter_by_type_and_location() {
        let theft = incident("1", "Theft", "Guindy Signal", at(2024, 1, 1, 0));
        let assault = incident("2", "Assault", "Adyar", at(2024, 1, 1, 0));

        assert!(passes_filter(&AlertFilter::default(), &theft));

        let by_type = AlertFilter {
            crime_types: vec!["Theft".to_string()],
            location: None,
        };
        assert!(passes_filter(&by_type, &theft));
        assert!(!passes_filter(&by_type, &assault));

        let by_location = AlertFilter {
            crime_types: Vec::new(),
            location: Some("guindy".to_string()),
        };
        assert!(passes_filter(&by_location, &theft));
        assert!(!passes_filter(&by_location, &assault));

        let blank_location = AlertFilter {
            crime_types: Vec::new(),
            location: Some("  ".to_string()),
        };
        assert!(passes_filter(&blank_location, &assault));
    }

    #[test]
    fn first_batch_raises_no_alerts() {
        let current = batch(&[("a", "Theft", "Guindy")]);
        let alerts = detect_alerts(None, &current, &AlertFilter::default(), at(2024, 1, 1, 0));
        assert!(alerts.is_empty());
    }

    #[test]
    fn detects_filtered_new_incidents() {
        let previous = batch(&[("a", "Theft", "Guindy")]);
        let current = batch(&[
            ("a", "Theft", "Guindy"),
            ("b", "Assault", "Guindy"),
            ("c", "Theft", "Adyar"),
        ]);
        let filter = AlertFilter {
            crime_types: vec!["Theft".to_string()],
            location: None,
        };
        let now = at(2024, 1, 2, 0);

        let alerts = detect_alerts(Some(&previous), &current, &filter, now);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].incident.id.as_str(), "c");
        assert_eq!(alerts[0].detected_at, now);
    }

    #[test]
    fn log_keeps_newest_first_up_to_capacity() {
        let mut log = AlertLog::new(3);
        let alert = |id: &str| Alert {
            incident: incident(id, "Theft", "Guindy", at(2024, 1, 1, 0)),
            detected_at: at(2024, 1, 1, 0),
        };

        log.record([alert("1"), alert("2")]);
        log.record([alert("3"), alert("4")]);

        let ids: Vec<String> = log
            .recent()
            .iter()
            .map(|a| a.incident.id.to_string())
            .collect();
        assert_eq!(ids, vec!["4", "3", "2"]);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn default_log_holds_ten() {
        let mut log = AlertLog::default();
        assert!(log.is_empty());
        log.record((0..15).map(|i| Alert {
            incident: incident(&i.to_string(), "Theft", "A", at(2024, 1, 1, 0)),
            detected_at: at(2024, 1, 1, 0),
        }));
        assert_eq!(log.len(), DEFAULT_ALERT_HISTORY);
        assert_eq!(log.recent()[0].incident.id.as_str(), "14");
    }
}
