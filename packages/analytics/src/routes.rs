//! Incident-weighted safety estimates for three fixed route profiles.
//!
//! No path is computed. Each profile's score is derived from the incident
//! counts at the two endpoints only.

use crime_spotter_analytics_models::{RouteOption, RouteProfile, RouteSafety, SafetyLabel};
use crime_spotter_incident_models::Incident;
use strum::IntoEnumIterator as _;

use crate::AnalyticsError;
use crate::matching::LocationQuery;
use crate::require_text;

/// `(score step per incident, score floor, incident offset)` for a profile.
const fn profile_weights(profile: RouteProfile) -> (u64, u64, i64) {
    match profile {
        RouteProfile::Safest => (2, 70, -2),
        RouteProfile::Fastest => (5, 50, 4),
        RouteProfile::Balanced => (3, 60, 0),
    }
}

/// Scores one profile given the averaged endpoint incident count.
#[must_use]
pub fn route_option(profile: RouteProfile, base: u64) -> RouteOption {
    let (step, floor, offset) = profile_weights(profile);
    let score = 100_u64.saturating_sub(base.saturating_mul(step)).max(floor);
    let safety_score = u8::try_from(score).unwrap_or(100);
    let incidents = base.saturating_add_signed(offset);

    RouteOption {
        profile,
        safety_score,
        safety_label: SafetyLabel::from_score(safety_score),
        incidents,
    }
}

/// `max(1, round((start + end) / 2))`.
#[must_use]
pub const fn base_incidents(start: u64, end: u64) -> u64 {
    let avg = start.saturating_add(end).saturating_add(1) / 2;
    if avg < 1 { 1 } else { avg }
}

/// Estimates safety of the safest, fastest and balanced routes between two
/// free-text locations.
///
/// # Errors
///
/// Returns [`AnalyticsError::Validation`] if either location is blank.
pub fn route_safety(
    incidents: &[Incident],
    start: &str,
    end: &str,
) -> Result<RouteSafety, AnalyticsError> {
    let start = require_text(start, "start location")?;
    let end = require_text(end, "end location")?;

    let start_incidents = LocationQuery::new(start).filter(incidents).count() as u64;
    let end_incidents = LocationQuery::new(end).filter(incidents).count() as u64;
    let base = base_incidents(start_incidents, end_incidents);

    log::debug!("Route {start:?} -> {end:?}: {start_incidents}+{end_incidents} incidents, base {base}");

    Ok(RouteSafety {
        start: start.to_string(),
        end: end.to_string(),
        start_incidents,
        end_incidents,
        routes: RouteProfile::iter()
            .map(|profile| route_option(profile, base))
            .collect(),
    })
}
