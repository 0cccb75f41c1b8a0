//! Heuristic risk assessment for a free-text location.
//!
//! The score and confidence formulas are deliberately simple frequency
//! heuristics kept stable so that reported numbers stay comparable over
//! time. Neither is a probability.

use std::collections::BTreeMap;

use chrono::{DateTime, Timelike as _, TimeZone};
use crime_spotter_analytics_models::{
    RiskAssessment, RiskLevel, TimePatterns, TimeWindow, TimeWindowCount,
};
use crime_spotter_incident_models::Incident;
use strum::IntoEnumIterator as _;

use crate::matching::LocationQuery;
use crate::{AnalyticsError, count_first_seen, rank, require_text};

/// `min(100, round(matched / total * 1000))`, or 0 for an empty batch.
#[must_use]
pub fn risk_score(matched: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    // Half-up rounding of matched * 1000 / total in integer arithmetic.
    let scaled = matched.saturating_mul(2000).saturating_add(total) / total.saturating_mul(2);
    u8::try_from(scaled.min(100)).unwrap_or(100)
}

/// `min(95, 60 + 5 * matched)`, or 0 with no matches.
#[must_use]
pub fn confidence(matched: u64) -> u8 {
    if matched == 0 {
        return 0;
    }
    let value = matched.saturating_mul(5).saturating_add(60).min(95);
    u8::try_from(value).unwrap_or(95)
}

/// Canned advice for a risk level, plus a line naming the most common
/// crime type when there is one.
#[must_use]
pub fn recommendations(level: RiskLevel, top_crime_type: Option<&str>) -> Vec<String> {
    let canned: [&str; 3] = match level {
        RiskLevel::High => [
            "Avoid this area during late hours",
            "Travel in groups when possible",
            "Keep emergency contacts ready",
        ],
        RiskLevel::Medium => [
            "Stay alert and aware of surroundings",
            "Extra caution during nighttime",
            "Stick to well-lit areas",
        ],
        RiskLevel::Low => [
            "Generally safe area",
            "Maintain normal vigilance",
            "Good location for activities",
        ],
    };

    let mut lines: Vec<String> = canned.iter().map(ToString::to_string).collect();
    if let Some(crime_type) = top_crime_type {
        lines.push(format!("Most common: {crime_type} - Take precautions"));
    }
    lines
}

/// Counts incidents per time-of-day window in `tz`.
///
/// The safest window has the fewest incidents and the riskiest the most,
/// the earlier window winning ties. Without incidents the safest window is
/// the morning and the riskiest is late night.
pub fn time_patterns<'a, Tz: TimeZone>(
    incidents: impl IntoIterator<Item = &'a Incident>,
    tz: &Tz,
) -> TimePatterns {
    let mut counts: Vec<TimeWindowCount> = TimeWindow::iter()
        .map(|window| TimeWindowCount {
            window,
            hours: window.hours().to_string(),
            count: 0,
        })
        .collect();

    let mut seen = 0_u64;
    for incident in incidents {
        let hour = incident.timestamp.with_timezone(tz).hour();
        let window = TimeWindow::from_hour(hour);
        if let Some(slot) = counts.iter_mut().find(|c| c.window == window) {
            slot.count += 1;
            seen += 1;
        }
    }

    let (safest_window, riskiest_window) = if seen == 0 {
        (TimeWindow::Morning, TimeWindow::LateNight)
    } else {
        let mut safest = &counts[0];
        let mut riskiest = &counts[0];
        for slot in &counts[1..] {
            if slot.count < safest.count {
                safest = slot;
            }
            if slot.count > riskiest.count {
                riskiest = slot;
            }
        }
        (safest.window, riskiest.window)
    };

    TimePatterns {
        windows: counts,
        safest_window,
        riskiest_window,
    }
}

/// Scores `location` against the full incident batch.
///
/// # Errors
///
/// Returns [`AnalyticsError::Validation`] if `location` is blank.
pub fn assess_risk<Tz: TimeZone>(
    incidents: &[Incident],
    location: &str,
    now: &DateTime<Tz>,
) -> Result<RiskAssessment, AnalyticsError> {
    let location = require_text(location, "location")?;
    let query = LocationQuery::new(location);
    let matched: Vec<&Incident> = query.filter(incidents).collect();

    let matched_count = matched.len() as u64;
    let risk_score = risk_score(matched_count, incidents.len() as u64);
    let risk_level = RiskLevel::from_score(risk_score);

    let crime_type_counts: BTreeMap<String, u64> =
        count_first_seen(matched.iter().map(|i| i.crime_type.as_str()))
            .into_iter()
            .map(|(crime_type, count)| (crime_type.to_string(), count))
            .collect();
    let top_crime_type = rank(matched.iter().map(|i| i.crime_type.as_str()), 1)
        .first()
        .map(|(crime_type, _)| (*crime_type).to_string());

    log::debug!(
        "Risk for {location:?}: {matched_count}/{} incidents, score {risk_score}",
        incidents.len()
    );

    Ok(RiskAssessment {
        location: location.to_string(),
        risk_score,
        risk_level,
        total_incidents: matched_count,
        crime_type_counts,
        confidence: confidence(matched_count),
        recommendations: recommendations(risk_level, top_crime_type.as_deref()),
        top_crime_type,
        time_patterns: time_patterns(matched.iter().copied(), &now.timezone()),
        assessed_at: now.fixed_offset(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, incident};

    fn batch(matching: usize, other: usize) -> Vec<Incident> {
        let mut incidents: Vec<Incident> = (0..matching)
            .map(|i| {
                incident(
                    &format!("m{i}"),
                    if i % 2 == 0 { "Theft" } else { "Assault" },
                    "Guindy Signal",
                    at(2024, 1, 10, 22),
                )
            })
            .collect();
        incidents.extend(
            (0..other).map(|i| incident(&format!("o{i}"), "Robbery", "Adyar", at(2024, 1, 10, 9))),
        );
        incidents
    }

    #[test]
    fn four_of_ten_caps_score_at_100() {
        let now = at(2024, 1, 11, 0);
        let assessment = assess_risk(&batch(4, 6), "Guindy", &now).unwrap();
        assert_eq!(assessment.total_incidents, 4);
        assert_eq!(assessment.risk_score, 100);
        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert_eq!(assessment.confidence, 80);
        assert_eq!(assessment.crime_type_counts["Theft"], 2);
        assert_eq!(assessment.crime_type_counts["Assault"], 2);
        assert_eq!(assessment.top_crime_type.as_deref(), Some("Theft"));
        assert_eq!(assessment.recommendations.len(), 4);
        assert_eq!(
            assessment.recommendations[3],
            "Most common: Theft - Take precautions"
        );
        assert_eq!(assessment.assessed_at, now.fixed_offset());
    }

    #[test]
    fn score_rounds_half_up_and_levels_follow() {
        assert_eq!(risk_score(0, 10), 0);
        assert_eq!(risk_score(1, 1000), 1);
        assert_eq!(risk_score(1, 2000), 1);
        assert_eq!(risk_score(1, 2001), 0);
        assert_eq!(risk_score(41, 1000), 41);
        assert_eq!(risk_score(5, 10), 100);
        assert_eq!(risk_score(3, 0), 0);
        assert_eq!(RiskLevel::from_score(risk_score(45, 1000)), RiskLevel::Medium);
    }

    #[test]
    fn confidence_is_bounded() {
        assert_eq!(confidence(0), 0);
        assert_eq!(confidence(1), 65);
        assert_eq!(confidence(7), 95);
        assert_eq!(confidence(u64::MAX), 95);
    }

    #[test]
    fn no_matches_is_low_with_default_time_windows() {
        let now = at(2024, 1, 11, 0);
        let assessment = assess_risk(&batch(0, 5), "Velachery", &now).unwrap();
        assert_eq!(assessment.total_incidents, 0);
        assert_eq!(assessment.risk_score, 0);
        assert_eq!(assessment.risk_level, RiskLevel::Low);
        assert_eq!(assessment.confidence, 0);
        assert!(assessment.top_crime_type.is_none());
        assert_eq!(assessment.recommendations.len(), 3);
        assert_eq!(assessment.time_patterns.safest_window, TimeWindow::Morning);
        assert_eq!(
            assessment.time_patterns.riskiest_window,
            TimeWindow::LateNight
        );
    }

    #[test]
    fn exact_location_always_matches() {
        let incidents = batch(1, 500);
        let assessment = assess_risk(&incidents, "Guindy Signal", &at(2024, 1, 11, 0)).unwrap();
        assert!(assessment.total_incidents >= 1);
        assert_eq!(assessment.risk_score, 2);
        assert!(assessment.confidence <= 95);
    }

    #[test]
    fn short_token_query_matches_whole_batch() {
        let incidents = batch(0, 10);
        let assessment = assess_risk(&incidents, "MG Rd", &at(2024, 1, 11, 0)).unwrap();
        assert_eq!(assessment.total_incidents, 10);
        assert_eq!(assessment.risk_score, 100);
    }

    #[test]
    fn empty_batch_scores_zero() {
        let assessment = assess_risk(&[], "Guindy", &at(2024, 1, 11, 0)).unwrap();
        assert_eq!(assessment.risk_score, 0);
        assert_eq!(assessment.confidence, 0);
    }

    #[test]
    fn blank_location_is_validation_error() {
        let err = assess_risk(&batch(1, 1), "  ", &at(2024, 1, 11, 0)).unwrap_err();
        assert!(matches!(err, AnalyticsError::Validation { .. }));
    }

    #[test]
    fn time_patterns_use_local_hours() {
        let incidents = [
            incident("1", "Theft", "A", at(2024, 1, 10, 22)),
            incident("2", "Theft", "A", at(2024, 1, 10, 23)),
            incident("3", "Theft", "A", at(2024, 1, 10, 8)),
        ];

        let utc = time_patterns(&incidents, &chrono::Utc);
        assert_eq!(utc.riskiest_window, TimeWindow::Evening);
        assert_eq!(utc.safest_window, TimeWindow::LateNight);
        assert_eq!(utc.windows[3].count, 2);

        // +05:30 moves 22:00 and 23:00 UTC past midnight.
        let ist = chrono::FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let local = time_patterns(&incidents, &ist);
        assert_eq!(local.riskiest_window, TimeWindow::LateNight);
        assert_eq!(local.safest_window, TimeWindow::Morning);
        assert_eq!(local.windows[2].count, 1);
    }
}
