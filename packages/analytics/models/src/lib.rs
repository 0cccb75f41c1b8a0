#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types produced by the incident analytics.
//!
//! Every type here is a plain JSON-serializable value so that a UI layer
//! can bind to it without knowing how it was computed.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use crime_spotter_incident_models::Incident;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Bucket size for trend queries.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TimeGranularity {
    /// Last 7 calendar days.
    #[default]
    Daily,
    /// Last 8 rolling 7-day windows.
    Weekly,
    /// Last 12 calendar months.
    Monthly,
    /// Last 5 calendar years.
    Yearly,
}

impl TimeGranularity {
    /// Number of buckets produced for this granularity.
    #[must_use]
    pub const fn bucket_count(self) -> usize {
        match self {
            Self::Daily => 7,
            Self::Weekly => 8,
            Self::Monthly => 12,
            Self::Yearly => 5,
        }
    }
}

/// One period window and the number of incidents inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendBucket {
    /// Display label (`Mon`, `W3`, `Jan`, `2024`).
    pub label: String,
    /// First calendar day covered by the bucket.
    pub period_start: NaiveDate,
    /// Incidents inside the bucket.
    pub count: u64,
}

/// Incident count for one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCount {
    /// Location as it appears in the feed.
    pub location: String,
    /// Number of incidents.
    pub count: u64,
}

/// Incident count for one crime type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeTypeCount {
    /// Crime type as it appears in the feed.
    pub crime_type: String,
    /// Number of incidents.
    pub count: u64,
    /// Share of the enclosing total, in percent with one decimal.
    pub percentage: f64,
}

/// Bucketed incident counts plus the derived trend signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    /// Granularity the buckets were built with.
    pub granularity: TimeGranularity,
    /// Buckets ordered oldest to newest.
    pub buckets: Vec<TrendBucket>,
    /// Incidents falling in any bucket.
    pub total: u64,
    /// Percent change of the last 3 buckets' mean against the 3 before.
    pub trend_percentage: f64,
    /// `trend_percentage > 0`.
    pub is_increasing: bool,
    /// `total` divided by the number of buckets, one decimal.
    pub average_per_period: f64,
    /// Top 5 locations inside the window.
    pub hotspots: Vec<LocationCount>,
    /// Top 5 crime types inside the window.
    pub top_crime_types: Vec<CrimeTypeCount>,
}

/// Coarse risk classification of a location.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum RiskLevel {
    /// Score of 40 or less.
    Low,
    /// Score above 40, up to 70.
    Medium,
    /// Score above 70.
    High,
}

impl RiskLevel {
    /// Classifies a risk score. Thresholds are exclusive.
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        if score > 70 {
            Self::High
        } else if score > 40 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// A six-hour slice of the day.
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
    strum_macros::EnumIter,
)]
pub enum TimeWindow {
    /// 00:00 to 06:00.
    #[serde(rename = "Late Night")]
    #[strum(serialize = "Late Night")]
    LateNight,
    /// 06:00 to 12:00.
    Morning,
    /// 12:00 to 18:00.
    Afternoon,
    /// 18:00 to midnight.
    Evening,
}

impl TimeWindow {
    /// The window containing a local hour (0-23).
    #[must_use]
    pub const fn from_hour(hour: u32) -> Self {
        match hour {
            0..6 => Self::LateNight,
            6..12 => Self::Morning,
            12..18 => Self::Afternoon,
            _ => Self::Evening,
        }
    }

    /// Human-readable hour span.
    #[must_use]
    pub const fn hours(self) -> &'static str {
        match self {
            Self::LateNight => "12 AM - 6 AM",
            Self::Morning => "6 AM - 12 PM",
            Self::Afternoon => "12 PM - 6 PM",
            Self::Evening => "6 PM - 12 AM",
        }
    }
}

/// Incidents counted in one time-of-day window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindowCount {
    /// The window.
    pub window: TimeWindow,
    /// Hour span label for display.
    pub hours: String,
    /// Matched incidents whose local hour falls in the window.
    pub count: u64,
}

/// Time-of-day breakdown of the incidents matched by a risk query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimePatterns {
    /// Counts in window order, starting with late night.
    pub windows: Vec<TimeWindowCount>,
    /// Window with the fewest incidents.
    pub safest_window: TimeWindow,
    /// Window with the most incidents.
    pub riskiest_window: TimeWindow,
}

/// Heuristic risk estimate for a free-text location query.
///
/// `risk_score` is a relative-frequency indicator (share of the batch that
/// matches the query, scaled by 1000 and capped at 100), not a probability.
/// `confidence` only reflects how many incidents back the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    /// The query as given (trimmed).
    pub location: String,
    /// 0 to 100.
    pub risk_score: u8,
    /// Level derived from `risk_score`.
    pub risk_level: RiskLevel,
    /// Number of incidents matching the location.
    pub total_incidents: u64,
    /// Matched incidents per crime type.
    pub crime_type_counts: BTreeMap<String, u64>,
    /// Most frequent crime type among matches.
    pub top_crime_type: Option<String>,
    /// 0 to 95.
    pub confidence: u8,
    /// Canned safety advice for the level.
    pub recommendations: Vec<String>,
    /// Time-of-day breakdown of the matches.
    pub time_patterns: TimePatterns,
    /// The "now" the assessment was computed against.
    pub assessed_at: DateTime<FixedOffset>,
}

/// Time filter for dashboard statistics.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StatsRange {
    /// Same local calendar day as now.
    #[default]
    Today,
    /// The last 7 days.
    Week,
    /// Same local calendar month as now.
    Month,
    /// Same local calendar year as now.
    Year,
    /// Every incident.
    All,
}

/// Summary figures for the analytics dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Range the `filtered` figures were computed over.
    pub range: StatsRange,
    /// Incidents in the batch.
    pub total: u64,
    /// Incidents on the current local day.
    pub today: u64,
    /// Incidents in the last 7 days.
    pub this_week: u64,
    /// Incidents in the current local month.
    pub this_month: u64,
    /// Incidents inside `range`.
    pub filtered: u64,
    /// Top 5 crime types inside `range`.
    pub top_crime_types: Vec<CrimeTypeCount>,
    /// Top 5 locations inside `range`.
    pub top_locations: Vec<LocationCount>,
    /// Incidents inside `range` per local hour of day.
    pub hourly: Vec<u64>,
    /// Last 7 local days over the whole batch, oldest first.
    pub daily_trend: Vec<TrendBucket>,
    /// Percent change from yesterday to today, one decimal.
    pub today_growth: f64,
}

/// One of the fixed route alternatives.
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
    strum_macros::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RouteProfile {
    /// Avoids incident areas at the cost of distance.
    Safest,
    /// Shortest path regardless of incidents.
    Fastest,
    /// A compromise between the two.
    Balanced,
}

/// Display label for a route safety score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum SafetyLabel {
    /// Score of 85 or more.
    #[serde(rename = "Very Safe")]
    #[strum(serialize = "Very Safe")]
    VerySafe,
    /// Score of 70 to 84.
    #[serde(rename = "Moderately Safe")]
    #[strum(serialize = "Moderately Safe")]
    ModeratelySafe,
    /// Score below 70.
    #[serde(rename = "Use Caution")]
    #[strum(serialize = "Use Caution")]
    UseCaution,
}

impl SafetyLabel {
    /// Classifies a safety score. Lower bounds are inclusive.
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        if score >= 85 {
            Self::VerySafe
        } else if score >= 70 {
            Self::ModeratelySafe
        } else {
            Self::UseCaution
        }
    }
}

/// Estimated safety of one route profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOption {
    /// Which alternative this is.
    pub profile: RouteProfile,
    /// 0 to 100, higher is safer.
    pub safety_score: u8,
    /// Label for `safety_score`.
    pub safety_label: SafetyLabel,
    /// Estimated incidents along the route.
    pub incidents: u64,
}

/// Route alternatives between two free-text locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSafety {
    /// Start location as given (trimmed).
    pub start: String,
    /// End location as given (trimmed).
    pub end: String,
    /// Incidents matching the start location.
    pub start_incidents: u64,
    /// Incidents matching the end location.
    pub end_incidents: u64,
    /// Safest, fastest and balanced alternatives, in that order.
    pub routes: Vec<RouteOption>,
}

/// Which new incidents should raise an alert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlertFilter {
    /// Crime types to alert on. Empty means every type.
    pub crime_types: Vec<String>,
    /// Only alert on locations containing this text (case-insensitive).
    pub location: Option<String>,
}

/// A new incident that passed the alert filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// The incident that triggered the alert.
    pub incident: Incident,
    /// When the incident was first seen in the feed.
    pub detected_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn granularity_parses_case_insensitively() {
        assert_eq!(
            TimeGranularity::from_str("Weekly").unwrap(),
            TimeGranularity::Weekly
        );
        assert_eq!(TimeGranularity::Monthly.to_string(), "monthly");
        assert!(TimeGranularity::from_str("hourly").is_err());
    }

    #[test]
    fn risk_level_thresholds_are_exclusive() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(40), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(41), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(70), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(71), RiskLevel::High);
        assert_eq!(RiskLevel::High.to_string(), "High");
    }

    #[test]
    fn time_windows_cover_the_day() {
        assert_eq!(TimeWindow::from_hour(0), TimeWindow::LateNight);
        assert_eq!(TimeWindow::from_hour(5), TimeWindow::LateNight);
        assert_eq!(TimeWindow::from_hour(6), TimeWindow::Morning);
        assert_eq!(TimeWindow::from_hour(12), TimeWindow::Afternoon);
        assert_eq!(TimeWindow::from_hour(23), TimeWindow::Evening);
        assert_eq!(
            serde_json::to_value(TimeWindow::LateNight).unwrap(),
            "Late Night"
        );
    }

    #[test]
    fn safety_labels() {
        assert_eq!(SafetyLabel::from_score(100), SafetyLabel::VerySafe);
        assert_eq!(SafetyLabel::from_score(85), SafetyLabel::VerySafe);
        assert_eq!(SafetyLabel::from_score(70), SafetyLabel::ModeratelySafe);
        assert_eq!(SafetyLabel::from_score(69), SafetyLabel::UseCaution);
        assert_eq!(SafetyLabel::UseCaution.to_string(), "Use Caution");
    }

    #[test]
    fn alert_filter_defaults_from_empty_object() {
        let filter: AlertFilter = serde_json::from_str("{}").unwrap();
        assert_eq!(filter, AlertFilter::default());

        let filter: AlertFilter =
            serde_json::from_str(r#"{"crimeTypes":["Theft"],"location":"Guindy"}"#).unwrap();
        assert_eq!(filter.crime_types, vec!["Theft".to_string()]);
        assert_eq!(filter.location.as_deref(), Some("Guindy"));
    }

    #[test]
    fn stats_range_round_trips_through_strings() {
        assert_eq!(StatsRange::from_str("all").unwrap(), StatsRange::All);
        assert_eq!(StatsRange::Week.as_ref(), "week");
    }
}
