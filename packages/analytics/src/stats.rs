//! Dashboard summary statistics.

use chrono::{DateTime, Datelike as _, Days, TimeDelta, TimeZone, Timelike as _};
use crime_spotter_analytics_models::{DashboardStats, StatsRange};
use crime_spotter_incident_models::Incident;

use crate::temporal::daily_buckets;
use crate::{percentage, top_crime_types, top_locations};

/// Computes dashboard figures relative to `now`.
///
/// `today`, `this_month` and `range` filters compare local calendar fields
/// in now's time zone; `this_week` and [`StatsRange::Week`] take every
/// incident from 7 days before now onwards.
pub fn dashboard_stats<Tz: TimeZone>(
    incidents: &[Incident],
    range: StatsRange,
    now: &DateTime<Tz>,
) -> DashboardStats {
    let tz = now.timezone();
    let today = now.date_naive();
    let yesterday = today.checked_sub_days(Days::new(1));
    let week_ago = now.to_utc() - TimeDelta::days(7);

    let mut today_count = 0_u64;
    let mut yesterday_count = 0_u64;
    let mut this_week = 0_u64;
    let mut this_month = 0_u64;
    let mut hourly = vec![0_u64; 24];
    let mut filtered: Vec<&Incident> = Vec::new();

    for incident in incidents {
        let local = incident.timestamp.with_timezone(&tz).naive_local();
        let is_today = local.date() == today;
        let in_week = incident.timestamp >= week_ago;
        let in_month = local.year() == today.year() && local.month() == today.month();

        today_count += u64::from(is_today);
        yesterday_count += u64::from(Some(local.date()) == yesterday);
        this_week += u64::from(in_week);
        this_month += u64::from(in_month);

        let in_range = match range {
            StatsRange::Today => is_today,
            StatsRange::Week => in_week,
            StatsRange::Month => in_month,
            StatsRange::Year => local.year() == today.year(),
            StatsRange::All => true,
        };
        if in_range {
            hourly[local.hour() as usize] += 1;
            filtered.push(incident);
        }
    }

    let filtered_count = filtered.len() as u64;
    let today_growth = if yesterday_count == 0 {
        0.0
    } else {
        let delta = today_count.abs_diff(yesterday_count);
        let magnitude = percentage(delta, yesterday_count);
        if today_count < yesterday_count {
            -magnitude
        } else {
            magnitude
        }
    };

    DashboardStats {
        range,
        total: incidents.len() as u64,
        today: today_count,
        this_week,
        this_month,
        filtered: filtered_count,
        top_crime_types: top_crime_types(
            filtered.iter().map(|i| i.crime_type.as_str()),
            filtered_count,
        ),
        top_locations: top_locations(filtered.iter().map(|i| i.location.as_str())),
        hourly,
        daily_trend: daily_buckets(incidents, now),
        today_growth,
    }
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;
    use crate::test_support::{at, incident};

    fn sample() -> Vec<Incident> {
        vec![
            incident("1", "Theft", "Guindy", at(2024, 3, 15, 9)),
            incident("2", "Theft", "Guindy", at(2024, 3, 15, 21)),
            incident("3", "Assault", "Adyar", at(2024, 3, 15, 21)),
            incident("4", "Theft", "Adyar", at(2024, 3, 14, 10)),
            incident("5", "Robbery", "T Nagar", at(2024, 3, 2, 10)),
            incident("6", "Robbery", "T Nagar", at(2024, 1, 20, 10)),
            incident("7", "Fraud", "Anna Nagar", at(2023, 12, 31, 23)),
        ]
    }

    #[test]
    fn headline_counts() {
        let now = at(2024, 3, 15, 23);
        let stats = dashboard_stats(&sample(), StatsRange::All, &now);
        assert_eq!(stats.total, 7);
        assert_eq!(stats.today, 3);
        assert_eq!(stats.this_week, 4);
        assert_eq!(stats.this_month, 5);
        assert_eq!(stats.filtered, 7);
        assert!((stats.today_growth - 200.0).abs() < 1e-9);
    }

    #[test]
    fn range_filters_rankings_and_hourly() {
        let now = at(2024, 3, 15, 23);
        let stats = dashboard_stats(&sample(), StatsRange::Today, &now);
        assert_eq!(stats.filtered, 3);
        assert_eq!(stats.hourly.len(), 24);
        assert_eq!(stats.hourly[9], 1);
        assert_eq!(stats.hourly[21], 2);
        assert_eq!(stats.hourly.iter().sum::<u64>(), 3);

        assert_eq!(stats.top_crime_types[0].crime_type, "Theft");
        assert_eq!(stats.top_crime_types[0].count, 2);
        assert!((stats.top_crime_types[0].percentage - 66.7).abs() < 1e-9);
        assert_eq!(stats.top_locations[0].location, "Guindy");

        let year = dashboard_stats(&sample(), StatsRange::Year, &now);
        assert_eq!(year.filtered, 6);
        let month = dashboard_stats(&sample(), StatsRange::Month, &now);
        assert_eq!(month.filtered, 5);
        let week = dashboard_stats(&sample(), StatsRange::Week, &now);
        assert_eq!(week.filtered, 4);
    }

    #[test]
    fn daily_trend_spans_whole_batch() {
        let now = at(2024, 3, 15, 23);
        let stats = dashboard_stats(&sample(), StatsRange::Today, &now);
        let counts: Vec<u64> = stats.daily_trend.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![0, 0, 0, 0, 0, 1, 3]);
    }

    #[test]
    fn growth_is_negative_when_today_is_quieter() {
        let now = at(2024, 3, 16, 12);
        let stats = dashboard_stats(&sample(), StatsRange::All, &now);
        assert_eq!(stats.today, 0);
        assert!((stats.today_growth - -100.0).abs() < 1e-9);
    }

    #[test]
    fn growth_is_zero_without_yesterday() {
        let now = at(2024, 3, 14, 12);
        let stats = dashboard_stats(&sample(), StatsRange::All, &now);
        assert_eq!(stats.today, 1);
        assert!(stats.today_growth.abs() < f64::EPSILON);
    }

    #[test]
    fn hours_follow_now_time_zone() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = at(2024, 3, 15, 12).with_timezone(&plus_two);
        let incidents = [incident("1", "Theft", "A", at(2024, 3, 15, 9))];
        let stats = dashboard_stats(&incidents, StatsRange::Today, &now);
        assert_eq!(stats.hourly[11], 1);
    }

    #[test]
    fn empty_batch() {
        let stats = dashboard_stats(&[], StatsRange::All, &at(2024, 3, 15, 12));
        assert_eq!(stats.total, 0);
        assert!(stats.top_crime_types.is_empty());
        assert_eq!(stats.daily_trend.len(), 7);
    }
}
