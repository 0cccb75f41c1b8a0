//! Period bucketing and trend detection.
//!
//! Buckets are rebuilt from the full incident list on every call. Calendar
//! buckets (days, months, years) compare dates in now's time zone; weekly
//! buckets are rolling 7-day windows ending at now.

use chrono::{DateTime, Datelike as _, Days, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use crime_spotter_analytics_models::{TimeGranularity, TrendAnalysis, TrendBucket};
use crime_spotter_incident_models::Incident;

use crate::{round1, top_crime_types, top_locations};

/// Buckets compared by [`trend_percentage`] on each side.
const TREND_SPAN: usize = 3;

enum Span {
    Day(NaiveDate),
    Rolling {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    Month {
        year: i32,
        month: u32,
    },
    Year(i32),
}

impl Span {
    fn contains(&self, local: &NaiveDateTime, utc: DateTime<Utc>) -> bool {
        match self {
            Self::Day(date) => local.date() == *date,
            Self::Rolling { start, end } => *start <= utc && utc < *end,
            Self::Month { year, month } => local.year() == *year && local.month() == *month,
            Self::Year(year) => local.year() == *year,
        }
    }
}

struct Window {
    label: String,
    period_start: NaiveDate,
    span: Span,
}

fn last_days(today: NaiveDate, days: u64) -> Vec<Window> {
    (0..days)
        .rev()
        .filter_map(|i| today.checked_sub_days(Days::new(i)))
        .map(|date| Window {
            label: date.format("%a").to_string(),
            period_start: date,
            span: Span::Day(date),
        })
        .collect()
}

fn last_weeks<Tz: TimeZone>(now: &DateTime<Tz>, weeks: i64) -> Vec<Window> {
    let tz = now.timezone();
    let now = now.with_timezone(&Utc);

    (0..weeks)
        .rev()
        .map(|i| {
            let start = now - TimeDelta::weeks(i + 1);
            let end = now - TimeDelta::weeks(i);
            Window {
                label: format!("W{}", weeks - i),
                period_start: start.with_timezone(&tz).date_naive(),
                span: Span::Rolling { start, end },
            }
        })
        .collect()
}

fn last_months(today: NaiveDate, months: usize) -> Vec<Window> {
    let (mut year, mut month) = (today.year(), today.month());
    let mut spans = Vec::with_capacity(months);
    for _ in 0..months {
        spans.push((year, month));
        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }

    spans
        .into_iter()
        .rev()
        .filter_map(|(year, month)| {
            let first = NaiveDate::from_ymd_opt(year, month, 1)?;
            Some(Window {
                label: first.format("%b").to_string(),
                period_start: first,
                span: Span::Month { year, month },
            })
        })
        .collect()
}

fn last_years(today: NaiveDate, years: i32) -> Vec<Window> {
    (0..years)
        .rev()
        .filter_map(|i| {
            let year = today.year() - i;
            Some(Window {
                label: year.to_string(),
                period_start: NaiveDate::from_ymd_opt(year, 1, 1)?,
                span: Span::Year(year),
            })
        })
        .collect()
}

fn windows<Tz: TimeZone>(granularity: TimeGranularity, now: &DateTime<Tz>) -> Vec<Window> {
    let today = now.date_naive();
    match granularity {
        TimeGranularity::Daily => last_days(today, 7),
        TimeGranularity::Weekly => last_weeks(now, 8),
        TimeGranularity::Monthly => last_months(today, 12),
        TimeGranularity::Yearly => last_years(today, 5),
    }
}

/// Assigns incidents to windows. Returns per-window counts and the
/// in-window incidents ordered window by window, then in feed order.
fn fill<'a, Tz: TimeZone>(
    windows: Vec<Window>,
    incidents: &'a [Incident],
    tz: &Tz,
) -> (Vec<TrendBucket>, Vec<&'a Incident>) {
    let located: Vec<(NaiveDateTime, &Incident)> = incidents
        .iter()
        .map(|incident| (incident.timestamp.with_timezone(tz).naive_local(), incident))
        .collect();

    let mut in_window = Vec::new();
    let buckets = windows
        .into_iter()
        .map(|window| {
            let before = in_window.len();
            in_window.extend(
                located
                    .iter()
                    .filter(|(local, incident)| window.span.contains(local, incident.timestamp))
                    .map(|(_, incident)| *incident),
            );
            TrendBucket {
                label: window.label,
                period_start: window.period_start,
                count: (in_window.len() - before) as u64,
            }
        })
        .collect();

    (buckets, in_window)
}

/// Counts for the last 7 local calendar days including today, oldest first.
pub fn daily_buckets<Tz: TimeZone>(incidents: &[Incident], now: &DateTime<Tz>) -> Vec<TrendBucket> {
    fill(last_days(now.date_naive(), 7), incidents, &now.timezone()).0
}

/// Percent change of the mean of the last 3 bucket counts against the mean
/// of the 3 before them, one decimal.
///
/// Both means divide by 3 even when fewer earlier buckets exist. Returns 0
/// when the earlier mean is 0.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn trend_percentage(counts: &[u64]) -> f64 {
    let n = counts.len();
    let recent_start = n.saturating_sub(TREND_SPAN);
    let earlier_start = n.saturating_sub(2 * TREND_SPAN);

    let recent: u64 = counts[recent_start..].iter().sum();
    let earlier: u64 = counts[earlier_start..recent_start].iter().sum();

    if earlier == 0 {
        return 0.0;
    }

    let recent_mean = recent as f64 / TREND_SPAN as f64;
    let earlier_mean = earlier as f64 / TREND_SPAN as f64;
    round1((recent_mean - earlier_mean) / earlier_mean * 100.0)
}

/// Buckets incidents at `granularity` relative to `now` and derives the
/// trend signal, hotspots and crime type mix for the covered window.
#[allow(clippy::cast_precision_loss)]
pub fn analyze_trends<Tz: TimeZone>(
    incidents: &[Incident],
    granularity: TimeGranularity,
    now: &DateTime<Tz>,
) -> TrendAnalysis {
    let (buckets, in_window) = fill(windows(granularity, now), incidents, &now.timezone());

    let counts: Vec<u64> = buckets.iter().map(|b| b.count).collect();
    let total = in_window.len() as u64;
    let trend_percentage = trend_percentage(&counts);
    let average_per_period = if buckets.is_empty() {
        0.0
    } else {
        round1(total as f64 / buckets.len() as f64)
    };

    log::debug!(
        "{granularity} trend over {} incidents: {total} in window, {trend_percentage}%",
        incidents.len()
    );

    TrendAnalysis {
        granularity,
        total,
        trend_percentage,
        is_increasing: trend_percentage > 0.0,
        average_per_period,
        hotspots: top_locations(in_window.iter().map(|i| i.location.as_str())),
        top_crime_types: top_crime_types(in_window.iter().map(|i| i.crime_type.as_str()), total),
        buckets,
    }
}
