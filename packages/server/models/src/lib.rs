#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the crime spotter server.
//!
//! Analytics results are returned as-is from their own model crates; this
//! crate only holds the query parameters and the envelopes that are
//! specific to the HTTP API.

use chrono::{DateTime, Utc};
use crime_spotter_analytics_models::{StatsRange, TimeGranularity};
use crime_spotter_incident_models::Incident;
use serde::{Deserialize, Serialize};

/// Default page size for the incidents endpoint.
pub const DEFAULT_INCIDENT_LIMIT: usize = 100;

/// Health and feed status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether an incident batch is available to serve.
    pub healthy: bool,
    /// Server version.
    pub version: String,
    /// Incidents in the current batch.
    pub incident_count: usize,
    /// Batches ingested since startup.
    pub generation: u64,
    /// When the feed was last polled.
    pub last_poll_at: Option<DateTime<Utc>>,
    /// Error from the last poll, if it failed.
    pub last_error: Option<String>,
    /// Whether the batch being served is older than the last poll.
    pub stale: bool,
}

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}

impl ApiError {
    /// Wraps a message.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// One page of incidents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiIncidentPage {
    /// Incidents in the whole batch.
    pub total: usize,
    /// Index of the first returned incident.
    pub offset: usize,
    /// Page size requested.
    pub limit: usize,
    /// The page.
    pub incidents: Vec<Incident>,
}

/// Query parameters for the incidents endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentQueryParams {
    /// Newest timestamp first instead of feed order.
    pub newest_first: Option<bool>,
    /// Maximum results to return.
    pub limit: Option<usize>,
    /// Number of results to skip.
    pub offset: Option<usize>,
}

/// Query parameters for the cluster endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterQueryParams {
    /// Clustering radius in degrees. Defaults to the configured radius.
    pub radius: Option<f64>,
}

/// Query parameters for the trends endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendQueryParams {
    /// Bucket size, `daily` when omitted.
    pub granularity: Option<TimeGranularity>,
}

/// Query parameters for the risk endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskQueryParams {
    /// Free-text location to assess.
    pub location: Option<String>,
}

/// Query parameters for the routes endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteQueryParams {
    /// Free-text start location.
    pub start: Option<String>,
    /// Free-text end location.
    pub end: Option<String>,
}

/// Query parameters for the stats endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQueryParams {
    /// Time filter, `today` when omitted.
    pub range: Option<StatsRange>,
}

/// Query parameters for the suggestions endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionQueryParams {
    /// Text typed so far.
    pub q: Option<String>,
    /// Maximum suggestions to return.
    pub limit: Option<usize>,
}
