#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident feed ingestion, normalization and polling.
//!
//! The feed is a single HTTP endpoint returning a JSON array of loosely
//! typed incident records. [`store::IncidentStore`] turns that payload into
//! an [`IncidentBatch`](crime_spotter_incident_models::IncidentBatch),
//! [`feed::FeedClient`] fetches it with retries, and [`poller`] runs the one
//! shared polling loop that publishes every new batch to its subscribers.

pub mod config;
pub mod feed;
pub mod parsing;
pub mod poller;
pub mod retry;
pub mod store;

/// Errors that can occur while fetching or ingesting the incident feed.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML configuration could not be parsed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The feed payload was valid JSON but not an array of records.
    #[error("Expected a JSON array of incidents, found {found}")]
    NotAnArray {
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// The server answered with a non-success status.
    #[error("Unexpected response: {message}")]
    Response {
        /// Description of what went wrong.
        message: String,
    },

    /// Configuration is invalid.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}
