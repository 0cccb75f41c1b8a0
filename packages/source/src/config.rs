//! Feed configuration.
//!
//! Deserialized from the `[feed]` table of the application TOML. Every key
//! has a default so an empty table is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::SourceError;
use crate::retry::RetryPolicy;

/// Default incident feed endpoint.
pub const DEFAULT_FEED_URL: &str = "https://api-2-2-88x4.onrender.com/crimes";

/// Where and how often to poll the incident feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// URL of the endpoint returning the incident array.
    pub url: String,
    /// Seconds to wait between the end of one poll and the start of the next.
    pub poll_interval_secs: u64,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Connection-level retries per poll.
    pub max_retries: u32,
    /// Re-fetches when the body cannot be decoded.
    pub max_body_retries: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            poll_interval_secs: 10,
            request_timeout_secs: 30,
            max_retries: 2,
            max_body_retries: 1,
        }
    }
}

impl FeedConfig {
    /// Delay between polls.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Timeout applied to every feed request.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Retry budget for a single poll.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            max_body_retries: self.max_body_retries,
            ..RetryPolicy::default()
        }
    }

    /// Checks that the configuration can drive a poller.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Config`] if the URL is blank or either
    /// interval is zero.
    pub fn validate(&self) -> Result<(), SourceError> {
        if self.url.trim().is_empty() {
            return Err(SourceError::Config {
                message: "feed url must not be empty".to_string(),
            });
        }
        if self.poll_interval_secs == 0 {
            return Err(SourceError::Config {
                message: "poll_interval_secs must be at least 1".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(SourceError::Config {
                message: "request_timeout_secs must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Parses a standalone feed configuration from TOML.
///
/// # Errors
///
/// Returns [`SourceError`] if the TOML is malformed or the resulting
/// configuration fails [`FeedConfig::validate`].
pub fn parse_feed_toml(toml_str: &str) -> Result<FeedConfig, SourceError> {
    let config: FeedConfig = toml::from_str(toml_str)?;
    config.validate()?;
    Ok(config)
}
