//! Incident feed client.

use std::path::Path;

use crate::SourceError;
use crate::config::FeedConfig;
use crate::retry::{self, RetryPolicy};

const USER_AGENT: &str = concat!("crime-spotter/", env!("CARGO_PKG_VERSION"));

/// Fetches the raw incident payload from the configured endpoint.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    url: String,
    retry: RetryPolicy,
}

impl FeedClient {
    /// Builds a client from the feed configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the configuration is invalid or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &FeedConfig) -> Result<Self, SourceError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
            retry: config.retry_policy(),
        })
    }

    /// The endpoint this client polls.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetches the full incident payload.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails after all retries or
    /// the body is not JSON.
    pub async fn fetch(&self) -> Result<serde_json::Value, SourceError> {
        log::debug!("Fetching incidents from {}", self.url);
        retry::send_json(|| self.client.get(&self.url), &self.retry).await
    }
}

/// Reads a saved feed payload from disk.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be read or is not JSON.
pub fn read_payload(path: &Path) -> Result<serde_json::Value, SourceError> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
