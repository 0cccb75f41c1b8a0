//! HTTP retry helpers for transient errors.
//!
//! The feed client sends every request through [`send_json`] instead of
//! calling `reqwest::RequestBuilder::send()` directly, so transient
//! failures (timeouts, connection resets, server errors, rate limiting)
//! are retried with exponential backoff.
//!
//! Retry budgets are kept small by default: a poll that keeps failing is
//! retried on the next tick anyway, and a long backoff would only delay
//! the next poll.

use std::time::Duration;

use crate::SourceError;

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 500;

/// How many times a request is retried before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries for connection errors, timeouts, HTTP 429 and HTTP 5xx.
    pub max_retries: u32,
    /// Full re-fetches when the body arrives but cannot be decoded.
    pub max_body_retries: u32,
    /// Delay before the first retry; doubles on every further attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            max_body_retries: 1,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
    }
}

/// Sends an HTTP request and parses the response body as JSON.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`] (builders are consumed by `.send()`).
///
/// Two layers of retry apply: connection-level retries in [`send_inner`],
/// and whole-request re-fetches when the body cannot be parsed. HTTP 4xx
/// other than 429 is never retried.
///
/// # Errors
///
/// Returns [`SourceError`] if the request still fails after all retries,
/// the server returns a non-retryable status, or the body cannot be parsed
/// as JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(
    build_request: F,
    policy: &RetryPolicy,
) -> Result<serde_json::Value, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut body_attempt = 0;

    loop {
        let response = send_inner(&build_request, policy).await?;
        let url = response.url().to_string();
        let status = response.status();

        let failure = match response.text().await {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(value) => return Ok(value),
                Err(json_err) => {
                    let preview = body_preview(&text);
                    log::warn!(
                        "JSON parse failed\n  \
                         url: {url}\n  \
                         status: {status}\n  \
                         received: {} bytes\n  \
                         parse error: {json_err}\n  \
                         body preview: {preview}",
                        text.len(),
                    );
                    SourceError::Json(json_err)
                }
            },
            Err(e) => {
                log::warn!("Response body read failed\n  url: {url}\n  status: {status}\n  error: {e}");
                SourceError::Http(e)
            }
        };

        if body_attempt >= policy.max_body_retries {
            log::error!("Giving up on {url} after {body_attempt} body retries");
            return Err(failure);
        }

        body_attempt += 1;
        let delay = policy.delay_for(body_attempt);
        log::warn!(
            "  body retry {body_attempt}/{} in {delay:?}...",
            policy.max_body_retries
        );
        tokio::time::sleep(delay).await;
    }
}

/// Core retry loop for connection-level failures.
///
/// Returns the successful [`reqwest::Response`] (status 2xx or 3xx).
#[allow(clippy::future_not_send)]
async fn send_inner<F>(
    build_request: &F,
    policy: &RetryPolicy,
) -> Result<reqwest::Response, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let max_retries = policy.max_retries;
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = policy.delay_for(attempt);
            log::warn!("  retry {attempt}/{max_retries} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        let error = match build_request().send().await {
            Err(e) => {
                if !is_transient(&e) {
                    return Err(SourceError::Http(e));
                }
                log::warn!("  transient error: {e}");
                SourceError::Http(e)
            }
            Ok(response) => {
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    log::warn!("  HTTP {status} from {}", response.url());
                    SourceError::Response {
                        message: format!("HTTP {status}"),
                    }
                } else if status.is_client_error() {
                    return Err(SourceError::Response {
                        message: format!("HTTP {status}"),
                    });
                } else {
                    return Ok(response);
                }
            }
        };

        if attempt >= max_retries {
            return Err(error);
        }
        attempt += 1;
    }
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_decode() || e.is_request()
}

fn body_preview(text: &str) -> String {
    if text.len() <= BODY_PREVIEW_LEN {
        return text.to_string();
    }
    let mut end = BODY_PREVIEW_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_from_base_delay() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(500),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_secs(1));
        assert_eq!(policy.delay_for(3), Duration::from_secs(2));
    }

    #[test]
    fn body_preview_truncates_on_char_boundary() {
        let text = "é".repeat(400);
        let preview = body_preview(&text);
        assert!(preview.ends_with("..."));
        assert!(preview.len() <= BODY_PREVIEW_LEN + 3);
    }

    #[test]
    fn short_body_preview_is_unchanged() {
        assert_eq!(body_preview("[]"), "[]");
    }
}
