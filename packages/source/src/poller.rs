//! The shared feed poller.
//!
//! One background task owns the fetch cadence and publishes every poll
//! outcome on a [`tokio::sync::watch`] channel. Views subscribe by cloning
//! the receiver instead of running their own timers.
//!
//! Polls never overlap: the next sleep only starts once the previous fetch
//! and ingestion have finished. When every receiver has been dropped the
//! task stops, abandoning any fetch still in flight so that its result is
//! never applied.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crime_spotter_incident_models::IncidentBatch;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::SourceError;
use crate::feed::FeedClient;
use crate::store::IncidentStore;

/// State published after every poll.
#[derive(Debug, Clone, Default)]
pub struct PollSnapshot {
    /// Latest successfully ingested batch. Survives failed polls.
    pub batch: Option<Arc<IncidentBatch>>,
    /// Error from the most recent poll, `None` if it succeeded.
    pub last_error: Option<String>,
    /// When the most recent poll finished.
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// Number of batches ingested so far.
    pub generation: u64,
}

impl PollSnapshot {
    /// Whether the latest poll failed and `batch` is left over from an
    /// earlier one.
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        self.last_error.is_some() && self.batch.is_some()
    }
}

/// Spawns the polling task around an arbitrary fetch function.
///
/// Returns the receiver side of the snapshot channel and the task handle.
/// The task exits once every receiver is dropped.
pub fn spawn_poller<F, Fut>(
    fetch: F,
    interval: Duration,
) -> (watch::Receiver<PollSnapshot>, JoinHandle<()>)
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Value, SourceError>> + Send + 'static,
{
    let (tx, rx) = watch::channel(PollSnapshot::default());

    let handle = tokio::spawn(async move {
        let mut store = IncidentStore::new();
        let mut generation = 0;

        loop {
            let fetched = tokio::select! {
                () = tx.closed() => {
                    log::debug!("All poll subscribers dropped; abandoning in-flight fetch");
                    break;
                }
                result = fetch() => result,
            };

            let attempted_at = Utc::now();
            let snapshot = match fetched.and_then(|payload| store.ingest(&payload, attempted_at)) {
                Ok(batch) => {
                    generation += 1;
                    log::info!(
                        "Poll {generation}: {} incidents ({} spatial)",
                        batch.len(),
                        batch.spatial().count()
                    );
                    PollSnapshot {
                        batch: Some(batch),
                        last_error: None,
                        last_attempt_at: Some(attempted_at),
                        generation,
                    }
                }
                Err(e) => {
                    let retained = store.current();
                    log::warn!(
                        "Poll failed: {e} (keeping previous batch of {} incidents)",
                        retained.as_ref().map_or(0, |b| b.len())
                    );
                    PollSnapshot {
                        batch: retained,
                        last_error: Some(e.to_string()),
                        last_attempt_at: Some(attempted_at),
                        generation,
                    }
                }
            };

            if tx.send(snapshot).is_err() {
                break;
            }

            tokio::select! {
                () = tx.closed() => break,
                () = tokio::time::sleep(interval) => {}
            }
        }

        log::debug!("Poller stopped");
    });

    (rx, handle)
}

/// Spawns the polling task for a [`FeedClient`].
pub fn spawn_feed_poller(
    client: FeedClient,
    interval: Duration,
) -> (watch::Receiver<PollSnapshot>, JoinHandle<()>) {
    let client = Arc::new(client);
    log::info!("Polling {} every {interval:?}", client.url());
    spawn_poller(
        move || {
            let client = Arc::clone(&client);
            async move { client.fetch().await }
        },
        interval,
    )
}
