#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for crime incident analytics.
//!
//! A single background poller fetches the incident feed and publishes each
//! batch on a watch channel. Request handlers read the latest snapshot and
//! run the analytics on it; nothing is cached between requests. A second
//! task follows the same channel to record alerts for new incidents.

pub mod config;
mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use crime_spotter_analytics::alerts::{AlertLog, detect_alerts};
use crime_spotter_analytics_models::AlertFilter;
use crime_spotter_incident_models::IncidentBatch;
use crime_spotter_source::SourceError;
use crime_spotter_source::feed::FeedClient;
use crime_spotter_source::poller::{PollSnapshot, spawn_feed_poller};
use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use crate::config::ServerConfig;

/// Errors that can stop the server from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    /// I/O error (config file, socket bind).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Feed configuration or client setup failed.
    #[error("Feed error: {0}")]
    Source(#[from] SourceError),

    /// A configuration value is out of range.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

/// Shared application state.
pub struct AppState {
    /// Latest poll outcome.
    pub snapshot: watch::Receiver<PollSnapshot>,
    /// Radius used when a cluster request does not give one.
    pub cluster_radius: f64,
    /// Recent alerts, newest first.
    pub alerts: Arc<Mutex<AlertLog>>,
}

/// Follows the poll channel and records alerts for incidents that were not
/// in the previous batch.
///
/// Failed polls leave the generation unchanged and are skipped. The task
/// ends when the poller stops.
pub fn spawn_alert_watcher(
    mut snapshots: watch::Receiver<PollSnapshot>,
    filter: AlertFilter,
    alerts: Arc<Mutex<AlertLog>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut previous: Option<Arc<IncidentBatch>> = None;
        let mut generation = 0;

        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            if snapshot.generation == generation {
                continue;
            }
            generation = snapshot.generation;

            let Some(batch) = snapshot.batch else {
                continue;
            };

            let detected = detect_alerts(
                previous.as_deref().map(|b| b.incidents.as_slice()),
                &batch.incidents,
                &filter,
                batch.ingested_at,
            );
            if !detected.is_empty() {
                log::info!("{} new incidents matched the alert filter", detected.len());
                alerts.lock().await.record(detected);
            }
            previous = Some(batch);
        }

        log::debug!("Alert watcher stopped");
    })
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/incidents", web::get().to(handlers::incidents))
            .route("/clusters", web::get().to(handlers::clusters))
            .route("/clusters/geojson", web::get().to(handlers::clusters_geojson))
            .route("/trends", web::get().to(handlers::trends))
            .route("/risk", web::get().to(handlers::risk))
            .route("/routes", web::get().to(handlers::routes))
            .route("/stats", web::get().to(handlers::stats))
            .route("/suggestions", web::get().to(handlers::suggestions))
            .route("/alerts", web::get().to(handlers::alerts)),
    );
}

/// Starts the poller, the alert watcher and the HTTP server.
///
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if the feed client cannot be built or the HTTP
/// server fails to bind or run.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let client = FeedClient::new(&config.feed)?;
    let (snapshots, _poller) = spawn_feed_poller(client, config.feed.poll_interval());

    let alerts = Arc::new(Mutex::new(AlertLog::new(config.alerts.history)));
    let _watcher = spawn_alert_watcher(
        snapshots.clone(),
        config.alerts.filter(),
        Arc::clone(&alerts),
    );

    let state = web::Data::new(AppState {
        snapshot: snapshots,
        cluster_radius: config.clustering.radius_degrees,
        alerts,
    });

    let bind_addr = config.server.bind_addr;
    let port = config.server.port;
    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use crime_spotter_incident_models::{Incident, IncidentId, TimestampSource};

    use super::*;

    fn batch(ids: &[&str]) -> Arc<IncidentBatch> {
        let incidents = ids
            .iter()
            .map(|id| Incident {
                id: IncidentId::new(*id),
                crime_type: "Theft".to_string(),
                location: "Guindy".to_string(),
                latitude: None,
                longitude: None,
                timestamp: Utc::now(),
                timestamp_source: TimestampSource::Date,
                description: None,
            })
            .collect();
        Arc::new(IncidentBatch::new(incidents, Utc::now(), 0))
    }

    fn snapshot(generation: u64, batch: Arc<IncidentBatch>) -> PollSnapshot {
        PollSnapshot {
            batch: Some(batch),
            last_error: None,
            last_attempt_at: Some(Utc::now()),
            generation,
        }
    }

    async fn wait_for_alerts(alerts: &Mutex<AlertLog>, count: usize) {
        for _ in 0..50 {
            if alerts.lock().await.len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn watcher_records_only_new_incidents() {
        let (tx, rx) = watch::channel(PollSnapshot::default());
        let alerts = Arc::new(Mutex::new(AlertLog::default()));
        let handle = spawn_alert_watcher(rx, AlertFilter::default(), Arc::clone(&alerts));

        tx.send(snapshot(1, batch(&["a", "b"]))).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(snapshot(2, batch(&["a", "b", "c"]))).unwrap();
        wait_for_alerts(&alerts, 1).await;

        let recent = alerts.lock().await.recent();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].incident.id.as_str(), "c");

        drop(tx);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
