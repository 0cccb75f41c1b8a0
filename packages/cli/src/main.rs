#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the crime spotter analytics.
//!
//! Each subcommand loads one incident batch, either from the live feed or
//! from a saved payload given with `--input`, runs a single analysis and
//! prints the result as JSON. `watch` keeps polling the feed and prints an
//! alert line for every new incident that passes the filter.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use crime_spotter_analytics::alerts::detect_alerts;
use crime_spotter_analytics::risk::assess_risk;
use crime_spotter_analytics::routes::route_safety;
use crime_spotter_analytics::stats::dashboard_stats;
use crime_spotter_analytics::suggestions::{DEFAULT_SUGGESTION_LIMIT, suggest_locations};
use crime_spotter_analytics::temporal::analyze_trends;
use crime_spotter_analytics_models::{AlertFilter, StatsRange, TimeGranularity};
use crime_spotter_incident_models::IncidentBatch;
use crime_spotter_source::config::FeedConfig;
use crime_spotter_source::feed::{FeedClient, read_payload};
use crime_spotter_source::poller::spawn_feed_poller;
use crime_spotter_source::store::IncidentStore;
use crime_spotter_spatial::render::clusters_to_geojson;
use crime_spotter_spatial::{DEFAULT_CLUSTER_RADIUS, SpatialClusterer};
use serde::Serialize;

// ---------------------------------------------------------------------------
// CLI definitions
// ---------------------------------------------------------------------------

/// Query crime incident analytics.
#[derive(Parser)]
#[command(name = "crime_spotter")]
#[command(about = "Query crime incident analytics from the command line")]
struct Cli {
    /// Read incidents from a saved JSON payload instead of the feed.
    #[arg(long, global = true, conflicts_with = "url")]
    input: Option<PathBuf>,

    /// Feed endpoint to fetch incidents from.
    #[arg(long, global = true)]
    url: Option<String>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Group geotagged incidents into hotspots.
    Clusters {
        /// Clustering radius in degrees.
        #[arg(long, default_value_t = DEFAULT_CLUSTER_RADIUS)]
        radius: f64,

        /// Print a GeoJSON `FeatureCollection` instead of the cluster list.
        #[arg(long)]
        geojson: bool,
    },

    /// Bucket incidents over time and report the trend.
    Trends {
        /// Bucket size (daily, weekly, monthly, yearly).
        #[arg(long, default_value = "daily")]
        granularity: TimeGranularity,
    },

    /// Assess the risk of a location.
    Risk {
        /// Free-text location, e.g. "Anna Nagar".
        location: String,
    },

    /// Compare route profiles between two locations.
    Routes {
        /// Start location.
        start: String,
        /// End location.
        end: String,
    },

    /// Dashboard counts and rankings.
    Stats {
        /// Time filter (today, week, month, year, all).
        #[arg(long, default_value = "today")]
        range: StatsRange,
    },

    /// Autocomplete a location.
    Suggest {
        /// Text typed so far.
        text: String,

        /// Maximum suggestions.
        #[arg(long, default_value_t = DEFAULT_SUGGESTION_LIMIT)]
        limit: usize,
    },

    /// Poll the feed and print alerts for new incidents.
    Watch {
        /// Seconds between polls.
        #[arg(long, default_value_t = 10)]
        interval: u64,

        /// Only alert on these crime types (repeatable).
        #[arg(long = "crime-type")]
        crime_types: Vec<String>,

        /// Only alert on locations containing this text.
        #[arg(long)]
        location: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

fn feed_client(url: Option<&str>) -> Result<FeedClient, Box<dyn std::error::Error>> {
    let mut config = FeedConfig::default();
    if let Some(url) = url {
        config.url = url.to_string();
    }
    Ok(FeedClient::new(&config)?)
}

/// Where incident batches come from.
struct Source {
    input: Option<PathBuf>,
    url: Option<String>,
}

impl Source {
    async fn batch(&self) -> Result<Arc<IncidentBatch>, Box<dyn std::error::Error>> {
        let payload = if let Some(path) = &self.input {
            log::info!("Reading incidents from {}", path.display());
            read_payload(path)?
        } else {
            feed_client(self.url.as_deref())?.fetch().await?
        };

        Ok(IncidentStore::new().ingest(&payload, Utc::now())?)
    }
}

fn print_json(value: &impl Serialize) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn watch(
    client: FeedClient,
    interval: Duration,
    filter: AlertFilter,
) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("Watching {} every {}s", client.url(), interval.as_secs());

    let (mut snapshots, _poller) = spawn_feed_poller(client, interval);
    let mut previous: Option<Arc<IncidentBatch>> = None;
    let mut generation = 0;

    while snapshots.changed().await.is_ok() {
        let snapshot = snapshots.borrow_and_update().clone();
        if let Some(error) = &snapshot.last_error {
            log::warn!("Poll failed: {error}");
        }
        if snapshot.generation == generation {
            continue;
        }
        generation = snapshot.generation;

        let Some(batch) = snapshot.batch else {
            continue;
        };

        for alert in detect_alerts(
            previous.as_deref().map(|b| b.incidents.as_slice()),
            &batch.incidents,
            &filter,
            batch.ingested_at,
        ) {
            println!("{}", serde_json::to_string(&alert)?);
        }
        previous = Some(batch);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let source = Source {
        input: cli.input,
        url: cli.url,
    };
    let now = Local::now();

    match cli.command {
        Commands::Clusters { radius, geojson } => {
            if !(radius.is_finite() && radius > 0.0) {
                return Err("--radius must be a positive number of degrees".into());
            }
            let batch = source.batch().await?;
            let clusters = SpatialClusterer::new(radius).cluster(batch.spatial());
            if geojson {
                println!("{}", clusters_to_geojson(&clusters));
            } else {
                print_json(&clusters)?;
            }
        }
        Commands::Trends { granularity } => {
            let batch = source.batch().await?;
            print_json(&analyze_trends(&batch.incidents, granularity, &now))?;
        }
        Commands::Risk { location } => {
            let batch = source.batch().await?;
            print_json(&assess_risk(&batch.incidents, &location, &now)?)?;
        }
        Commands::Routes { start, end } => {
            let batch = source.batch().await?;
            print_json(&route_safety(&batch.incidents, &start, &end)?)?;
        }
        Commands::Stats { range } => {
            let batch = source.batch().await?;
            print_json(&dashboard_stats(&batch.incidents, range, &now))?;
        }
        Commands::Suggest { text, limit } => {
            let batch = source.batch().await?;
            print_json(&suggest_locations(&batch.incidents, &text, limit))?;
        }
        Commands::Watch {
            interval,
            crime_types,
            location,
        } => {
            if source.input.is_some() {
                return Err("watch polls the feed and cannot read --input".into());
            }
            let client = feed_client(source.url.as_deref())?;
            let filter = AlertFilter {
                crime_types,
                location,
            };
            watch(client, Duration::from_secs(interval), filter).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    run(Cli::parse()).await
}
