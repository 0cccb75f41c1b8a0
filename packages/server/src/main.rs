#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Entry point for the crime spotter API server.
//!
//! Reads the configuration (see [`crime_spotter_server::config`]), starts
//! polling the incident feed and serves the `/api` routes.

use crime_spotter_server::config::ServerConfig;
use crime_spotter_server::run_server;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::load()?;
    run_server(config).await?;

    Ok(())
}
