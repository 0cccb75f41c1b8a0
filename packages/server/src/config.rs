//! Server configuration.
//!
//! The embedded `config/default.toml` is used unless `CRIME_SPOTTER_CONFIG`
//! names another file. `BIND_ADDR`, `PORT` and `CRIME_SPOTTER_FEED_URL`
//! override individual keys after the file is loaded.

use std::path::Path;

use crime_spotter_analytics::alerts::DEFAULT_ALERT_HISTORY;
use crime_spotter_analytics_models::AlertFilter;
use crime_spotter_source::config::FeedConfig;
use crime_spotter_spatial::DEFAULT_CLUSTER_RADIUS;
use serde::{Deserialize, Serialize};

use crate::ServerError;

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Environment variable naming a replacement config file.
pub const CONFIG_PATH_ENV: &str = "CRIME_SPOTTER_CONFIG";

/// Where the HTTP server listens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Address to bind.
    pub bind_addr: String,
    /// Port to bind.
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Clustering defaults for the cluster endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Radius in degrees used when a request does not give one.
    pub radius_degrees: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            radius_degrees: DEFAULT_CLUSTER_RADIUS,
        }
    }
}

/// Which new incidents are recorded as alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// Crime types to alert on. Empty means every type.
    pub crime_types: Vec<String>,
    /// Only alert on locations containing this text.
    pub location: Option<String>,
    /// Alerts kept for the alerts endpoint.
    pub history: usize,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            crime_types: Vec::new(),
            location: None,
            history: DEFAULT_ALERT_HISTORY,
        }
    }
}

impl AlertsConfig {
    /// The filter applied to new incidents.
    #[must_use]
    pub fn filter(&self) -> AlertFilter {
        AlertFilter {
            crime_types: self.crime_types.clone(),
            location: self.location.clone(),
        }
    }
}

/// Complete server configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// `[server]` table.
    pub server: HttpConfig,
    /// `[feed]` table.
    pub feed: FeedConfig,
    /// `[clustering]` table.
    pub clustering: ClusteringConfig,
    /// `[alerts]` table.
    pub alerts: AlertsConfig,
}

impl ServerConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the TOML is malformed or a value is out
    /// of range.
    pub fn from_toml(toml_str: &str) -> Result<Self, ServerError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration from the file named by
    /// `CRIME_SPOTTER_CONFIG`, or the embedded default, then applies
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the file cannot be read, does not parse,
    /// or an override is invalid.
    pub fn load() -> Result<Self, ServerError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => {
                log::info!("Loading configuration from {path}");
                Self::from_file(Path::new(&path))?
            }
            Err(_) => Self::from_toml(DEFAULT_CONFIG)?,
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ServerError> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    /// Applies `BIND_ADDR`, `PORT` and `CRIME_SPOTTER_FEED_URL` from `var`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] if `PORT` is not a port number or the
    /// resulting configuration is invalid.
    pub fn apply_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ServerError> {
        if let Some(bind_addr) = var("BIND_ADDR") {
            self.server.bind_addr = bind_addr;
        }
        if let Some(port) = var("PORT") {
            self.server.port = port.trim().parse().map_err(|_| ServerError::Config {
                message: format!("PORT must be a port number, got {port:?}"),
            })?;
        }
        if let Some(url) = var("CRIME_SPOTTER_FEED_URL") {
            self.feed.url = url;
        }
        self.validate()
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the feed settings are invalid or the
    /// clustering radius is not a positive number.
    pub fn validate(&self) -> Result<(), ServerError> {
        self.feed.validate()?;
        if !(self.clustering.radius_degrees.is_finite() && self.clustering.radius_degrees > 0.0) {
            return Err(ServerError::Config {
                message: "clustering.radius_degrees must be a positive number".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn embedded_default_parses() {
        let config = ServerConfig::from_toml(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.feed, FeedConfig::default());
        assert!((config.clustering.radius_degrees - 0.01).abs() < f64::EPSILON);
        assert_eq!(config.alerts.history, 10);
        assert!(config.alerts.filter().crime_types.is_empty());
    }

    #[test]
    fn missing_tables_use_defaults() {
        let config = ServerConfig::from_toml("[server]\nport = 9000\n").unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_addr, "127.0.0.1");
        assert_eq!(config.alerts, AlertsConfig::default());
    }

    #[test]
    fn env_overrides_replace_keys() {
        let vars: HashMap<&str, &str> = [
            ("BIND_ADDR", "0.0.0.0"),
            ("PORT", "3000"),
            ("CRIME_SPOTTER_FEED_URL", "http://localhost:4000/crimes"),
        ]
        .into_iter()
        .collect();

        let mut config = ServerConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(ToString::to_string))
            .unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.feed.url, "http://localhost:4000/crimes");
    }

    #[test]
    fn invalid_port_override_is_rejected() {
        let mut config = ServerConfig::default();
        let err = config
            .apply_overrides(|key| (key == "PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ServerError::Config { .. }));
    }

    #[test]
    fn rejects_non_positive_radius() {
        let err = ServerConfig::from_toml("[clustering]\nradius_degrees = 0.0\n").unwrap_err();
        assert!(matches!(err, ServerError::Config { .. }));
    }

    #[test]
    fn alert_filter_from_table() {
        let config = ServerConfig::from_toml(
            r#"
            [alerts]
            crime_types = ["Theft", "Robbery"]
            location = "Guindy"
            history = 3
            "#,
        )
        .unwrap();
        let filter = config.alerts.filter();
        assert_eq!(filter.crime_types.len(), 2);
        assert_eq!(filter.location.as_deref(), Some("Guindy"));
        assert_eq!(config.alerts.history, 3);
    }
}
