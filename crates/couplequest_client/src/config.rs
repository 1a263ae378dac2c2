//! crates/couplequest_client/src/config.rs
//!
//! Configuration of the terminal client, loaded from environment variables at
//! startup. The `.env` file is used for local development.

use couplequest_core::domain::LocationCoords;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/generate-date-idea";
pub const DEFAULT_STORE_PATH: &str = "./couplequest-store.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub endpoint: String,
    pub store_path: PathBuf,
    /// The position reported to the app. `None` behaves like a denied permission.
    pub location: Option<LocationCoords>,
    pub timeout: Duration,
    pub log_level: Level,
}

impl ClientConfig {
    /// Loads configuration from environment variables, reading `.env` first
    /// outside of tests.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = lookup("COUPLEQUEST_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let store_path = lookup("COUPLEQUEST_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH));

        let location = match (lookup("COUPLEQUEST_LATITUDE"), lookup("COUPLEQUEST_LONGITUDE")) {
            (None, None) => None,
            (Some(lat), Some(lon)) => Some(parse_coords(&lat, &lon)?),
            (None, Some(_)) => return Err(ConfigError::MissingVar("COUPLEQUEST_LATITUDE".to_string())),
            (Some(_), None) => return Err(ConfigError::MissingVar("COUPLEQUEST_LONGITUDE".to_string())),
        };

        let timeout_str = lookup("COUPLEQUEST_TIMEOUT_SECS").unwrap_or_else(|| "25".to_string());
        let timeout_secs = timeout_str
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "COUPLEQUEST_TIMEOUT_SECS".to_string(),
                    format!("'{}' is not a positive number of seconds", timeout_str),
                )
            })?;

        // Quiet by default so log lines do not drown the prompt.
        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "WARN".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            endpoint,
            store_path,
            location,
            timeout: Duration::from_secs(timeout_secs),
            log_level,
        })
    }
}

fn parse_coords(lat: &str, lon: &str) -> Result<LocationCoords, ConfigError> {
    let invalid = |var: &str, value: &str| {
        ConfigError::InvalidValue(var.to_string(), format!("'{}' is not a coordinate", value))
    };
    let latitude = lat
        .trim()
        .parse::<f64>()
        .map_err(|_| invalid("COUPLEQUEST_LATITUDE", lat))?;
    let longitude = lon
        .trim()
        .parse::<f64>()
        .map_err(|_| invalid("COUPLEQUEST_LONGITUDE", lon))?;
    LocationCoords::new(latitude, longitude).ok_or_else(|| {
        ConfigError::InvalidValue(
            "COUPLEQUEST_LATITUDE".to_string(),
            format!("({}, {}) is out of range", latitude, longitude),
        )
    })
}
