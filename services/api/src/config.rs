//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// Gemini's OpenAI-compatible endpoint, used when a Gemini key is configured.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_IDEA_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://couplequestlive.com";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// The e-mail log is disabled when no database is configured.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub allowed_origin: String,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub llm_api_base: Option<String>,
    pub idea_model: String,
    pub upstream_timeout: Duration,
}

/// Credentials and endpoint for the upstream model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LlmSettings {
    pub api_key: String,
    pub api_base: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server and Database Settings ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let allowed_origin =
            lookup("ALLOWED_ORIGIN").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string());

        // --- API Keys (as optional) ---
        let openai_api_key = lookup("OPENAI_API_KEY").filter(|k| !k.is_empty());
        let gemini_api_key = lookup("GEMINI_API_KEY").filter(|k| !k.is_empty());

        // --- Upstream Model Settings ---
        let llm_api_base = lookup("LLM_API_BASE").filter(|b| !b.is_empty());
        let idea_model = lookup("IDEA_MODEL").unwrap_or_else(|| DEFAULT_IDEA_MODEL.to_string());

        let timeout_str = lookup("UPSTREAM_TIMEOUT_SECS").unwrap_or_else(|| "25".to_string());
        let timeout_secs = timeout_str
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "UPSTREAM_TIMEOUT_SECS".to_string(),
                    format!("'{}' is not a positive number of seconds", timeout_str),
                )
            })?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            allowed_origin,
            openai_api_key,
            gemini_api_key,
            llm_api_base,
            idea_model,
            upstream_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Picks the upstream credentials. A Gemini key wins and defaults the
    /// base URL to Gemini's OpenAI-compatible endpoint.
    pub fn llm_settings(&self) -> Result<LlmSettings, ConfigError> {
        if let Some(key) = &self.gemini_api_key {
            return Ok(LlmSettings {
                api_key: key.clone(),
                api_base: Some(
                    self.llm_api_base
                        .clone()
                        .unwrap_or_else(|| GEMINI_API_BASE.to_string()),
                ),
            });
        }
        if let Some(key) = &self.openai_api_key {
            return Ok(LlmSettings {
                api_key: key.clone(),
                api_base: self.llm_api_base.clone(),
            });
        }
        Err(ConfigError::MissingVar(
            "GEMINI_API_KEY or OPENAI_API_KEY".to_string(),
        ))
    }
}
