//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

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
    pub database_url: String,
    pub log_level: Level,
    /// Base URL of the external inference service (ingest + chat).
    pub socratic_service_url: String,
    /// Upper bound on any single ingest or chat call.
    pub gateway_timeout: Duration,
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

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Inference Service Settings ---
        let socratic_service_url = std::env::var("SOCRATIC_SERVICE_URL")
            .unwrap_or_else(|_| "http://localhost:2002".to_string());

        let timeout_secs_str =
            std::env::var("GATEWAY_TIMEOUT_SECS").unwrap_or_else(|_| "60".to_string());
        let timeout_secs = timeout_secs_str.parse::<u64>().map_err(|_| {
            ConfigError::InvalidValue(
                "GATEWAY_TIMEOUT_SECS".to_string(),
                format!("'{}' is not a valid number of seconds", timeout_secs_str),
            )
        })?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            socratic_service_url,
            gateway_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
