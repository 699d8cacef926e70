//! services/coach/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub data_dir: PathBuf,
    pub secrets_dir: PathBuf,
    pub log_level: Level,
    pub ad_reward_coins: u64,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Storage Locations ---
        let data_dir = lookup("COACH_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./coach-data"));
        let secrets_dir = lookup("COACH_SECRETS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("secrets"));

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Rewards ---
        let ad_reward_coins = match lookup("AD_REWARD_COINS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("AD_REWARD_COINS".to_string(), e.to_string())
            })?,
            None => 10,
        };

        Ok(Self {
            data_dir,
            secrets_dir,
            log_level,
            ad_reward_coins,
        })
    }

    /// Directory holding one JSON document per stored profile.
    pub fn documents_dir(&self) -> PathBuf {
        self.data_dir.join("documents")
    }
}
