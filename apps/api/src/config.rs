//! API configuration module.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`PHARMACY_*`, e.g. `PHARMACY_PORT=9000`)
//! 2. Config file (`pharmacy.toml`, optional)
//! 3. Defaults (this file)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use pharmacy_db::DbConfig;

/// Config file read from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "pharmacy.toml";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "PHARMACY";

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Interface to bind. Default: 0.0.0.0
    pub bind_addr: String,

    /// HTTP port. Default: 8000
    pub port: u16,

    /// SQLite database file. Default: ./data/pharmacy.db
    pub database_path: PathBuf,

    /// Pooled connections. Default: 5
    pub max_connections: u32,

    /// How long a purchase waits on another writer. Default: 5
    pub busy_timeout_secs: u64,

    /// Fallback tracing filter when `RUST_LOG` is unset. Default: info
    pub log_level: String,
}

impl ApiConfig {
    /// Loads configuration from `pharmacy.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Loads configuration using `path` as the (optional) config file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .set_default("bind_addr", "0.0.0.0")?
            .set_default("port", 8000_i64)?
            .set_default("database_path", "./data/pharmacy.db")?
            .set_default("max_connections", 5_i64)?
            .set_default("busy_timeout_secs", 5_i64)?
            .set_default("log_level", "info")?
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: ApiConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue("port".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("max_connections".to_string()));
        }
        Ok(())
    }

    /// `host:port` to bind the listener on.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Pool settings for [`pharmacy_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .busy_timeout(Duration::from_secs(self.busy_timeout_secs))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}
