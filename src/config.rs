//! Service configuration, read from `SPOOLSTOCK_*` environment variables.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::db::SqliteVendorStore;
use crate::entities::VendorRegistry;
use crate::store::VendorStore;

pub const DB_FILE_NAME: &str = "spoolstock.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbType {
    Sqlite,
    Memory,
}

impl DbType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DbType::Sqlite => "sqlite",
            DbType::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_type: DbType,
    pub data_dir: PathBuf,
    pub log_level: String,
    pub log_format: LogFormat,
    /// Empty means any origin is allowed
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "0.0.0.0".to_string(),
            port: 8000,
            db_type: DbType::Sqlite,
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            cors_origins: Vec::new(),
        }
    }
}

impl Config {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(host) = lookup("SPOOLSTOCK_HOST") {
            config.host = host;
        }

        if let Some(port) = lookup("SPOOLSTOCK_PORT") {
            config.port = port.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    key: "SPOOLSTOCK_PORT",
                    value: port.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        if let Some(db_type) = lookup("SPOOLSTOCK_DB_TYPE") {
            config.db_type = match db_type.to_lowercase().as_str() {
                "sqlite" => DbType::Sqlite,
                "memory" => DbType::Memory,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "SPOOLSTOCK_DB_TYPE",
                        value: db_type,
                        reason: "expected sqlite or memory".to_string(),
                    })
                }
            };
        }

        if let Some(dir) = lookup("SPOOLSTOCK_DIR_DATA") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(level) = lookup("SPOOLSTOCK_LOGGING_LEVEL") {
            config.log_level = level.to_lowercase();
        }

        if let Some(format) = lookup("SPOOLSTOCK_LOG_FORMAT") {
            config.log_format = match format.to_lowercase().as_str() {
                "pretty" | "text" => LogFormat::Pretty,
                "json" => LogFormat::Json,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "SPOOLSTOCK_LOG_FORMAT",
                        value: format,
                        reason: "expected pretty or json".to_string(),
                    })
                }
            };
        }

        if let Some(origins) = lookup("SPOOLSTOCK_CORS_ORIGIN") {
            config.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    /// Build the configured vendor store, creating the data directory if needed
    pub fn open_store(&self) -> anyhow::Result<Arc<dyn VendorStore>> {
        let store: Arc<dyn VendorStore> = match self.db_type {
            DbType::Memory => Arc::new(VendorRegistry::new()),
            DbType::Sqlite => {
                std::fs::create_dir_all(&self.data_dir)?;
                Arc::new(SqliteVendorStore::open(&self.db_path())?)
            }
        };
        Ok(store)
    }
}
