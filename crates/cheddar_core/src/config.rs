//! Explicit runtime configuration.
//!
//! # Responsibility
//! - Describe connection settings for every adapter and the logger.
//! - Layer an optional config file under `CHEDDAR__*` environment overrides.
//!
//! # Invariants
//! - Configuration is a plain value handed to constructors; nothing in this
//!   crate reads process-wide configuration on its own.
//! - Every field has a default, so an empty source yields a usable config.

use crate::logging::default_log_level;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const ENV_PREFIX: &str = "CHEDDAR";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Relational adapter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationalConfig {
    /// SQLite database file. `None` opens a private in-memory database.
    pub database_path: Option<PathBuf>,
    pub busy_timeout_ms: u64,
}

impl Default for RelationalConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            busy_timeout_ms: 5_000,
        }
    }
}

/// Column-store adapter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnStoreConfig {
    /// `host:port` of one cluster node.
    pub contact_point: String,
    pub keyspace: String,
}

impl Default for ColumnStoreConfig {
    fn default() -> Self {
        Self {
            contact_point: "127.0.0.1:9042".to_string(),
            keyspace: "cheddar".to_string(),
        }
    }
}

/// Logger settings consumed by [`crate::logging::init_logging`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Rolling log directory; stderr when absent.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheddarConfig {
    pub relational: RelationalConfig,
    pub column_store: ColumnStoreConfig,
    pub logging: LoggingConfig,
}

impl CheddarConfig {
    /// Loads `file` (optional, format from its extension) then environment
    /// overrides such as `CHEDDAR__RELATIONAL__DATABASE_PATH`.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }
        let config = builder.add_source(environment()).build()?;
        Ok(config.try_deserialize()?)
    }

    /// Parses TOML text, then applies `overrides` as if they were environment
    /// variables.
    pub fn from_toml_str(
        text: &str,
        overrides: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .add_source(environment().source(overrides))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}
