//! TOML configuration parsing and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::adapter::AdapterOptions;
use crate::error::{DbError, DbResult};

/// Database the credentials are checked against
pub const DEFAULT_AUTH_DATABASE: &str = "admin";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub data_source: DataSourceConfig,
    #[serde(default)]
    pub blob: BlobConfig,
    #[serde(default)]
    pub adapter: AdapterConfig,
}

impl StoreConfig {
    /// Reject settings no connection can be built from
    pub fn validate(&self) -> DbResult<()> {
        if self.data_source.host.trim().is_empty() {
            return Err(DbError::config("data_source.host must not be empty"));
        }
        if self.data_source.database.trim().is_empty() {
            return Err(DbError::config("data_source.database must not be empty"));
        }
        if self.blob.bucket.trim().is_empty() {
            return Err(DbError::config("blob.bucket must not be empty"));
        }
        Ok(())
    }
}

/// Where the document store lives and how to log in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_database")]
    pub database: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    27017
}

fn default_database() -> String {
    DEFAULT_AUTH_DATABASE.to_string()
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: None,
            password: None,
            database: default_database(),
        }
    }
}

impl DataSourceConfig {
    /// Credentials, only when both user and password are non-empty
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.user.as_deref(), self.password.as_deref()) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                Some((user, password))
            }
            _ => None,
        }
    }

    /// Connection string for the driver.
    ///
    /// Credentials are URL-encoded and authenticated against the `admin`
    /// database whatever database the data lives in.
    pub fn connection_uri(&self) -> String {
        match self.credentials() {
            Some((user, password)) => format!(
                "mongodb://{}:{}@{}:{}/?authSource={}",
                urlencoding::encode(user),
                urlencoding::encode(password),
                self.host,
                self.port,
                DEFAULT_AUTH_DATABASE
            ),
            None => format!("mongodb://{}:{}/", self.host, self.port),
        }
    }
}

/// Blob store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobConfig {
    #[serde(default = "default_bucket")]
    pub bucket: String,
}

fn default_bucket() -> String {
    "fs".to_string()
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
        }
    }
}

/// Adapter behaviour settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdapterConfig {
    #[serde(default)]
    pub lenient_delete: bool,
}

impl From<&AdapterConfig> for AdapterOptions {
    fn from(config: &AdapterConfig) -> Self {
        AdapterOptions {
            lenient_delete: config.lenient_delete,
        }
    }
}

/// Loads the store configuration from a TOML file
#[derive(Debug, Clone)]
pub struct ConfigurationLoader {
    pub config: StoreConfig,
}

impl ConfigurationLoader {
    /// Load configuration.
    ///
    /// # Arguments
    /// * `config_path` - Path to a TOML file. If None, defaults are used.
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => Self::load_config(path)?,
            None => StoreConfig::default(),
        };
        Ok(Self { config })
    }

    /// Wrap an already built configuration
    pub fn from_config(config: StoreConfig) -> Self {
        Self { config }
    }

    fn load_config(path: &Path) -> Result<StoreConfig> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Adapter options derived from the configuration
    pub fn adapter_options(&self) -> AdapterOptions {
        AdapterOptions::from(&self.config.adapter)
    }
}
