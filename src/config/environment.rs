//! Environment variable loading and management.
//!
//! Connection settings can be overridden per deployment without touching the
//! TOML file.

use std::env;
use std::path::Path;

use super::config::DataSourceConfig;

/// Override for [`DataSourceConfig::host`]
pub const HOST_VAR: &str = "NOSQL_HOST";
/// Override for [`DataSourceConfig::port`]
pub const PORT_VAR: &str = "NOSQL_PORT";
/// Override for [`DataSourceConfig::user`]
pub const USER_VAR: &str = "NOSQL_USER";
/// Override for [`DataSourceConfig::password`]
pub const PASSWORD_VAR: &str = "NOSQL_PASSWORD";
/// Override for [`DataSourceConfig::database`]
pub const DATABASE_VAR: &str = "NOSQL_DATABASE";

/// Loads environment variables from .env file and system environment.
#[derive(Debug, Clone)]
pub struct EnvironmentLoader {
    env_file: Option<String>,
}

impl EnvironmentLoader {
    /// Initialize the environment loader.
    ///
    /// # Arguments
    /// * `env_file` - Path to .env file. Nothing is loaded when None.
    pub fn new(env_file: Option<&Path>) -> Self {
        if let Some(path) = env_file {
            if path.exists() {
                if let Err(e) = dotenv::from_path(path) {
                    tracing::warn!(path = %path.display(), error = %e, "failed to load .env file");
                }
            }
        }

        Self {
            env_file: env_file.map(|p| p.to_string_lossy().to_string()),
        }
    }

    /// Path of the .env file this loader was created with
    pub fn env_file(&self) -> Option<&str> {
        self.env_file.as_deref()
    }

    /// Apply `NOSQL_*` overrides to a data source.
    ///
    /// An unparsable port is ignored with a warning.
    pub fn apply_overrides(&self, data_source: &mut DataSourceConfig) {
        if let Ok(host) = env::var(HOST_VAR) {
            data_source.host = host;
        }
        if let Ok(port) = env::var(PORT_VAR) {
            match port.parse() {
                Ok(port) => data_source.port = port,
                Err(_) => tracing::warn!(value = %port, "ignoring invalid {}", PORT_VAR),
            }
        }
        if let Ok(user) = env::var(USER_VAR) {
            data_source.user = Some(user);
        }
        if let Ok(password) = env::var(PASSWORD_VAR) {
            data_source.password = Some(password);
        }
        if let Ok(database) = env::var(DATABASE_VAR) {
            data_source.database = database;
        }
    }
}

impl Default for EnvironmentLoader {
    fn default() -> Self {
        Self::new(None)
    }
}
