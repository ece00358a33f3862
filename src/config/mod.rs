//! Configuration management for the document store connection.
//!
//! This module provides configuration loading through TOML files and
//! environment variable overrides via `.env` files.
//!
//! # Example
//!
//! ```no_run
//! use nosql_facade::config::{ConfigurationLoader, EnvironmentLoader};
//! use std::path::Path;
//!
//! // Load configuration from TOML
//! let mut loader = ConfigurationLoader::new(Some(Path::new("config/store.toml"))).unwrap();
//!
//! // Let the environment override the data source
//! let env = EnvironmentLoader::new(Some(Path::new(".env")));
//! env.apply_overrides(&mut loader.config.data_source);
//!
//! println!("Connecting to {}", loader.config.data_source.host);
//! ```

#[allow(clippy::module_inception)]
pub mod config;
pub mod environment;

// Re-export main types for convenience
pub use self::config::{
    AdapterConfig, BlobConfig, ConfigurationLoader, DataSourceConfig, StoreConfig,
    DEFAULT_AUTH_DATABASE,
};
pub use self::environment::EnvironmentLoader;
