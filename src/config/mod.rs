//! Application configuration loading, validation, and management.
//!
//! This module provides the top-level `Config` structure that aggregates
//! logging, HTTP listener and nvme-cli settings. It handles loading from
//! TOML files, the `NVME_EXPORTER_CONFIG` override and validation.
//!
//! The configuration is loaded early in the application lifecycle and is
//! intended to remain immutable thereafter.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::config::{exporter::ExporterConfig, logger::LoggerConfig, nvme::NvmeConfig};

pub mod exporter;
pub mod logger;
pub mod nvme;

/// Environment variable holding an explicit configuration file path.
pub const CONFIG_ENV: &str = "NVME_EXPORTER_CONFIG";

/// Configuration file used when `NVME_EXPORTER_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/nvme-exporter/config.toml";

/// Timestamp used by the `print_*` macros, which run before the tracing
/// subscriber is initialized.
#[doc(hidden)]
pub fn console_timestamp() -> String {
    let format = time::macros::format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
    );
    time::OffsetDateTime::now_utc()
        .format(&format)
        .unwrap_or_default()
}

/// Simple macros for printing timestamped messages before the tracing subscriber
/// is initialized. These are used during early configuration loading.
#[macro_export]
macro_rules! print_info {
    ($($arg:tt)*) => {
        println!("{}  {} {}",
            console::style($crate::config::console_timestamp()).dim(),
            console::style("INFO").green(),
            format_args!($($arg)*)
        );
    };
}

#[macro_export]
macro_rules! print_warn {
    ($($arg:tt)*) => {
        println!("{}  {} {}",
            console::style($crate::config::console_timestamp()).dim(),
            console::style("WARN").yellow(),
            format_args!($($arg)*)
        );
    };
}

#[macro_export]
macro_rules! print_error {
    ($($arg:tt)*) => {
        eprintln!("{}  {} {}",
            console::style($crate::config::console_timestamp()).dim(),
            console::style("ERROR").red(),
            format_args!($($arg)*)
        );
    };
}

/// Errors that can occur during configuration loading, parsing or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Generic configuration-related error with a descriptive message.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error while accessing configuration files.
    #[error("IO error while reading configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// Failure to parse the TOML configuration file.
    #[error("Parse error while reading configuration: {0}")]
    ParseError(String),

    /// Validation failure after successful parsing.
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Top-level application configuration.
#[derive(Serialize, Deserialize, Debug, Validate, Clone, Default)]
#[serde(default)]
pub struct Config {
    /// Logging subsystem configuration.
    #[validate(nested)]
    pub logger: LoggerConfig,

    /// HTTP listener configuration.
    #[validate(nested)]
    pub exporter: ExporterConfig,

    /// nvme-cli invocation and environment checks.
    #[validate(nested)]
    pub nvme: NvmeConfig,
}

impl Config {
    /// Constructs a new configuration by locating and loading the config file.
    ///
    /// Falls back to the built-in defaults when no file can be found.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if an existing configuration file cannot be
    /// read, parsed, or validated.
    pub fn new() -> Result<Self, ConfigError> {
        match Self::get_config_path() {
            Some(path) => Self::load(&path),
            None => {
                print_warn!("No configuration file found, using defaults");
                let config = Config::default();
                config
                    .validate()
                    .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
                Ok(config)
            }
        }
    }

    /// Determines the configuration file path.
    ///
    /// Priority:
    /// 1. `NVME_EXPORTER_CONFIG` environment variable
    /// 2. `/etc/nvme-exporter/config.toml`
    fn get_config_path() -> Option<PathBuf> {
        if let Ok(config_path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(config_path);
            print_info!("Using config from {}: {}", CONFIG_ENV, path.display());
            return Some(path);
        }

        let fallback = Path::new(DEFAULT_CONFIG_PATH);
        if fallback.exists() {
            print_info!("Using default config path: {}", fallback.display());
            return Some(fallback.to_path_buf());
        }

        None
    }

    /// Loads and validates configuration from the specified path.
    ///
    /// # Errors
    ///
    /// Propagates IO, parsing, and validation errors as `ConfigError`.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        print_info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::Config(format!(
                "configuration file {} does not exist",
                path.display()
            )));
        }

        let config_str = fs::read_to_string(path)?;
        let config = Self::parse(&config_str)?;

        print_info!("Successfully loaded config from: {}", path.display());
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    pub fn parse(config_str: &str) -> Result<Config, ConfigError> {
        let mut config: Config =
            toml::from_str(config_str).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        config.exporter.normalize_endpoint();
        Ok(config)
    }
}
