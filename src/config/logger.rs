//! Logging configuration structures and validation logic.
//!
//! These types drive [`crate::logger::LoggerManager`]. They deserialize from
//! the `[logger]` table of the configuration file and carry `validator`
//! rules that are checked before the subscriber is installed.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Available formats for console log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// Top-level logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggerConfig {
    /// Global log level. Valid values: trace, debug, info, warn, error (case-insensitive).
    /// `RUST_LOG` takes precedence when set.
    #[validate(custom(function = "validate_log_level"))]
    pub level: String,

    /// Console output configuration.
    #[validate(nested)]
    pub console: Option<ConsoleConfig>,

    /// systemd journald output configuration.
    #[validate(nested)]
    pub journald: Option<JournaldConfig>,
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => {
            let mut err = ValidationError::new("invalid_log_level");
            err.message = Some(format!("Invalid log level: {}", level).into());
            Err(err)
        }
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        LoggerConfig {
            level: "info".to_string(),
            console: Some(ConsoleConfig::default()),
            journald: Some(JournaldConfig::default()),
        }
    }
}

/// Configuration for console log output.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ConsoleConfig {
    pub enabled: bool,

    pub format: LogFormat,

    /// Include the log target (module path) in output.
    pub show_target: bool,

    pub show_thread_ids: bool,

    /// Emit span close events, which carry span timings.
    pub show_spans: bool,

    pub ansi_colors: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        ConsoleConfig {
            enabled: true,
            format: LogFormat::default(),
            show_target: false,
            show_thread_ids: false,
            show_spans: false,
            ansi_colors: true,
        }
    }
}

/// Configuration for systemd journald output.
///
/// Only honoured when the crate is built with the `journald` feature.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct JournaldConfig {
    pub enabled: bool,

    /// `SYSLOG_IDENTIFIER` attached to journal entries. Must be non-empty.
    #[validate(length(min = 1))]
    pub identifier: String,
}

impl Default for JournaldConfig {
    fn default() -> Self {
        JournaldConfig {
            enabled: false,
            identifier: env!("CARGO_PKG_NAME").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_is_case_insensitive() {
        assert!(validate_log_level("DEBUG").is_ok());
        assert!(validate_log_level("Warn").is_ok());
        assert!(validate_log_level("verbose").is_err());
    }

    #[test]
    fn test_empty_journald_identifier_is_rejected() {
        let config = LoggerConfig {
            journald: Some(JournaldConfig {
                enabled: true,
                identifier: String::new(),
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_format_deserializes_lowercase() {
        let console: ConsoleConfig = toml::from_str("format = \"json\"").unwrap();
        assert_eq!(console.format, LogFormat::Json);
        assert!(console.enabled);
    }
}
