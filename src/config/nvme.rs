//! Settings for invoking nvme-cli and validating the host environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::core::preflight::ToolVersion;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct NvmeConfig {
    /// nvme-cli executable, looked up on `PATH` unless it contains a `/`.
    #[validate(length(min = 1, message = "nvme binary must not be empty"))]
    pub binary: String,

    /// Oldest supported nvme-cli release as `major.minor`.
    #[validate(custom(function = "validate_min_version"))]
    pub min_version: String,

    /// Refuse to start unless running with an effective uid of 0.
    pub require_root: bool,

    /// Upper bound for a single nvme-cli invocation.
    #[validate(range(min = 1, message = "Command timeout must be at least 1 second"))]
    pub command_timeout_secs: u64,

    /// Interval for re-running the version check. 0 disables re-validation.
    pub revalidate_interval_secs: u64,

    /// Optional vendor log groups to collect, by registered name (e.g. `ocp`).
    pub optional_logs: Vec<String>,
}

fn validate_min_version(version: &str) -> Result<(), ValidationError> {
    version.parse::<ToolVersion>().map(|_| ()).map_err(|e| {
        let mut err = ValidationError::new("invalid_min_version");
        err.message = Some(e.to_string().into());
        err
    })
}

impl NvmeConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Parsed version floor. Falls back to the default floor when the
    /// configured value was never validated.
    pub fn version_floor(&self) -> ToolVersion {
        self.min_version
            .parse()
            .unwrap_or(ToolVersion::DEFAULT_FLOOR)
    }

    pub fn revalidate_interval(&self) -> Option<Duration> {
        (self.revalidate_interval_secs > 0)
            .then(|| Duration::from_secs(self.revalidate_interval_secs))
    }
}

impl Default for NvmeConfig {
    fn default() -> Self {
        Self {
            binary: "nvme".into(),
            min_version: ToolVersion::DEFAULT_FLOOR.to_string(),
            require_root: true,
            command_timeout_secs: 30,
            revalidate_interval_secs: 0,
            optional_logs: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_floor_parses_configured_value() {
        let config = NvmeConfig {
            min_version: "2.11".into(),
            ..Default::default()
        };
        assert_eq!(config.version_floor(), ToolVersion::new(2, 11));
    }

    #[test]
    fn test_revalidation_disabled_by_default() {
        let config = NvmeConfig::default();
        assert!(config.revalidate_interval().is_none());
        assert_eq!(config.command_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_min_version_validation() {
        assert!(validate_min_version("2.9").is_ok());
        assert!(validate_min_version("2").is_err());
        assert!(validate_min_version("abc").is_err());
    }
}
