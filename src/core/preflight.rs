//! Startup and periodic environment checks.
//!
//! Privilege and executable checks run once at startup and are fatal to the
//! binary. The nvme-cli version check feeds the [`ValidationGate`] instead,
//! so an unsupported tool turns scrapes into cheap no-ops rather than
//! crashing the exporter. It can optionally be repeated in the background.

use std::{fmt, str::FromStr, sync::Arc, time::Duration};

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{
    collectors::{error::CollectorError, types::CollectorResult},
    command::CommandRunner,
    gate::ValidationGate,
};

static VERSION_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"version (\d+)\.(\d+)").ok());

/// Two-part `major.minor` tool version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToolVersion {
    pub major: u32,
    pub minor: u32,
}

impl ToolVersion {
    /// Oldest nvme-cli release the exporter is known to work with.
    pub const DEFAULT_FLOOR: ToolVersion = ToolVersion::new(2, 9);

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Extracts the version from `nvme --version` output, e.g.
    /// `nvme version 2.9.1 (git 2.9.1)`.
    pub fn from_probe_output(output: &str) -> CollectorResult<Self> {
        let invalid = |reason: &str| CollectorError::InvalidVersion {
            input: output.trim().to_string(),
            reason: reason.to_string(),
        };
        let captures = VERSION_PATTERN
            .as_ref()
            .and_then(|pattern| pattern.captures(output))
            .ok_or_else(|| invalid("no 'version X.Y' in tool output"))?;
        let major = captures[1]
            .parse()
            .map_err(|_| invalid("major version out of range"))?;
        let minor = captures[2]
            .parse()
            .map_err(|_| invalid("minor version out of range"))?;
        Ok(Self::new(major, minor))
    }

    /// Whether this version is at or above `floor`.
    pub fn satisfies(&self, floor: ToolVersion) -> bool {
        *self >= floor
    }
}

impl FromStr for ToolVersion {
    type Err = CollectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CollectorError::InvalidVersion {
            input: s.to_string(),
            reason: "expected 'major.minor'".to_string(),
        };
        let (major, minor) = s.trim().split_once('.').ok_or_else(invalid)?;
        Ok(Self::new(
            major.parse().map_err(|_| invalid())?,
            minor.parse().map_err(|_| invalid())?,
        ))
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Whether `version` satisfies `floor`. Unparsable versions never do.
pub fn is_supported(version: &str, floor: ToolVersion) -> bool {
    version
        .parse::<ToolVersion>()
        .map(|found| found.satisfies(floor))
        .unwrap_or(false)
}

/// Fails unless the process runs with an effective uid of 0.
pub fn check_privileges(require_root: bool) -> CollectorResult<()> {
    if !require_root {
        return Ok(());
    }
    // SAFETY: geteuid has no preconditions and cannot fail.
    let euid = unsafe { libc::geteuid() };
    if euid != 0 {
        return Err(CollectorError::Privilege(format!(
            "running as uid {}, nvme-cli needs root",
            euid
        )));
    }
    Ok(())
}

/// Probes `<binary> --version` and updates `gate` with the outcome.
///
/// Returns the detected version when it is supported.
pub async fn validate_version(
    runner: &dyn CommandRunner,
    binary: &str,
    floor: ToolVersion,
    gate: &ValidationGate,
) -> CollectorResult<ToolVersion> {
    let result = probe_version(runner, binary).await.and_then(|found| {
        if found.satisfies(floor) {
            Ok(found)
        } else {
            Err(CollectorError::EnvironmentInvalid(format!(
                "{} version {} is not supported, minimum supported version is {}",
                binary, found, floor
            )))
        }
    });

    match &result {
        Ok(found) => {
            debug!("{} version {} satisfies minimum {}", binary, found, floor);
            gate.set_valid();
        }
        Err(e) => gate.set_invalid(e.to_string()),
    }
    result
}

async fn probe_version(runner: &dyn CommandRunner, binary: &str) -> CollectorResult<ToolVersion> {
    let output = runner.run(binary, &["--version"]).await?;
    ToolVersion::from_probe_output(&output)
}

/// Re-runs [`validate_version`] every `interval` in a background task.
pub fn spawn_revalidation(
    runner: Arc<dyn CommandRunner>,
    binary: String,
    floor: ToolVersion,
    gate: Arc<ValidationGate>,
    interval: Duration,
) -> JoinHandle<()> {
    info!("Re-validating {} every {}s", binary, interval.as_secs());
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately; startup already validated.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let _ = validate_version(runner.as_ref(), &binary, floor, &gate).await;
        }
    })
}
