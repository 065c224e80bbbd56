/// Metric groups, field providers and device inventory handling.
pub mod collectors;

/// External command execution.
pub mod command;

/// Prometheus text exposition of scraped samples.
pub mod exposition;

/// Shared environment validity state.
pub mod gate;

/// Privilege, executable and tool version checks.
pub mod preflight;

/// Composite collector running a full scrape.
pub mod scrape;
