//! nvme-exporter: NVMe health metrics for Prometheus, collected through nvme-cli
//!
//! The exporter shells out to the `nvme` tool on every scrape, normalizes the
//! JSON it prints across the schema revisions shipped by different nvme-cli
//! versions, and turns the interesting fields into Prometheus metrics.
//!
//! ## Modules
//!
//! * `config`: Configuration structures, loading, validation, and defaults.
//!   Supports TOML configuration files with validation via the `validator` crate.
//!
//! * `core`: The collection pipeline:
//!   - Command runner for the external tool
//!   - Device inventory normalization and metric groups
//!   - Composite collector driving one scrape
//!   - Validation gate and startup preflight checks
//!   - Prometheus exposition helpers
//!
//! * `server`: axum router exposing the scrape endpoint, a landing page
//!   and a health check backed by the validation gate.
//!
//! * `logger`: Centralized logging initialization using `tracing`.
//!   Supports console output in multiple formats (compact, pretty, JSON)
//!   and optional systemd journald integration.
//!
//! ## Features
//!
//! * `journald`: Enables the systemd journald log output (default: enabled).

pub mod config;
pub mod core;
pub mod logger;
pub mod server;
