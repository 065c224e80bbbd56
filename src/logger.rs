// ============================================================================
// logger.rs
// ============================================================================
//! Logging initialization for the exporter.
//!
//! `LoggerManager` validates the `[logger]` configuration and installs the
//! global `tracing` subscriber: a console layer in the configured format
//! and, when built with the `journald` feature, a systemd journal layer.
//! `RUST_LOG` overrides the configured level for every layer.

use std::io;

use thiserror::Error;
use tracing::instrument;
use tracing_subscriber::{fmt, fmt::format::FmtSpan, prelude::*, EnvFilter, Layer, Registry};
use validator::{Validate, ValidationErrors};

#[cfg(feature = "journald")]
use crate::{config::logger::JournaldConfig, print_info};
use crate::{
    config::logger::{ConsoleConfig, LogFormat, LoggerConfig},
    print_warn,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Logger initialization error: {0}")]
    InitializationError(String),

    #[error("Logger configuration validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    /// Journal socket could not be opened.
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("No logging layers were configured or successfully initialized")]
    NoLayersConfigured,

    /// Journald was requested next to an enabled console and failed.
    #[error("Failed to initialize journald logger while console logging is enabled, check the [logger.journald] section")]
    JournaldFailedWithConsoleEnabled,
}

pub struct LoggerManager {
    config: LoggerConfig,
}

impl LoggerManager {
    /// Validates `config` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns `LoggerError::ValidationError` if configuration validation fails.
    pub fn new(config: LoggerConfig) -> Result<Self, LoggerError> {
        config.validate()?;
        Ok(LoggerManager { config })
    }

    /// Installs the global subscriber. Call once, early in `main`.
    ///
    /// # Errors
    ///
    /// Fails when no layer could be built, when journald fails while the
    /// console is also enabled, or when a global subscriber already exists.
    #[instrument(skip(self))]
    pub fn init(&mut self) -> Result<(), LoggerError> {
        let layers = self.build_layers()?;
        if layers.is_empty() {
            print_warn!("No logging layers were initialized. Please check your configuration.");
            return Err(LoggerError::NoLayersConfigured);
        }

        tracing_subscriber::registry()
            .with(layers)
            .try_init()
            .map_err(|e| LoggerError::InitializationError(e.to_string()))
    }

    fn build_layers(&self) -> Result<Vec<BoxedLayer>, LoggerError> {
        let mut layers = Vec::new();

        if let Some(console) = self.config.console.as_ref().filter(|c| c.enabled) {
            layers.push(console_layer(console, self.filter()));
        }

        #[cfg(feature = "journald")]
        if let Some(journald) = self.config.journald.as_ref().filter(|j| j.enabled) {
            match journald_layer(journald, self.filter()) {
                Ok(layer) => {
                    layers.push(layer);
                    print_info!(
                        "Systemd journald logger initialized with identifier: {}",
                        journald.identifier
                    );
                }
                Err(e) => {
                    print_warn!("Failed to initialize systemd journald logger: {}", e);
                    if self.console_enabled() {
                        return Err(LoggerError::JournaldFailedWithConsoleEnabled);
                    }
                }
            }
        }

        #[cfg(not(feature = "journald"))]
        if self.config.journald.as_ref().is_some_and(|j| j.enabled) {
            print_warn!("journald output requested but this build lacks the 'journald' feature");
        }

        Ok(layers)
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.config.level))
    }

    fn console_enabled(&self) -> bool {
        self.config.console.as_ref().is_some_and(|c| c.enabled)
    }
}

fn console_layer(config: &ConsoleConfig, filter: EnvFilter) -> BoxedLayer {
    let span_events = if config.show_spans {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let base = fmt::layer()
        .with_target(config.show_target)
        .with_thread_ids(config.show_thread_ids)
        .with_span_events(span_events)
        .with_ansi(config.ansi_colors)
        .with_writer(io::stdout);

    match config.format {
        LogFormat::Json => base.json().with_filter(filter).boxed(),
        LogFormat::Pretty => base.pretty().with_filter(filter).boxed(),
        LogFormat::Compact => base.compact().with_filter(filter).boxed(),
    }
}

#[cfg(feature = "journald")]
fn journald_layer(config: &JournaldConfig, filter: EnvFilter) -> Result<BoxedLayer, LoggerError> {
    let layer = tracing_journald::layer()?.with_syslog_identifier(config.identifier.clone());
    Ok(layer.with_filter(filter).boxed())
}
