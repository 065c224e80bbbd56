//! Validation gate for the host environment.
//!
//! The gate records whether nvme-cli can currently be used at all (tool
//! present, supported version, sufficient privileges). Scrapes consult it
//! before running any command, so a known-broken environment is not
//! hammered with failing subprocesses on every scrape interval.

use std::{
    fmt,
    sync::{PoisonError, RwLock},
};

use tracing::{debug, warn};

/// Current validity of the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    /// External commands may be attempted.
    Valid,
    /// External commands must not be attempted, with the reason.
    Invalid(String),
}

impl GateState {
    pub fn is_valid(&self) -> bool {
        matches!(self, GateState::Valid)
    }

    /// Returns the reason if the state is `Invalid`, otherwise an empty string.
    pub fn reason(&self) -> &str {
        match self {
            GateState::Invalid(reason) => reason,
            GateState::Valid => "",
        }
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateState::Valid => write!(f, "Valid"),
            GateState::Invalid(reason) => write!(f, "Invalid: {}", reason),
        }
    }
}

/// Shared, lock-guarded environment state.
///
/// Reads take a shared lock and may run concurrently; updates are
/// exclusive. Wrap in an `Arc` to share between the collector and the
/// preflight tasks. A fresh gate is valid.
#[derive(Debug)]
pub struct ValidationGate {
    state: RwLock<GateState>,
}

impl ValidationGate {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(GateState::Valid),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_valid()
    }

    pub fn state(&self) -> GateState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Marks the environment unusable.
    pub fn set_invalid(&self, reason: impl Into<String>) {
        self.set_state(GateState::Invalid(reason.into()));
    }

    pub fn set_valid(&self) {
        self.set_state(GateState::Valid);
    }

    fn set_state(&self, state: GateState) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if *guard == state {
            return;
        }
        match &state {
            GateState::Invalid(reason) => warn!("Environment marked invalid: {}", reason),
            GateState::Valid => debug!("Environment state changed: {} -> Valid", *guard),
        }
        *guard = state;
    }
}

impl Default for ValidationGate {
    fn default() -> Self {
        Self::new()
    }
}
