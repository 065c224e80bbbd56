use thiserror::Error;

use crate::core::command::CommandError;

/// Errors raised while building or running the collection pipeline.
///
/// None of these abort a scrape: the composite collector logs them and
/// degrades to partial or empty output.
#[derive(Error, Debug)]
pub enum CollectorError {
    /// The external tool could not be run or returned unusable output.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The validation gate reports the environment as unusable.
    #[error("Environment is not valid: {0}")]
    EnvironmentInvalid(String),

    /// A version string did not match `major.minor`.
    #[error("Invalid version '{input}': {reason}")]
    InvalidVersion { input: String, reason: String },

    /// A metric descriptor was rejected (bad name, label or empty help).
    #[error("Invalid metric descriptor '{metric}': {source}")]
    Descriptor {
        metric: String,
        #[source]
        source: prometheus::Error,
    },

    /// The process lacks the privileges needed to talk to the devices.
    #[error("Insufficient privileges: {0}")]
    Privilege(String),

    /// A group was constructed with a kind it cannot honor.
    #[error("Invalid metric group '{name}': {reason}")]
    InvalidGroup { name: String, reason: String },

    /// Tried to enable an optional group that was never registered.
    #[error("Metric group not found for: {0}")]
    GroupNotFound(String),
}
