//! HTTP listener settings for the metrics endpoint.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ExporterConfig {
    /// Address the listener binds to.
    #[validate(length(min = 1, message = "Listen address must not be empty"))]
    pub listen_address: String,

    #[validate(range(min = 1, message = "Port must be between 1 and 65535"))]
    pub port: u16,

    /// Path serving the Prometheus text format. A missing leading `/` is added.
    #[validate(length(min = 1, message = "Metrics endpoint must not be empty"))]
    pub endpoint: String,
}

impl ExporterConfig {
    /// Makes sure the endpoint is an absolute path.
    pub fn normalize_endpoint(&mut self) {
        if !self.endpoint.starts_with('/') {
            self.endpoint.insert(0, '/');
        }
    }

    /// `host:port` string for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listen_address, self.port)
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0".into(),
            port: 9998,
            endpoint: "/metrics".into(),
        }
    }
}
