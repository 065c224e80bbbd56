use std::sync::Arc;

use prometheus::core::Desc;

use super::error::CollectorError;

/// Result alias used throughout the collection pipeline.
pub type CollectorResult<T> = std::result::Result<T, CollectorError>;

/// Prometheus value type of an exported metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Gauge,
    Counter,
}

/// One sample produced during a scrape.
///
/// The descriptor is shared with the [`FieldProvider`](super::provider::FieldProvider)
/// that produced it, so emitting a metric never copies name or help text.
#[derive(Debug, Clone)]
pub struct ConstMetric {
    pub desc: Arc<Desc>,
    pub kind: ValueKind,
    pub label_values: Vec<String>,
    pub value: f64,
}

impl ConstMetric {
    pub fn name(&self) -> &str {
        &self.desc.fq_name
    }

    /// Label value for `label`, if the descriptor declares it.
    pub fn label(&self, label: &str) -> Option<&str> {
        self.desc
            .variable_labels
            .iter()
            .position(|name| name == label)
            .and_then(|idx| self.label_values.get(idx))
            .map(String::as_str)
    }
}
