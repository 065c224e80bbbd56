//! Declarative mapping from one JSON field to one exported metric.

use std::{collections::HashMap, sync::Arc};

use prometheus::core::Desc;
use serde_json::Value;
use tracing::error;

use super::{
    error::CollectorError,
    types::{CollectorResult, ConstMetric, ValueKind},
};

/// Static description of a provider, as written in the metric tables.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: ValueKind,
    /// Key in the source document. `.` separates nested object keys.
    pub key: &'static str,
}

impl FieldSpec {
    pub const fn gauge(name: &'static str, help: &'static str, key: &'static str) -> Self {
        Self {
            name,
            help,
            kind: ValueKind::Gauge,
            key,
        }
    }

    pub const fn counter(name: &'static str, help: &'static str, key: &'static str) -> Self {
        Self {
            name,
            help,
            kind: ValueKind::Counter,
            key,
        }
    }
}

/// Binds a metric descriptor to a JSON field.
///
/// Built once at startup and shared read-only by every scrape.
#[derive(Debug, Clone)]
pub struct FieldProvider {
    desc: Arc<Desc>,
    kind: ValueKind,
    key: String,
}

impl FieldProvider {
    /// Creates a provider, validating name, help and labels.
    pub fn new(spec: &FieldSpec, labels: &[&str]) -> CollectorResult<Self> {
        let desc = Desc::new(
            spec.name.to_string(),
            spec.help.to_string(),
            labels.iter().map(|l| l.to_string()).collect(),
            HashMap::new(),
        )
        .map_err(|source| CollectorError::Descriptor {
            metric: spec.name.to_string(),
            source,
        })?;

        Ok(Self {
            desc: Arc::new(desc),
            kind: spec.kind,
            key: spec.key.to_string(),
        })
    }

    /// Builds one provider per spec, all sharing the same label set.
    pub fn from_table(specs: &[FieldSpec], labels: &[&str]) -> CollectorResult<Vec<Self>> {
        specs.iter().map(|spec| Self::new(spec, labels)).collect()
    }

    pub fn desc(&self) -> &Desc {
        &self.desc
    }

    /// Produces the metric for `document`.
    ///
    /// An absent document yields `None`. A missing or non-numeric field
    /// yields a metric with value `0.0`.
    pub fn resolve(&self, document: Option<&Value>, label_values: &[&str]) -> Option<ConstMetric> {
        let document = document?;

        if label_values.len() != self.desc.variable_labels.len() {
            error!(
                "Metric '{}' expects {} label values, got {}",
                self.desc.fq_name,
                self.desc.variable_labels.len(),
                label_values.len()
            );
            return None;
        }

        let value = lookup(document, &self.key).map(extract_numeric).unwrap_or(0.0);

        Some(ConstMetric {
            desc: Arc::clone(&self.desc),
            kind: self.kind,
            label_values: label_values.iter().map(|v| v.to_string()).collect(),
            value,
        })
    }
}

/// Finds `key` in `document`.
///
/// The literal key wins; otherwise `.` is treated as a path separator so
/// that `Physical media units written.hi` reaches the `hi` member of the
/// `Physical media units written` object.
pub fn lookup<'a>(document: &'a Value, key: &str) -> Option<&'a Value> {
    if let Some(node) = document.get(key) {
        return Some(node);
    }
    if !key.contains('.') {
        return None;
    }
    key.split('.')
        .try_fold(document, |node, segment| node.get(segment))
}

/// Reads a numeric value out of a JSON node.
///
/// Newer nvme-cli releases wrap some scalars as `{"value": ..., ...}`; those
/// envelopes are unwrapped recursively. Anything that is not a number ends
/// up as `0.0`.
pub fn extract_numeric(node: &Value) -> f64 {
    match node {
        Value::Object(map) => map.get("value").map(extract_numeric).unwrap_or(0.0),
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null | Value::Array(_) => 0.0,
    }
}
