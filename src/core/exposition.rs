//! Conversion of scraped samples into Prometheus metric families.

use std::collections::HashMap;

use prometheus::{
    proto::{Counter, Gauge, LabelPair, Metric, MetricFamily, MetricType},
    Encoder, TextEncoder,
};

use super::collectors::types::{ConstMetric, ValueKind};

/// Groups samples by metric name, keeping the order in which names were
/// first seen.
pub fn into_families(metrics: Vec<ConstMetric>) -> Vec<MetricFamily> {
    let mut families: Vec<MetricFamily> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for sample in metrics {
        let slot = *index.entry(sample.name().to_string()).or_insert_with(|| {
            let mut family = MetricFamily::default();
            family.set_name(sample.desc.fq_name.clone());
            family.set_help(sample.desc.help.clone());
            family.set_field_type(match sample.kind {
                ValueKind::Gauge => MetricType::GAUGE,
                ValueKind::Counter => MetricType::COUNTER,
            });
            families.push(family);
            families.len() - 1
        });
        families[slot].mut_metric().push(to_metric(&sample));
    }

    families
}

fn to_metric(sample: &ConstMetric) -> Metric {
    let mut metric = Metric::default();

    for (name, value) in sample
        .desc
        .variable_labels
        .iter()
        .zip(sample.label_values.iter())
    {
        let mut pair = LabelPair::default();
        pair.set_name(name.clone());
        pair.set_value(value.clone());
        metric.mut_label().push(pair);
    }

    match sample.kind {
        ValueKind::Gauge => {
            let mut gauge = Gauge::default();
            gauge.set_value(sample.value);
            metric.set_gauge(gauge);
        }
        ValueKind::Counter => {
            let mut counter = Counter::default();
            counter.set_value(sample.value);
            metric.set_counter(counter);
        }
    }

    metric
}

/// Renders families in the Prometheus text exposition format.
pub fn encode(families: &[MetricFamily]) -> prometheus::Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Content type served alongside [`encode`] output.
pub fn content_type() -> String {
    TextEncoder::new().format_type().to_string()
}
